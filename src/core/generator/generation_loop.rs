//! 명시적 단계 상태 머신으로 구현한 최적화 루프

use super::CancelToken;
use crate::core::augment::Augmenter;
use crate::core::config::GenerationConfig;
use crate::core::decoder::{build_decoder, DecodeMode, Decoder};
use crate::core::error::{GenError, GenResult};
use crate::core::models::ModelContext;
use crate::core::optimizers::{build_optimizer, clip_grad_norm, Optimizer};
use crate::core::scorer::{embed_image, PromptTarget, ScoreBreakdown, Scorer};
use crate::core::tensors::{fit_reference, rgb_to_tensor, tensor_to_frame, Checkpoint, ParameterizedState};
use candle_core::Tensor;
use image::RgbImage;
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

/// 작업 입력: 프롬프트와 선택적 참조 이미지
#[derive(Debug, Clone)]
pub struct GenerationInput {
    pub prompt: String,
    pub subtract: Option<String>,
    pub reference: Option<RgbImage>,
}

impl GenerationInput {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self { prompt: prompt.into(), subtract: None, reference: None }
    }

    pub fn with_subtract(mut self, text: impl Into<String>) -> Self {
        self.subtract = Some(text.into());
        self
    }

    pub fn with_reference(mut self, image: RgbImage) -> Self {
        self.reference = Some(image);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopPhase {
    Init,
    /// 다음에 실행할 스텝 (0 부터)
    Stepping { step: usize },
    Done,
}

/// 한 스텝의 결과 요약
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: usize,
    pub loss: f32,
    pub learning_rate: f32,
    pub breakdown: ScoreBreakdown,
    pub checkpointed: bool,
}

/// 성공한 작업의 결과. 체크포인트와 프레임은 1:1 대응한다
#[derive(Debug, Clone, Default)]
pub struct GenerationResult {
    pub frames: Vec<RgbImage>,
    pub checkpoints: Vec<Checkpoint>,
    pub loss_history: Vec<f32>,
}

impl GenerationResult {
    pub fn last_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints.last()
    }

    pub fn last_frame(&self) -> Option<&RgbImage> {
        self.frames.last()
    }
}

/// Init 단계에서 만들어져 작업이 끝날 때까지 유지되는 구성 요소
struct Session {
    decoder: Box<dyn Decoder>,
    state: ParameterizedState,
    optimizer: Box<dyn Optimizer>,
    scorer: Scorer,
    augmenter: Augmenter,
    progress: ProgressBar,
}

pub struct GenerationLoop {
    ctx: ModelContext,
    config: GenerationConfig,
    input: GenerationInput,
    cancel: CancelToken,
    rng: StdRng,
    phase: LoopPhase,
    session: Option<Session>,
    result: GenerationResult,
}

impl GenerationLoop {
    pub fn new(ctx: &ModelContext, config: &GenerationConfig, input: GenerationInput) -> GenResult<Self> {
        config.validate()?;
        Ok(Self {
            ctx: ctx.clone(),
            config: config.clone(),
            input,
            cancel: CancelToken::new(),
            rng: StdRng::seed_from_u64(config.seed),
            phase: LoopPhase::Init,
            session: None,
            result: GenerationResult::default(),
        })
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn phase(&self) -> LoopPhase {
        self.phase
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// 지금까지 쌓인 결과 (실패 시 비어 있음)
    pub fn partial(&self) -> &GenerationResult {
        &self.result
    }

    pub fn decoder(&self) -> Option<&dyn Decoder> {
        self.session.as_ref().map(|s| s.decoder.as_ref())
    }

    pub fn into_decoder(self) -> Option<Box<dyn Decoder>> {
        self.session.map(|s| s.decoder)
    }

    /// 한 스텝 진행. 끝났으면 `Ok(None)`
    ///
    /// 에러는 종료성이다. 루프는 Done 으로 가고 부분 결과는 버려진다.
    pub fn step(&mut self) -> GenResult<Option<StepReport>> {
        let step = match self.phase {
            LoopPhase::Done => return Ok(None),
            LoopPhase::Init => 0,
            LoopPhase::Stepping { step } => step,
        };
        if self.cancel.is_cancelled() {
            log::info!("generation cancelled before step {step}");
            return Err(self.fail(GenError::Cancelled { step }));
        }
        if self.phase == LoopPhase::Init {
            match self.initialize() {
                Ok(session) => self.session = Some(session),
                Err(err) => return Err(self.fail(err)),
            }
        }

        match self.iterate(step) {
            Ok(report) => {
                let next = step + 1;
                if next >= self.config.iterations {
                    self.phase = LoopPhase::Done;
                    if let Some(session) = &self.session {
                        session.progress.finish_with_message("done");
                    }
                    log::info!(
                        "generation finished: {} checkpoints, final loss {:.4}",
                        self.result.checkpoints.len(),
                        report.loss
                    );
                } else {
                    self.phase = LoopPhase::Stepping { step: next };
                }
                Ok(Some(report))
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// 예산을 모두 소진할 때까지 실행
    pub fn run(&mut self) -> GenResult<GenerationResult> {
        while self.step()?.is_some() {}
        Ok(std::mem::take(&mut self.result))
    }

    fn fail(&mut self, err: GenError) -> GenError {
        log::warn!("generation aborted: {err}");
        self.phase = LoopPhase::Done;
        self.result = GenerationResult::default();
        if let Some(session) = self.session.take() {
            session.progress.abandon();
        }
        err
    }

    fn initialize(&mut self) -> GenResult<Session> {
        let device = self.ctx.device().clone();
        let decoder = build_decoder(&self.config.decoder, &self.ctx, &mut self.rng)?;
        log::info!(
            "starting {} generation: {} iterations, {} views, prompt {:?}",
            decoder.kind(),
            self.config.iterations,
            self.config.augment.num_views,
            self.input.prompt
        );

        let mut target = PromptTarget::new(self.input.prompt.clone());
        if let Some(subtract) = &self.input.subtract {
            target = target.with_subtract(subtract.clone());
        }

        let mut seeded = None;
        if let Some(reference) = &self.input.reference {
            let fitted = fit_reference(reference, self.config.decoder.width, self.config.decoder.height);
            let image = rgb_to_tensor(&fitted, &device)?;
            if self.config.score.image_weight != 0.0 {
                let embedding = embed_image(self.ctx.image_encoder(), &image, self.config.score.normalize_input)?;
                target = target.with_reference_embedding(embedding);
            }
            if self.config.seed_from_reference || self.config.score.anchor_enabled {
                match decoder.encode_reference(&image)? {
                    Some(encoded) => {
                        target = target.with_reference_state(encoded.clone());
                        if self.config.seed_from_reference {
                            seeded = Some(encoded);
                        }
                    }
                    None => log::warn!(
                        "{} decoder cannot encode the reference image, starting from noise",
                        decoder.kind()
                    ),
                }
            }
        }

        let initial = match seeded {
            Some(values) => values,
            None => decoder.init_state(&mut self.rng, &device)?,
        };
        let state = ParameterizedState::new(decoder.layout().clone(), &initial)?;
        let optimizer = build_optimizer(&self.config.optimizer)?;
        let scorer = Scorer::new(&self.ctx, &target, &self.config.score)?;
        let augmenter = Augmenter::new(&self.config.augment, self.ctx.image_encoder().input_size())?;

        Ok(Session {
            decoder,
            state,
            optimizer,
            scorer,
            augmenter,
            progress: self.progress_bar(),
        })
    }

    fn progress_bar(&self) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let progress = ProgressBar::new(self.config.iterations as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("🎨 [{elapsed_precise}] [{bar:40.cyan/blue}] {pos:>4}/{len:4} {msg}")
        {
            progress.set_style(style.progress_chars("█▉▊▋▌▍▎▏ "));
        }
        progress
    }

    fn iterate(&mut self, step: usize) -> GenResult<StepReport> {
        let Self { session, rng, config, result, .. } = self;
        let session = session
            .as_mut()
            .ok_or_else(|| GenError::invalid_config("generation loop stepped before init"))?;

        let values = session.state.values();
        let image = session.decoder.decode(values, DecodeMode::Train(rng))?;
        let views = session.augmenter.augment(&image, rng)?;
        let (loss, breakdown) = session.scorer.score(&views, values)?;
        let loss_value = loss.to_scalar::<f32>()?;
        if !loss_value.is_finite() {
            return Err(GenError::NumericalDivergence { step, loss: loss_value });
        }

        let grads = loss.backward()?;
        let grad = match grads.get(values) {
            Some(grad) => grad.clone(),
            None => values.zeros_like()?,
        };
        let grad_sq = grad.sqr()?.sum_all()?.to_scalar::<f32>()?;
        if !grad_sq.is_finite() {
            return Err(GenError::NumericalDivergence { step, loss: loss_value });
        }
        let grad = match config.optimizer.gradient_clipping {
            Some(max_norm) => clip_grad_norm(&grad, max_norm)?,
            None => grad,
        };

        let lr = config
            .optimizer
            .lr_schedule
            .learning_rate(config.optimizer.learning_rate, step, config.iterations);
        let next: Tensor = session.optimizer.step(&values.detach(), &grad, lr)?;
        session.state.set(&next)?;

        let checkpointed = step % config.save_every == 0;
        if checkpointed {
            let checkpoint = session.state.snapshot(step)?;
            let rendered = session.decoder.decode(checkpoint.values(), DecodeMode::Render)?;
            result.frames.push(tensor_to_frame(&rendered)?);
            result.checkpoints.push(checkpoint);
        }
        result.loss_history.push(loss_value);

        log::debug!("step {step}: loss {loss_value:.5} lr {lr:.4} text cos {:.4}", breakdown.text_similarity);
        session.progress.set_message(format!("loss {loss_value:.4}"));
        session.progress.inc(1);

        Ok(StepReport { step, loss: loss_value, learning_rate: lr, breakdown, checkpointed })
    }
}
