//! 작업 실행기
//!
//! 결과물은 `public_root` 아래에 쓰고 응답 URL 은 그 루트 기준 상대 경로다.

use super::{GenerationRequest, GenerationResponse};
use crate::core::config::JobMode;
use crate::core::error::{GenError, GenResult};
use crate::core::generator::{CancelToken, GenerationInput, GenerationLoop};
use crate::core::interpolate::Interpolator;
use crate::core::models::ModelContext;
use crate::core::output::{save_png, FrameSink, PngSequenceSink};
use image::RgbImage;
use std::path::{Path, PathBuf};

/// 단일 생성 과정 영상 프레임율
pub const SINGLE_VIDEO_FPS: u32 = 5;

const GENERATIONS_DIR: &str = "generations";
const MAX_SLUG_LEN: usize = 64;

pub struct JobRunner {
    ctx: ModelContext,
    public_root: PathBuf,
    cancel: CancelToken,
    show_progress: bool,
}

impl JobRunner {
    pub fn new(ctx: ModelContext, public_root: impl Into<PathBuf>) -> Self {
        Self {
            ctx,
            public_root: public_root.into(),
            cancel: CancelToken::new(),
            show_progress: false,
        }
    }

    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn public_root(&self) -> &Path {
        &self.public_root
    }

    /// 요청 하나를 처리하고 항상 응답을 만든다
    pub fn handle(&self, request: &GenerationRequest) -> GenerationResponse {
        let outcome = match request.mode() {
            JobMode::Single => self.run_single(request),
            JobMode::Story => self.run_story(request),
        };
        outcome.unwrap_or_else(|err| {
            log::error!("job for model {:?} failed: {err}", request.model);
            GenerationResponse::failure(&err)
        })
    }

    pub fn run_single(&self, request: &GenerationRequest) -> GenResult<GenerationResponse> {
        let prompt = request
            .prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .ok_or_else(|| GenError::invalid_config("prompt is required"))?;
        let reference = match request.images.first() {
            Some(path) => Some(load_reference(path)?),
            None => None,
        };
        let mut config = request.to_config(JobMode::Single, reference.is_some())?;
        config.show_progress = self.show_progress;

        let mut input = GenerationInput::new(prompt);
        if let Some(subtract) = &request.subtract {
            input = input.with_subtract(subtract.clone());
        }
        if let Some(image) = reference {
            input = input.with_reference(image);
        }

        let result = GenerationLoop::new(&self.ctx, &config, input)?
            .with_cancel(self.cancel.clone())
            .run()?;

        let out_dir = self.output_dir(prompt);
        let mut img_url = String::new();
        let mut video_url = String::new();
        if request.generate_img {
            if let Some(last) = result.last_frame() {
                let path = out_dir.join("img.png");
                save_png(last, &path)?;
                img_url = self.public_url(&path);
            }
        }
        if request.generate_video {
            let mut sink = PngSequenceSink::new(out_dir.join("video"), "frame", SINGLE_VIDEO_FPS)?;
            for frame in &result.frames {
                sink.push(frame)?;
            }
            sink.finish()?;
            video_url = self.public_url(sink.dir());
        }
        Ok(GenerationResponse::success(img_url, video_url))
    }

    /// 프롬프트마다 독립 최적화 후 마지막 체크포인트들을 순환 보간
    pub fn run_story(&self, request: &GenerationRequest) -> GenResult<GenerationResponse> {
        if request.prompts.is_empty() {
            return Err(GenError::invalid_config("story needs at least one prompt"));
        }
        if request.durations.len() != request.prompts.len() {
            return Err(GenError::invalid_config(format!(
                "{} durations given for {} prompts",
                request.durations.len(),
                request.prompts.len()
            )));
        }
        let mut config = request.to_config(JobMode::Story, !request.images.is_empty())?;
        config.show_progress = self.show_progress;

        let mut checkpoints = Vec::with_capacity(request.prompts.len());
        let mut decoder = None;
        for (idx, prompt) in request.prompts.iter().enumerate() {
            log::info!("story prompt {}/{}: {prompt:?}", idx + 1, request.prompts.len());
            let mut input = GenerationInput::new(prompt.clone());
            if let Some(path) = request.images.get(idx) {
                input = input.with_reference(load_reference(path)?);
            }
            let mut job = GenerationLoop::new(&self.ctx, &config, input)?.with_cancel(self.cancel.clone());
            let result = job.run()?;
            let last = result
                .checkpoints
                .last()
                .cloned()
                .ok_or_else(|| GenError::invalid_config("generation produced no checkpoint"))?;
            checkpoints.push(last);
            // 같은 구성과 시드로 만든 디코더는 프롬프트마다 동일
            decoder = job.into_decoder();
        }
        let decoder = decoder.ok_or_else(|| GenError::invalid_config("story produced no decoder"))?;

        let out_dir = self.output_dir(&request.prompts.join(" "));
        let interpolator = Interpolator::new(config.interpolation_fps);
        let mut sink = PngSequenceSink::new(out_dir.join("interpolation"), "frame", interpolator.fps())?;
        let frames = interpolator.run(&checkpoints, &request.durations, decoder.as_ref(), &mut sink)?;
        log::info!("story interpolation wrote {frames} frames");

        Ok(GenerationResponse::success(String::new(), self.public_url(sink.dir())))
    }

    fn output_dir(&self, prompt: &str) -> PathBuf {
        self.public_root.join(GENERATIONS_DIR).join(slug(prompt))
    }

    /// 공개 루트 기준 `/` 구분 상대 경로
    fn public_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.public_root).unwrap_or(path);
        relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

fn load_reference(path: &Path) -> GenResult<RgbImage> {
    Ok(image::open(path)?.to_rgb8())
}

/// 프롬프트 → 파일 시스템 안전한 디렉터리 이름
pub(crate) fn slug(prompt: &str) -> String {
    let mut out = String::with_capacity(prompt.len());
    let mut last_sep = true;
    for ch in prompt.trim().chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            last_sep = false;
        } else if !last_sep {
            out.push('_');
            last_sep = true;
        }
        if out.chars().count() >= MAX_SLUG_LEN {
            break;
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "untitled".to_string()
    } else {
        trimmed.to_string()
    }
}
