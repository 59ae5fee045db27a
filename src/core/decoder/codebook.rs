//! 코드북 로짓 디코더
//!
//! 격자 위치마다 V 개 코드에 대한 로짓을 두고, 완화된 범주형 분포로
//! 소프트 코드 할당을 만든 뒤 외부 생성기에 넘긴다.

use super::{gaussian_tensor, DecodeMode, Decoder, DecoderKind, OutputRange};
use crate::core::error::{Collaborator, CollaboratorContext, GenError, GenResult};
use crate::core::models::{CodeEncoder, Generator};
use crate::core::tensors::StateLayout;
use candle_core::{DType, Device, Tensor, D};
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 코드북 디코더 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodebookConfig {
    pub vocab: usize,
    pub grid_h: usize,
    pub grid_w: usize,
    /// 소프트맥스 온도 τ
    pub temperature: f32,
    /// straight-through 원-핫
    pub hard: bool,
    /// 학습 시 검벨 노이즈 사용
    pub gumbel: bool,
    pub init_std: f32,
    pub output_range: OutputRange,
}

impl Default for CodebookConfig {
    fn default() -> Self {
        Self {
            vocab: 8192,
            grid_h: 32,
            grid_w: 32,
            temperature: 1.0,
            hard: false,
            gumbel: true,
            init_std: 1.0,
            output_range: OutputRange::MappedSigmoid { eps: 0.1 },
        }
    }
}

const MIN_TEMPERATURE: f32 = 1e-6;
const UNIFORM_EPS: f32 = 1e-10;

/// 마지막 축에 대한 완화된 범주형 할당
///
/// `rng` 가 있으면 검벨 노이즈 `-ln(-ln u)` 를 더한 뒤 `softmax(x / τ)`.
/// `hard` 면 순전파는 원-핫, 역전파는 소프트 그래디언트를 쓴다.
pub fn relaxed_categorical(
    logits: &Tensor,
    temperature: f32,
    hard: bool,
    rng: Option<&mut StdRng>,
) -> GenResult<Tensor> {
    let tau = temperature.max(MIN_TEMPERATURE) as f64;
    let perturbed = match rng {
        Some(rng) => {
            let count = logits.elem_count();
            let noise: Vec<f32> = (0..count)
                .map(|_| {
                    let u: f32 = rng.gen_range(UNIFORM_EPS..1.0);
                    -(-u.ln()).ln()
                })
                .collect();
            let noise = Tensor::from_vec(noise, logits.dims(), logits.device())?;
            logits.add(&noise)?
        }
        None => logits.clone(),
    };
    let soft = candle_nn::ops::softmax(&perturbed.affine(1.0 / tau, 0.0)?, D::Minus1)?;
    if !hard {
        return Ok(soft);
    }

    let vocab = soft.dim(D::Minus1)?;
    let index = soft.detach().argmax_keepdim(D::Minus1)?;
    let codes = Tensor::arange(0u32, vocab as u32, soft.device())?;
    let mut shape = vec![1usize; soft.rank()];
    shape[soft.rank() - 1] = vocab;
    let one_hot = index
        .broadcast_eq(&codes.reshape(shape)?)?
        .to_dtype(soft.dtype())?;
    Ok(one_hot.sub(&soft.detach())?.add(&soft)?)
}

pub struct CodebookDecoder {
    layout: StateLayout,
    config: CodebookConfig,
    generator: Arc<dyn Generator>,
    code_encoder: Option<Arc<dyn CodeEncoder>>,
}

impl CodebookDecoder {
    pub fn new(
        batch: usize,
        config: &CodebookConfig,
        generator: Arc<dyn Generator>,
        code_encoder: Option<Arc<dyn CodeEncoder>>,
    ) -> GenResult<Self> {
        if batch == 0 || config.vocab == 0 || config.grid_h == 0 || config.grid_w == 0 {
            return Err(GenError::invalid_config(format!(
                "codebook dims must be positive: batch {batch}, vocab {}, grid {}x{}",
                config.vocab, config.grid_h, config.grid_w
            )));
        }
        if !(config.temperature > 0.0) {
            return Err(GenError::invalid_config("codebook temperature must be positive"));
        }
        Ok(Self {
            layout: StateLayout::CodebookLogits {
                batch,
                vocab: config.vocab,
                grid_h: config.grid_h,
                grid_w: config.grid_w,
            },
            config: config.clone(),
            generator,
            code_encoder,
        })
    }

    pub fn config(&self) -> &CodebookConfig {
        &self.config
    }

    /// 로짓 `(B, V, gh, gw)` → 소프트 코드 `(B, V, gh, gw)`
    pub fn assign(&self, values: &Tensor, mode: DecodeMode<'_>) -> GenResult<Tensor> {
        self.layout.check("codebook decode", values)?;
        let (b, v, gh, gw) = values.dims4()?;
        let per_cell = values
            .reshape((b, v, gh * gw))?
            .transpose(1, 2)?
            .contiguous()?;
        let rng = match mode {
            DecodeMode::Train(rng) if self.config.gumbel => Some(rng),
            _ => None,
        };
        let soft = relaxed_categorical(&per_cell, self.config.temperature, self.config.hard, rng)?;
        Ok(soft.transpose(1, 2)?.contiguous()?.reshape((b, v, gh, gw))?)
    }
}

impl Decoder for CodebookDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Codebook
    }

    fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn init_state(&self, rng: &mut StdRng, device: &Device) -> GenResult<Tensor> {
        gaussian_tensor(rng, &self.layout.dims(), self.config.init_std, device)
    }

    fn encode_reference(&self, image: &Tensor) -> GenResult<Option<Tensor>> {
        let Some(encoder) = &self.code_encoder else {
            return Ok(None);
        };
        let logits = encoder
            .encode(image)
            .collaborator(Collaborator::CodeEncoder)?
            .to_dtype(DType::F32)?;
        let expected = self.layout.dims();
        // 단일 이미지 인코딩은 배치 전체로 복제
        let single = logits.rank() == 4
            && logits.dim(0)? == 1
            && expected[0] > 1
            && logits.dims()[1..] == expected[1..];
        let logits = if single {
            logits.repeat((expected[0], 1, 1, 1))?
        } else {
            logits
        };
        self.layout.check("codebook reference", &logits)?;
        Ok(Some(logits))
    }

    fn decode(&self, values: &Tensor, mode: DecodeMode<'_>) -> GenResult<Tensor> {
        let code = self.assign(values, mode)?;
        let raw = self
            .generator
            .generate(&code)
            .collaborator(Collaborator::Generator)?;
        self.config.output_range.apply(&raw)
    }
}
