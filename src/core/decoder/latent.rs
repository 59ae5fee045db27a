//! 생성기 전용 연속 잠재 디코더
//!
//! VQ 생성기의 양자화 후 잠재 `(B, C, h, w)` 나 스타일 생성기의 `(B, D)`
//! 잠재 벡터를 그대로 최적화한다. 스타일 잠재는 합성 레이어 수만큼 복제해
//! `(B, L, D)` 로 넘길 수 있다.

use super::{gaussian_tensor, DecodeMode, Decoder, DecoderKind, OutputRange};
use crate::core::error::{Collaborator, CollaboratorContext, GenError, GenResult};
use crate::core::models::{CodeEncoder, Generator};
use crate::core::tensors::StateLayout;
use candle_core::{DType, Device, Tensor};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// 잠재 초기화 방식
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LatentInit {
    Zeros,
    /// `N(0, std²)` 후 선택적 `sinh(k·asinh(x))` 첨예화
    Gaussian { std: f32, sharpen: Option<f32> },
}

/// 잠재를 지정 축에 끼워 `count` 번 복제
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatentRepeat {
    pub axis: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LatentConfig {
    /// 배치 축을 포함한 잠재 형상
    pub dims: Vec<usize>,
    pub init: LatentInit,
    pub repeat: Option<LatentRepeat>,
    pub output_range: OutputRange,
}

impl Default for LatentConfig {
    fn default() -> Self {
        Self {
            dims: vec![1, 256, 16, 16],
            init: LatentInit::Gaussian { std: 1.0, sharpen: None },
            repeat: None,
            output_range: OutputRange::Symmetric,
        }
    }
}

pub struct LatentDecoder {
    kind: DecoderKind,
    layout: StateLayout,
    config: LatentConfig,
    generator: Arc<dyn Generator>,
    code_encoder: Option<Arc<dyn CodeEncoder>>,
}

impl LatentDecoder {
    pub fn new(
        kind: DecoderKind,
        config: &LatentConfig,
        generator: Arc<dyn Generator>,
        code_encoder: Option<Arc<dyn CodeEncoder>>,
    ) -> GenResult<Self> {
        if !matches!(kind, DecoderKind::VqLatent | DecoderKind::StyleLatent) {
            return Err(GenError::UnsupportedBackend(format!("{kind} is not a latent backend")));
        }
        if config.dims.is_empty() || config.dims.iter().any(|&d| d == 0) {
            return Err(GenError::invalid_config(format!(
                "latent dims must be non-empty and positive, got {:?}",
                config.dims
            )));
        }
        if let Some(repeat) = &config.repeat {
            if repeat.count == 0 || repeat.axis == 0 || repeat.axis > config.dims.len() {
                return Err(GenError::invalid_config(format!(
                    "latent repeat axis {} / count {} out of range for {:?}",
                    repeat.axis, repeat.count, config.dims
                )));
            }
        }
        Ok(Self {
            kind,
            layout: StateLayout::Latent { dims: config.dims.clone() },
            config: config.clone(),
            generator,
            code_encoder,
        })
    }

    pub fn config(&self) -> &LatentConfig {
        &self.config
    }

    /// 생성기 입력 형태로 확장 (복제 축 삽입)
    pub fn expand(&self, values: &Tensor) -> GenResult<Tensor> {
        self.layout.check("latent decode", values)?;
        let Some(repeat) = &self.config.repeat else {
            return Ok(values.clone());
        };
        let inserted = values.unsqueeze(repeat.axis)?;
        let mut counts = vec![1usize; inserted.rank()];
        counts[repeat.axis] = repeat.count;
        Ok(inserted.repeat(counts)?)
    }
}

impl Decoder for LatentDecoder {
    fn kind(&self) -> DecoderKind {
        self.kind
    }

    fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn init_state(&self, rng: &mut StdRng, device: &Device) -> GenResult<Tensor> {
        let dims = self.layout.dims();
        match self.config.init {
            LatentInit::Zeros => Ok(Tensor::zeros(dims, DType::F32, device)?),
            LatentInit::Gaussian { std, sharpen: None } => gaussian_tensor(rng, &dims, std, device),
            LatentInit::Gaussian { std, sharpen: Some(k) } => {
                // 꼬리를 키워 잠재 분포를 뾰족하게
                let base = gaussian_tensor(rng, &dims, std, device)?;
                let data: Vec<f32> = base
                    .flatten_all()?
                    .to_vec1::<f32>()?
                    .into_iter()
                    .map(|x| (k * x.asinh()).sinh())
                    .collect();
                Ok(Tensor::from_vec(data, dims, device)?)
            }
        }
    }

    fn encode_reference(&self, image: &Tensor) -> GenResult<Option<Tensor>> {
        let Some(encoder) = &self.code_encoder else {
            return Ok(None);
        };
        let latent = encoder
            .encode(image)
            .collaborator(Collaborator::CodeEncoder)?
            .to_dtype(DType::F32)?;
        self.layout.check("latent reference", &latent)?;
        Ok(Some(latent))
    }

    fn decode(&self, values: &Tensor, _mode: DecodeMode<'_>) -> GenResult<Tensor> {
        let input = self.expand(values)?;
        let raw = self
            .generator
            .generate(&input)
            .collaborator(Collaborator::Generator)?;
        self.config.output_range.apply(&raw)
    }
}
