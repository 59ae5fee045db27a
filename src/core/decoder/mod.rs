//! # 표현 디코더
//!
//! 최적화 상태를 [0,1] RGB 이미지로 사상하는 결정적이고 미분 가능한 디코더들.
//! 백엔드 선택은 문자열 분기가 아니라 `DecoderKind` 열거형 기반 팩토리로 한다.

pub mod dft;
pub mod color;
pub mod spectral;
pub mod codebook;
pub mod latent;
pub mod factory;

#[cfg(test)]
mod __tests__;

pub use codebook::{relaxed_categorical, CodebookConfig, CodebookDecoder};
pub use factory::build_decoder;
pub use latent::{LatentConfig, LatentDecoder, LatentInit, LatentRepeat};
pub use spectral::{SpectralConfig, SpectralDecoder};

use crate::core::error::{GenError, GenResult};
use crate::core::tensors::StateLayout;
use candle_core::{Device, Tensor};
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 등록된 디코더 변형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecoderKind {
    /// 주파수 영역 합성 (aphantasia)
    #[serde(alias = "aphantasia")]
    Spectral,
    /// 코드북 로짓 + 완화된 범주형 샘플링 (dall-e)
    #[serde(alias = "dalle")]
    Codebook,
    /// VQ 생성기 잠재 공간 직접 최적화 (taming)
    #[serde(alias = "taming")]
    VqLatent,
    /// 스타일 잠재 벡터 (stylegan)
    #[serde(alias = "stylegan")]
    StyleLatent,
}

impl DecoderKind {
    pub const ALL: [DecoderKind; 4] = [
        DecoderKind::Spectral,
        DecoderKind::Codebook,
        DecoderKind::VqLatent,
        DecoderKind::StyleLatent,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DecoderKind::Spectral => "spectral",
            DecoderKind::Codebook => "codebook",
            DecoderKind::VqLatent => "vq_latent",
            DecoderKind::StyleLatent => "style_latent",
        }
    }

    /// 외부 생성기 네트워크가 필요한 변형인지
    pub fn requires_generator(&self) -> bool {
        !matches!(self, DecoderKind::Spectral)
    }
}

impl fmt::Display for DecoderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DecoderKind {
    type Err = GenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "spectral" | "aphantasia" => Ok(DecoderKind::Spectral),
            "codebook" | "dalle" => Ok(DecoderKind::Codebook),
            "vq_latent" | "taming" | "vqgan" => Ok(DecoderKind::VqLatent),
            "style_latent" | "stylegan" => Ok(DecoderKind::StyleLatent),
            other => Err(GenError::UnsupportedBackend(other.to_string())),
        }
    }
}

/// 디코딩 모드: 학습 중에는 확률적 완화를 쓰고 렌더링은 결정적이다
pub enum DecodeMode<'a> {
    Train(&'a mut StdRng),
    Render,
}

/// 생성기 출력을 [0,1] 로 사상하는 방식 (앞 3채널만 사용)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputRange {
    /// 이미 [0,1] - clamp 만 적용
    Unit,
    /// [-1,1] → `(clamp(x) + 1) / 2`
    Symmetric,
    /// 로짓 → sigmoid
    Sigmoid,
    /// sigmoid 후 픽셀 역매핑 `(x - eps) / (1 - 2 eps)`
    MappedSigmoid { eps: f32 },
}

impl OutputRange {
    pub fn apply(&self, raw: &Tensor) -> GenResult<Tensor> {
        let channels = raw.dim(1)?;
        if channels < 3 {
            return Err(GenError::ShapeMismatch {
                context: "generator output",
                expected: vec![raw.dim(0)?, 3, raw.dim(2)?, raw.dim(3)?],
                actual: raw.dims().to_vec(),
            });
        }
        let rgb = raw.narrow(1, 0, 3)?;
        let mapped = match self {
            OutputRange::Unit => rgb.clamp(0f32, 1f32)?,
            OutputRange::Symmetric => rgb.clamp(-1f32, 1f32)?.affine(0.5, 0.5)?,
            OutputRange::Sigmoid => sigmoid(&rgb)?,
            OutputRange::MappedSigmoid { eps } => {
                let eps = *eps as f64;
                sigmoid(&rgb)?
                    .affine(1.0 / (1.0 - 2.0 * eps), -eps / (1.0 - 2.0 * eps))?
                    .clamp(0f32, 1f32)?
            }
        };
        Ok(mapped)
    }
}

/// 기본 연산으로 구성한 sigmoid - 유한 입력에 대해 항상 유한
pub(crate) fn sigmoid(xs: &Tensor) -> candle_core::Result<Tensor> {
    xs.neg()?.exp()?.affine(1.0, 1.0)?.recip()
}

/// 표현 상태 디코더
pub trait Decoder: Send {
    fn kind(&self) -> DecoderKind;

    fn layout(&self) -> &StateLayout;

    /// 낮은 진폭의 무작위 초기 상태
    fn init_state(&self, rng: &mut StdRng, device: &Device) -> GenResult<Tensor>;

    /// 참조 이미지 `(1, 3, H, W)` 를 이 디코더의 표현으로 인코딩 (불가능하면 None)
    fn encode_reference(&self, image: &Tensor) -> GenResult<Option<Tensor>>;

    /// 상태 → `(B, 3, H, W)` [0,1]
    fn decode(&self, values: &Tensor, mode: DecodeMode<'_>) -> GenResult<Tensor>;
}

/// 가우시안 난수 텐서 (작업 RNG 에서 뽑아 재현성 유지)
pub(crate) fn gaussian_tensor(
    rng: &mut StdRng,
    shape: &[usize],
    std: f32,
    device: &Device,
) -> GenResult<Tensor> {
    use rand_distr::{Distribution, Normal};
    let normal = Normal::new(0f32, std.max(0.0))
        .map_err(|e| GenError::invalid_config(format!("invalid std {std}: {e}")))?;
    let count: usize = shape.iter().product();
    let data: Vec<f32> = (0..count).map(|_| normal.sample(rng)).collect();
    Ok(Tensor::from_vec(data, shape, device)?)
}

/// 디코더 공통 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    pub kind: DecoderKind,
    pub batch: usize,
    /// 스펙트럼 해상도 / 참조 이미지 맞춤 해상도
    pub width: usize,
    pub height: usize,
    pub spectral: SpectralConfig,
    pub codebook: CodebookConfig,
    pub latent: LatentConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            kind: DecoderKind::Spectral,
            batch: 1,
            width: 512,
            height: 512,
            spectral: SpectralConfig::default(),
            codebook: CodebookConfig::default(),
            latent: LatentConfig::default(),
        }
    }
}
