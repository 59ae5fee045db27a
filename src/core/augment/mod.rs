//! # 뷰 증강
//!
//! 렌더링된 이미지마다 N 개의 무작위 크롭 뷰를 만들고 인코더 입력 해상도로
//! 리샘플한다. 기하 샘플링(`CropWindow`, `ViewTransform`)은 텐서 작업과 분리되어 있다.

pub mod geometry;
pub mod sampler;

#[cfg(test)]
mod __tests__;

pub use geometry::{CropWindow, ViewTransform};
pub use sampler::SamplingGrid;

use crate::core::decoder::gaussian_tensor;
use crate::core::error::{GenError, GenResult};
use candle_core::Tensor;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// 축별 크롭 비율 분포
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CropSampling {
    Uniform { min: f32, max: f32 },
    /// `clip(N(mean, std²), min, max)`
    ClippedNormal { mean: f32, std: f32, min: f32, max: f32 },
}

impl Default for CropSampling {
    fn default() -> Self {
        CropSampling::Uniform { min: 0.2, max: 0.8 }
    }
}

/// 패딩/반전/회전/이동/노이즈 증강
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RichAugment {
    pub pad: usize,
    pub flip_prob: f32,
    pub max_rotation_deg: f32,
    /// 크롭 크기 대비 최대 이동 비율
    pub max_translate: f32,
    pub noise_amplitude: f32,
}

impl Default for RichAugment {
    fn default() -> Self {
        Self {
            pad: 0,
            flip_prob: 0.5,
            max_rotation_deg: 5.0,
            max_translate: 0.05,
            noise_amplitude: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub num_views: usize,
    /// 뷰 해상도 (None 이면 이미지 인코더 입력 크기)
    pub output_size: Option<usize>,
    pub sampling: CropSampling,
    pub rich: Option<RichAugment>,
}

impl Default for AugmentConfig {
    fn default() -> Self {
        Self {
            num_views: 20,
            output_size: None,
            sampling: CropSampling::default(),
            rich: None,
        }
    }
}

impl AugmentConfig {
    pub fn validate(&self) -> GenResult<()> {
        if self.num_views == 0 {
            return Err(GenError::invalid_config("num_views must be at least 1"));
        }
        if self.output_size == Some(0) {
            return Err(GenError::invalid_config("view size must be positive"));
        }
        let (min, max) = self.sampling.bounds();
        if !(min > 0.0 && min <= max && max <= 1.0) {
            return Err(GenError::invalid_config(format!(
                "crop fraction bounds must satisfy 0 < min <= max <= 1, got [{min}, {max}]"
            )));
        }
        Ok(())
    }
}

/// 뷰 증강기
#[derive(Debug, Clone)]
pub struct Augmenter {
    config: AugmentConfig,
    size: usize,
}

impl Augmenter {
    pub fn new(config: &AugmentConfig, encoder_input_size: usize) -> GenResult<Self> {
        config.validate()?;
        let size = config.output_size.unwrap_or(encoder_input_size);
        if size == 0 {
            return Err(GenError::invalid_config("view size must be positive"));
        }
        Ok(Self { config: config.clone(), size })
    }

    pub fn view_size(&self) -> usize {
        self.size
    }

    pub fn num_views(&self) -> usize {
        self.config.num_views
    }

    /// 뷰 기하만 샘플링
    pub fn sample_transforms(&self, src_width: usize, src_height: usize, rng: &mut StdRng) -> Vec<ViewTransform> {
        (0..self.config.num_views)
            .map(|_| {
                ViewTransform::sample(src_width, src_height, &self.config.sampling, self.config.rich.as_ref(), rng)
            })
            .collect()
    }

    /// `(B, C, H, W)` → `(N·B, C, S, S)`
    pub fn augment(&self, images: &Tensor, rng: &mut StdRng) -> GenResult<Tensor> {
        let (_, _, height, width) = images.dims4()?;
        let transforms = self.sample_transforms(width, height, rng);
        let grid = SamplingGrid::build(&transforms, width, height, self.size);
        let views = grid.resample(images, images.device())?;

        match &self.config.rich {
            Some(rich) if rich.noise_amplitude > 0.0 => self.add_noise(&views, rich.noise_amplitude, rng),
            _ => Ok(views),
        }
    }

    /// 뷰별 곱셈 노이즈와 픽셀별 덧셈 노이즈
    fn add_noise(&self, views: &Tensor, amplitude: f32, rng: &mut StdRng) -> GenResult<Tensor> {
        let device = views.device();
        let count = views.dim(0)?;
        let gain = gaussian_tensor(rng, &[count, 1, 1, 1], amplitude, device)?.affine(1.0, 1.0)?;
        let additive = gaussian_tensor(rng, views.dims(), amplitude, device)?;
        Ok(views.broadcast_mul(&gain)?.add(&additive)?)
    }
}
