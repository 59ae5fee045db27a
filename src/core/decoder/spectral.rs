//! # 스펙트럼(주파수 영역) 이미지 합성
//!
//! 상태는 픽셀 주파수별 복소 계수 `(B, C, H, Wf, 2)` 이다. 디코드 순서:
//! 1. `1 / max(freq, 1/max(H,W))^decay · sqrt(H·W)` 스케일 (저주파 우세)
//! 2. 선택적 고정 노이즈 시프트 (같은 스케일 적용)
//! 3. 정규직교 역 rfft2
//! 4. 자기 표준편차로 나누어 고정 대비 유지
//! 5. 선택적 색 상관 제거
//! 6. sigmoid

use super::color::ColorDecorrelation;
use super::dft::{forward_rfft2, rfft2d_freqs, InverseRfft2};
use super::{gaussian_tensor, sigmoid, DecodeMode, Decoder, DecoderKind};
use crate::core::error::{GenError, GenResult};
use crate::core::tensors::{freq_bins, StateLayout};
use candle_core::{DType, Device, Tensor, D};
use ndarray::Array2;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

/// 스펙트럼 디코더 설정
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpectralConfig {
    /// 고주파 감쇠 지수
    pub decay_power: f32,
    /// 초기 스펙트럼 표준편차
    pub init_std: f32,
    /// 누적 아티팩트 억제용 노이즈 시프트 크기 (0 이면 비활성)
    pub noise: f32,
    pub contrast: f32,
    /// 채도 (색 기저 첫 열의 나눗수)
    pub colors: f32,
    pub decorrelate: bool,
}

impl Default for SpectralConfig {
    fn default() -> Self {
        Self {
            decay_power: 1.0,
            init_std: 0.01,
            noise: 0.0,
            contrast: 1.0,
            colors: 1.0,
            decorrelate: true,
        }
    }
}

const STD_EPS: f64 = 1e-12;
const LOGIT_CLIP: f32 = 1e-4;

pub struct SpectralDecoder {
    layout: StateLayout,
    config: SpectralConfig,
    height: usize,
    width: usize,
    /// `(1, 1, H, Wf, 1)` 주파수 스케일
    scale: Tensor,
    /// 인코딩용 CPU 사본
    scale_plane: Array2<f32>,
    /// `scale · shift` 사전 계산 (노이즈 비활성 시 None)
    scaled_shift: Option<Tensor>,
    shift_plane: Option<Array2<f32>>,
    idft: InverseRfft2,
    color: Option<ColorDecorrelation>,
}

impl SpectralDecoder {
    pub fn new(
        batch: usize,
        height: usize,
        width: usize,
        config: &SpectralConfig,
        rng: &mut StdRng,
        device: &Device,
    ) -> GenResult<Self> {
        if batch == 0 || height == 0 || width == 0 {
            return Err(GenError::invalid_config(format!(
                "spectral resolution must be positive, got {batch}x{height}x{width}"
            )));
        }
        if !(config.contrast > 0.0) || !config.decay_power.is_finite() {
            return Err(GenError::invalid_config("spectral contrast must be positive and decay finite"));
        }
        if config.decorrelate && !(config.colors > 0.0) {
            return Err(GenError::invalid_config("colors must be positive when decorrelating"));
        }

        let channels = 3;
        let wf = freq_bins(width);
        let freqs = rfft2d_freqs(height, width);
        let floor = 1.0 / height.max(width) as f32;
        let norm = ((height * width) as f32).sqrt();
        let scale_plane = freqs.mapv(|f| norm / f.max(floor).powf(config.decay_power));

        let scale_data: Vec<f32> = scale_plane.iter().copied().collect();
        let scale = Tensor::from_vec(scale_data, (1, 1, height, wf, 1), device)?;

        let (scaled_shift, shift_plane) = if config.noise > 0.0 {
            let shift = gaussian_tensor(rng, &[1, 1, height, wf, 1], config.noise, device)?;
            let plane = Array2::from_shape_vec((height, wf), shift.flatten_all()?.to_vec1::<f32>()?)
                .map_err(|e| GenError::invalid_config(e.to_string()))?;
            (Some(scale.mul(&shift)?), Some(plane))
        } else {
            (None, None)
        };

        let color = if config.decorrelate {
            Some(ColorDecorrelation::new(config.colors, device)?)
        } else {
            None
        };

        Ok(Self {
            layout: StateLayout::Spectral { batch, channels, height, width },
            config: config.clone(),
            height,
            width,
            scale,
            scale_plane,
            scaled_shift,
            shift_plane,
            idft: InverseRfft2::new(height, width, device)?,
            color,
        })
    }

    pub fn config(&self) -> &SpectralConfig {
        &self.config
    }

    /// 디코드 1~3 단계: 스케일된 스펙트럼의 공간 영역 이미지 (정규화 전)
    pub fn spatial(&self, values: &Tensor) -> GenResult<Tensor> {
        self.layout.check("spectral decode", values)?;
        let mut scaled = values.broadcast_mul(&self.scale)?;
        if let Some(shift) = &self.scaled_shift {
            scaled = scaled.broadcast_add(shift)?;
        }
        let re = scaled.narrow(D::Minus1, 0, 1)?.squeeze(D::Minus1)?;
        let im = scaled.narrow(D::Minus1, 1, 1)?.squeeze(D::Minus1)?;
        Ok(self.idft.apply(&re, &im)?)
    }

    fn contrast_normalize(&self, image: &Tensor) -> GenResult<Tensor> {
        // 텐서 전체에 대한 비편향 표준편차
        let count = image.elem_count();
        let mean = image.mean_all()?;
        let centered = image.broadcast_sub(&mean)?;
        let denom = (count.max(2) - 1) as f64;
        let std = centered
            .sqr()?
            .sum_all()?
            .affine(1.0 / denom, STD_EPS)?
            .sqrt()?;
        let ratio = std.recip()?.affine(self.config.contrast as f64, 0.0)?;
        Ok(image.broadcast_mul(&ratio)?)
    }
}

impl Decoder for SpectralDecoder {
    fn kind(&self) -> DecoderKind {
        DecoderKind::Spectral
    }

    fn layout(&self) -> &StateLayout {
        &self.layout
    }

    fn init_state(&self, rng: &mut StdRng, device: &Device) -> GenResult<Tensor> {
        gaussian_tensor(rng, &self.layout.dims(), self.config.init_std, device)
    }

    /// 참조 이미지의 로짓을 순방향 rfft2 하고 스케일로 나누어 스펙트럼으로 되돌린다
    ///
    /// `spatial` 까지는 로짓 평면이 그대로 복원된다. 전체 디코드는 대비 정규화를
    /// 거치므로 평면 표준편차가 `contrast` 와 같을 때만 원본 픽셀과 일치하고,
    /// 그 밖에는 대비가 `contrast / std` 배로 늘어난 참조 이미지가 나온다.
    fn encode_reference(&self, image: &Tensor) -> GenResult<Option<Tensor>> {
        let (_, channels, height, width) = image.dims4()?;
        if channels != 3 || height != self.height || width != self.width {
            return Err(GenError::ShapeMismatch {
                context: "spectral reference",
                expected: vec![1, 3, self.height, self.width],
                actual: image.dims().to_vec(),
            });
        }

        let pixels = image
            .narrow(0, 0, 1)?
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .flatten_all()?
            .to_vec1::<f32>()?;
        let plane = height * width;
        let logit = |p: f32| {
            let p = p.clamp(LOGIT_CLIP, 1.0 - LOGIT_CLIP);
            (p / (1.0 - p)).ln()
        };

        // 채널 평면으로 분리하며 색 기저 역적용
        let mut planes = vec![Array2::<f32>::zeros((height, width)); 3];
        for i in 0..plane {
            let rgb = [logit(pixels[i]), logit(pixels[plane + i]), logit(pixels[2 * plane + i])];
            let z = match &self.color {
                Some(color) => color.invert_pixel(rgb),
                None => rgb,
            };
            for c in 0..3 {
                planes[c][[i / width, i % width]] = z[c];
            }
        }

        let wf = freq_bins(width);
        let mut data = Vec::with_capacity(3 * height * wf * 2);
        for plane in &planes {
            let (re, im) = forward_rfft2(plane);
            for ky in 0..height {
                for kx in 0..wf {
                    let s = self.scale_plane[[ky, kx]];
                    let shift = self.shift_plane.as_ref().map_or(0.0, |p| p[[ky, kx]]);
                    // 시프트는 실수/허수 축 모두에 브로드캐스트된다
                    data.push(re[[ky, kx]] / s - shift);
                    data.push(im[[ky, kx]] / s - shift);
                }
            }
        }

        let batch = self.layout.dims()[0];
        let single = Tensor::from_vec(data, (1, 3, height, wf, 2), image.device())?;
        let encoded = if batch > 1 {
            single.repeat((batch, 1, 1, 1, 1))?
        } else {
            single
        };
        self.layout.check("spectral reference", &encoded)?;
        Ok(Some(encoded))
    }

    fn decode(&self, values: &Tensor, _mode: DecodeMode<'_>) -> GenResult<Tensor> {
        let spatial = self.spatial(values)?;
        let mut image = self.contrast_normalize(&spatial)?;
        if let Some(color) = &self.color {
            image = color.apply(&image)?;
        }
        Ok(sigmoid(&image)?)
    }
}
