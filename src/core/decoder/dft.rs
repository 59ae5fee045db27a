//! 2차원 실수 DFT
//!
//! 역변환은 cos/sin 기저 행렬곱으로 구성해 candle 자동 미분이 통과하도록 하고,
//! 순변환(참조 이미지 인코딩)은 rustfft 로 CPU 에서 계산한다.
//! 모든 변환은 정규직교(`1/sqrt(H·W)`) 정규화를 쓴다.

use crate::core::tensors::freq_bins;
use candle_core::{Device, Result, Tensor};
use ndarray::Array2;
use rustfft::{num_complex::Complex, FftPlanner};
use std::f64::consts::PI;

/// numpy `fftfreq(n)` 와 동일한 표본 주파수
pub fn fft_freq(n: usize) -> Vec<f64> {
    let n_f = n as f64;
    let positive = (n - 1) / 2 + 1;
    (0..n)
        .map(|i| {
            if i < positive {
                i as f64 / n_f
            } else {
                (i as f64 - n_f) / n_f
            }
        })
        .collect()
}

/// rfft2 격자의 주파수 크기 `(H, Wf)`
pub fn rfft2d_freqs(height: usize, width: usize) -> Array2<f32> {
    let fy = fft_freq(height);
    let fx = fft_freq(width);
    let wf = freq_bins(width);
    Array2::from_shape_fn((height, wf), |(y, x)| {
        (fy[y] * fy[y] + fx[x] * fx[x]).sqrt() as f32
    })
}

/// 미분 가능한 역 rfft2 (기저 행렬 캐시)
#[derive(Debug, Clone)]
pub struct InverseRfft2 {
    height: usize,
    width: usize,
    cos_y: Tensor,
    sin_y: Tensor,
    cos_x: Tensor,
    sin_x: Tensor,
}

impl InverseRfft2 {
    pub fn new(height: usize, width: usize, device: &Device) -> Result<Self> {
        let wf = freq_bins(width);

        // 세로 방향: 완전한 복소 역변환 `(H, H)`
        let mut cos_y = Vec::with_capacity(height * height);
        let mut sin_y = Vec::with_capacity(height * height);
        for y in 0..height {
            for ky in 0..height {
                let angle = 2.0 * PI * (y * ky) as f64 / height as f64;
                cos_y.push(angle.cos() as f32);
                sin_y.push(angle.sin() as f32);
            }
        }

        // 가로 방향: 에르미트 대칭을 접은 실수 역변환 `(Wf, W)`
        let norm = 1.0 / ((height * width) as f64).sqrt();
        let mut cos_x = Vec::with_capacity(wf * width);
        let mut sin_x = Vec::with_capacity(wf * width);
        for kx in 0..wf {
            let nyquist = width % 2 == 0 && kx == width / 2;
            let fold = if kx == 0 || nyquist { 1.0 } else { 2.0 };
            for x in 0..width {
                let angle = 2.0 * PI * (kx * x) as f64 / width as f64;
                cos_x.push((fold * norm * angle.cos()) as f32);
                sin_x.push((fold * norm * angle.sin()) as f32);
            }
        }

        Ok(Self {
            height,
            width,
            cos_y: Tensor::from_vec(cos_y, (height, height), device)?,
            sin_y: Tensor::from_vec(sin_y, (height, height), device)?,
            cos_x: Tensor::from_vec(cos_x, (wf, width), device)?,
            sin_x: Tensor::from_vec(sin_x, (wf, width), device)?,
        })
    }

    /// `(B, C, H, Wf)` 실수부/허수부 → `(B, C, H, W)`
    pub fn apply(&self, re: &Tensor, im: &Tensor) -> Result<Tensor> {
        let (b, c, h, wf) = re.dims4()?;
        // 세로 축을 행으로 올려 2차원 행렬곱으로 처리
        let to_rows = |t: &Tensor| -> Result<Tensor> {
            t.permute((2, 0, 1, 3))?.contiguous()?.reshape((h, b * c * wf))
        };
        let re_rows = to_rows(re)?;
        let im_rows = to_rows(im)?;

        let z_re = self.cos_y.matmul(&re_rows)?.sub(&self.sin_y.matmul(&im_rows)?)?;
        let z_im = self.sin_y.matmul(&re_rows)?.add(&self.cos_y.matmul(&im_rows)?)?;

        let to_cols = |t: &Tensor| -> Result<Tensor> {
            t.reshape((h, b, c, wf))?
                .permute((1, 2, 0, 3))?
                .contiguous()?
                .reshape((b * c * h, wf))
        };
        let spatial = to_cols(&z_re)?
            .matmul(&self.cos_x)?
            .sub(&to_cols(&z_im)?.matmul(&self.sin_x)?)?;
        spatial.reshape((b, c, self.height, self.width))
    }
}

/// 정규직교 순방향 rfft2: 실수 평면 `(H, W)` → `(re, im)` 각각 `(H, Wf)`
pub fn forward_rfft2(plane: &Array2<f32>) -> (Array2<f32>, Array2<f32>) {
    let (height, width) = plane.dim();
    let wf = freq_bins(width);
    let mut planner = FftPlanner::<f32>::new();
    let row_fft = planner.plan_fft_forward(width);
    let col_fft = planner.plan_fft_forward(height);

    let mut grid: Vec<Complex<f32>> = plane.iter().map(|&v| Complex::new(v, 0.0)).collect();
    for row in grid.chunks_mut(width) {
        row_fft.process(row);
    }

    let norm = 1.0 / ((height * width) as f32).sqrt();
    let mut re = Array2::<f32>::zeros((height, wf));
    let mut im = Array2::<f32>::zeros((height, wf));
    let mut column = vec![Complex::new(0.0, 0.0); height];
    for kx in 0..wf {
        for y in 0..height {
            column[y] = grid[y * width + kx];
        }
        col_fft.process(&mut column);
        for ky in 0..height {
            re[[ky, kx]] = column[ky].re * norm;
            im[[ky, kx]] = column[ky].im * norm;
        }
    }
    (re, im)
}

/// rustfft 기반 역 rfft2 - 행렬 기저 역변환의 교차 검증용
///
/// 세로 축은 복소 역변환, 가로 축은 C2R (DC/나이퀴스트 허수부 무시)
pub fn inverse_rfft2_reference(re: &Array2<f32>, im: &Array2<f32>, width: usize) -> Array2<f32> {
    let (height, wf) = re.dim();
    let mut planner = FftPlanner::<f32>::new();
    let col_ifft = planner.plan_fft_inverse(height);
    let row_ifft = planner.plan_fft_inverse(width);

    let mut half = vec![Complex::new(0.0f32, 0.0); height * wf];
    let mut column = vec![Complex::new(0.0f32, 0.0); height];
    for kx in 0..wf {
        for ky in 0..height {
            column[ky] = Complex::new(re[[ky, kx]], im[[ky, kx]]);
        }
        col_ifft.process(&mut column);
        for y in 0..height {
            half[y * wf + kx] = column[y];
        }
    }

    let norm = 1.0 / ((height * width) as f32).sqrt();
    let mut out = Array2::<f32>::zeros((height, width));
    let mut row = vec![Complex::new(0.0f32, 0.0); width];
    for y in 0..height {
        for k in 0..width {
            row[k] = if k < wf {
                half[y * wf + k]
            } else {
                half[y * wf + (width - k)].conj()
            };
        }
        row[0].im = 0.0;
        if width % 2 == 0 {
            row[width / 2].im = 0.0;
        }
        row_ifft.process(&mut row);
        for x in 0..width {
            out[[y, x]] = row[x].re * norm;
        }
    }
    out
}
