//! 색 상관 제거 기저
//!
//! 주파수 영역 합성에서 생기는 채널 간 상관 아티팩트를 줄이기 위한 고정 3×3 기저.

use candle_core::{Device, Result, Tensor};
use nalgebra::Matrix3;

/// 색 상관 행렬의 SVD 제곱근 (경험적 값)
const COLOR_CORRELATION_SVD_SQRT: [[f32; 3]; 3] = [
    [0.26, 0.09, 0.02],
    [0.27, 0.00, -0.05],
    [0.27, -0.09, 0.03],
];

/// 첫 열을 `colors` 로 나눈 뒤 최대 열 노름으로 정규화한 기저
pub fn color_basis(colors: f32) -> Matrix3<f32> {
    let mut basis = Matrix3::from_fn(|i, j| COLOR_CORRELATION_SVD_SQRT[i][j]);
    // 채도 조절
    let mut first = basis.column_mut(0);
    first /= colors;
    let max_norm = basis
        .column_iter()
        .map(|c| c.norm())
        .fold(0f32, f32::max);
    basis / max_norm
}

/// `pixel ↦ M · pixel` 색 변환과 그 역
#[derive(Debug, Clone)]
pub struct ColorDecorrelation {
    basis: Matrix3<f32>,
    inverse: Matrix3<f32>,
    /// 행 벡터 픽셀에 오른쪽에서 곱하는 `Mᵀ`
    transposed: Tensor,
}

impl ColorDecorrelation {
    pub fn new(colors: f32, device: &Device) -> Result<Self> {
        let basis = color_basis(colors);
        let inverse = basis
            .try_inverse()
            .ok_or_else(|| candle_core::Error::Msg("color basis is singular".into()))?;
        let t = basis.transpose();
        let data: Vec<f32> = (0..3).flat_map(|i| (0..3).map(move |j| t[(i, j)])).collect();
        Ok(Self {
            basis,
            inverse,
            transposed: Tensor::from_vec(data, (3, 3), device)?,
        })
    }

    pub fn basis(&self) -> &Matrix3<f32> {
        &self.basis
    }

    pub fn inverse(&self) -> &Matrix3<f32> {
        &self.inverse
    }

    /// `(B, 3, H, W)` 텐서에 기저 적용 (미분 가능)
    pub fn apply(&self, image: &Tensor) -> Result<Tensor> {
        let (b, c, h, w) = image.dims4()?;
        let pixels = image
            .permute((0, 2, 3, 1))?
            .contiguous()?
            .reshape((b * h * w, c))?;
        pixels
            .matmul(&self.transposed)?
            .reshape((b, h, w, c))?
            .permute((0, 3, 1, 2))?
            .contiguous()
    }

    /// 단일 픽셀 역변환 (CPU)
    pub fn invert_pixel(&self, rgb: [f32; 3]) -> [f32; 3] {
        let v = self.inverse * nalgebra::Vector3::new(rgb[0], rgb[1], rgb[2]);
        [v[0], v[1], v[2]]
    }
}
