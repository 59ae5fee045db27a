//! 쌍선형 샘플링 격자
//!
//! 격자는 CPU 에서 뷰 단위로 병렬 생성하고, 텐서 쪽에서는 `index_select`
//! 한 번과 가중합으로 모든 뷰를 리샘플한다. 원본 밖 좌표는 가중치 0 (제로 패딩).

use super::geometry::ViewTransform;
use candle_core::{Device, Result, Tensor};
use rayon::prelude::*;

/// 출력 픽셀 하나가 읽는 4개 이웃
pub const TAPS: usize = 4;

/// 모든 뷰의 이웃 인덱스와 가중치 (뷰 → 출력 픽셀 → 이웃 순)
#[derive(Debug, Clone, PartialEq)]
pub struct SamplingGrid {
    pub size: usize,
    pub views: usize,
    pub indices: Vec<u32>,
    pub weights: Vec<f32>,
}

fn view_taps(
    transform: &ViewTransform,
    src_width: usize,
    src_height: usize,
    size: usize,
) -> (Vec<u32>, Vec<f32>) {
    let mut indices = Vec::with_capacity(size * size * TAPS);
    let mut weights = Vec::with_capacity(size * size * TAPS);
    for row in 0..size {
        for col in 0..size {
            let (x, y) = transform.source_point(row, col, size);
            let (x0, y0) = (x.floor(), y.floor());
            let (fx, fy) = (x - x0, y - y0);
            let corners = [
                (x0, y0, (1.0 - fx) * (1.0 - fy)),
                (x0 + 1.0, y0, fx * (1.0 - fy)),
                (x0, y0 + 1.0, (1.0 - fx) * fy),
                (x0 + 1.0, y0 + 1.0, fx * fy),
            ];
            for (cx, cy, w) in corners {
                let inside = cx >= 0.0 && cy >= 0.0 && (cx as usize) < src_width && (cy as usize) < src_height;
                if inside && w > 0.0 {
                    indices.push((cy as usize * src_width + cx as usize) as u32);
                    weights.push(w);
                } else {
                    indices.push(0);
                    weights.push(0.0);
                }
            }
        }
    }
    (indices, weights)
}

impl SamplingGrid {
    pub fn build(transforms: &[ViewTransform], src_width: usize, src_height: usize, size: usize) -> Self {
        let per_view: Vec<(Vec<u32>, Vec<f32>)> = transforms
            .par_iter()
            .map(|t| view_taps(t, src_width, src_height, size))
            .collect();
        let mut indices = Vec::with_capacity(transforms.len() * size * size * TAPS);
        let mut weights = Vec::with_capacity(indices.capacity());
        for (i, w) in per_view {
            indices.extend(i);
            weights.extend(w);
        }
        Self { size, views: transforms.len(), indices, weights }
    }

    /// `(B, C, H, W)` → `(N·B, C, S, S)` (뷰 우선 순서, 미분 가능)
    pub fn resample(&self, images: &Tensor, device: &Device) -> Result<Tensor> {
        let (b, c, h, w) = images.dims4()?;
        let s2 = self.size * self.size;
        let flat = images.reshape((b, c, h * w))?;
        let index = Tensor::from_slice(&self.indices, self.indices.len(), device)?;
        let weights = Tensor::from_slice(&self.weights, (1, 1, self.weights.len()), device)?;

        let gathered = flat.index_select(&index, 2)?;
        gathered
            .broadcast_mul(&weights)?
            .reshape((b, c, self.views, s2, TAPS))?
            .sum(4)?
            .permute((2, 0, 1, 3))?
            .contiguous()?
            .reshape((self.views * b, c, self.size, self.size))
    }
}
