//! 크롭 기하 샘플링 (텐서 연산과 분리)

use super::{CropSampling, RichAugment};
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// 원본(패딩 포함) 좌표계의 정수 크롭 창
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl CropSampling {
    /// 한 축의 크롭 비율
    pub fn sample_fraction<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            CropSampling::Uniform { min, max } => {
                if max > min {
                    rng.gen_range(min..max)
                } else {
                    min
                }
            }
            CropSampling::ClippedNormal { mean, std, min, max } => {
                let draw = Normal::new(mean, std.max(0.0)).map(|n| n.sample(rng)).unwrap_or(mean);
                draw.clamp(min, max)
            }
        }
    }

    pub fn bounds(&self) -> (f32, f32) {
        match *self {
            CropSampling::Uniform { min, max } | CropSampling::ClippedNormal { min, max, .. } => (min, max),
        }
    }
}

impl CropWindow {
    /// 축별로 독립적인 비율과 `[0, src - size]` 균등 오프셋
    pub fn sample<R: Rng + ?Sized>(
        src_width: usize,
        src_height: usize,
        sampling: &CropSampling,
        rng: &mut R,
    ) -> Self {
        let (width, x) = Self::sample_axis(src_width, sampling, rng);
        let (height, y) = Self::sample_axis(src_height, sampling, rng);
        Self { x, y, width, height }
    }

    fn sample_axis<R: Rng + ?Sized>(src: usize, sampling: &CropSampling, rng: &mut R) -> (usize, usize) {
        let fraction = sampling.sample_fraction(rng);
        let size = ((src as f32 * fraction) as usize).clamp(1, src.max(1));
        let offset = rng.gen_range(0..=src - size);
        (size, offset)
    }

    pub fn fits(&self, src_width: usize, src_height: usize) -> bool {
        self.width > 0
            && self.height > 0
            && self.x + self.width <= src_width
            && self.y + self.height <= src_height
    }

    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + (self.width as f32 - 1.0) / 2.0,
            self.y as f32 + (self.height as f32 - 1.0) / 2.0,
        )
    }
}

/// 한 뷰의 전체 기하 변환
///
/// 좌표는 패딩된 원본 기준이며 `pad` 만큼 빼면 실제 원본 픽셀 좌표가 된다.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewTransform {
    pub window: CropWindow,
    pub pad: usize,
    pub flip: bool,
    /// 라디안
    pub rotation: f32,
    /// 픽셀 단위 평행이동
    pub translate: (f32, f32),
}

impl ViewTransform {
    pub fn plain(window: CropWindow) -> Self {
        Self { window, pad: 0, flip: false, rotation: 0.0, translate: (0.0, 0.0) }
    }

    pub fn sample<R: Rng + ?Sized>(
        src_width: usize,
        src_height: usize,
        sampling: &CropSampling,
        rich: Option<&RichAugment>,
        rng: &mut R,
    ) -> Self {
        let Some(rich) = rich else {
            return Self::plain(CropWindow::sample(src_width, src_height, sampling, rng));
        };

        let padded_w = src_width + 2 * rich.pad;
        let padded_h = src_height + 2 * rich.pad;
        let window = CropWindow::sample(padded_w, padded_h, sampling, rng);
        let flip = rich.flip_prob > 0.0 && rng.gen_bool(rich.flip_prob.clamp(0.0, 1.0) as f64);
        let max_rot = rich.max_rotation_deg.abs().to_radians();
        let rotation = if max_rot > 0.0 { rng.gen_range(-max_rot..=max_rot) } else { 0.0 };
        let shift = |rng: &mut R, size: usize| {
            let limit = rich.max_translate.abs() * size as f32;
            if limit > 0.0 {
                rng.gen_range(-limit..=limit)
            } else {
                0.0
            }
        };
        let dx = shift(rng, window.width);
        let dy = shift(rng, window.height);
        Self { window, pad: rich.pad, flip, rotation, translate: (dx, dy) }
    }

    /// 출력 픽셀 `(row, col)` 이 읽을 원본 좌표 `(x, y)` (align-corners)
    pub fn source_point(&self, row: usize, col: usize, size: usize) -> (f32, f32) {
        let w = &self.window;
        let step = |extent: usize| {
            if size > 1 {
                (extent as f32 - 1.0) / (size as f32 - 1.0)
            } else {
                0.0
            }
        };
        let (cx, cy) = w.center();
        let col = if self.flip { size - 1 - col } else { col };
        let (mut x, mut y) = if size > 1 {
            (w.x as f32 + col as f32 * step(w.width), w.y as f32 + row as f32 * step(w.height))
        } else {
            (cx, cy)
        };

        if self.rotation != 0.0 {
            let (sin, cos) = self.rotation.sin_cos();
            let (rx, ry) = (x - cx, y - cy);
            x = cx + cos * rx - sin * ry;
            y = cy + sin * rx + cos * ry;
        }
        x += self.translate.0;
        y += self.translate.1;
        (x - self.pad as f32, y - self.pad as f32)
    }
}
