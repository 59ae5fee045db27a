//! # 체크포인트 보간
//!
//! 체크포인트 목록을 순환으로 잇고 표현 공간에서 sin² 이징으로 블렌딩한 뒤
//! 매 중간 상태를 디코드해 프레임으로 내보낸다. 모든 디코더 변형에서 동작한다.

#[cfg(test)]
mod __tests__;

use crate::core::decoder::{DecodeMode, Decoder};
use crate::core::error::{GenError, GenResult};
use crate::core::output::{FrameSink, VecSink};
use crate::core::tensors::{tensor_to_frame, Checkpoint};
use image::RgbImage;
use std::f32::consts::FRAC_PI_2;

/// 스토리 영상 기본 프레임율
pub const INTERPOLATION_FPS: u32 = 25;

/// `sin(π/2 · t/n)²` - t=0 에서 0, t→n 에서 1 로 단조 증가
pub fn easing_weight(t: usize, num_steps: usize) -> f32 {
    if num_steps == 0 {
        return 1.0;
    }
    let phase = FRAC_PI_2 * t as f32 / num_steps as f32;
    phase.sin().powi(2)
}

/// 구간 길이(초) → 프레임 수
pub fn segment_steps(duration_secs: f32, fps: u32) -> usize {
    if !(duration_secs > 0.0) {
        return 0;
    }
    (duration_secs * fps as f32).round() as usize
}

#[derive(Debug, Clone, Copy)]
pub struct Interpolator {
    fps: u32,
}

impl Default for Interpolator {
    fn default() -> Self {
        Self::new(INTERPOLATION_FPS)
    }
}

impl Interpolator {
    pub fn new(fps: u32) -> Self {
        Self { fps: fps.max(1) }
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// 전체 프레임 수 (구간 합)
    pub fn frame_count(&self, durations: &[f32]) -> usize {
        durations.iter().map(|&d| segment_steps(d, self.fps)).sum()
    }

    /// 체크포인트 i 에서 i+1 (마지막은 처음으로) 로 `durations[i]` 초 동안 보간
    ///
    /// 내보낸 프레임 수를 돌려준다.
    pub fn run(
        &self,
        checkpoints: &[Checkpoint],
        durations: &[f32],
        decoder: &dyn Decoder,
        sink: &mut dyn FrameSink,
    ) -> GenResult<usize> {
        if checkpoints.is_empty() {
            return Err(GenError::invalid_config("interpolation needs at least one checkpoint"));
        }
        if durations.len() != checkpoints.len() {
            return Err(GenError::invalid_config(format!(
                "{} durations given for {} checkpoints",
                durations.len(),
                checkpoints.len()
            )));
        }
        if let Some(bad) = durations.iter().find(|d| !d.is_finite() || **d < 0.0) {
            return Err(GenError::invalid_config(format!("invalid segment duration {bad}")));
        }
        for checkpoint in checkpoints {
            decoder
                .layout()
                .check("interpolation checkpoint", checkpoint.values())?;
        }

        let mut emitted = 0;
        for (i, duration) in durations.iter().enumerate() {
            let from = &checkpoints[i];
            let to = &checkpoints[(i + 1) % checkpoints.len()];
            let steps = segment_steps(*duration, self.fps);
            log::debug!(
                "segment {i}: step {} -> step {} over {steps} frames",
                from.step(),
                to.step()
            );
            for t in 0..steps {
                let state = from.blend(to, easing_weight(t, steps))?;
                let image = decoder.decode(&state, DecodeMode::Render)?;
                sink.push(&tensor_to_frame(&image)?)?;
                emitted += 1;
            }
        }
        sink.finish()?;
        Ok(emitted)
    }

    /// 메모리로 모으는 편의 함수
    pub fn collect(
        &self,
        checkpoints: &[Checkpoint],
        durations: &[f32],
        decoder: &dyn Decoder,
    ) -> GenResult<Vec<RgbImage>> {
        let mut sink = VecSink::new(self.fps);
        self.run(checkpoints, durations, decoder, &mut sink)?;
        Ok(sink.into_frames())
    }
}
