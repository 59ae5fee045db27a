//! # 생성 작업 구성
//!
//! 모든 필드는 기본값을 가지며 JSON 으로 부분 지정할 수 있다.

pub mod presets;


pub use presets::JobMode;

use crate::core::augment::AugmentConfig;
use crate::core::decoder::DecoderConfig;
use crate::core::error::{GenError, GenResult};
use crate::core::interpolate::INTERPOLATION_FPS;
use crate::core::optimizers::OptimizerConfig;
use crate::core::scorer::ScoreConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 한 작업(단일 프롬프트 최적화)의 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// 고정 반복 예산 (수렴 판정 없음)
    pub iterations: usize,
    /// 체크포인트 간격 K
    pub save_every: usize,
    /// 작업 RNG 시드
    pub seed: u64,
    pub show_progress: bool,
    /// 참조 이미지가 있으면 그 인코딩으로 상태를 시작
    pub seed_from_reference: bool,
    pub decoder: DecoderConfig,
    pub augment: AugmentConfig,
    pub score: ScoreConfig,
    pub optimizer: OptimizerConfig,
    pub interpolation_fps: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            iterations: 200,
            save_every: 1,
            seed: 0,
            show_progress: false,
            seed_from_reference: true,
            decoder: DecoderConfig::default(),
            augment: AugmentConfig::default(),
            score: ScoreConfig::default(),
            optimizer: OptimizerConfig::default(),
            interpolation_fps: INTERPOLATION_FPS,
        }
    }
}

impl GenerationConfig {
    pub fn from_json_str(json: &str) -> GenResult<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| GenError::invalid_config(format!("config parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> GenResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&text)
    }

    pub fn to_json_string(&self) -> GenResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| GenError::invalid_config(e.to_string()))
    }

    pub fn validate(&self) -> GenResult<()> {
        if self.iterations == 0 {
            return Err(GenError::invalid_config("iterations must be at least 1"));
        }
        if self.save_every == 0 {
            return Err(GenError::invalid_config("save_every must be at least 1"));
        }
        if self.interpolation_fps == 0 {
            return Err(GenError::invalid_config("interpolation fps must be positive"));
        }
        if self.decoder.batch == 0 || self.decoder.width == 0 || self.decoder.height == 0 {
            return Err(GenError::invalid_config(format!(
                "decoder batch/resolution must be positive, got {}x{}x{}",
                self.decoder.batch, self.decoder.height, self.decoder.width
            )));
        }
        self.augment.validate()?;
        Ok(())
    }

    /// `"H-W"` 해상도 문자열 적용
    pub fn with_resolution(mut self, resolution: &str) -> GenResult<Self> {
        let (height, width) = parse_resolution(resolution)?;
        self.decoder.height = height;
        self.decoder.width = width;
        self.sync_latent_grid();
        Ok(self)
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.optimizer.learning_rate = lr;
        self
    }

    pub fn with_views(mut self, num_views: usize) -> Self {
        self.augment.num_views = num_views;
        self
    }
}

/// `"1024-768"` → `(1024, 768)`
pub fn parse_resolution(resolution: &str) -> GenResult<(usize, usize)> {
    let parts: Vec<&str> = resolution.trim().split('-').collect();
    let parsed: Vec<usize> = parts
        .iter()
        .filter_map(|p| p.trim().parse::<usize>().ok())
        .filter(|&v| v > 0)
        .collect();
    match (parts.len(), parsed.as_slice()) {
        (2, [first, second]) => Ok((*first, *second)),
        _ => Err(GenError::invalid_config(format!(
            "resolution must look like \"512-512\", got {resolution:?}"
        ))),
    }
}
