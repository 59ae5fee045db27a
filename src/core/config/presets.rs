//! 백엔드별 기본 하이퍼파라미터

use super::GenerationConfig;
use crate::core::augment::CropSampling;
use crate::core::decoder::{DecoderKind, LatentConfig, LatentInit, LatentRepeat, OutputRange};
use crate::core::optimizers::{AdamConfig, OptimizerConfig, SgdConfig};
use serde::{Deserialize, Serialize};

/// 단일 이미지 생성인지 프롬프트 목록 스토리인지
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobMode {
    Single,
    Story,
}

/// 텍스트 유사도 항 가중치
const SIMILARITY_WEIGHT: f32 = 10.0;
/// 스타일 생성기 합성 레이어 수
const STYLE_LAYERS: usize = 18;
const STYLE_DIM: usize = 512;
/// VQ 생성기 잠재 채널 수와 다운샘플 배율
const VQ_CHANNELS: usize = 256;
const VQ_DOWNSAMPLE: usize = 16;
/// 생성기 백엔드의 축별 크롭 비율
const GENERATOR_CROP: CropSampling = CropSampling::Uniform { min: 0.75, max: 0.95 };
/// 스타일 백엔드는 전체 프레임 한 장만 인코딩
const FULL_FRAME: CropSampling = CropSampling::Uniform { min: 1.0, max: 1.0 };

impl GenerationConfig {
    /// 백엔드와 모드에 맞춘 기본 구성
    pub fn for_backend(kind: DecoderKind, mode: JobMode, has_reference: bool) -> Self {
        let mut config = Self::default();
        config.decoder.kind = kind;
        config.augment.num_views = 20;
        config.score.similarity_weight = SIMILARITY_WEIGHT;
        let story = mode == JobMode::Story;

        match kind {
            DecoderKind::Spectral => {
                let lr = if story { 0.8 } else { 0.9 };
                config.optimizer = OptimizerConfig::sgd(lr, SgdConfig::default());
            }
            DecoderKind::Codebook => {
                config.optimizer = OptimizerConfig::adam(0.7, AdamConfig::default());
                config.augment.sampling = GENERATOR_CROP;
            }
            DecoderKind::VqLatent => {
                let lr = if has_reference { 0.3 } else { 0.5 };
                config.optimizer = OptimizerConfig::adam_w(lr, AdamConfig { weight_decay: 0.1, ..AdamConfig::default() });
                config.augment.sampling = GENERATOR_CROP;
                config.decoder.latent = LatentConfig {
                    dims: vec![1, VQ_CHANNELS, config.decoder.height / VQ_DOWNSAMPLE, config.decoder.width / VQ_DOWNSAMPLE],
                    init: LatentInit::Gaussian { std: 0.5, sharpen: Some(1.9) },
                    repeat: None,
                    output_range: OutputRange::Symmetric,
                };
            }
            DecoderKind::StyleLatent => {
                let lr = if story { 6e-3 } else { 3e-2 };
                config.optimizer = OptimizerConfig::adam(lr, AdamConfig::default());
                config.decoder.latent = LatentConfig {
                    dims: vec![1, STYLE_DIM],
                    init: LatentInit::Zeros,
                    repeat: Some(LatentRepeat { axis: 1, count: STYLE_LAYERS }),
                    output_range: OutputRange::Symmetric,
                };
                config.augment.num_views = 1;
                config.augment.sampling = FULL_FRAME;
            }
        }
        config
    }

    /// 해상도 변경 후 VQ 잠재 격자를 다시 맞춘다
    pub fn sync_latent_grid(&mut self) {
        if self.decoder.kind == DecoderKind::VqLatent && self.decoder.latent.dims.len() == 4 {
            self.decoder.latent.dims[2] = (self.decoder.height / VQ_DOWNSAMPLE).max(1);
            self.decoder.latent.dims[3] = (self.decoder.width / VQ_DOWNSAMPLE).max(1);
        }
    }
}
