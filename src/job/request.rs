//! 요청/응답 직렬화 형식 (camelCase 키)

use crate::core::config::{GenerationConfig, JobMode};
use crate::core::decoder::DecoderKind;
use crate::core::error::{GenError, GenResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerationRequest {
    pub prompt: Option<String>,
    /// 비어 있지 않으면 스토리 작업
    pub prompts: Vec<String>,
    /// 음성 프롬프트
    pub subtract: Option<String>,
    /// 백엔드 선택자 (`aphantasia`, `dalle`, `taming`, `stylegan` 및 정식 이름)
    pub model: String,
    #[serde(alias = "iterations")]
    pub num_iterations: Option<usize>,
    /// `"H-W"`
    pub resolution: Option<String>,
    pub views: Option<usize>,
    #[serde(alias = "learningRate")]
    pub lr: Option<f32>,
    pub seed: Option<u64>,
    /// 참조 이미지 경로 (스토리에서는 프롬프트 순서대로)
    pub images: Vec<PathBuf>,
    /// 스토리 구간 길이(초)
    pub durations: Vec<f32>,
    #[serde(alias = "imageGeneration")]
    pub generate_img: bool,
    #[serde(alias = "videoGeneration")]
    pub generate_video: bool,
}

impl GenerationRequest {
    pub fn single(prompt: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            model: model.into(),
            generate_img: true,
            ..Self::default()
        }
    }

    pub fn story(prompts: Vec<String>, durations: Vec<f32>, model: impl Into<String>) -> Self {
        Self { prompts, durations, model: model.into(), ..Self::default() }
    }

    pub fn from_json_str(json: &str) -> GenResult<Self> {
        serde_json::from_str(json).map_err(|e| GenError::invalid_config(format!("request parse error: {e}")))
    }

    pub fn mode(&self) -> JobMode {
        if self.prompts.is_empty() {
            JobMode::Single
        } else {
            JobMode::Story
        }
    }

    pub fn backend(&self) -> GenResult<DecoderKind> {
        self.model.parse()
    }

    /// 프리셋 위에 요청 값을 덮어쓴 작업 구성
    pub fn to_config(&self, mode: JobMode, has_reference: bool) -> GenResult<GenerationConfig> {
        let mut config = GenerationConfig::for_backend(self.backend()?, mode, has_reference);
        if let Some(resolution) = &self.resolution {
            config = config.with_resolution(resolution)?;
        }
        if let Some(iterations) = self.num_iterations {
            config = config.with_iterations(iterations);
        }
        if let Some(views) = self.views {
            config = config.with_views(views);
        }
        if let Some(lr) = self.lr {
            config = config.with_learning_rate(lr);
        }
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResponse {
    pub success: bool,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub video_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub finished_at: DateTime<Utc>,
}

impl GenerationResponse {
    pub fn success(img_url: impl Into<String>, video_url: impl Into<String>) -> Self {
        Self {
            success: true,
            img_url: img_url.into(),
            video_url: video_url.into(),
            error: None,
            finished_at: Utc::now(),
        }
    }

    pub fn failure(err: &GenError) -> Self {
        Self {
            success: false,
            img_url: String::new(),
            video_url: String::new(),
            error: Some(err.code().to_string()),
            finished_at: Utc::now(),
        }
    }

    pub fn to_json_string(&self) -> GenResult<String> {
        serde_json::to_string(self).map_err(|e| GenError::invalid_config(e.to_string()))
    }
}
