use serde::{Deserialize, Serialize};

/// 옵티마이저 전체 구성
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// 알고리즘과 하이퍼파라미터
    pub method: OptimizerMethod,
    /// 학습률
    pub learning_rate: f32,
    /// 학습률 스케줄링
    pub lr_schedule: LearningRateSchedule,
    /// 전역 L2 노름 그래디언트 클리핑
    pub gradient_clipping: Option<f32>,
}

/// 업데이트 규칙
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerMethod {
    Sgd(SgdConfig),
    Adam(AdamConfig),
    /// 가중치 감소를 그래디언트와 분리한 Adam
    #[serde(rename = "adamw")]
    AdamW(AdamConfig),
}

/// SGD 구성
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SgdConfig {
    pub momentum: f32,
    pub nesterov: bool,
    pub weight_decay: f32,
}

/// Adam 옵티마이저 구성
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdamConfig {
    /// 베타1 파라미터 (1차 모멘트 지수 감소율)
    pub beta1: f32,
    /// 베타2 파라미터 (2차 모멘트 지수 감소율)
    pub beta2: f32,
    /// 엡실론 (수치 안정성을 위한 작은 값)
    pub epsilon: f32,
    pub weight_decay: f32,
}

/// 학습률 스케줄링 방법
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningRateSchedule {
    /// 고정 학습률
    Constant,
    /// 예산에 걸쳐 `lr` 에서 `2·lr` 로 선형 증가
    Progressive,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            method: OptimizerMethod::Adam(AdamConfig::default()),
            learning_rate: 0.05,
            lr_schedule: LearningRateSchedule::Constant,
            gradient_clipping: None,
        }
    }
}

impl Default for SgdConfig {
    fn default() -> Self {
        Self {
            momentum: 0.0,
            nesterov: false,
            weight_decay: 0.0,
        }
    }
}

impl Default for AdamConfig {
    fn default() -> Self {
        Self {
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-8,
            weight_decay: 0.0,
        }
    }
}

impl LearningRateSchedule {
    /// 0 부터 센 `step` 에서의 학습률
    pub fn learning_rate(&self, base: f32, step: usize, total: usize) -> f32 {
        match self {
            LearningRateSchedule::Constant => base,
            LearningRateSchedule::Progressive => {
                let progress = if total == 0 { 0.0 } else { step.min(total) as f32 / total as f32 };
                base * (1.0 + progress)
            }
        }
    }
}

impl OptimizerConfig {
    /// 새 구성 생성
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sgd(learning_rate: f32, config: SgdConfig) -> Self {
        Self { method: OptimizerMethod::Sgd(config), learning_rate, ..Self::default() }
    }

    pub fn adam(learning_rate: f32, config: AdamConfig) -> Self {
        Self { method: OptimizerMethod::Adam(config), learning_rate, ..Self::default() }
    }

    pub fn adam_w(learning_rate: f32, config: AdamConfig) -> Self {
        Self { method: OptimizerMethod::AdamW(config), learning_rate, ..Self::default() }
    }

    /// 학습률 설정
    pub fn with_learning_rate(mut self, lr: f32) -> Self {
        self.learning_rate = lr;
        self
    }

    /// 학습률 스케줄 설정
    pub fn with_lr_schedule(mut self, schedule: LearningRateSchedule) -> Self {
        self.lr_schedule = schedule;
        self
    }

    /// 그래디언트 클리핑 설정
    pub fn with_gradient_clipping(mut self, clip_value: Option<f32>) -> Self {
        self.gradient_clipping = clip_value;
        self
    }
}
