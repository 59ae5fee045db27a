//! 작업 단위로 고정되는 프롬프트 대상

use candle_core::Tensor;

/// 텍스트 프롬프트와 선택적 참조들
#[derive(Debug, Clone)]
pub struct PromptTarget {
    text: String,
    subtract_text: Option<String>,
    reference_embedding: Option<Tensor>,
    reference_state: Option<Tensor>,
}

impl PromptTarget {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            subtract_text: None,
            reference_embedding: None,
            reference_state: None,
        }
    }

    /// 멀어져야 할 음성 프롬프트
    pub fn with_subtract(mut self, text: impl Into<String>) -> Self {
        self.subtract_text = Some(text.into());
        self
    }

    pub fn with_reference_embedding(mut self, embedding: Tensor) -> Self {
        self.reference_embedding = Some(embedding);
        self
    }

    /// 앵커링 기준이 되는 참조 표현
    pub fn with_reference_state(mut self, state: Tensor) -> Self {
        self.reference_state = Some(state);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn subtract_text(&self) -> Option<&str> {
        self.subtract_text.as_deref()
    }

    pub fn reference_embedding(&self) -> Option<&Tensor> {
        self.reference_embedding.as_ref()
    }

    pub fn reference_state(&self) -> Option<&Tensor> {
        self.reference_state.as_ref()
    }
}
