//! # 생성 작업 에러 타입
//!
//! 모든 실패는 현재 작업에 대해 종료성(terminal)이다. 부분 결과 복구 없음.

use std::fmt;

pub type GenResult<T> = Result<T, GenError>;

/// 외부 협력자 구분 (인코더/생성기)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collaborator {
    TextEncoder,
    ImageEncoder,
    CodeEncoder,
    Generator,
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collaborator::TextEncoder => "text encoder",
            Collaborator::ImageEncoder => "image encoder",
            Collaborator::CodeEncoder => "code encoder",
            Collaborator::Generator => "generator",
        };
        f.write_str(name)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum GenError {
    /// 알 수 없는 모델 선택자 - 최적화 시작 전에 실패
    #[error("unsupported backend: {0}")]
    UnsupportedBackend(String),

    /// 상태/디코더 형상 불일치 - Init 단계에서 실패
    #[error("shape mismatch in {context}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        context: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// 손실 또는 그래디언트가 유한하지 않음
    #[error("numerical divergence at step {step} (loss = {loss})")]
    NumericalDivergence { step: usize, loss: f32 },

    /// 가속기 메모리 고갈
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("{collaborator} failed: {source}")]
    ExternalEncoderFailure {
        collaborator: Collaborator,
        #[source]
        source: anyhow::Error,
    },

    /// 단계 사이에서 취소됨 (타임아웃 등)
    #[error("job cancelled before step {step}")]
    Cancelled { step: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("tensor backend error: {0}")]
    Backend(candle_core::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl GenError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn external(collaborator: Collaborator, source: anyhow::Error) -> Self {
        Self::ExternalEncoderFailure { collaborator, source }
    }

    /// 응답에 실리는 안정적인 에러 코드
    pub fn code(&self) -> &'static str {
        match self {
            GenError::UnsupportedBackend(_) => "MODEL NOT RECOGNIZED",
            GenError::ShapeMismatch { .. } => "SHAPE MISMATCH",
            GenError::NumericalDivergence { .. } => "NUMERICAL DIVERGENCE",
            GenError::ResourceExhausted(_) => "RESOURCE EXHAUSTED",
            GenError::ExternalEncoderFailure { .. } => "EXTERNAL ENCODER FAILURE",
            GenError::Cancelled { .. } => "CANCELLED",
            GenError::InvalidConfig(_) => "INVALID REQUEST",
            GenError::Backend(_) | GenError::Io(_) | GenError::Image(_) => "INTERNAL ERROR",
        }
    }
}

impl From<candle_core::Error> for GenError {
    /// 백엔드 메모리 부족은 ResourceExhausted 로 분류
    fn from(err: candle_core::Error) -> Self {
        let msg = err.to_string();
        if msg.to_lowercase().contains("out of memory") {
            GenError::ResourceExhausted(msg)
        } else {
            GenError::Backend(err)
        }
    }
}

/// 외부 호출 결과를 협력자 실패로 감싼다
pub(crate) trait CollaboratorContext<T> {
    fn collaborator(self, who: Collaborator) -> GenResult<T>;
}

impl<T> CollaboratorContext<T> for anyhow::Result<T> {
    fn collaborator(self, who: Collaborator) -> GenResult<T> {
        self.map_err(|source| GenError::external(who, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn 에러코드_안정성_테스트() {
        assert_eq!(
            GenError::UnsupportedBackend("foo".into()).code(),
            "MODEL NOT RECOGNIZED"
        );
        assert_eq!(
            GenError::NumericalDivergence { step: 3, loss: f32::NAN }.code(),
            "NUMERICAL DIVERGENCE"
        );
        assert!(GenError::invalid_config("x").to_string().contains("invalid configuration"));
    }

    #[test]
    fn 메모리부족_분류_테스트() {
        let err: GenError = candle_core::Error::Msg("CUDA_ERROR_OUT_OF_MEMORY: out of memory".into()).into();
        assert!(matches!(err, GenError::ResourceExhausted(_)));

        let err: GenError = candle_core::Error::Msg("unexpected rank".into()).into();
        assert!(matches!(err, GenError::Backend(_)));
    }

    #[test]
    fn 협력자_실패_전파_테스트() {
        let failed: anyhow::Result<()> = Err(anyhow::anyhow!("boom"));
        let err = failed.collaborator(Collaborator::ImageEncoder).unwrap_err();
        assert!(err.to_string().contains("image encoder failed: boom"));
    }
}
