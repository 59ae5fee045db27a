//! dream_canvas - 텍스트 프롬프트 기반 이미지/영상 합성 엔진
//!
//! 사전학습 인코더의 유사도를 최대화하도록 이미지 표현을 최적화하고,
//! 프롬프트별 결과를 표현 공간에서 보간해 영상을 만든다.

pub mod core;
pub mod job;

// 핵심 모듈들 재수출
pub use crate::core::{
    build_decoder, CancelToken, Checkpoint, DecodeMode, Decoder, DecoderConfig, DecoderKind,
    FrameSink, GenError, GenResult, GenerationConfig, GenerationInput, GenerationLoop,
    GenerationResult, Interpolator, JobMode, LoopPhase, ModelContext, PngSequenceSink, VecSink,
    INTERPOLATION_FPS,
};
pub use crate::job::{GenerationRequest, GenerationResponse, JobRunner};
