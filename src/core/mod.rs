//! # 생성 엔진 핵심 모듈
//!
//! 표현 상태 → 디코더 → 뷰 증강 → 점수 → 옵티마이저 루프와 체크포인트 보간

pub mod error;
pub mod config;
pub mod tensors;
pub mod models;
pub mod decoder;
pub mod augment;
pub mod scorer;
pub mod optimizers;
pub mod generator;
pub mod interpolate;
pub mod output;

#[cfg(test)]
pub(crate) mod testing;

// 주요 타입들 재수출
pub use config::{GenerationConfig, JobMode};
pub use decoder::{build_decoder, DecodeMode, Decoder, DecoderConfig, DecoderKind};
pub use error::{Collaborator, GenError, GenResult};
pub use generator::{CancelToken, GenerationInput, GenerationLoop, GenerationResult, LoopPhase};
pub use interpolate::{Interpolator, INTERPOLATION_FPS};
pub use models::{CodeEncoder, Generator, ImageEncoder, ModelContext, TextEncoder};
pub use output::{FrameSink, PngSequenceSink, VecSink};
pub use tensors::{Checkpoint, ParameterizedState, StateLayout};
