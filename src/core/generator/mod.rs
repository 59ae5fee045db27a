//! # 생성 루프
//!
//! 고정 반복 예산 동안 디코드 → 증강 → 점수 → 역전파 → 옵티마이저 전이를 반복하고
//! K 스텝마다 체크포인트와 프레임을 남긴다.

pub mod cancel;
pub mod generation_loop;


pub use cancel::CancelToken;
pub use generation_loop::{GenerationInput, GenerationLoop, GenerationResult, LoopPhase, StepReport};
