//! # 작업 경계
//!
//! 서비스 요청/응답 형식과 단일 생성 및 스토리 생성 실행기.

pub mod request;
pub mod runner;


pub use request::{GenerationRequest, GenerationResponse};
pub use runner::{JobRunner, SINGLE_VIDEO_FPS};
