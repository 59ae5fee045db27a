//! 텐서 모듈 - 표현 상태, 체크포인트, 프레임 변환

pub mod state;
pub mod image_io;


pub use state::{freq_bins, Checkpoint, ParameterizedState, StateLayout};
pub use image_io::{fit_reference, rgb_to_tensor, tensor_to_frame, tensor_to_frames};
