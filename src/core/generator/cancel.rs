//! 단계 사이 취소 신호

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 복제해 다른 스레드(타임아웃 감시 등)에 넘길 수 있는 취소 토큰
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
