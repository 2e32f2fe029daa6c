//! 会话共享状态：取消令牌和播放状态

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crate::PlaybackState;

/// 等待下一条消息时的最大睡眠粒度
const WAIT_SLICE: Duration = Duration::from_millis(10);

/// 协作式取消令牌，每个会话一个
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// 幂等
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// 睡眠到 `deadline`，被取消时提前返回 false
    pub fn wait_until(&self, deadline: Instant) -> bool {
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(WAIT_SLICE));
        }
    }
}

/// 引擎与 UI 共享的播放状态
#[derive(Debug, Clone, Default)]
pub struct SharedStatus(Arc<AtomicU8>);

impl SharedStatus {
    pub fn get(&self) -> PlaybackState {
        PlaybackState::from_u8(self.0.load(Ordering::SeqCst))
    }

    pub(crate) fn set(&self, state: PlaybackState) {
        self.0.store(state as u8, Ordering::SeqCst);
    }

    pub fn is_playing(&self) -> bool {
        self.get() == PlaybackState::Playing
    }
}
