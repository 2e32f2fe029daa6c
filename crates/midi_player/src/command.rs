//! 播放命令和事件定义

use std::time::Duration;

use crate::TrackSource;

/// 播放器命令（UI -> 引擎）
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    /// 开始新的播放会话（会先取消并等待上一个会话结束）
    Play(PlayRequest),
    /// 请求停止当前会话
    Stop,
    /// 关闭引擎
    Shutdown,
}

/// 一次播放请求
#[derive(Debug, Clone)]
pub struct PlayRequest {
    pub source: TrackSource,
    pub port_name: String,
    /// 是否发送 `PlayerEvent::Progress`
    pub report_progress: bool,
}

impl PlayRequest {
    pub fn new(source: TrackSource, port_name: impl Into<String>) -> Self {
        Self {
            source,
            port_name: port_name.into(),
            report_progress: true,
        }
    }

    pub fn without_progress(mut self) -> Self {
        self.report_progress = false;
        self
    }
}

/// 播放器事件（引擎 -> UI）
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// 状态变更
    StateChanged(PlaybackState),
    /// 播放进度
    Progress(Progress),
    /// 解码完成后的曲目信息
    TrackInfo(TrackInfo),
    /// 会话结束
    Finished(StopReason),
    /// 错误
    Error(String),
}

/// 播放状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum PlaybackState {
    #[default]
    Idle = 0,
    Playing = 1,
}

impl PlaybackState {
    pub(crate) fn from_u8(value: u8) -> Self {
        match value {
            1 => PlaybackState::Playing,
            _ => PlaybackState::Idle,
        }
    }
}

/// 会话结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Completed,
    Cancelled,
    Failed,
}

/// 进度：已播放时间 / 总时长
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Progress {
    pub elapsed: Duration,
    pub total: Duration,
}

impl Progress {
    /// 会话结束后发送的复位值 (0, 1)
    pub const IDLE: Progress = Progress {
        elapsed: Duration::ZERO,
        total: Duration::from_secs(1),
    };

    pub fn is_idle(&self) -> bool {
        *self == Self::IDLE
    }
}

/// 曲目信息
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TrackInfo {
    pub label: String,
    pub format: String,
    pub message_count: usize,
    pub duration: Duration,
}
