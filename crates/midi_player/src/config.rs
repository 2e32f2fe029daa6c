//! 引擎配置

use std::time::Duration;

/// 默认输出端口（Windows 上常见的 loopMIDI 虚拟端口）
pub const DEFAULT_PORT_NAME: &str = "loopMIDI Port 1";

/// 覆盖默认端口名的环境变量
pub const PORT_ENV: &str = "MIDI_REMOTE_PORT";

/// 播放引擎配置
#[derive(Debug, Clone)]
pub struct PlayerConfig {
    /// 默认输出端口名
    pub port_name: String,
    /// 远程文件下载超时
    pub fetch_timeout: Duration,
    /// 取消播放时是否发送 All Notes Off
    pub reset_on_stop: bool,
    /// midir 客户端名
    pub client_name: String,
    /// 下载时是否使用系统代理（HTTP_PROXY 等环境变量）
    pub system_proxy: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            port_name: DEFAULT_PORT_NAME.to_string(),
            fetch_timeout: Duration::from_secs(10),
            reset_on_stop: true,
            client_name: "midi-remote".to_string(),
            system_proxy: true,
        }
    }
}

impl PlayerConfig {
    /// 默认值，端口名可由 `MIDI_REMOTE_PORT` 覆盖
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(port) = std::env::var(PORT_ENV) {
            if !port.trim().is_empty() {
                config.port_name = port;
            }
        }
        config
    }
}
