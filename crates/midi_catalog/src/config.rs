//! 曲库配置

use std::time::Duration;

pub const DEFAULT_API_URL: &str = "http://127.0.0.1:5000/midi_files";

pub const API_ENV: &str = "MIDI_REMOTE_API";
pub const TOKEN_ENV: &str = "MIDI_REMOTE_TOKEN";

/// 曲库客户端配置
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// 列表接口地址；去掉最后一段即为服务根地址
    pub api_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
    /// 是否使用系统代理（HTTP_PROXY 等环境变量）
    pub system_proxy: bool,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL)
    }
}

impl CatalogConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            token: None,
            timeout: Duration::from_secs(5),
            system_proxy: true,
        }
    }

    /// 默认值，可由 `MIDI_REMOTE_API` / `MIDI_REMOTE_TOKEN` 覆盖
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(api_url) = non_empty_env(API_ENV) {
            config.api_url = api_url;
        }
        config.token = non_empty_env(TOKEN_ENV);
        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
