//! MIDI 数据来源（本地文件或 HTTP）

use std::fmt;
use std::path::PathBuf;

use percent_encoding::percent_decode_str;
use reqwest::Url;

use crate::PlayerConfig;

/// 数据来源错误
#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned status {0}")]
    Status(u16),
}

/// 曲目来源
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackSource {
    /// 本地 .mid 文件
    Local(PathBuf),
    /// 远程 URL
    Remote(String),
}

impl TrackSource {
    pub fn is_local(&self) -> bool {
        matches!(self, TrackSource::Local(_))
    }

    /// 显示用名称（文件名或 URL 最后一段）
    pub fn label(&self) -> String {
        match self {
            TrackSource::Local(path) => path
                .file_name()
                .and_then(|s| s.to_str())
                .unwrap_or("Unknown")
                .to_string(),
            TrackSource::Remote(url) => Url::parse(url)
                .ok()
                .and_then(|url| {
                    url.path_segments()?
                        .filter(|segment| !segment.is_empty())
                        .next_back()
                        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
                })
                .unwrap_or_else(|| url.clone()),
        }
    }

    /// 读取原始字节
    ///
    /// 远程来源使用阻塞 GET，`fetch_timeout` 覆盖连接和读取；非 2xx 视为错误。
    pub fn fetch(&self, config: &PlayerConfig) -> Result<Vec<u8>, SourceError> {
        match self {
            TrackSource::Local(path) => Ok(std::fs::read(path)?),
            TrackSource::Remote(url) => {
                let mut builder = reqwest::blocking::Client::builder().timeout(config.fetch_timeout);
                if !config.system_proxy {
                    builder = builder.no_proxy();
                }
                let client = builder.build()?;

                let response = client.get(url).send()?;
                let status = response.status();
                if !status.is_success() {
                    return Err(SourceError::Status(status.as_u16()));
                }
                Ok(response.bytes()?.to_vec())
            }
        }
    }
}

impl fmt::Display for TrackSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackSource::Local(path) => write!(f, "{}", path.display()),
            TrackSource::Remote(url) => f.write_str(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{local_config, serve};
    use std::io::Write;

    #[test]
    fn test_local_fetch() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"MThd").unwrap();

        let source = TrackSource::Local(file.path().to_path_buf());
        let bytes = source.fetch(&PlayerConfig::default()).unwrap();
        assert_eq!(bytes, b"MThd");
    }

    #[test]
    fn test_missing_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = TrackSource::Local(dir.path().join("missing.mid"));

        let err = source.fetch(&PlayerConfig::default()).unwrap_err();
        assert!(matches!(err, SourceError::Io(_)));
    }

    #[test]
    fn test_remote_fetch_returns_body() {
        let server = serve(vec![(200, b"MThd\x00\x00\x00\x06".to_vec())]);
        let source = TrackSource::Remote(format!("{}/midi_files/song.mid", server.url));

        let bytes = source.fetch(&local_config()).unwrap();
        assert_eq!(bytes, b"MThd\x00\x00\x00\x06");
        assert!(server.next_request().starts_with("GET /midi_files/song.mid "));
    }

    #[test]
    fn test_remote_fetch_rejects_error_status() {
        let server = serve(vec![(404, b"missing".to_vec())]);
        let source = TrackSource::Remote(format!("{}/midi_files/gone.mid", server.url));

        let err = source.fetch(&local_config()).unwrap_err();
        assert!(matches!(err, SourceError::Status(404)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_labels() {
        let local = TrackSource::Local(PathBuf::from("/tmp/songs/canon.mid"));
        assert_eq!(local.label(), "canon.mid");

        let remote = TrackSource::Remote("http://host:5000/midi_files/My%20Song.mid".to_string());
        assert_eq!(remote.label(), "My Song.mid");
        assert!(!remote.is_local());

        let trailing = TrackSource::Remote("http://host/midi_files/a%23b.mid/".to_string());
        assert_eq!(trailing.label(), "a#b.mid");

        let opaque = TrackSource::Remote("not a url".to_string());
        assert_eq!(opaque.label(), "not a url");
    }
}
