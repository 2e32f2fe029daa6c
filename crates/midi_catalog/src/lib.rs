//! midi_catalog - 远程 MIDI 曲库客户端
//!
//! 列出、上传、重命名、删除服务器上的 MIDI 文件。每个操作只发一次请求，不重试。

mod client;
mod config;

#[cfg(test)]
mod test_server;

pub use client::*;
pub use config::*;

/// 曲库错误
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Forbidden")]
    Forbidden,

    #[error("Request failed with status {0}")]
    Status(u16),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// 获取文件列表并过滤
///
/// 任何失败都只记录日志并返回空列表。
pub fn list_catalog(api_url: &str, filter: &str) -> Vec<String> {
    list_catalog_with(&CatalogConfig::new(api_url), filter)
}

/// 同 [`list_catalog`]，使用完整配置（token、超时）
pub fn list_catalog_with(config: &CatalogConfig, filter: &str) -> Vec<String> {
    let result = CatalogClient::new(config).and_then(|client| client.search(filter));

    match result {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("Failed to list catalog from {}: {}", config.api_url, e);
            Vec::new()
        }
    }
}

/// 不区分大小写的子串过滤，结果按字典序排序
pub fn filter_entries(entries: Vec<String>, query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let mut matched: Vec<String> = entries
        .into_iter()
        .filter(|name| query.is_empty() || name.to_lowercase().contains(&query))
        .collect();
    matched.sort();
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{local_config, serve, Reply};

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_filter_is_case_insensitive_and_sorted() {
        let entries = names(&["b.mid", "A.mid", "c.mid"]);

        assert_eq!(filter_entries(entries.clone(), "a"), names(&["A.mid"]));
        assert_eq!(
            filter_entries(entries.clone(), ""),
            names(&["A.mid", "b.mid", "c.mid"])
        );
        assert_eq!(
            filter_entries(entries.clone(), "MID"),
            names(&["A.mid", "b.mid", "c.mid"])
        );
        assert!(filter_entries(entries, "zzz").is_empty());
    }

    #[test]
    fn test_list_catalog_filters_response() {
        let server = serve(vec![Reply::json(200, r#"["b.mid","A.mid","c.mid"]"#)]);

        assert_eq!(
            list_catalog_with(&local_config(&server.url), "a"),
            names(&["A.mid"])
        );
    }

    #[test]
    fn test_list_catalog_degrades_to_empty() {
        let server = serve(vec![
            Reply::text(500, "boom"),
            Reply::json(200, r#"{"not":"a list"}"#),
        ]);
        let config = local_config(&server.url);

        assert!(list_catalog_with(&config, "").is_empty());
        assert!(list_catalog_with(&config, "").is_empty());
        assert!(list_catalog("not a url", "").is_empty());
    }
}
