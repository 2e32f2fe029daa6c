//! HTTP 客户端

use std::path::Path;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::{filter_entries, CatalogConfig, CatalogError};

#[derive(Serialize)]
struct RenameRequest<'a> {
    old_name: &'a str,
    new_name: &'a str,
}

#[derive(Serialize)]
struct DeleteRequest<'a> {
    filename: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    token: String,
}

/// 远程曲库客户端
///
/// 所有请求都是阻塞的单次请求；token 存在时以 Bearer 方式附带。
#[derive(Debug, Clone)]
pub struct CatalogClient {
    http: Client,
    api_url: Url,
    base_url: Url,
    token: Option<String>,
}

impl CatalogClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let api_url = Url::parse(config.api_url.trim())
            .map_err(|e| CatalogError::InvalidUrl(format!("{}: {}", config.api_url, e)))?;
        let base_url = base_of(&api_url)?;

        let mut builder = Client::builder().timeout(config.timeout);
        if !config.system_proxy {
            builder = builder.no_proxy();
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            api_url,
            base_url,
            token: config.token.clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 下载地址 `{base}/midi_files/{name}`
    pub fn file_url(&self, name: &str) -> Result<Url, CatalogError> {
        self.endpoint(&["midi_files", name])
    }

    /// 获取全部文件名（已排序）
    pub fn list(&self) -> Result<Vec<String>, CatalogError> {
        let response = self.authorized(self.http.get(self.api_url.clone())).send()?;
        let mut entries: Vec<String> = expect_ok(response)?.json()?;
        entries.sort();
        Ok(entries)
    }

    pub fn search(&self, filter: &str) -> Result<Vec<String>, CatalogError> {
        Ok(filter_entries(self.list()?, filter))
    }

    pub fn upload(&self, path: &Path) -> Result<(), CatalogError> {
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("not a file path: {}", path.display()),
                )
            })?
            .to_string();
        let data = std::fs::read(path)?;
        self.upload_bytes(&name, data)
    }

    /// multipart 上传，字段名 `file`
    pub fn upload_bytes(&self, name: &str, data: Vec<u8>) -> Result<(), CatalogError> {
        let part = Part::bytes(data)
            .file_name(name.to_string())
            .mime_str("audio/midi")?;
        let form = Form::new().part("file", part);

        let url = self.endpoint(&["upload"])?;
        let response = self.authorized(self.http.post(url)).multipart(form).send()?;
        expect_ok(response)?;

        log::info!("Uploaded {}", name);
        Ok(())
    }

    pub fn rename(&self, old_name: &str, new_name: &str) -> Result<(), CatalogError> {
        let url = self.endpoint(&["rename"])?;
        let response = self
            .authorized(self.http.post(url))
            .json(&RenameRequest { old_name, new_name })
            .send()?;
        expect_ok(response)?;

        log::info!("Renamed {} -> {}", old_name, new_name);
        Ok(())
    }

    pub fn delete(&self, filename: &str) -> Result<(), CatalogError> {
        let url = self.endpoint(&["delete"])?;
        let response = self
            .authorized(self.http.post(url))
            .json(&DeleteRequest { filename })
            .send()?;
        expect_ok(response)?;

        log::info!("Deleted {}", filename);
        Ok(())
    }

    /// 登录并保存返回的 token
    pub fn login(&mut self, password: &str) -> Result<String, CatalogError> {
        let url = self.endpoint(&["login"])?;
        let response = self
            .http
            .post(url)
            .json(&LoginRequest { password })
            .send()?;
        let body: LoginResponse = expect_ok(response)?.json()?;

        self.token = Some(body.token.clone());
        Ok(body.token)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CatalogError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CatalogError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

/// 列表地址去掉最后一段（忽略末尾的斜杠）
fn base_of(api_url: &Url) -> Result<Url, CatalogError> {
    let mut base = api_url.clone();
    base.set_query(None);
    base.set_fragment(None);
    base.path_segments_mut()
        .map_err(|_| CatalogError::InvalidUrl(api_url.to_string()))?
        .pop_if_empty()
        .pop();
    Ok(base)
}

fn expect_ok(response: Response) -> Result<Response, CatalogError> {
    match response.status() {
        StatusCode::OK => Ok(response),
        StatusCode::FORBIDDEN => Err(CatalogError::Forbidden),
        status => Err(CatalogError::Status(status.as_u16())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{json_body, local_config, serve, Reply};
    use serde_json::json;
    use std::io::Write;

    fn client(url: &str) -> CatalogClient {
        CatalogClient::new(&local_config(url)).unwrap()
    }

    #[test]
    fn test_urls() {
        let client = CatalogClient::new(&CatalogConfig::new("http://host:5000/midi_files")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://host:5000/");
        assert_eq!(
            client.file_url("My Song#2.mid").unwrap().as_str(),
            "http://host:5000/midi_files/My%20Song%232.mid"
        );
        assert_eq!(
            client.endpoint(&["upload"]).unwrap().as_str(),
            "http://host:5000/upload"
        );

        let nested = CatalogClient::new(&CatalogConfig::new("http://host/api/list/")).unwrap();
        assert_eq!(
            nested.endpoint(&["delete"]).unwrap().as_str(),
            "http://host/api/delete"
        );
    }

    #[test]
    fn test_invalid_url() {
        assert!(matches!(
            CatalogClient::new(&CatalogConfig::new("::nope::")),
            Err(CatalogError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_list_sorts_and_sends_token() {
        let server = serve(vec![Reply::json(200, r#"["b.mid","A.mid"]"#)]);
        let client = client(&server.url).with_token("abc");

        let entries = client.list().unwrap();
        assert_eq!(entries, vec!["A.mid".to_string(), "b.mid".to_string()]);

        let request = server.next_request().to_lowercase();
        assert!(request.starts_with("get /midi_files "));
        assert!(request.contains("authorization: bearer abc"));
    }

    #[test]
    fn test_delete_forbidden() {
        let server = serve(vec![Reply::text(403, "no")]);
        let client = client(&server.url);

        let err = client.delete("x.mid").unwrap_err();
        assert!(matches!(err, CatalogError::Forbidden));

        let request = server.next_request();
        assert!(request.starts_with("POST /delete "));
        assert_eq!(json_body(&request), json!({ "filename": "x.mid" }));
    }

    #[test]
    fn test_upload_server_error() {
        let server = serve(vec![Reply::text(500, "oops")]);
        let client = client(&server.url).with_token("t");

        let mut file = tempfile::Builder::new().suffix(".mid").tempfile().unwrap();
        file.write_all(b"MThd").unwrap();

        let err = client.upload(file.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Status(500)));
        assert!(err.to_string().contains("500"));

        let request = server.next_request();
        assert!(request.starts_with("POST /upload "));
        assert!(request.contains(r#"name="file""#));
        assert!(request.contains(".mid\""));
        assert!(request.contains("MThd"));
    }

    #[test]
    fn test_rename() {
        let server = serve(vec![Reply::text(200, "ok")]);
        let client = client(&server.url);

        client.rename("old.mid", "new.mid").unwrap();

        let request = server.next_request();
        assert!(request.starts_with("POST /rename "));
        assert_eq!(
            json_body(&request),
            json!({ "old_name": "old.mid", "new_name": "new.mid" })
        );
    }

    #[test]
    fn test_login_stores_token() {
        let server = serve(vec![
            Reply::json(200, r#"{"token":"s3cret"}"#),
            Reply::text(200, "ok"),
        ]);
        let mut client = client(&server.url);

        assert_eq!(client.login("pw").unwrap(), "s3cret");
        assert_eq!(client.token(), Some("s3cret"));
        assert_eq!(json_body(&server.next_request()), json!({ "password": "pw" }));

        client.delete("a.mid").unwrap();
        assert!(server
            .next_request()
            .to_lowercase()
            .contains("authorization: bearer s3cret"));
    }

    #[test]
    fn test_other_status_is_generic_failure() {
        let server = serve(vec![Reply::text(404, "missing")]);
        let err = client(&server.url).rename("a", "b").unwrap_err();
        assert!(matches!(err, CatalogError::Status(404)));
    }
}
