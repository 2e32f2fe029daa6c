//! 测试用的本地 HTTP 文件服务器

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use std::time::Duration;

use crate::PlayerConfig;

pub struct TestServer {
    pub url: String,
    requests: Receiver<String>,
}

impl TestServer {
    /// 下一个收到的请求头
    pub fn next_request(&self) -> String {
        self.requests
            .recv_timeout(Duration::from_secs(5))
            .expect("no request received")
    }
}

/// 不走系统代理的默认配置
pub fn local_config() -> PlayerConfig {
    PlayerConfig {
        system_proxy: false,
        ..PlayerConfig::default()
    }
}

/// 依次对每个连接返回 (状态码, 正文)
pub fn serve(replies: Vec<(u16, Vec<u8>)>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = channel();

    thread::spawn(move || {
        for (status, body) in replies {
            let Ok((mut stream, _)) = listener.accept() else {
                return;
            };
            let _ = stream.set_read_timeout(Some(Duration::from_secs(5)));

            // GET 请求没有正文，读到空行为止
            let mut head = Vec::new();
            let mut buf = [0u8; 1024];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            let _ = tx.send(String::from_utf8_lossy(&head).into_owned());

            let header = format!(
                "HTTP/1.1 {} {}\r\nContent-Type: audio/midi\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                if status == 200 { "OK" } else { "Error" },
                body.len()
            );
            let _ = stream.write_all(header.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
    });

    TestServer { url, requests: rx }
}
