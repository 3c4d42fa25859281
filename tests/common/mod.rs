//! Shared helpers for integration tests: a canned-response HTTP stub and
//! zero-delay configuration.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use student_crawler::CrawlerConfig;
use student_crawler::infrastructure::{ApiConfig, HttpClient, HttpClientConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

type Handler = dyn Fn(&str) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server answering every GET through `handler`, which
/// receives the request target (path plus query)
pub struct StubServer {
    pub port: u16,
    hits: Arc<AtomicUsize>,
}

impl StubServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        Self::serve(usize::MAX, handler).await
    }

    /// Answers the first `replies` requests, then reads every later request
    /// and holds the connection open without ever responding
    pub async fn stalling<F>(replies: usize, handler: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        Self::serve(replies, handler).await
    }

    async fn serve<F>(replies: usize, handler: F) -> Self
    where
        F: Fn(&str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));
        let handler: Arc<Handler> = Arc::new(handler);

        let counter = Arc::clone(&hits);
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    break;
                };
                let handler = Arc::clone(&handler);
                let counter = Arc::clone(&counter);

                tokio::spawn(async move {
                    let mut buffer = Vec::new();
                    let mut chunk = [0u8; 1024];
                    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
                        match socket.read(&mut chunk).await {
                            Ok(0) | Err(_) => return,
                            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
                        }
                    }

                    let head = String::from_utf8_lossy(&buffer);
                    let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                    if counter.fetch_add(1, Ordering::SeqCst) >= replies {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        return;
                    }

                    let (status, body) = handler(&target);
                    let response = format!(
                        "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                        if status == 200 { "OK" } else { "Error" },
                        body.len()
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });

        Self { port, hits }
    }

    pub fn origin(&self) -> String {
        format!("http://127.0.0.1:{}", self.port)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A port nothing listens on
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Value of one query parameter in a request target
pub fn query_param(target: &str, name: &str) -> Option<usize> {
    let query = target.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .and_then(|(_, value)| value.parse().ok())
}

/// Student objects for the given indices, ids counting from SV000001
pub fn students_json(range: std::ops::Range<usize>) -> Vec<serde_json::Value> {
    range
        .map(|i| {
            serde_json::json!({
                "id": i + 1,
                "student_id": format!("SV{:06}", i + 1),
                "first_name": "An",
                "last_name": "Nguyễn",
                "email": format!("sv{}@school.edu.vn", i + 1),
                "math_score": 8.5,
            })
        })
        .collect()
}

/// Default configuration with no crawl delay and the API pointed at `ports`
pub fn test_config(ports: Vec<u16>) -> CrawlerConfig {
    CrawlerConfig {
        crawl_delay_ms: 0,
        api: ApiConfig {
            candidate_ports: ports,
            ..ApiConfig::default()
        },
        ..CrawlerConfig::default()
    }
}

pub fn http_client(config: &CrawlerConfig) -> Arc<HttpClient> {
    Arc::new(HttpClient::new(HttpClientConfig::from(config)).unwrap())
}
