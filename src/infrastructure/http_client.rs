//! HTTP client for page and API fetches
//!
//! One client is built per crawl run and reused for every request of that
//! run. Requests are issued one at a time; after each network fetch the
//! client sleeps for the configured crawl delay.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde_json::Value;
use url::Url;

use super::config::CrawlerConfig;
use super::parsing_error::{ExtractionError, FetchResult};

/// HTTP client configuration for crawling
#[derive(Debug, Clone, serde::Serialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    /// Default timeout for page fetches
    pub timeout: Duration,
    /// Pause after every network fetch
    pub crawl_delay: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&CrawlerConfig::default())
    }
}

impl From<&CrawlerConfig> for HttpClientConfig {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            timeout: config.request_timeout(),
            crawl_delay: config.crawl_delay(),
        }
    }
}

pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .gzip(true)
            .brotli(true)
            .cookie_store(true)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    /// Fetch a page as text. `file://` locators and plain paths are read
    /// from disk; everything else goes over HTTP with the page timeout.
    pub async fn get_text(&self, locator: &str) -> FetchResult<String> {
        if let Some(path) = local_path(locator)? {
            tracing::info!("Reading page from {}", path.display());
            return tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| ExtractionError::FileRead {
                    path: path.display().to_string(),
                    message: e.to_string(),
                });
        }

        let response = self.send(locator, self.config.timeout).await?;
        let text = response
            .text()
            .await
            .map_err(|e| ExtractionError::fetch(locator, &e));
        self.pause().await;

        let text = text?;
        tracing::debug!("Fetched {} ({} chars)", locator, text.len());
        Ok(text)
    }

    /// Fetch and decode a JSON document with a per-call timeout
    pub async fn get_json(&self, url: &str, timeout: Duration) -> FetchResult<Value> {
        let response = self.send(url, timeout).await?;
        let body = response.bytes().await.map_err(|e| ExtractionError::fetch(url, &e));
        self.pause().await;

        serde_json::from_slice(&body?).map_err(|e| ExtractionError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn send(&self, url: &str, timeout: Duration) -> FetchResult<Response> {
        tracing::debug!("GET {}", url);

        let result = self.client.get(url).timeout(timeout).send().await;
        let response = match result {
            Ok(response) => response,
            Err(e) => {
                self.pause().await;
                return Err(if e.is_timeout() {
                    ExtractionError::Timeout {
                        url: url.to_string(),
                        seconds: timeout.as_secs(),
                    }
                } else {
                    ExtractionError::fetch(url, &e)
                });
            }
        };

        if !response.status().is_success() {
            self.pause().await;
            return Err(ExtractionError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(response)
    }

    async fn pause(&self) {
        if !self.config.crawl_delay.is_zero() {
            tokio::time::sleep(self.config.crawl_delay).await;
        }
    }
}

/// Filesystem path for `file://` locators and bare paths, `None` for URLs
fn local_path(locator: &str) -> FetchResult<Option<PathBuf>> {
    match Url::parse(locator) {
        Ok(url) if url.scheme() == "file" => url
            .to_file_path()
            .map(Some)
            .map_err(|()| ExtractionError::invalid_locator(locator, "not a valid file path")),
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(None),
        Ok(url) => Err(ExtractionError::invalid_locator(
            locator,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Some(PathBuf::from(locator))),
        Err(e) => Err(ExtractionError::invalid_locator(locator, e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn client() -> HttpClient {
        HttpClient::new(HttpClientConfig {
            crawl_delay: Duration::ZERO,
            ..HttpClientConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn local_path_classification() {
        assert_eq!(local_path("http://localhost:3000/").unwrap(), None);
        assert_eq!(
            local_path("file:///tmp/index.html").unwrap(),
            Some(PathBuf::from("/tmp/index.html"))
        );
        assert_eq!(local_path("pages/index.html").unwrap(), Some(PathBuf::from("pages/index.html")));
        assert!(matches!(
            local_path("ftp://example.com/x"),
            Err(ExtractionError::InvalidLocator { .. })
        ));
    }

    #[tokio::test]
    async fn reads_file_locators() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "<table></table>").unwrap();
        let url = Url::from_file_path(file.path()).unwrap();

        let text = client().get_text(url.as_str()).await.unwrap();
        assert_eq!(text, "<table></table>");
    }

    #[tokio::test]
    async fn missing_file_is_a_read_error() {
        let result = client().get_text("file:///definitely/not/here.html").await;
        assert!(matches!(result, Err(ExtractionError::FileRead { .. })));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_failure() {
        // port 9 (discard) is essentially never listening on loopback
        let result = client()
            .get_json("http://127.0.0.1:9/api", Duration::from_secs(2))
            .await;
        assert!(result.is_err_and(|e| e.is_transport()));
    }
}
