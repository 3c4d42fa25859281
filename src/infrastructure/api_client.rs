//! Direct retrieval from a page's backing JSON API
//!
//! Client-rendered student pages have empty tables in their HTML. Their data
//! comes from a local API, so before touching the DOM we try the usual dev
//! ports for it and page through whatever answers.

#![allow(clippy::uninlined_format_args)]

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};
use url::Url;

use super::config::ApiConfig;
use super::http_client::HttpClient;
use super::parsing_error::{ExtractionError, FetchResult};
use crate::domain::{ExtractionResult, RawRecord, StrategyKind};

/// Envelope keys that may hold the item array, in lookup order
const ENVELOPE_KEYS: [&str; 3] = ["students", "data", "items"];

/// Host names that are treated as "this machine"
const LOCAL_HOSTS: [&str; 4] = ["localhost", "127.0.0.1", "0.0.0.0", "[::1]"];

/// Records from the first live endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ApiFetch {
    pub endpoint: String,
    pub records: Vec<RawRecord>,
}

pub struct ApiFallbackClient {
    http: Arc<HttpClient>,
    config: ApiConfig,
    self_origin: Option<Url>,
}

impl ApiFallbackClient {
    pub fn new(http: Arc<HttpClient>, config: ApiConfig) -> Self {
        let self_origin = config.self_origin.as_deref().and_then(|origin| match Url::parse(origin) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Ignoring unparseable self origin '{}': {}", origin, e);
                None
            }
        });

        Self {
            http,
            config,
            self_origin,
        }
    }

    /// Candidate API base URLs for a locator, one per configured port
    pub fn candidate_endpoints(&self, locator: &str) -> Vec<String> {
        let host = local_host(locator).unwrap_or_else(|| self.config.default_host.clone());
        self.config
            .candidate_ports
            .iter()
            .map(|port| format!("http://{}:{}{}", host, port, self.config.path))
            .collect()
    }

    fn is_self_call(&self, endpoint: &str) -> bool {
        match (&self.self_origin, Url::parse(endpoint)) {
            (Some(own), Ok(candidate)) => same_origin(own, &candidate),
            _ => false,
        }
    }

    /// Offset of a page, clamped instead of wrapping on huge page sizes
    fn page_offset(&self, page: usize) -> usize {
        page.saturating_mul(self.config.page_size)
    }

    /// Most records one endpoint can yield before the page ceiling stops it
    fn page_ceiling(&self) -> usize {
        self.config.page_size.saturating_mul(self.config.max_pages)
    }

    /// Fetch records from the backing API, never failing.
    ///
    /// Any error is logged and yields an empty result.
    pub async fn fetch(&self, locator: &str) -> ExtractionResult {
        match self.try_fetch(locator).await {
            Ok(fetch) if !fetch.records.is_empty() => {
                ExtractionResult::from_records(StrategyKind::ApiFallback, fetch.endpoint, fetch.records)
            }
            Ok(fetch) => ExtractionResult::empty(fetch.endpoint),
            Err(e) => {
                warn!("API fallback for {} failed: {}", locator, e);
                ExtractionResult::empty(locator)
            }
        }
    }

    /// Try candidate endpoints in order and page through the first that
    /// yields records.
    ///
    /// Returns `Ok` with no records when endpoints answered but were empty,
    /// [`ExtractionError::NoApi`] when nothing answered, and the transport
    /// error when a live endpoint broke off mid-pagination.
    pub async fn try_fetch(&self, locator: &str) -> FetchResult<ApiFetch> {
        let mut live_endpoint = None;

        for endpoint in self.candidate_endpoints(locator) {
            if self.is_self_call(&endpoint) {
                warn!("{}", ExtractionError::SelfCall { origin: endpoint });
                continue;
            }

            match self.fetch_endpoint(&endpoint).await? {
                Some(records) if !records.is_empty() => {
                    info!("API {} returned {} records", endpoint, records.len());
                    return Ok(ApiFetch { endpoint, records });
                }
                Some(_) => {
                    debug!("API {} is live but empty", endpoint);
                    live_endpoint = Some(endpoint);
                }
                None => {}
            }
        }

        match live_endpoint {
            Some(endpoint) => Ok(ApiFetch {
                endpoint,
                records: Vec::new(),
            }),
            None => Err(ExtractionError::NoApi {
                ports: self.config.candidate_ports.clone(),
            }),
        }
    }

    /// Page through one endpoint.
    ///
    /// `Ok(None)` means the first page failed and the next port should be
    /// tried.
    async fn fetch_endpoint(&self, endpoint: &str) -> FetchResult<Option<Vec<RawRecord>>> {
        let page_size = self.config.page_size;
        let mut records = Vec::new();

        for page in 0..self.config.max_pages {
            let url = self.page_url(endpoint, self.page_offset(page), page_size)?;
            let payload = self.http.get_json(&url, self.config.timeout()).await;

            let items = match payload {
                Ok(value) => match envelope_items(&value) {
                    Some(items) => items.clone(),
                    None if page == 0 => {
                        debug!("{} answered with an unknown payload shape", url);
                        return Ok(None);
                    }
                    None => {
                        warn!("Stopping pagination at {}: unknown payload shape", url);
                        break;
                    }
                },
                Err(e) if page == 0 => {
                    debug!("No API at {}: {}", endpoint, e);
                    return Ok(None);
                }
                Err(e) if e.is_transport() => return Err(e),
                Err(e) => {
                    warn!("Stopping pagination at {}: {}", url, e);
                    break;
                }
            };

            let count = items.len();
            records.extend(items.iter().filter_map(item_to_record));
            debug!("Page {} of {} gave {} items", page, endpoint, count);

            if count < page_size {
                return Ok(Some(self.with_last_resort(endpoint, records).await));
            }
        }

        if records.len() >= self.page_ceiling() {
            warn!("Hit the {} page ceiling on {}", self.config.max_pages, endpoint);
        }
        Ok(Some(self.with_last_resort(endpoint, records).await))
    }

    /// One oversized request when paging came back empty
    async fn with_last_resort(&self, endpoint: &str, records: Vec<RawRecord>) -> Vec<RawRecord> {
        if !records.is_empty() {
            return records;
        }

        let url = match self.page_url(endpoint, 0, self.config.fallback_limit) {
            Ok(url) => url,
            Err(e) => {
                warn!("{}", e);
                return records;
            }
        };

        match self.http.get_json(&url, self.config.timeout()).await {
            Ok(value) => envelope_items(&value)
                .map(|items| items.iter().filter_map(item_to_record).collect())
                .unwrap_or_default(),
            Err(e) => {
                debug!("Oversized request to {} failed: {}", url, e);
                records
            }
        }
    }

    fn page_url(&self, endpoint: &str, offset: usize, limit: usize) -> FetchResult<String> {
        let mut url = Url::parse(endpoint).map_err(|e| ExtractionError::invalid_locator(endpoint, e.to_string()))?;
        url.query_pairs_mut()
            .append_pair(&self.config.offset_param, &offset.to_string())
            .append_pair(&self.config.limit_param, &limit.to_string());
        Ok(url.into())
    }
}

fn is_local_host(host: &str) -> bool {
    LOCAL_HOSTS.iter().any(|local| host.eq_ignore_ascii_case(local))
}

/// The locator's host when it names this machine
fn local_host(locator: &str) -> Option<String> {
    let url = Url::parse(locator).ok()?;
    let host = url.host_str()?;
    is_local_host(host).then(|| host.to_string())
}

/// Scheme, host and effective port equality, with every loopback spelling
/// counted as the same host
fn same_origin(a: &Url, b: &Url) -> bool {
    let host = |url: &Url| {
        url.host_str()
            .map(|host| (if is_local_host(host) { "localhost" } else { host }).to_ascii_lowercase())
    };
    a.scheme() == b.scheme() && a.port_or_known_default() == b.port_or_known_default() && host(a) == host(b)
}

/// Item array of a response: a bare array, or an array under one of the
/// envelope keys (one level of `data` nesting is allowed)
pub fn envelope_items(value: &Value) -> Option<&Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(map) => ENVELOPE_KEYS.iter().find_map(|key| match map.get(*key) {
            Some(Value::Array(items)) => Some(items),
            Some(nested @ Value::Object(_)) if *key == "data" => envelope_items(nested),
            _ => None,
        }),
        _ => None,
    }
}

/// Flatten one JSON object into a raw record; non-objects are skipped
pub fn item_to_record(item: &Value) -> Option<RawRecord> {
    let object = item.as_object()?;
    Some(
        object
            .iter()
            .map(|(key, value)| {
                let text = match value {
                    Value::Null => None,
                    Value::String(s) => Some(s.clone()),
                    Value::Number(n) => Some(n.to_string()),
                    Value::Bool(b) => Some(b.to_string()),
                    nested => Some(nested.to_string()),
                };
                (key.clone(), text)
            })
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::HttpClientConfig;
    use serde_json::json;
    use std::time::Duration;

    fn client(config: ApiConfig) -> ApiFallbackClient {
        let http = HttpClient::new(HttpClientConfig {
            crawl_delay: Duration::ZERO,
            ..HttpClientConfig::default()
        })
        .unwrap();
        ApiFallbackClient::new(Arc::new(http), config)
    }

    #[test]
    fn envelopes() {
        let bare = json!([{"student_id": "SV000001"}]);
        assert_eq!(envelope_items(&bare).map(Vec::len), Some(1));

        let wrapped = json!({"total": 2, "students": [{}, {}]});
        assert_eq!(envelope_items(&wrapped).map(Vec::len), Some(2));

        let nested = json!({"data": {"items": [{}]}});
        assert_eq!(envelope_items(&nested).map(Vec::len), Some(1));

        assert!(envelope_items(&json!({"detail": "Not Found"})).is_none());
        assert!(envelope_items(&json!("text")).is_none());
    }

    #[test]
    fn items_flatten_to_strings() {
        let record = item_to_record(&json!({
            "student_id": "SV000001",
            "math_score": 8.5,
            "active": true,
            "email": null,
            "tags": ["a"]
        }))
        .unwrap();

        assert_eq!(record.get("student_id"), Some("SV000001"));
        assert_eq!(record.get("math_score"), Some("8.5"));
        assert_eq!(record.get("active"), Some("true"));
        assert_eq!(record.get("email"), None);
        assert_eq!(record.get("tags"), Some("[\"a\"]"));
        assert!(item_to_record(&json!(42)).is_none());
    }

    #[test]
    fn candidates_follow_local_host() {
        let api = client(ApiConfig {
            candidate_ports: vec![8000, 8001],
            ..ApiConfig::default()
        });

        assert_eq!(
            api.candidate_endpoints("http://localhost:5500/index.html"),
            vec![
                "http://localhost:8000/api/v1/students",
                "http://localhost:8001/api/v1/students"
            ]
        );
        assert_eq!(
            api.candidate_endpoints("file:///srv/www/index.html")[0],
            "http://127.0.0.1:8000/api/v1/students"
        );
        assert_eq!(
            api.candidate_endpoints("https://school.example.edu/students")[0],
            "http://127.0.0.1:8000/api/v1/students"
        );
    }

    #[test]
    fn items_keep_response_key_order() {
        let item = json!({"student_id": "SV000001", "que quan": "Huế", "address": "12 Lê Lợi"});
        let record = item_to_record(&item).unwrap();
        let keys: Vec<&str> = record.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, ["student_id", "que quan", "address"]);
    }

    #[test]
    fn self_origin_is_recognized() {
        let api = client(ApiConfig {
            self_origin: Some("http://127.0.0.1:8000".to_string()),
            ..ApiConfig::default()
        });
        assert!(api.is_self_call("http://127.0.0.1:8000/api/v1/students"));
        assert!(!api.is_self_call("http://127.0.0.1:8001/api/v1/students"));
    }

    #[test]
    fn loopback_spellings_share_an_origin() {
        let api = client(ApiConfig {
            self_origin: Some("http://localhost:8000".to_string()),
            ..ApiConfig::default()
        });
        assert!(api.is_self_call("http://127.0.0.1:8000/api/v1/students"));
        assert!(api.is_self_call("http://0.0.0.0:8000/api/v1/students"));
        assert!(api.is_self_call("http://[::1]:8000/api/v1/students"));
        assert!(api.is_self_call("http://LOCALHOST:8000/api/v1/students"));
        assert!(!api.is_self_call("https://127.0.0.1:8000/api/v1/students"));
        assert!(!api.is_self_call("http://127.0.0.1:8001/api/v1/students"));
        assert!(!api.is_self_call("http://school.example.edu:8000/api/v1/students"));

        let default_port = client(ApiConfig {
            self_origin: Some("http://127.0.0.1".to_string()),
            ..ApiConfig::default()
        });
        assert!(default_port.is_self_call("http://localhost:80/api/v1/students"));
    }

    #[test]
    fn huge_paging_settings_saturate() {
        let api = client(ApiConfig {
            page_size: usize::MAX,
            max_pages: usize::MAX,
            ..ApiConfig::default()
        });
        assert_eq!(api.page_offset(0), 0);
        assert_eq!(api.page_offset(3), usize::MAX);
        assert_eq!(api.page_ceiling(), usize::MAX);

        let url = api.page_url("http://127.0.0.1:8000/api/v1/students", api.page_offset(2), usize::MAX).unwrap();
        assert!(url.ends_with(&format!("?skip={}&limit={}", usize::MAX, usize::MAX)));

        let normal = client(ApiConfig {
            page_size: 100,
            max_pages: 50,
            ..ApiConfig::default()
        });
        assert_eq!(normal.page_offset(2), 200);
        assert_eq!(normal.page_ceiling(), 5000);
    }

    #[test]
    fn page_urls_carry_window() {
        let api = client(ApiConfig::default());
        let url = api.page_url("http://127.0.0.1:8000/api/v1/students", 200, 100).unwrap();
        assert_eq!(url, "http://127.0.0.1:8000/api/v1/students?skip=200&limit=100");
    }
}
