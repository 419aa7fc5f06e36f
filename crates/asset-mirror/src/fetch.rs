//! Async HTTP client wrapping reqwest.
//!
//! One GET per call, no retry. The client is built once from a
//! [`FetchConfig`] and reused for every request of a run so connections
//! are kept alive between assets.

use std::time::Duration;

use encoding_rs::{Encoding, UTF_8};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use tracing::{debug, info};

use crate::types::{MirrorError, MirrorResult};

/// Desktop Chrome user-agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_ACCEPT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

pub const DEFAULT_ACCEPT_LANGUAGE: &str = "es-AR,es;q=0.9,en;q=0.8";

/// Per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Headers and timeout applied to every request.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub accept: String,
    pub accept_language: String,
    /// Additional headers sent verbatim.
    pub extra_headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept: DEFAULT_ACCEPT.to_string(),
            accept_language: DEFAULT_ACCEPT_LANGUAGE.to_string(),
            extra_headers: vec![("Upgrade-Insecure-Requests".to_string(), "1".to_string())],
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl FetchConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn header_map(&self) -> MirrorResult<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, header_value(&self.accept)?);
        headers.insert(ACCEPT_LANGUAGE, header_value(&self.accept_language)?);
        for (name, value) in &self.extra_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| MirrorError::Client(format!("invalid header name {name:?}: {e}")))?;
            headers.insert(name, header_value(value)?);
        }
        Ok(headers)
    }
}

fn header_value(value: &str) -> MirrorResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| MirrorError::Client(format!("invalid header value {value:?}: {e}")))
}

/// A successful (2xx) response.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// Requested URL.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    /// Raw (already decompressed) body.
    pub body: Vec<u8>,
}

impl FetchResult {
    /// Body decoded with the `Content-Type` charset.
    ///
    /// A byte-order mark wins over the header; without either the body is
    /// read as UTF-8. Unknown labels fall back to UTF-8 as well.
    pub fn text(&self) -> String {
        let encoding = self
            .content_type
            .as_deref()
            .and_then(charset)
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .unwrap_or(UTF_8);
        let (text, used, malformed) = encoding.decode(&self.body);
        if malformed {
            debug!("{}: body is not valid {}", self.url, used.name());
        }
        text.into_owned()
    }
}

/// The `charset` parameter of a `Content-Type` value.
fn charset(content_type: &str) -> Option<&str> {
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"'))
    })
}

/// HTTP client shared by every stage of a run.
#[derive(Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpClient {
    /// Build a client from explicit configuration.
    pub fn new(config: &FetchConfig) -> MirrorResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(config.user_agent.as_str())
            .default_headers(config.header_map()?)
            .build()
            .map_err(|e| MirrorError::Client(e.to_string()))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    /// Perform a single GET request.
    ///
    /// Transport failures and timeouts become [`MirrorError::Fetch`];
    /// non-2xx responses become [`MirrorError::Status`].
    pub async fn get(&self, url: &str) -> MirrorResult<FetchResult> {
        info!("Downloading {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.fetch_error(url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = resp
            .bytes()
            .await
            .map_err(|e| self.fetch_error(url, e))?
            .to_vec();

        debug!("{url}: {} bytes, status {}", body.len(), status.as_u16());

        Ok(FetchResult {
            url: url.to_string(),
            status: status.as_u16(),
            content_type,
            body,
        })
    }

    fn fetch_error(&self, url: &str, e: reqwest::Error) -> MirrorError {
        let reason = if e.is_timeout() {
            format!("timed out after {}s", self.timeout.as_secs_f64())
        } else {
            e.to_string()
        };
        MirrorError::Fetch {
            url: url.to_string(),
            reason,
        }
    }
}
