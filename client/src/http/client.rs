//! HTTP client implementation

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::errors::ClockError;

/// Per-request timeout the clock's HTTP server is given
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(3000);

/// Characters left as-is in query keys and values, same as JavaScript's
/// `encodeURIComponent`; a space goes out as `%20`, never `+`
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode query pairs into `k1=v1&k2=v2`
pub fn encode_query(query: &[(String, String)]) -> String {
    query
        .iter()
        .map(|(key, value)| {
            format!(
                "{}={}",
                utf8_percent_encode(key, QUERY_COMPONENT),
                utf8_percent_encode(value, QUERY_COMPONENT)
            )
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// One bounded request against one device endpoint
///
/// Implementations perform exactly one attempt. Retrying is the caller's
/// business (the poll cycle simply tries again on its next tick).
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// GET `path` with the given query pairs and parse the body as JSON
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClockError>;

    /// POST a JSON body to `path` and parse the response as JSON
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClockError>;
}

/// HTTP client for the clock's JSON API
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    /// Create a new HTTP client with the default request timeout
    pub fn new(base_url: &str) -> Result<Self, ClockError> {
        Self::with_timeout(base_url, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new HTTP client with a custom request timeout
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self, ClockError> {
        let base_url = base_url.trim_end_matches('/');
        Url::parse(base_url)?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            timeout,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get the request timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn url(&self, path: &str, query: &[(String, String)]) -> Result<Url, ClockError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))?;
        if !query.is_empty() {
            url.set_query(Some(&encode_query(query)));
        }
        Ok(url)
    }

    /// Send a request and parse the JSON body, bounded by the request timeout
    ///
    /// The whole exchange (headers and body) runs inside the timeout; when it
    /// fires the in-flight future is dropped, which aborts the transfer.
    async fn send(&self, method: &str, url: &Url, request: RequestBuilder) -> Result<Value, ClockError> {
        let exchange = async {
            let response = request.send().await?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                error!("HTTP {} {} failed: {} - {}", method, url, status, body);
                return Err(ClockError::NetworkError(format!("{}: {}", status, body)));
            }

            let bytes = response.bytes().await?;
            serde_json::from_slice::<Value>(&bytes).map_err(|e| {
                error!("HTTP {} {} returned invalid JSON: {}", method, url, e);
                ClockError::ParseError(e.to_string())
            })
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                let ms = self.timeout.as_millis() as u64;
                warn!("HTTP {} {} timed out after {} ms", method, url, ms);
                Err(ClockError::Timeout(ms))
            }
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpClient {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ClockError> {
        let url = self.url(path, query)?;
        debug!("GET {}", url);

        let request = self.client.get(url.clone());
        self.send("GET", &url, request).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ClockError> {
        let url = self.url(path, &[])?;
        debug!("POST {}", url);

        let request = self.client.post(url.clone()).json(body);
        self.send("POST", &url, request).await
    }
}
