use crate::domain::{DetailData, ExternalRef, SearchMatch};
use crate::error::{Result, ShowingsError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;

// Outbound HTTP
#[async_trait]
pub trait HttpClientPort: Send + Sync {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult>;
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

impl HttpRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        let value = format!("Bearer {}", token);
        self.header("Authorization", &value)
    }
}

#[derive(Clone, Debug)]
pub struct HttpGetResult {
    pub url: String,
    pub status: u16,
    pub bytes: Vec<u8>,
    pub content_type: String,
}

impl HttpGetResult {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Fails with `ShowingsError::Status` unless the status is 2xx.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ShowingsError::Status {
                url: self.url,
                status: self.status,
            })
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.bytes)?)
    }
}

/// Metadata lookups used by movie enrichment. Implementations never fail:
/// lookup errors degrade to "nothing found".
#[async_trait]
pub trait MovieLookupPort: Send + Sync {
    async fn find_best_match(&self, title: &str) -> Option<SearchMatch>;

    async fn fetch_detail(&self, external_ref: &ExternalRef) -> DetailData;

    /// Always `None` when `poster_lookup_enabled` is false.
    async fn fetch_poster(&self, external_ref: &ExternalRef) -> Option<String>;

    fn poster_lookup_enabled(&self) -> bool;

    /// Whether a sentinel rating from the feed's own reference may be
    /// retried through a title search.
    fn secondary_search_enabled(&self) -> bool;
}
