use crate::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};
use crate::error::{Result, ShowingsError};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

#[derive(Clone, Debug)]
enum StubReply {
    Body { status: u16, body: String, content_type: &'static str },
    Fail(String),
    Hang,
}

/// In-memory HTTP client answering from canned responses, for replays and tests.
///
/// Routes match by URL prefix; the longest matching prefix wins. Unrouted
/// URLs answer 404.
#[derive(Default)]
pub struct StubHttp {
    routes: Vec<(String, StubReply)>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, url_prefix: &str, body: serde_json::Value) -> Self {
        self.routes.push((
            url_prefix.to_string(),
            StubReply::Body { status: 200, body: body.to_string(), content_type: "application/json" },
        ));
        self
    }

    pub fn with_html(mut self, url_prefix: &str, body: &str) -> Self {
        self.routes.push((
            url_prefix.to_string(),
            StubReply::Body { status: 200, body: body.to_string(), content_type: "text/html" },
        ));
        self
    }

    pub fn with_status(mut self, url_prefix: &str, status: u16) -> Self {
        self.routes.push((
            url_prefix.to_string(),
            StubReply::Body { status, body: String::new(), content_type: "text/plain" },
        ));
        self
    }

    /// Simulates a transport failure (connection refused, timeout).
    pub fn with_failure(mut self, url_prefix: &str, message: &str) -> Self {
        self.routes.push((url_prefix.to_string(), StubReply::Fail(message.to_string())));
        self
    }

    /// Never answers; callers must bound the wait themselves.
    pub fn with_hang(mut self, url_prefix: &str) -> Self {
        self.routes.push((url_prefix.to_string(), StubReply::Hang));
        self
    }

    /// URLs requested so far, in call order.
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|req| req.url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    fn route(&self, url: &str) -> Option<&StubReply> {
        self.routes
            .iter()
            .filter(|(prefix, _)| url.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, reply)| reply)
    }
}

#[async_trait]
impl HttpClientPort for StubHttp {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        match self.route(&request.url).cloned() {
            Some(StubReply::Body { status, body, content_type }) => Ok(HttpGetResult {
                url: request.url.clone(),
                status,
                bytes: body.into_bytes(),
                content_type: content_type.to_string(),
            }),
            Some(StubReply::Fail(message)) => Err(ShowingsError::Api { message }),
            Some(StubReply::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ShowingsError::Api { message: format!("{} never answered", request.url) })
            }
            None => Ok(HttpGetResult {
                url: request.url.clone(),
                status: 404,
                bytes: Vec::new(),
                content_type: "text/plain".to_string(),
            }),
        }
    }
}
