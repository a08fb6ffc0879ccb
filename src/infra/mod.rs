pub mod http_client;
pub mod lookup;
pub mod rate_limiter;
#[cfg(any(test, feature = "test-util"))]
pub mod stub_http;
