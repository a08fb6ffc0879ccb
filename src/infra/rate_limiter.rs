use crate::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OwnedSemaphorePermit, Semaphore};

#[derive(Clone, Debug, Default)]
pub struct Limits {
    pub requests_per_min: Option<u64>,
    pub concurrency: Option<u32>,
}

#[derive(Clone, Debug)]
pub struct RateLimiter {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    limits: Limits,
    // token bucket: current tokens and time of last refill
    rpm_tokens: Mutex<(f64, Instant)>,
    sem: Option<Arc<Semaphore>>,
}

/// Held for the duration of one request; releases the in-flight slot on drop.
#[derive(Debug)]
pub struct RatePermit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl RateLimiter {
    pub fn new(limits: Limits) -> Self {
        let rpm_capacity = limits.requests_per_min.unwrap_or(0) as f64;
        let sem = limits
            .concurrency
            .filter(|c| *c > 0)
            .map(|c| Arc::new(Semaphore::new(c as usize)));
        Self {
            inner: Arc::new(Inner {
                limits,
                rpm_tokens: Mutex::new((rpm_capacity, Instant::now())),
                sem,
            }),
        }
    }

    /// Wait for an in-flight slot and a request token.
    pub async fn acquire(&self) -> RatePermit {
        // Concurrency first. The semaphore is never closed, so a failed
        // acquire only means "unbounded".
        let permit = match &self.inner.sem {
            Some(sem) => sem.clone().acquire_owned().await.ok(),
            None => None,
        };

        if let Some(rpm) = self.inner.limits.requests_per_min {
            if rpm > 0 {
                self.consume_token(rpm as f64, 60.0).await;
            }
        }

        RatePermit { _permit: permit }
    }

    async fn consume_token(&self, capacity: f64, period_secs: f64) {
        loop {
            let mut guard = self.inner.rpm_tokens.lock().await;
            let (ref mut tokens, ref mut last) = *guard;
            let now = Instant::now();
            let elapsed = now.duration_since(*last).as_secs_f64();
            let refill_rate = capacity / period_secs;
            *tokens = (*tokens + elapsed * refill_rate).min(capacity);
            *last = now;
            if *tokens >= 1.0 {
                *tokens -= 1.0;
                break;
            }
            let secs = (1.0 - *tokens) / refill_rate;
            drop(guard);
            tokio::time::sleep(Duration::from_secs_f64(secs.max(0.001))).await;
        }
    }
}

/// Applies a shared `RateLimiter` to every request of the wrapped client.
pub struct RateLimitedHttp {
    inner: Arc<dyn HttpClientPort>,
    limiter: RateLimiter,
}

impl RateLimitedHttp {
    pub fn new(inner: Arc<dyn HttpClientPort>, limiter: RateLimiter) -> Self {
        Self { inner, limiter }
    }
}

#[async_trait]
impl HttpClientPort for RateLimitedHttp {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult> {
        let _permit = self.limiter.acquire().await;
        self.inner.get(request).await
    }
}
