// Showtime pipeline: feed fetch, reconciliation, enrichment and ordering.

pub mod dates;
pub mod enrich;
pub mod reconcile;
pub mod showtimes;
pub mod sort;
pub mod title;

use crate::apis::kino::KinoFeedClient;
use crate::app::ports::HttpClientPort;
use crate::config::Config;
use crate::domain::CanonicalMovie;
use crate::error::Result;
use crate::infra::http_client::ReqwestHttp;
use crate::infra::lookup::HttpMovieLookup;
use crate::infra::rate_limiter::{Limits, RateLimitedHttp, RateLimiter};
use crate::metrics::record_feed_fetch;
use chrono::{Local, NaiveDateTime};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, instrument};

pub use reconcile::Reconciler;

pub struct MovieShowingsPipeline {
    feed: KinoFeedClient,
    reconciler: Reconciler,
}

impl MovieShowingsPipeline {
    pub fn new(feed: KinoFeedClient, reconciler: Reconciler) -> Self {
        Self { feed, reconciler }
    }

    /// Wires the live HTTP adapters. All outbound requests share one rate limiter.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = live_http(config)?;
        let lookup = Arc::new(HttpMovieLookup::new(http.clone(), config.tmdb_credential()));
        Ok(Self::new(
            KinoFeedClient::new(http, &config.feed.url),
            Reconciler::new(lookup, &config.enrichment),
        ))
    }

    /// One pipeline pass against the local clock.
    pub async fn run(&self) -> Vec<CanonicalMovie> {
        self.run_at(Local::now().naive_local()).await
    }

    /// One pipeline pass. A failed feed fetch yields an empty list.
    #[instrument(skip(self))]
    pub async fn run_at(&self, now: NaiveDateTime) -> Vec<CanonicalMovie> {
        let started = Instant::now();
        let feed = match self.feed.fetch_feed().await {
            Ok(feed) => {
                record_feed_fetch(true, started.elapsed().as_secs_f64());
                feed
            }
            Err(e) => {
                record_feed_fetch(false, started.elapsed().as_secs_f64());
                error!(error = %e, "Showtime feed unavailable, returning no movies");
                return Vec::new();
            }
        };

        let movies = self.reconciler.reconcile_sorted(&feed, now).await;
        info!(
            movies = movies.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Pipeline finished"
        );
        movies
    }
}

/// Reqwest client behind the shared request limiter.
pub fn live_http(config: &Config) -> Result<Arc<dyn HttpClientPort>> {
    let client = ReqwestHttp::new(config.http.request_timeout(), &config.http.user_agent)?;
    let limiter = RateLimiter::new(Limits {
        requests_per_min: config.http.requests_per_min,
        concurrency: config.http.max_in_flight,
    });
    Ok(Arc::new(RateLimitedHttp::new(Arc::new(client), limiter)))
}
