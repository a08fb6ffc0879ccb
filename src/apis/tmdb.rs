//! Poster lookup through TMDB's external-id `find` endpoint.

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::constants::{TMDB_FIND_BASE, TMDB_IMAGE_BASE};
use crate::domain::ExternalRef;
use crate::error::Result;
use crate::metrics::{record_lookup, LookupOutcome};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{instrument, warn};

#[derive(Debug, Default, Deserialize)]
pub struct FindResponse {
    #[serde(default)]
    pub movie_results: Vec<FindMovieResult>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FindMovieResult {
    #[serde(default)]
    pub poster_path: Option<String>,
}

/// Poster URL of the first cross-referenced movie, if it has one.
pub fn poster_url_from(response: &FindResponse) -> Option<String> {
    response
        .movie_results
        .first()
        .and_then(|m| m.poster_path.as_deref())
        .filter(|path| !path.trim().is_empty())
        .map(|path| format!("{}{}", TMDB_IMAGE_BASE, path))
}

/// Only constructed when a bearer credential is configured.
pub struct TmdbPosterClient {
    http: Arc<dyn HttpClientPort>,
    bearer: String,
}

impl TmdbPosterClient {
    pub fn new(http: Arc<dyn HttpClientPort>, bearer: impl Into<String>) -> Self {
        Self {
            http,
            bearer: bearer.into(),
        }
    }

    fn find_url(external_ref: &ExternalRef) -> String {
        format!(
            "{}{}?external_source=imdb_id&language=en-US",
            TMDB_FIND_BASE, external_ref
        )
    }

    pub async fn try_fetch_poster(&self, external_ref: &ExternalRef) -> Result<Option<String>> {
        let request = HttpRequest::new(Self::find_url(external_ref))
            .header("Accept", "application/json")
            .bearer(&self.bearer);
        let response = self.http.get(&request).await?.error_for_status()?;
        let parsed: FindResponse = response.json()?;
        Ok(poster_url_from(&parsed))
    }

    #[instrument(skip(self), fields(external_ref = %external_ref))]
    pub async fn fetch_poster(&self, external_ref: &ExternalRef) -> Option<String> {
        match self.try_fetch_poster(external_ref).await {
            Ok(Some(url)) => {
                record_lookup("poster", LookupOutcome::Hit);
                Some(url)
            }
            Ok(None) => {
                record_lookup("poster", LookupOutcome::Miss);
                None
            }
            Err(e) => {
                warn!(error = %e, "Poster lookup failed");
                record_lookup("poster", LookupOutcome::Error);
                None
            }
        }
    }
}
