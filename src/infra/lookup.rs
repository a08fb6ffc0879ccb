use crate::apis::imdb_detail::ImdbDetailClient;
use crate::apis::imdb_search::ImdbSearchClient;
use crate::apis::tmdb::TmdbPosterClient;
use crate::app::ports::{HttpClientPort, MovieLookupPort};
use crate::domain::{DetailData, ExternalRef, SearchMatch};
use async_trait::async_trait;
use std::sync::Arc;

/// Lookups backed by the search, detail and image-metadata services.
pub struct HttpMovieLookup {
    search: ImdbSearchClient,
    detail: ImdbDetailClient,
    posters: Option<TmdbPosterClient>,
}

impl HttpMovieLookup {
    /// Poster lookups and the secondary search fallback are enabled only
    /// when `tmdb_credential` is present.
    pub fn new(http: Arc<dyn HttpClientPort>, tmdb_credential: Option<&str>) -> Self {
        Self {
            search: ImdbSearchClient::new(http.clone()),
            detail: ImdbDetailClient::new(http.clone()),
            posters: tmdb_credential.map(|key| TmdbPosterClient::new(http, key)),
        }
    }
}

#[async_trait]
impl MovieLookupPort for HttpMovieLookup {
    async fn find_best_match(&self, title: &str) -> Option<SearchMatch> {
        self.search.find_best_match(title).await
    }

    async fn fetch_detail(&self, external_ref: &ExternalRef) -> DetailData {
        self.detail.fetch_detail(external_ref).await
    }

    async fn fetch_poster(&self, external_ref: &ExternalRef) -> Option<String> {
        match &self.posters {
            Some(client) => client.fetch_poster(external_ref).await,
            None => None,
        }
    }

    fn poster_lookup_enabled(&self) -> bool {
        self.posters.is_some()
    }

    fn secondary_search_enabled(&self) -> bool {
        self.posters.is_some()
    }
}

/// Resolves nothing. Used when processing a saved feed without network access.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineLookup;

#[async_trait]
impl MovieLookupPort for OfflineLookup {
    async fn find_best_match(&self, _title: &str) -> Option<SearchMatch> {
        None
    }

    async fn fetch_detail(&self, _external_ref: &ExternalRef) -> DetailData {
        DetailData::default()
    }

    async fn fetch_poster(&self, _external_ref: &ExternalRef) -> Option<String> {
        None
    }

    fn poster_lookup_enabled(&self) -> bool {
        false
    }

    fn secondary_search_enabled(&self) -> bool {
        false
    }
}
