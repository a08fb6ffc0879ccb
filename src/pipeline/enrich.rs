//! Per-movie enrichment: rating, release date and poster fallbacks.
//!
//! A task works on an owned snapshot of the movie and fills an
//! [`Enrichment`] patch; it never touches the reconciler's map.

use crate::app::ports::MovieLookupPort;
use crate::constants::{is_placeholder_poster, FALLBACK_POSTER_URL};
use crate::domain::{CanonicalMovie, ExternalRef, Rating, ReleaseDate};
use crate::types::FeedId;
use chrono::NaiveDate;
use tracing::{debug, instrument};

/// Snapshot of the fields enrichment starts from.
#[derive(Debug, Clone)]
pub struct EnrichmentRequest {
    pub movie_id: FeedId,
    pub title: String,
    pub external_ref: Option<ExternalRef>,
    pub poster_url: String,
    pub release_date: ReleaseDate,
}

impl EnrichmentRequest {
    pub fn for_movie(movie: &CanonicalMovie) -> Self {
        Self {
            movie_id: movie.feed_id,
            title: movie.title.clone(),
            external_ref: movie.external_ref.clone(),
            poster_url: movie.poster_url.clone(),
            release_date: movie.release_date,
        }
    }
}

/// Field updates produced by one enrichment task. Unset fields mean "leave as is".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub rating: Rating,
    pub external_ref: Option<ExternalRef>,
    pub poster_url: Option<String>,
    pub release_date: Option<NaiveDate>,
}

impl Enrichment {
    pub fn is_empty(&self) -> bool {
        *self == Enrichment::default()
    }

    pub fn apply_to(self, movie: &mut CanonicalMovie) {
        if self.rating.is_known() {
            movie.rating = self.rating;
        }
        if let Some(external_ref) = self.external_ref {
            movie.external_ref = Some(external_ref);
        }
        if let Some(poster_url) = self.poster_url {
            movie.poster_url = poster_url;
        }
        if let Some(date) = self.release_date {
            if movie.release_date.is_unknown() {
                movie.set_release_date(ReleaseDate::Known(date));
            }
        }
    }
}

/// Where a candidate external reference for the rating lookup comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingStrategy {
    FeedReference,
    TitleSearch,
}

/// Rating strategies in the order they are tried.
pub fn rating_strategies(has_feed_ref: bool, secondary_search: bool) -> Vec<RatingStrategy> {
    if has_feed_ref {
        let mut strategies = vec![RatingStrategy::FeedReference];
        if secondary_search {
            strategies.push(RatingStrategy::TitleSearch);
        }
        strategies
    } else {
        vec![RatingStrategy::TitleSearch]
    }
}

/// Poster chosen at creation time: the feed's own poster unless it is a
/// placeholder, else the generic fallback image.
pub fn initial_poster(feed_poster: Option<&str>) -> String {
    feed_poster
        .map(str::trim)
        .filter(|uri| !uri.is_empty() && !is_placeholder_poster(uri))
        .unwrap_or(FALLBACK_POSTER_URL)
        .to_string()
}

/// Runs the fallback chains for one movie, recording each resolved field
/// in `enrichment` as soon as it is known. If the caller abandons the future
/// (timeout), everything recorded so far stays valid.
///
/// Rating: strategies are tried in order and the first known rating wins,
/// together with its reference. When none yields a rating, a movie without
/// a feed reference keeps the searched one. Release date: the first valid
/// publication date seen fills an unknown release date. Poster: a
/// placeholder is replaced by a lookup on the feed reference, then on the
/// final reference.
#[instrument(skip(lookup, request, enrichment), fields(movie_id = request.movie_id, title = %request.title))]
pub async fn enrich_movie(lookup: &dyn MovieLookupPort, request: EnrichmentRequest, enrichment: &mut Enrichment) {
    let mut release_known = !request.release_date.is_unknown();
    let mut poster_is_placeholder = is_placeholder_poster(&request.poster_url);
    let mut poster_tried: Option<ExternalRef> = None;

    if poster_is_placeholder && lookup.poster_lookup_enabled() {
        if let Some(feed_ref) = &request.external_ref {
            poster_tried = Some(feed_ref.clone());
            if let Some(url) = lookup.fetch_poster(feed_ref).await {
                poster_is_placeholder = is_placeholder_poster(&url);
                enrichment.poster_url = Some(url);
            }
        }
    }

    let mut tried: Vec<ExternalRef> = Vec::new();
    let strategies = rating_strategies(request.external_ref.is_some(), lookup.secondary_search_enabled());

    for strategy in strategies {
        let candidate = match strategy {
            RatingStrategy::FeedReference => request.external_ref.clone(),
            RatingStrategy::TitleSearch => lookup
                .find_best_match(&request.title)
                .await
                .map(|found| found.external_ref),
        };
        let Some(candidate) = candidate else {
            debug!(?strategy, "No reference from strategy");
            continue;
        };
        if tried.contains(&candidate) {
            continue;
        }
        if request.external_ref.is_none() && enrichment.external_ref.is_none() {
            enrichment.external_ref = Some(candidate.clone());
        }

        let detail = lookup.fetch_detail(&candidate).await;
        tried.push(candidate.clone());

        if !release_known {
            if let Some(date) = detail.published {
                enrichment.release_date = Some(date);
                release_known = true;
            }
        }
        if detail.rating.is_known() {
            debug!(?strategy, external_ref = %candidate, "Rating resolved");
            enrichment.rating = detail.rating;
            if request.external_ref.as_ref() != Some(&candidate) {
                enrichment.external_ref = Some(candidate);
            }
            break;
        }
    }

    if poster_is_placeholder && lookup.poster_lookup_enabled() {
        let final_ref = enrichment.external_ref.clone().or_else(|| request.external_ref.clone());
        if let Some(final_ref) = final_ref.filter(|r| poster_tried.as_ref() != Some(r)) {
            if let Some(url) = lookup.fetch_poster(&final_ref).await {
                enrichment.poster_url = Some(url);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DetailData, SearchMatch};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct MockLookup {
        search: HashMap<String, String>,
        details: HashMap<String, DetailData>,
        posters: HashMap<String, String>,
        credential: bool,
        calls: Mutex<Vec<String>>,
    }

    impl MockLookup {
        fn with_credential() -> Self {
            Self { credential: true, ..Default::default() }
        }

        fn search(mut self, title: &str, external_ref: &str) -> Self {
            self.search.insert(title.to_string(), external_ref.to_string());
            self
        }

        fn detail(mut self, external_ref: &str, rating: Option<&str>, published: Option<(i32, u32, u32)>) -> Self {
            self.details.insert(
                external_ref.to_string(),
                DetailData {
                    rating: rating.map_or(Rating::Unknown, |r| Rating::Known(r.to_string())),
                    published: published.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
                },
            );
            self
        }

        fn poster(mut self, external_ref: &str, url: &str) -> Self {
            self.posters.insert(external_ref.to_string(), url.to_string());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl MovieLookupPort for MockLookup {
        async fn find_best_match(&self, title: &str) -> Option<SearchMatch> {
            self.log(format!("search:{}", title));
            self.search.get(title).map(|id| SearchMatch {
                matched_title: title.to_string(),
                rank: 1,
                external_ref: ExternalRef::parse(id).unwrap(),
            })
        }

        async fn fetch_detail(&self, external_ref: &ExternalRef) -> DetailData {
            self.log(format!("detail:{}", external_ref));
            self.details.get(external_ref.as_str()).cloned().unwrap_or_default()
        }

        async fn fetch_poster(&self, external_ref: &ExternalRef) -> Option<String> {
            self.log(format!("poster:{}", external_ref));
            if !self.credential {
                return None;
            }
            self.posters.get(external_ref.as_str()).cloned()
        }

        fn poster_lookup_enabled(&self) -> bool {
            self.credential
        }

        fn secondary_search_enabled(&self) -> bool {
            self.credential
        }
    }

    fn request(external_ref: Option<&str>, poster: &str) -> EnrichmentRequest {
        EnrichmentRequest {
            movie_id: 1,
            title: "Flow".to_string(),
            external_ref: external_ref.and_then(ExternalRef::parse),
            poster_url: poster.to_string(),
            release_date: ReleaseDate::Unknown,
        }
    }

    async fn enrich(lookup: &MockLookup, request: EnrichmentRequest) -> Enrichment {
        let mut enrichment = Enrichment::default();
        enrich_movie(lookup, request, &mut enrichment).await;
        enrichment
    }

    const REAL_POSTER: &str = "https://img.kino.dk/flow.webp";

    #[test]
    fn test_strategy_order() {
        assert_eq!(rating_strategies(true, true), vec![RatingStrategy::FeedReference, RatingStrategy::TitleSearch]);
        assert_eq!(rating_strategies(true, false), vec![RatingStrategy::FeedReference]);
        assert_eq!(rating_strategies(false, false), vec![RatingStrategy::TitleSearch]);
    }

    #[test]
    fn test_initial_poster() {
        assert_eq!(initial_poster(Some(REAL_POSTER)), REAL_POSTER);
        assert_eq!(initial_poster(None), FALLBACK_POSTER_URL);
        assert_eq!(initial_poster(Some("https://x/no-poster.png")), FALLBACK_POSTER_URL);
    }

    #[tokio::test]
    async fn test_feed_reference_rating_is_used_directly() {
        let lookup = MockLookup::with_credential().detail("tt1", Some("8.1"), Some((2024, 10, 3)));

        let enrichment = enrich(&lookup, request(Some("tt1"), REAL_POSTER)).await;

        assert_eq!(enrichment.rating, Rating::Known("8.1".to_string()));
        assert_eq!(enrichment.external_ref, None);
        assert_eq!(enrichment.poster_url, None);
        assert_eq!(enrichment.release_date, NaiveDate::from_ymd_opt(2024, 10, 3));
        assert_eq!(lookup.calls(), vec!["detail:tt1"]);
    }

    #[tokio::test]
    async fn test_sentinel_rating_triggers_secondary_search() {
        let lookup = MockLookup::with_credential()
            .detail("tt1", None, None)
            .search("Flow", "tt2")
            .detail("tt2", Some("7.9"), None);

        let enrichment = enrich(&lookup, request(Some("tt1"), REAL_POSTER)).await;

        assert_eq!(enrichment.rating.as_display(), "7.9");
        assert_eq!(enrichment.external_ref, ExternalRef::parse("tt2"));
    }

    #[tokio::test]
    async fn test_secondary_search_without_rating_keeps_feed_reference() {
        let lookup = MockLookup::with_credential()
            .detail("tt1", None, None)
            .search("Flow", "tt2")
            .detail("tt2", None, Some((2025, 2, 2)));

        let enrichment = enrich(&lookup, request(Some("tt1"), REAL_POSTER)).await;

        assert_eq!(enrichment.rating, Rating::Unknown);
        assert_eq!(enrichment.external_ref, None);
        assert_eq!(enrichment.release_date, NaiveDate::from_ymd_opt(2025, 2, 2));
    }

    #[tokio::test]
    async fn test_no_secondary_search_without_credential() {
        let lookup = MockLookup::default().detail("tt1", None, None).search("Flow", "tt2");

        let enrichment = enrich(&lookup, request(Some("tt1"), REAL_POSTER)).await;

        assert!(enrichment.is_empty());
        assert_eq!(lookup.calls(), vec!["detail:tt1"]);
    }

    #[tokio::test]
    async fn test_search_hit_for_movie_without_reference() {
        let lookup = MockLookup::with_credential()
            .search("Flow", "tt4772188")
            .detail("tt4772188", Some("7.5"), None)
            .poster("tt4772188", "https://image.tmdb.org/t/p/w500/flow.jpg");

        let enrichment = enrich(&lookup, request(None, FALLBACK_POSTER_URL)).await;

        assert_eq!(enrichment.rating.as_display(), "7.5");
        assert_eq!(enrichment.external_ref, ExternalRef::parse("tt4772188"));
        assert_eq!(enrichment.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/flow.jpg"));
    }

    #[tokio::test]
    async fn test_unresolved_search_ends_task() {
        let lookup = MockLookup::with_credential();

        let enrichment = enrich(&lookup, request(None, FALLBACK_POSTER_URL)).await;

        assert!(enrichment.is_empty());
        assert_eq!(lookup.calls(), vec!["search:Flow"]);
    }

    #[tokio::test]
    async fn test_search_reference_adopted_even_without_rating() {
        let lookup = MockLookup::default().search("Flow", "tt9");

        let enrichment = enrich(&lookup, request(None, REAL_POSTER)).await;

        assert_eq!(enrichment.rating, Rating::Unknown);
        assert_eq!(enrichment.external_ref, ExternalRef::parse("tt9"));
    }

    #[tokio::test]
    async fn test_placeholder_poster_resolved_from_feed_reference_once() {
        let lookup = MockLookup::with_credential()
            .detail("tt1", Some("6.0"), None)
            .poster("tt1", "https://image.tmdb.org/t/p/w500/one.jpg");

        let enrichment = enrich(&lookup, request(Some("tt1"), FALLBACK_POSTER_URL)).await;

        assert_eq!(enrichment.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/one.jpg"));
        let poster_calls = lookup.calls().iter().filter(|c| c.starts_with("poster:")).count();
        assert_eq!(poster_calls, 1);
    }

    #[tokio::test]
    async fn test_poster_retried_with_upgraded_reference() {
        let lookup = MockLookup::with_credential()
            .detail("tt1", None, None)
            .search("Flow", "tt2")
            .detail("tt2", Some("7.0"), None)
            .poster("tt2", "https://image.tmdb.org/t/p/w500/two.jpg");

        let enrichment = enrich(&lookup, request(Some("tt1"), FALLBACK_POSTER_URL)).await;

        assert_eq!(enrichment.poster_url.as_deref(), Some("https://image.tmdb.org/t/p/w500/two.jpg"));
        assert_eq!(
            lookup.calls(),
            vec!["poster:tt1", "detail:tt1", "search:Flow", "detail:tt2", "poster:tt2"]
        );
    }

    #[tokio::test]
    async fn test_known_release_date_not_overwritten() {
        let lookup = MockLookup::default().detail("tt1", Some("5.5"), Some((1999, 1, 1)));
        let mut req = request(Some("tt1"), REAL_POSTER);
        req.release_date = ReleaseDate::Known(NaiveDate::from_ymd_opt(2025, 5, 5).unwrap());

        let enrichment = enrich(&lookup, req).await;

        assert_eq!(enrichment.release_date, None);
    }

    #[test]
    fn test_apply_only_fills_unknown_release_date() {
        let mut movie = CanonicalMovie::new(
            1,
            "Flow".to_string(),
            "flow".to_string(),
            None,
            FALLBACK_POSTER_URL.to_string(),
            ReleaseDate::Known(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()),
        );
        Enrichment {
            rating: Rating::Known("7.2".to_string()),
            external_ref: ExternalRef::parse("tt5"),
            poster_url: Some(REAL_POSTER.to_string()),
            release_date: NaiveDate::from_ymd_opt(1990, 1, 1),
        }
        .apply_to(&mut movie);

        assert_eq!(movie.rating.as_display(), "7.2");
        assert_eq!(movie.external_ref, ExternalRef::parse("tt5"));
        assert_eq!(movie.poster_url, REAL_POSTER);
        assert_eq!(movie.release_date.known(), NaiveDate::from_ymd_opt(2025, 1, 1));
    }
}
