//! Feed reconciliation: one canonical movie per feed id, with enrichment
//! fanned out over a bounded set of tasks.

use crate::app::ports::MovieLookupPort;
use crate::config::EnrichmentConfig;
use crate::domain::{CanonicalMovie, ExternalRef, ReleaseDate};
use crate::metrics::{record_enrichment, record_reconciled, record_skipped_entry};
use crate::pipeline::dates::parse_release_date;
use crate::pipeline::enrich::{enrich_movie, initial_poster, Enrichment, EnrichmentRequest};
use crate::pipeline::showtimes::build_cinema_showings;
use crate::pipeline::sort::sort_by_release;
use crate::pipeline::title::slugify;
use crate::types::{FeedId, RawCinema, RawFeed, RawMovie};
use chrono::NaiveDateTime;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

pub struct Reconciler {
    lookup: Arc<dyn MovieLookupPort>,
    concurrency: usize,
    task_timeout: Duration,
}

impl Reconciler {
    pub fn new(lookup: Arc<dyn MovieLookupPort>, config: &EnrichmentConfig) -> Self {
        Self::with_limits(lookup, config.concurrency, config.task_timeout())
    }

    pub fn with_limits(lookup: Arc<dyn MovieLookupPort>, concurrency: usize, task_timeout: Duration) -> Self {
        Self {
            lookup,
            concurrency: concurrency.max(1),
            task_timeout,
        }
    }

    /// Merges the feed into canonical movies in first-encounter order.
    ///
    /// Entries with an empty title are dropped. A movie's showings for a
    /// cinema are replaced wholesale each time that cinema lists it again.
    /// Returns only after every enrichment task has finished or timed out.
    #[instrument(skip_all, fields(cinemas = feed.cinemas.len()))]
    pub async fn reconcile(&self, feed: &RawFeed) -> Vec<CanonicalMovie> {
        let mut movies: HashMap<FeedId, CanonicalMovie> = HashMap::new();
        let mut order: Vec<FeedId> = Vec::new();
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<(FeedId, Enrichment)> = JoinSet::new();

        for cinema in &feed.cinemas {
            for raw in &cinema.movies {
                if raw.title.trim().is_empty() {
                    debug!(cinema_id = cinema.id, movie_id = raw.id, "Skipping untitled feed entry");
                    record_skipped_entry();
                    continue;
                }

                if let Entry::Vacant(slot) = movies.entry(raw.id) {
                    let movie = new_canonical_movie(raw);
                    self.spawn_enrichment(&mut tasks, permits.clone(), EnrichmentRequest::for_movie(&movie));
                    order.push(raw.id);
                    slot.insert(movie);
                }

                if let Some(movie) = movies.get_mut(&raw.id) {
                    attach_showings(movie, cinema, raw);
                }
            }
        }

        debug!(movies = order.len(), "Feed traversed, awaiting enrichment");
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((movie_id, enrichment)) => {
                    if let Some(movie) = movies.get_mut(&movie_id) {
                        enrichment.apply_to(movie);
                    }
                }
                Err(e) => warn!(error = %e, "Enrichment task aborted"),
            }
        }

        let reconciled: Vec<CanonicalMovie> = order.into_iter().filter_map(|id| movies.remove(&id)).collect();
        record_reconciled(reconciled.len());
        info!(movies = reconciled.len(), "Reconciled feed");
        reconciled
    }

    /// [`reconcile`](Self::reconcile) followed by release ordering relative to `now`.
    pub async fn reconcile_sorted(&self, feed: &RawFeed, now: NaiveDateTime) -> Vec<CanonicalMovie> {
        let movies = self.reconcile(feed).await;
        sort_by_release(movies, now)
    }

    fn spawn_enrichment(
        &self,
        tasks: &mut JoinSet<(FeedId, Enrichment)>,
        permits: Arc<Semaphore>,
        request: EnrichmentRequest,
    ) {
        let lookup = self.lookup.clone();
        let task_timeout = self.task_timeout;
        tasks.spawn(async move {
            let movie_id = request.movie_id;
            let title = request.title.clone();
            // The semaphore is never closed.
            let _permit = permits.acquire_owned().await.ok();
            let mut enrichment = Enrichment::default();
            let finished = tokio::time::timeout(
                task_timeout,
                enrich_movie(lookup.as_ref(), request, &mut enrichment),
            )
            .await
            .is_ok();
            if !finished {
                warn!(
                    movie_id,
                    title = %title,
                    timeout_secs = task_timeout.as_secs_f64(),
                    kept_partial = !enrichment.is_empty(),
                    "Enrichment timed out"
                );
            }
            record_enrichment(enrichment.rating.is_known(), !finished);
            (movie_id, enrichment)
        });
    }
}

fn new_canonical_movie(raw: &RawMovie) -> CanonicalMovie {
    let release_date: ReleaseDate = raw
        .release_date_text
        .as_deref()
        .and_then(parse_release_date)
        .into();
    CanonicalMovie::new(
        raw.id,
        raw.title.clone(),
        slugify(&raw.title),
        raw.external_ref.as_deref().and_then(ExternalRef::parse),
        initial_poster(raw.poster_uri.as_deref()),
        release_date,
    )
}

fn attach_showings(movie: &mut CanonicalMovie, cinema: &RawCinema, raw: &RawMovie) {
    let showings = build_cinema_showings(cinema.id, &cinema.name, &raw.versions);
    if movie.cinemas.contains_key(&cinema.id) {
        debug!(movie_id = raw.id, cinema_id = cinema.id, "Cinema listed the movie again, replacing its showings");
    }
    debug!(movie_id = raw.id, cinema_id = cinema.id, showings = showings.showing_count(), "Attached showings");
    movie.attach_cinema(showings);
}
