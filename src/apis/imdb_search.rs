//! Fuzzy title search against the IMDb suggestion endpoint.

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::constants::IMDB_SEARCH_BASE;
use crate::domain::{ExternalRef, SearchMatch};
use crate::error::{Result, ShowingsError};
use crate::metrics::{record_lookup, LookupOutcome};
use crate::pipeline::title::clean_for_search;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Url;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const MOVIE_CATEGORY: &str = "movie";

// "A (B)": lazy first part, greedy parenthetical
static PARENTHETICAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(.*?)\((.*)\)").expect("valid regex"));

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionResponse {
    #[serde(default)]
    pub d: Vec<Suggestion>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Suggestion {
    #[serde(default)]
    pub id: String,
    /// Display label
    #[serde(default)]
    pub l: String,
    /// Category tag ("movie", "tvSeries", ...)
    #[serde(default)]
    pub qid: Option<String>,
    #[serde(default)]
    pub rank: Option<i64>,
    /// Release year
    #[serde(default)]
    pub y: Option<i32>,
}

/// Splits `"A (B)"` into its two trimmed phrases. Returns `None` when the
/// title has no complete parenthetical or either phrase is blank.
pub fn split_parenthetical(title: &str) -> Option<(String, String)> {
    let captures = PARENTHETICAL_RE.captures(title)?;
    let first = captures.get(1)?.as_str().trim();
    let second = captures.get(2)?.as_str().trim();
    if first.is_empty() || second.is_empty() {
        return None;
    }
    Some((first.to_string(), second.to_string()))
}

/// Picks the best movie candidate for `phrase`.
///
/// Newest first, the first candidate whose folded title equals the folded
/// query or is contained in it wins; otherwise the most relevant (lowest
/// rank) candidate. Non-movie categories never match.
pub fn pick_best(phrase: &str, suggestions: Vec<Suggestion>) -> Option<SearchMatch> {
    let mut movies: Vec<Suggestion> = suggestions
        .into_iter()
        .filter(|s| s.qid.as_deref() == Some(MOVIE_CATEGORY))
        .filter(|s| ExternalRef::parse(&s.id).is_some())
        .collect();
    if movies.is_empty() {
        return None;
    }

    let query = clean_for_search(phrase);
    movies.sort_by(|a, b| b.y.unwrap_or(0).cmp(&a.y.unwrap_or(0)));

    let chosen = movies
        .iter()
        .find(|s| {
            let candidate = clean_for_search(&s.l);
            !candidate.is_empty() && (candidate == query || query.contains(&candidate))
        })
        .or_else(|| movies.iter().min_by_key(|s| s.rank.unwrap_or(i64::MAX)))?;

    Some(SearchMatch {
        matched_title: chosen.l.clone(),
        rank: chosen.rank.unwrap_or(i64::MAX),
        external_ref: ExternalRef::parse(&chosen.id)?,
    })
}

pub struct ImdbSearchClient {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl ImdbSearchClient {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self::with_base_url(http, IMDB_SEARCH_BASE)
    }

    pub fn with_base_url(http: Arc<dyn HttpClientPort>, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.to_string(),
        }
    }

    fn suggestion_url(&self, phrase: &str) -> Result<String> {
        let mut url = Url::parse(&self.base_url).map_err(|e| ShowingsError::Api {
            message: format!("bad search base url {}: {}", self.base_url, e),
        })?;
        url.path_segments_mut()
            .map_err(|_| ShowingsError::Api {
                message: format!("search base url cannot take path segments: {}", self.base_url),
            })?
            .pop_if_empty()
            .push(&format!("{}.json", phrase));
        url.set_query(Some("includeVideos=0"));
        Ok(url.to_string())
    }

    pub async fn try_suggest(&self, phrase: &str) -> Result<Vec<Suggestion>> {
        let request = HttpRequest::new(self.suggestion_url(phrase)?).header("Accept", "application/json");
        let response = self.http.get(&request).await?.error_for_status()?;
        let parsed: SuggestionResponse = response.json()?;
        Ok(parsed.d)
    }

    /// Single-phrase resolution. Failures resolve to `None`.
    pub async fn search_phrase(&self, phrase: &str) -> Option<SearchMatch> {
        match self.try_suggest(phrase).await {
            Ok(suggestions) => {
                let best = pick_best(phrase, suggestions);
                let outcome = if best.is_some() { LookupOutcome::Hit } else { LookupOutcome::Miss };
                record_lookup("search", outcome);
                best
            }
            Err(e) => {
                warn!(phrase, error = %e, "Title search failed");
                record_lookup("search", LookupOutcome::Error);
                None
            }
        }
    }

    /// Resolves a feed title, disambiguating `"A (B)"` titles by requiring
    /// both phrases to agree and otherwise trusting the first phrase.
    #[instrument(skip(self))]
    pub async fn find_best_match(&self, title: &str) -> Option<SearchMatch> {
        let Some((first, second)) = split_parenthetical(title) else {
            return self.search_phrase(title.trim()).await;
        };

        let first_match = self.search_phrase(&first).await;
        let second_match = self.search_phrase(&second).await;
        if let (Some(a), Some(b)) = (&first_match, &second_match) {
            if a.external_ref == b.external_ref {
                debug!(external_ref = %a.external_ref, "Both title phrases agree");
            }
        }
        first_match
    }
}
