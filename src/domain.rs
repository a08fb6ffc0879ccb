//! Canonical records produced by the reconciler.
//!
//! Unknown values are modelled explicitly (`Rating::Unknown`,
//! `ReleaseDate::Unknown`, `Option<ExternalRef>`) and only turn into the
//! `"?"` / `"1900-01-01"` / `""` sentinels when serialized.

use crate::constants::{RELEASE_DISPLAY_FORMAT, UNKNOWN_DISPLAY_DATE, UNKNOWN_RELEASE_DATE, UNRESOLVED_RATING};
use crate::types::FeedId;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

static TITLE_ID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"tt\d+").expect("valid regex"));

/// Third-party title identifier (an IMDb `tt` id).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ExternalRef(String);

impl ExternalRef {
    /// Extracts a reference from a bare id or a title URL. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == UNRESOLVED_RATING {
            return None;
        }
        let id = TITLE_ID_RE
            .find(trimmed)
            .map(|m| m.as_str())
            .unwrap_or(trimmed);
        Some(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExternalRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Rating {
    Known(String),
    #[default]
    Unknown,
}

impl Rating {
    pub fn is_known(&self) -> bool {
        matches!(self, Rating::Known(_))
    }

    pub fn as_display(&self) -> &str {
        match self {
            Rating::Known(value) => value,
            Rating::Unknown => UNRESOLVED_RATING,
        }
    }
}

impl Serialize for Rating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_display())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReleaseDate {
    Known(NaiveDate),
    #[default]
    Unknown,
}

impl ReleaseDate {
    pub fn known(&self) -> Option<NaiveDate> {
        match self {
            ReleaseDate::Known(date) => Some(*date),
            ReleaseDate::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, ReleaseDate::Unknown)
    }

    pub fn display(&self) -> String {
        match self {
            ReleaseDate::Known(date) => date.format(RELEASE_DISPLAY_FORMAT).to_string(),
            ReleaseDate::Unknown => UNKNOWN_DISPLAY_DATE.to_string(),
        }
    }
}

impl From<Option<NaiveDate>> for ReleaseDate {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(ReleaseDate::Unknown, ReleaseDate::Known)
    }
}

impl Serialize for ReleaseDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ReleaseDate::Known(date) => serializer.serialize_str(&date.format("%Y-%m-%d").to_string()),
            ReleaseDate::Unknown => serializer.serialize_str(UNKNOWN_RELEASE_DATE),
        }
    }
}

/// One bookable showing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Showing {
    pub link: String,
    pub time_label: String,
}

/// Showings of one movie at one cinema, keyed by date string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CinemaShowings {
    pub cinema_id: FeedId,
    pub cinema_name: String,
    pub showings_by_date: BTreeMap<String, Vec<Showing>>,
}

impl CinemaShowings {
    pub fn showing_count(&self) -> usize {
        self.showings_by_date.values().map(Vec::len).sum()
    }
}

/// The deduplicated record for one feed movie id.
#[derive(Debug, Clone, Serialize)]
pub struct CanonicalMovie {
    pub feed_id: FeedId,
    pub title: String,
    pub slug_id: String,
    #[serde(serialize_with = "serialize_external_ref")]
    pub external_ref: Option<ExternalRef>,
    pub rating: Rating,
    pub poster_url: String,
    pub release_date: ReleaseDate,
    pub display_release_date: String,
    pub cinemas: BTreeMap<FeedId, CinemaShowings>,
}

impl CanonicalMovie {
    pub fn new(
        feed_id: FeedId,
        title: String,
        slug_id: String,
        external_ref: Option<ExternalRef>,
        poster_url: String,
        release_date: ReleaseDate,
    ) -> Self {
        Self {
            feed_id,
            title,
            slug_id,
            external_ref,
            rating: Rating::Unknown,
            poster_url,
            display_release_date: release_date.display(),
            release_date,
            cinemas: BTreeMap::new(),
        }
    }

    pub fn set_release_date(&mut self, release_date: ReleaseDate) {
        self.release_date = release_date;
        self.display_release_date = release_date.display();
    }

    /// Replaces this cinema's entry wholesale; other cinemas are untouched.
    pub fn attach_cinema(&mut self, showings: CinemaShowings) {
        self.cinemas.insert(showings.cinema_id, showings);
    }
}

fn serialize_external_ref<S: Serializer>(
    external_ref: &Option<ExternalRef>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(external_ref.as_ref().map_or("", ExternalRef::as_str))
}

/// Best title-search candidate for a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchMatch {
    pub matched_title: String,
    pub rank: i64,
    pub external_ref: ExternalRef,
}

/// Rating and publication date read from the detail service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DetailData {
    pub rating: Rating,
    pub published: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_external_ref_parse_forms() {
        assert_eq!(ExternalRef::parse("tt0111161").unwrap().as_str(), "tt0111161");
        assert_eq!(
            ExternalRef::parse("https://www.imdb.com/title/tt15239678/?ref_=x").unwrap().as_str(),
            "tt15239678"
        );
        assert!(ExternalRef::parse("  ").is_none());
        assert!(ExternalRef::parse("?").is_none());
    }

    #[test]
    fn test_sentinels_only_at_serialization() {
        let movie = CanonicalMovie::new(
            7,
            "Flow".to_string(),
            "flow".to_string(),
            None,
            "poster".to_string(),
            ReleaseDate::Unknown,
        );

        let value = serde_json::to_value(&movie).unwrap();

        assert_eq!(value["rating"], json!("?"));
        assert_eq!(value["release_date"], json!("1900-01-01"));
        assert_eq!(value["display_release_date"], json!("?"));
        assert_eq!(value["external_ref"], json!(""));
        assert_eq!(value["cinemas"], json!({}));
    }

    #[test]
    fn test_set_release_date_recomputes_display() {
        let mut movie = CanonicalMovie::new(
            1,
            "Flow".to_string(),
            "flow".to_string(),
            None,
            String::new(),
            ReleaseDate::Unknown,
        );
        movie.set_release_date(ReleaseDate::Known(NaiveDate::from_ymd_opt(2024, 10, 3).unwrap()));
        assert_eq!(movie.display_release_date, "03. Oct. 2024");
    }

    #[test]
    fn test_release_date_display() {
        let date = ReleaseDate::Known(NaiveDate::from_ymd_opt(2025, 6, 5).unwrap());
        assert_eq!(date.display(), "05. Jun. 2025");
        assert_eq!(ReleaseDate::Unknown.display(), "?");
    }

    #[test]
    fn test_cinemas_serialize_keyed_by_id() {
        let mut movie = CanonicalMovie::new(
            1,
            "Flow".to_string(),
            "flow".to_string(),
            ExternalRef::parse("tt4772188"),
            String::new(),
            ReleaseDate::Unknown,
        );
        movie.attach_cinema(CinemaShowings {
            cinema_id: 42,
            cinema_name: "Grand".to_string(),
            showings_by_date: BTreeMap::new(),
        });

        let value = serde_json::to_value(&movie).unwrap();
        assert_eq!(value["cinemas"]["42"]["cinema_name"], json!("Grand"));
        assert_eq!(value["external_ref"], json!("tt4772188"));
    }
}
