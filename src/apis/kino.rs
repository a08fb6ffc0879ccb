//! Showtime feed client and wire format.

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::error::Result;
use crate::types::{
    deserialize_feed_id, deserialize_flexible_string, deserialize_lenient_list, deserialize_null_default, FeedId, RawCinema, RawDate, RawFeed, RawMovie,
    RawShowtime, RawVersion,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

#[derive(Debug, Default, Deserialize)]
pub struct KinoResponse {
    #[serde(default)]
    pub content: Option<KinoOuter>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoOuter {
    #[serde(default)]
    pub content: Option<KinoInner>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoInner {
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub content: Vec<KinoCinema>,
}

#[derive(Debug, Deserialize)]
pub struct KinoCinema {
    #[serde(deserialize_with = "deserialize_feed_id")]
    pub id: FeedId,
    #[serde(default)]
    pub content: Option<KinoLabel>,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub movies: Vec<KinoMovie>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoLabel {
    #[serde(default)]
    pub label: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct KinoMovie {
    #[serde(deserialize_with = "deserialize_feed_id")]
    pub id: FeedId,
    #[serde(default)]
    pub content: Option<KinoMovieContent>,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub versions: Vec<KinoVersion>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoMovieContent {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub field_premiere: Option<String>,
    #[serde(default)]
    pub field_imdb: Option<String>,
    #[serde(default)]
    pub field_poster: Option<KinoPoster>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoPoster {
    #[serde(default)]
    pub field_media_image: Option<KinoMediaImage>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoMediaImage {
    #[serde(default)]
    pub img_element: Option<KinoImgElement>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoImgElement {
    #[serde(default)]
    pub uri: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct KinoVersion {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub dates: Vec<KinoDate>,
}

#[derive(Debug, Deserialize)]
pub struct KinoDate {
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub showtimes: Vec<KinoShowtime>,
}

#[derive(Debug, Deserialize)]
pub struct KinoShowtime {
    #[serde(deserialize_with = "deserialize_flexible_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub time: String,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl From<KinoResponse> for RawFeed {
    fn from(response: KinoResponse) -> Self {
        let cinemas = response
            .content
            .and_then(|outer| outer.content)
            .map(|inner| inner.content)
            .unwrap_or_default();

        RawFeed {
            cinemas: cinemas.into_iter().map(RawCinema::from).collect(),
        }
    }
}

impl From<KinoCinema> for RawCinema {
    fn from(cinema: KinoCinema) -> Self {
        RawCinema {
            id: cinema.id,
            name: cinema.content.and_then(|c| c.label).unwrap_or_default(),
            movies: cinema.movies.into_iter().map(RawMovie::from).collect(),
        }
    }
}

impl From<KinoMovie> for RawMovie {
    fn from(movie: KinoMovie) -> Self {
        let content = movie.content.unwrap_or_default();
        let poster_uri = content
            .field_poster
            .and_then(|p| p.field_media_image)
            .and_then(|m| m.img_element)
            .and_then(|i| i.uri);

        RawMovie {
            id: movie.id,
            title: content.label.unwrap_or_default(),
            release_date_text: non_blank(content.field_premiere),
            external_ref: non_blank(content.field_imdb),
            poster_uri: non_blank(poster_uri),
            versions: movie
                .versions
                .into_iter()
                .map(|v| RawVersion {
                    label: v.label,
                    dates: v
                        .dates
                        .into_iter()
                        .map(|d| RawDate {
                            date: d.date,
                            showtimes: d
                                .showtimes
                                .into_iter()
                                .map(|s| RawShowtime { id: s.id, time: s.time })
                                .collect(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Parses a saved or fetched feed body.
pub fn parse_feed(bytes: &[u8]) -> Result<RawFeed> {
    let response: KinoResponse = serde_json::from_slice(bytes)?;
    Ok(response.into())
}

pub struct KinoFeedClient {
    http: Arc<dyn HttpClientPort>,
    url: String,
}

impl KinoFeedClient {
    pub fn new(http: Arc<dyn HttpClientPort>, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch_feed(&self) -> Result<RawFeed> {
        let request = HttpRequest::new(&self.url).header("Accept", "application/json");
        let response = self.http.get(&request).await?.error_for_status()?;
        let feed = parse_feed(&response.bytes).map_err(|e| {
            warn!(content_type = %response.content_type, bytes = response.bytes.len(), "Feed body did not parse");
            e
        })?;
        info!(
            cinemas = feed.cinemas.len(),
            movie_entries = feed.cinemas.iter().map(|c| c.movies.len()).sum::<usize>(),
            "Fetched showtime feed"
        );
        Ok(feed)
    }
}
