//! Rating and publication date from IMDb title pages.

use crate::app::ports::{HttpClientPort, HttpRequest};
use crate::constants::{BROWSER_USER_AGENT, IMDB_TITLE_BASE};
use crate::domain::{DetailData, ExternalRef, Rating};
use crate::error::{Result, ShowingsError};
use crate::metrics::{record_lookup, LookupOutcome};
use crate::pipeline::dates::parse_published_date;
use scraper::{Html, Selector};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Extracts rating and publication date from the page's JSON-LD block.
pub fn parse_detail_html(html: &str) -> Result<DetailData> {
    let document = Html::parse_document(html);
    let selector = Selector::parse(r#"script[type="application/ld+json"]"#)
        .map_err(|e| ShowingsError::Api { message: format!("invalid selector: {:?}", e) })?;

    let block = document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>())
        .filter(|text| !text.trim().is_empty())
        .ok_or_else(|| ShowingsError::MissingField("ld+json block".into()))?;

    let json: Value = serde_json::from_str(block.trim())?;

    let rating = json
        .get("aggregateRating")
        .and_then(|r| r.get("ratingValue"))
        .and_then(rating_text)
        .map_or(Rating::Unknown, Rating::Known);

    let published = json
        .get("datePublished")
        .and_then(Value::as_str)
        .and_then(parse_published_date);

    Ok(DetailData { rating, published })
}

fn rating_text(value: &Value) -> Option<String> {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(f) if f.fract() == 0.0 && f.abs() < 1e15 => Some(format!("{}", f as i64)),
            _ => Some(n.to_string()),
        },
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

pub struct ImdbDetailClient {
    http: Arc<dyn HttpClientPort>,
    base_url: String,
}

impl ImdbDetailClient {
    pub fn new(http: Arc<dyn HttpClientPort>) -> Self {
        Self {
            http,
            base_url: IMDB_TITLE_BASE.to_string(),
        }
    }

    fn title_url(&self, external_ref: &ExternalRef) -> String {
        format!("{}{}/", self.base_url, external_ref)
    }

    pub async fn try_fetch_detail(&self, external_ref: &ExternalRef) -> Result<DetailData> {
        let request = HttpRequest::new(self.title_url(external_ref))
            .header("User-Agent", BROWSER_USER_AGENT)
            .header("Accept", "text/html,application/json");
        let response = self.http.get(&request).await?.error_for_status()?;
        parse_detail_html(&response.text())
    }

    /// Best effort: any failure yields an unknown rating and no date.
    #[instrument(skip(self), fields(external_ref = %external_ref))]
    pub async fn fetch_detail(&self, external_ref: &ExternalRef) -> DetailData {
        match self.try_fetch_detail(external_ref).await {
            Ok(detail) => {
                let outcome = if detail.rating.is_known() { LookupOutcome::Hit } else { LookupOutcome::Miss };
                record_lookup("detail", outcome);
                detail
            }
            Err(e) if e.is_not_found() => {
                debug!("Title page not found");
                record_lookup("detail", LookupOutcome::Miss);
                DetailData::default()
            }
            Err(e) => {
                warn!(error = %e, "Failed to fetch title detail");
                record_lookup("detail", LookupOutcome::Error);
                DetailData::default()
            }
        }
    }
}
