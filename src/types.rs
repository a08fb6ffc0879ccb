use crate::metrics::record_skipped_entry;
use serde::de::DeserializeOwned;
use serde::{de, Deserialize, Deserializer, Serialize};
use tracing::debug;

/// Identifier assigned by the feed to cinemas and movies.
pub type FeedId = u64;

/// Cinema-grouped showtime feed, as consumed by the reconciler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawFeed {
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub cinemas: Vec<RawCinema>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawCinema {
    #[serde(deserialize_with = "deserialize_feed_id")]
    pub id: FeedId,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub movies: Vec<RawMovie>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawMovie {
    #[serde(deserialize_with = "deserialize_feed_id")]
    pub id: FeedId,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub title: String,
    #[serde(default)]
    pub release_date_text: Option<String>,
    #[serde(default)]
    pub external_ref: Option<String>,
    #[serde(default)]
    pub poster_uri: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub versions: Vec<RawVersion>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawVersion {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub dates: Vec<RawDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawDate {
    pub date: String,
    #[serde(default, deserialize_with = "deserialize_lenient_list")]
    pub showtimes: Vec<RawShowtime>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawShowtime {
    #[serde(deserialize_with = "deserialize_flexible_string")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    pub time: String,
}

/// Accepts ids written either as JSON numbers or as numeric strings.
pub fn deserialize_feed_id<'de, D>(deserializer: D) -> Result<FeedId, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| de::Error::custom(format!("id is not an unsigned integer: {}", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("id is not numeric: {}", s))),
        other => Err(de::Error::custom(format!("unexpected id value: {}", other))),
    }
}

/// Accepts a string or a number and keeps its textual form.
pub fn deserialize_flexible_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected string or number, got {}", other))),
    }
}

/// Reads JSON `null` the same as a missing key.
pub fn deserialize_null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Reads a list entry by entry, dropping entries that do not deserialize.
/// A `null` list reads as empty.
pub fn deserialize_lenient_list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<serde_json::Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                debug!(error = %e, "Dropping malformed feed entry");
                record_skipped_entry();
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_feed_accepts_mixed_id_forms() {
        let feed: RawFeed = serde_json::from_value(json!({
            "cinemas": [{
                "id": "12",
                "name": "Palads",
                "movies": [{
                    "id": 99,
                    "title": "Dune",
                    "versions": [{
                        "label": "IMAX",
                        "dates": [{ "date": "2025-03-01", "showtimes": [{ "id": 555, "time": "19:00" }] }]
                    }]
                }]
            }]
        }))
        .unwrap();

        assert_eq!(feed.cinemas[0].id, 12);
        assert_eq!(feed.cinemas[0].movies[0].id, 99);
        assert_eq!(feed.cinemas[0].movies[0].versions[0].dates[0].showtimes[0].id, "555");
        assert!(feed.cinemas[0].movies[0].external_ref.is_none());
    }

    #[test]
    fn test_non_numeric_id_rejected() {
        let result: Result<RawCinema, _> =
            serde_json::from_value(json!({ "id": "abc", "name": "x" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_null_fields_and_bad_entries_stay_local() {
        let feed: RawFeed = serde_json::from_value(json!({
            "cinemas": [
                {
                    "id": 1,
                    "name": null,
                    "movies": [
                        { "id": 2, "title": "Wicked", "versions": null },
                        { "id": "not-a-number", "title": "Broken" },
                        null,
                        {
                            "id": 3,
                            "title": "Flow",
                            "versions": [{
                                "label": null,
                                "dates": [
                                    { "date": null, "showtimes": [] },
                                    { "date": "2025-03-01", "showtimes": [{ "id": 7, "time": null }, { "id": null }] }
                                ]
                            }]
                        }
                    ]
                },
                { "id": 4, "name": "Grand", "movies": null }
            ]
        }))
        .unwrap();

        assert_eq!(feed.cinemas.len(), 2);
        let movies = &feed.cinemas[0].movies;
        assert_eq!(feed.cinemas[0].name, "");
        assert_eq!(movies.iter().map(|m| m.id).collect::<Vec<_>>(), vec![2, 3]);
        assert!(movies[0].versions.is_empty());
        let dates = &movies[1].versions[0].dates;
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].showtimes.len(), 1);
        assert_eq!(dates[0].showtimes[0].time, "");
        assert!(feed.cinemas[1].movies.is_empty());
    }
}
