use crate::constants::{SHOWTIME_LINK_BASE, VERSION_LABEL_TAGS};
use crate::domain::{CinemaShowings, Showing};
use crate::types::{FeedId, RawVersion};
use std::collections::BTreeMap;

/// Suffix for every showtime under a version, e.g. `" - IMAX - Danish"`.
///
/// Tags are emitted in table order regardless of where they occur in the label.
pub fn version_suffix(label: Option<&str>) -> String {
    let Some(label) = label else {
        return String::new();
    };
    VERSION_LABEL_TAGS
        .iter()
        .filter(|(needle, _)| label.contains(needle))
        .map(|(_, shown)| format!(" - {}", shown))
        .collect()
}

pub fn showtime_link(showtime_id: &str) -> String {
    format!("{}{}", SHOWTIME_LINK_BASE, showtime_id)
}

/// Builds one cinema's showings for a movie from its version blocks.
pub fn build_cinema_showings(
    cinema_id: FeedId,
    cinema_name: &str,
    versions: &[RawVersion],
) -> CinemaShowings {
    let mut showings_by_date: BTreeMap<String, Vec<Showing>> = BTreeMap::new();

    for version in versions {
        let suffix = version_suffix(version.label.as_deref());
        for date in &version.dates {
            for showtime in &date.showtimes {
                showings_by_date
                    .entry(date.date.clone())
                    .or_default()
                    .push(Showing {
                        link: showtime_link(&showtime.id),
                        time_label: format!("{}{}", showtime.time, suffix),
                    });
            }
        }
    }

    CinemaShowings {
        cinema_id,
        cinema_name: cinema_name.to_string(),
        showings_by_date,
    }
}
