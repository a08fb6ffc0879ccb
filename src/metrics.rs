//! Pipeline counters.
//!
//! Recorded through the `metrics` facade. Nothing is exported unless the
//! embedding application installs a recorder.

use metrics::{counter, histogram};

/// Outcome label for one external lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    Hit,
    Miss,
    Error,
}

impl LookupOutcome {
    fn as_str(self) -> &'static str {
        match self {
            LookupOutcome::Hit => "hit",
            LookupOutcome::Miss => "miss",
            LookupOutcome::Error => "error",
        }
    }
}

pub fn record_feed_fetch(success: bool, duration_secs: f64) {
    let outcome = if success { "success" } else { "error" };
    counter!("kino_feed_fetches_total", "outcome" => outcome).increment(1);
    histogram!("kino_feed_fetch_duration_seconds").record(duration_secs);
}

pub fn record_lookup(service: &'static str, outcome: LookupOutcome) {
    counter!("kino_lookups_total", "service" => service, "outcome" => outcome.as_str()).increment(1);
}

pub fn record_skipped_entry() {
    counter!("kino_feed_entries_skipped_total").increment(1);
}

pub fn record_enrichment(rating_resolved: bool, timed_out: bool) {
    let outcome = match (timed_out, rating_resolved) {
        (true, _) => "timeout",
        (false, true) => "resolved",
        (false, false) => "unresolved",
    };
    counter!("kino_enrichments_total", "outcome" => outcome).increment(1);
}

pub fn record_reconciled(movies: usize) {
    histogram!("kino_reconciled_movies").record(movies as f64);
}
