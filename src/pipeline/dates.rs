//! Locale-aware release date parsing.
//!
//! Everything past this module handles plain `NaiveDate`s.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;

/// Danish month names, matched on their first three letters.
const DANISH_MONTHS: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("maj", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("okt", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Numeric formats accepted after the locale-specific ones.
const NUMERIC_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

// "5. jun. 2025", "05 okt 2025", "12. marts 2026"
static SHORT_DATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2})\.?\s*([[:alpha:]]+)\.?\s+(\d{4})$").expect("valid regex")
});

/// Parses the feed's premiere text (Danish short date, or a numeric date).
pub fn parse_release_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    parse_danish_short_date(text).or_else(|| parse_numeric_date(text))
}

/// Parses a publication date from the detail service (`YYYY-MM-DD`).
pub fn parse_published_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    // occasionally carries a time component
    let date_part = text.split('T').next().unwrap_or(text);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn parse_danish_short_date(text: &str) -> Option<NaiveDate> {
    let captures = SHORT_DATE_RE.captures(text)?;
    let day: u32 = captures.get(1)?.as_str().parse().ok()?;
    let month_name: String = captures.get(2)?.as_str().to_lowercase().chars().take(3).collect();
    let year: i32 = captures.get(3)?.as_str().parse().ok()?;
    let month = DANISH_MONTHS
        .iter()
        .find(|(name, _)| *name == month_name)
        .map(|(_, number)| *number)?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_numeric_date(text: &str) -> Option<NaiveDate> {
    NUMERIC_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_danish_short_dates() {
        assert_eq!(parse_release_date("5. jun. 2025"), Some(ymd(2025, 6, 5)));
        assert_eq!(parse_release_date("12. okt 2024"), Some(ymd(2024, 10, 12)));
        assert_eq!(parse_release_date("1. maj 2026"), Some(ymd(2026, 5, 1)));
        assert_eq!(parse_release_date("24. December 2025"), Some(ymd(2025, 12, 24)));
        assert_eq!(parse_release_date("3. marts 2025"), Some(ymd(2025, 3, 3)));
    }

    #[test]
    fn test_numeric_fallbacks() {
        assert_eq!(parse_release_date("2025-02-14"), Some(ymd(2025, 2, 14)));
        assert_eq!(parse_release_date("14-02-2025"), Some(ymd(2025, 2, 14)));
    }

    #[test]
    fn test_unparseable_release_dates() {
        assert_eq!(parse_release_date(""), None);
        assert_eq!(parse_release_date("snart"), None);
        assert_eq!(parse_release_date("31. feb. 2025"), None);
        assert_eq!(parse_release_date("5. foo 2025"), None);
    }

    #[test]
    fn test_published_date() {
        assert_eq!(parse_published_date("2024-08-30"), Some(ymd(2024, 8, 30)));
        assert_eq!(parse_published_date("2024-08-30T00:00:00Z"), Some(ymd(2024, 8, 30)));
        assert_eq!(parse_published_date(""), None);
    }
}
