/// Upstream endpoints and fixed lookup tables shared across the crate.

// Feed source
pub const KINO_FEED_URL: &str =
    "https://api.kino.dk/ticketflow/showtimes?format=json&region=content&city=24-41-70-55&sort=alphabetical";
pub const SHOWTIME_LINK_BASE: &str = "https://kino.dk/ticketflow/showtimes/";
pub const FALLBACK_POSTER_URL: &str = "https://api.kino.dk/sites/kino.dk/files/styles/isg_focal_point_348_522/public/2023-05/Kino-fallback-poster.webp?h=6c02f54b&itok=14CuSSHm";

/// Substrings that mark a poster URL as a generic placeholder.
pub const PLACEHOLDER_POSTER_PATTERNS: [&str; 3] = ["Kino-fallback-poster", "default_poster", "no-poster"];

// External metadata services
pub const IMDB_SEARCH_BASE: &str = "https://v3.sg.media-imdb.com/suggestion/x/";
pub const IMDB_TITLE_BASE: &str = "https://www.imdb.com/title/";
pub const TMDB_FIND_BASE: &str = "https://api.themoviedb.org/3/find/";
pub const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/87.0.4280.88 Safari/537.36";

/// Ordered (label substring, display suffix) pairs applied to version labels.
pub const VERSION_LABEL_TAGS: [(&str, &str); 4] = [
    ("IMAX", "IMAX"),
    ("3D", "3D"),
    ("Dansk", "Danish"),
    ("Engelsk", "English"),
];

/// Locale letters folded into ASCII digraphs when building slugs.
pub const SLUG_LETTER_SUBSTITUTIONS: [(char, &str); 3] = [('æ', "ae"), ('ø', "oe"), ('å', "aa")];

// Output sentinels
pub const UNRESOLVED_RATING: &str = "?";
pub const UNKNOWN_RELEASE_DATE: &str = "1900-01-01";
pub const UNKNOWN_DISPLAY_DATE: &str = "?";

/// English display form of a release date, e.g. `05. Jun. 2025`.
pub const RELEASE_DISPLAY_FORMAT: &str = "%d. %b. %Y";

pub fn is_placeholder_poster(url: &str) -> bool {
    PLACEHOLDER_POSTER_PATTERNS.iter().any(|p| url.contains(p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_poster_counts_as_placeholder() {
        assert!(is_placeholder_poster(FALLBACK_POSTER_URL));
        assert!(!is_placeholder_poster("https://image.tmdb.org/t/p/w500/abc.jpg"));
    }
}
