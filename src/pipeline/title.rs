//! Title normalization: stable slugs and search-friendly folded titles.

use crate::constants::SLUG_LETTER_SUBSTITUTIONS;
use unicode_normalization::UnicodeNormalization;

/// Builds the stable `[a-z0-9-]` identifier for a title.
///
/// Lowercases, folds the Danish letters into digraphs, drops everything
/// outside `[a-z0-9\s-]`, turns whitespace runs into one hyphen, collapses
/// repeated hyphens and trims hyphens from both ends.
pub fn slugify(title: &str) -> String {
    let mut folded = String::with_capacity(title.len());
    for c in title.to_lowercase().chars() {
        match SLUG_LETTER_SUBSTITUTIONS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => folded.push_str(to),
            None => folded.push(c),
        }
    }

    let mut slug = String::with_capacity(folded.len());
    let mut pending_hyphen = false;
    for c in folded.chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
        // anything else is dropped without breaking a hyphen run
    }
    slug
}

/// Decomposes to NFD, strips combining diacritical marks and lowercases.
pub fn clean_for_search(title: &str) -> String {
    title
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .collect::<String>()
        .to_lowercase()
}
