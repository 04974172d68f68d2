//! UK postcode shape classification.
//!
//! "Postcode-shaped" means the input matches the canonical UK pattern —
//! outward code of 1–2 letters, 1–2 digits, and an optional trailing letter,
//! then an optional space and an inward code of one digit plus two letters.
//! `GIR 0AA` is accepted as a historical special case. Shape validity says
//! nothing about whether the postcode exists; that is the geocoder's call.

use std::sync::LazyLock;

use regex::Regex;

static POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(gir\s?0aa|[a-z]{1,2}[0-9]{1,2}[a-z]?\s?[0-9][a-z]{2})$")
        .expect("valid postcode regex")
});

/// Returns `true` if the trimmed input matches the UK postcode shape.
#[must_use]
pub fn is_postcode_shaped(input: &str) -> bool {
    POSTCODE_RE.is_match(input.trim())
}

/// Uppercases and strips internal whitespace, the form the lookup API wants
/// in its URL path. Call only on postcode-shaped input.
#[must_use]
pub fn compact(input: &str) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}
