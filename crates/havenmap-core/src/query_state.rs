//! Query-string codec for shareable, bookmarkable search views.
//!
//! Selected facets and the current page mirror into the browser address bar
//! as `serviceType`, `specialisms` (comma-joined), `q`, `radius`, and
//! `page`. Defaults are omitted so an untouched search encodes to an empty
//! string.

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

use crate::search::{SearchQuery, DEFAULT_RADIUS_MILES};

/// Serializes the query into address-bar form. Keys with default values are
/// skipped.
#[must_use]
pub fn encode_query_state(query: &SearchQuery) -> String {
    let mut pairs: Vec<String> = Vec::new();

    if !query.raw_input.trim().is_empty() {
        pairs.push(format!("q={}", encode(query.raw_input.trim())));
    }
    if let Some(service_type) = query.service_type.as_deref() {
        if !service_type.is_empty() {
            pairs.push(format!("serviceType={}", encode(service_type)));
        }
    }
    if !query.specialisms.is_empty() {
        let joined = query
            .specialisms
            .iter()
            .map(|s| encode(s))
            .collect::<Vec<_>>()
            .join(",");
        pairs.push(format!("specialisms={joined}"));
    }
    if (query.radius_miles - DEFAULT_RADIUS_MILES).abs() > f64::EPSILON {
        pairs.push(format!("radius={}", query.radius_miles));
    }
    if query.page > 0 {
        pairs.push(format!("page={}", query.page));
    }

    pairs.join("&")
}

/// Parses an address-bar query string back into a [`SearchQuery`].
///
/// Unknown keys are ignored; malformed values degrade to defaults, matching
/// the rest of the pipeline's never-throw posture toward bad data.
#[must_use]
pub fn parse_query_state(query_string: &str) -> SearchQuery {
    let mut query = SearchQuery::default();

    for pair in query_string.trim_start_matches('?').split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "q" => query.raw_input = decode(value),
            "serviceType" => {
                let decoded = decode(value);
                if !decoded.is_empty() {
                    query.service_type = Some(decoded);
                }
            }
            "specialisms" => {
                query.specialisms = value
                    .split(',')
                    .map(decode)
                    .filter(|s| !s.is_empty())
                    .collect();
            }
            "radius" => {
                if let Ok(radius) = value.parse::<f64>() {
                    query = query.with_radius(radius);
                }
            }
            "page" => query.page = value.parse().unwrap_or(0),
            _ => {}
        }
    }

    query
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, NON_ALPHANUMERIC).to_string()
}

fn decode(value: &str) -> String {
    percent_decode_str(value)
        .decode_utf8()
        .map(|s| s.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_query_encodes_to_empty() {
        assert_eq!(encode_query_state(&SearchQuery::default()), "");
    }

    #[test]
    fn facets_round_trip() {
        let mut query = SearchQuery::new("SW1A 1AA").with_radius(5.0);
        query.service_type = Some("Refuge".to_string());
        query.specialisms = vec!["Women & girls".to_string(), "Children".to_string()];
        query.page = 2;

        let encoded = encode_query_state(&query);
        let parsed = parse_query_state(&encoded);
        assert_eq!(parsed, query);
    }

    #[test]
    fn reserved_characters_survive_the_trip() {
        let query = SearchQuery {
            specialisms: vec!["A&E support".to_string(), "50+, older people".to_string()],
            ..SearchQuery::default()
        };

        let parsed = parse_query_state(&encode_query_state(&query));
        assert_eq!(parsed.specialisms, query.specialisms);
    }

    #[test]
    fn unknown_keys_and_junk_are_ignored() {
        let parsed = parse_query_state("?utm_source=x&page=notanumber&radius=banana&flag");
        assert_eq!(parsed, SearchQuery::default());
    }

    #[test]
    fn leading_question_mark_is_tolerated() {
        let parsed = parse_query_state("?q=refuge&page=1");
        assert_eq!(parsed.raw_input, "refuge");
        assert_eq!(parsed.page, 1);
    }
}
