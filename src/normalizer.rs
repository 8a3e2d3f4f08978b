//! Normalization of generated "famous cities" text into a clean city list
//!
//! Generated text is supposed to be a JSON array of city names but often
//! arrives wrapped in code fences, surrounded by prose, or as a bulleted list.
//! Every parse strategy degrades to the next one; the caller always gets a
//! list, possibly empty.

use crate::reference::ReferenceIndex;
use crate::TripError;
use serde_json::Value;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, instrument, warn};

/// Most city names returned for one request
pub const MAX_CITIES: usize = 12;

const FENCE: &str = "```";

/// Why the strict JSON parse was abandoned in favour of line recovery
#[derive(Error, Debug)]
pub enum CandidateParseError {
    #[error("Candidate text is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Candidate JSON is not an array")]
    NotAnArray,

    #[error("No bracketed array found in candidate text")]
    NoBrackets,
}

/// How the candidates were recovered from the raw text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateSource {
    JsonArray,
    BracketedArray,
    Lines,
}

/// Cleans generated city lists, optionally checking them against the reference index
#[derive(Debug, Clone, Copy)]
pub struct CityListNormalizer<'a> {
    index: &'a ReferenceIndex,
}

impl<'a> CityListNormalizer<'a> {
    pub fn new(index: &'a ReferenceIndex) -> Self {
        Self { index }
    }

    /// Turn raw generated text into at most [`MAX_CITIES`] unique city names
    ///
    /// When `country` is given and the index knows cities for it, only those
    /// cities are kept; if none survive, the country's best-covered cities are
    /// returned instead.
    #[instrument(level = "debug", skip(self, raw), fields(raw_len = raw.len()))]
    pub fn normalize(&self, raw: &str, country: Option<&str>) -> Vec<String> {
        let text = strip_fences(raw.trim());
        let (source, candidates) = extract_candidates(text);
        let cities = dedup_candidates(candidates);
        debug!(?source, candidates = cities.len(), "Candidates extracted");

        let mut cities = match country {
            Some(country) => self.filter_by_country(cities, country),
            None => cities,
        };
        cities.truncate(MAX_CITIES);
        cities
    }

    fn filter_by_country(&self, cities: Vec<String>, country: &str) -> Vec<String> {
        let known = match self.index.cities_for(country) {
            Some(known) if !known.is_empty() => known,
            _ => {
                debug!(country, "No reference cities for country, skipping validation");
                return cities;
            }
        };

        let before = cities.len();
        let filtered: Vec<String> = cities.into_iter().filter(|c| known.contains(c)).collect();
        if filtered.is_empty() {
            warn!(
                country,
                candidates = before,
                "No candidate matched the reference cities, using the most covered cities"
            );
            return self.index.top_cities(country, MAX_CITIES);
        }

        debug!(country, kept = filtered.len(), dropped = before - filtered.len(), "Filtered by country");
        filtered
    }
}

/// Normalize, treating an empty result as "no cities found"
pub fn famous_cities_or_err(
    normalizer: &CityListNormalizer<'_>,
    raw: &str,
    country: Option<&str>,
) -> Result<Vec<String>, TripError> {
    let cities = normalizer.normalize(raw, country);
    if cities.is_empty() {
        return Err(TripError::NoCitiesFound(
            country.map(str::trim).unwrap_or("<any>").to_string(),
        ));
    }
    Ok(cities)
}

/// Drop an opening fence line and, if present, the closing fence line
fn strip_fences(text: &str) -> &str {
    if !text.starts_with(FENCE) {
        return text;
    }

    let body = match text.find('\n') {
        Some(pos) => &text[pos + 1..],
        None => return "",
    };

    let trimmed = body.trim_end();
    match trimmed.rfind('\n') {
        Some(pos) if trimmed[pos + 1..].trim().starts_with(FENCE) => &trimmed[..pos],
        None if trimmed.trim().starts_with(FENCE) => "",
        _ => trimmed,
    }
}

fn extract_candidates(text: &str) -> (CandidateSource, Vec<Value>) {
    let text = text.trim();

    match parse_array(text) {
        Ok(items) => return (CandidateSource::JsonArray, items),
        Err(e) => debug!(error = %e, "Strict JSON parse failed"),
    }

    match bracketed(text).and_then(parse_array) {
        Ok(items) => return (CandidateSource::BracketedArray, items),
        Err(e) => debug!(error = %e, "Bracketed JSON parse failed, recovering from lines"),
    }

    let items = candidate_lines(text).map(|l| Value::String(l.to_string())).collect();
    (CandidateSource::Lines, items)
}

fn parse_array(text: &str) -> Result<Vec<Value>, CandidateParseError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Array(items) => Ok(items),
        _ => Err(CandidateParseError::NotAnArray),
    }
}

/// Slice from the first `[` to the last `]`, inclusive
fn bracketed(text: &str) -> Result<&str, CandidateParseError> {
    match (text.find('['), text.rfind(']')) {
        (Some(start), Some(end)) if start < end => Ok(&text[start..=end]),
        _ => Err(CandidateParseError::NoBrackets),
    }
}

fn candidate_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| matches!(c, '-' | '•' | '*') || c.is_whitespace())
                .trim_end()
        })
        .filter(|line| {
            !line.is_empty()
                && !line.starts_with('[')
                && !line.starts_with('`')
                && !line.eq_ignore_ascii_case("json")
        })
}

fn candidate_to_string(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Trim, drop empties and keep the first occurrence of each name
fn dedup_candidates(candidates: Vec<Value>) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter_map(candidate_to_string)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::AirportRecord;

    fn normalize(raw: &str) -> Vec<String> {
        CityListNormalizer::new(&ReferenceIndex::empty()).normalize(raw, None)
    }

    fn france_index() -> ReferenceIndex {
        ReferenceIndex::from_records(vec![
            AirportRecord::new("Lyon", "France", "LYS", "Lyon Saint-Exupéry Airport"),
        ])
    }

    #[test]
    fn test_fenced_json_array() {
        let raw = "```json\n[\"Paris\", \"Lyon\", \"Paris\"]\n```";
        assert_eq!(normalize(raw), vec!["Paris", "Lyon"]);
    }

    #[test]
    fn test_fence_without_closing_marker() {
        let raw = "```json\n[\"Kyoto\", \"Osaka\"]";
        assert_eq!(normalize(raw), vec!["Kyoto", "Osaka"]);
    }

    #[test]
    fn test_plain_json_array_trims_entries() {
        assert_eq!(normalize("  [\" Rome \", \"\", \"Milan\"]  "), vec!["Rome", "Milan"]);
    }

    #[test]
    fn test_array_inside_prose() {
        let raw = "Sure! Here are the cities: [\"Lisbon\", \"Porto\"] Enjoy your trip.";
        assert_eq!(normalize(raw), vec!["Lisbon", "Porto"]);
    }

    #[test]
    fn test_bulleted_fallback() {
        assert_eq!(normalize("- Paris\n- Lyon\n- json\n"), vec!["Paris", "Lyon"]);
        assert_eq!(
            normalize("* Seville\n• Granada\n  -  Malaga  \n\n"),
            vec!["Seville", "Granada", "Malaga"]
        );
    }

    #[test]
    fn test_fallback_skips_brackets_and_backticks() {
        let raw = "[\"Oslo\",\n\"Bergen\"\n`note`\nJSON";
        assert_eq!(normalize(raw), vec!["\"Bergen\""]);
    }

    #[test]
    fn test_non_string_candidates_are_coerced() {
        assert_eq!(normalize("[\"Nice\", 7, null, true]"), vec!["Nice", "7", "true"]);
    }

    #[test]
    fn test_object_is_not_an_array() {
        let raw = "{\"cities\": [\"Hanoi\", \"Hue\"]}";
        assert_eq!(normalize(raw), vec!["Hanoi", "Hue"]);
    }

    #[test]
    fn test_caps_at_twelve() {
        let names: Vec<String> = (1..=20).map(|i| format!("\"City{}\"", i)).collect();
        let raw = format!("[{}]", names.join(","));
        let cities = normalize(&raw);
        assert_eq!(cities.len(), MAX_CITIES);
        assert_eq!(cities[0], "City1");
        assert_eq!(cities[11], "City12");
    }

    #[test]
    fn test_garbage_and_empty_input() {
        assert!(normalize("").is_empty());
        assert!(normalize("   \n ").is_empty());
        assert!(normalize("```").is_empty());
        assert!(normalize("```json\n```").is_empty());
    }

    #[test]
    fn test_country_filter() {
        let index = france_index();
        let normalizer = CityListNormalizer::new(&index);
        assert_eq!(
            normalizer.normalize("[\"Paris\", \"Lyon\"]", Some("France")),
            vec!["Lyon"]
        );
    }

    #[test]
    fn test_unknown_country_does_not_filter() {
        let index = france_index();
        let normalizer = CityListNormalizer::new(&index);
        assert_eq!(
            normalizer.normalize("[\"Paris\", \"Lyon\"]", Some("Peru")),
            vec!["Paris", "Lyon"]
        );
    }

    #[test]
    fn test_country_fallback_to_top_cities() {
        let index = ReferenceIndex::from_records(vec![
            AirportRecord::new("Osaka", "Japan", "KIX", "Kansai International Airport"),
            AirportRecord::new("Tokyo", "Japan", "HND", "Haneda Airport"),
            AirportRecord::new("Tokyo", "Japan", "NRT", "Narita International Airport"),
            AirportRecord::new("Osaka", "Japan", "ITM", "Osaka International Airport"),
            AirportRecord::new("Sapporo", "Japan", "CTS", "New Chitose Airport"),
        ]);
        let normalizer = CityListNormalizer::new(&index);
        assert_eq!(
            normalizer.normalize("[\"Atlantis\"]", Some("Japan")),
            vec!["Osaka", "Tokyo", "Sapporo"]
        );
    }

    #[test]
    fn test_famous_cities_or_err() {
        let index = ReferenceIndex::empty();
        let normalizer = CityListNormalizer::new(&index);
        assert!(matches!(
            famous_cities_or_err(&normalizer, "nothing useful", None),
            Ok(ref cities) if cities == &vec!["nothing useful".to_string()]
        ));
        match famous_cities_or_err(&normalizer, "[]", Some(" Chile ")) {
            Err(TripError::NoCitiesFound(country)) => assert_eq!(country, "Chile"),
            other => panic!("expected NoCitiesFound, got {:?}", other),
        }
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(strip_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_fences("```\n[1]\n```\n\n"), "[1]");
        assert_eq!(strip_fences("[1]"), "[1]");
    }
}
