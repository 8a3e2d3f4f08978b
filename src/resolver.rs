//! City name / airport code resolution
//!
//! Resolution runs a fixed sequence of stages and the first stage that
//! produces a match wins:
//!
//! 1. direct code: a trimmed input of exactly three ASCII letters is returned
//!    uppercased without looking at the dataset (staged mode only)
//! 2. exact city name, case-insensitive
//! 3. city name prefix, case-insensitive
//! 4. airport name substring, case-insensitive (staged mode only)
//!
//! Within a stage the first record in dataset order wins.

use crate::dataset::DatasetLayout;
use crate::reference::{IndexedAirport, ReferenceIndex};
use crate::TripError;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, instrument};

/// Outcome of resolving one location input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedLocation {
    Code(String),
    Unresolved,
}

impl ResolvedLocation {
    pub fn code(&self) -> Option<&str> {
        match self {
            ResolvedLocation::Code(code) => Some(code),
            ResolvedLocation::Unresolved => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, ResolvedLocation::Code(_))
    }

    pub fn into_option(self) -> Option<String> {
        match self {
            ResolvedLocation::Code(code) => Some(code),
            ResolvedLocation::Unresolved => None,
        }
    }
}

impl fmt::Display for ResolvedLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolvedLocation::Code(code) => write!(f, "{}", code),
            ResolvedLocation::Unresolved => write!(f, "unresolved"),
        }
    }
}

/// Which matching stages the resolver runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverMode {
    /// Direct code, exact city, city prefix, airport name
    Staged,
    /// Exact city and city prefix only, for `city -> code` datasets
    Flat,
}

impl ResolverMode {
    pub fn for_layout(layout: DatasetLayout) -> Self {
        match layout {
            DatasetLayout::Records => ResolverMode::Staged,
            DatasetLayout::CityCodeMap => ResolverMode::Flat,
        }
    }
}

impl FromStr for ResolverMode {
    type Err = TripError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "staged" | "full" => Ok(ResolverMode::Staged),
            "flat" | "minimal" => Ok(ResolverMode::Flat),
            _ => Err(TripError::InvalidMode(s.to_string())),
        }
    }
}

/// Stage that produced a match, reported in debug logs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MatchStage {
    DirectCode,
    ExactCity,
    CityPrefix,
    AirportName,
}

/// Resolves free-text locations against a [`ReferenceIndex`]
#[derive(Debug, Clone, Copy)]
pub struct LocationResolver<'a> {
    index: &'a ReferenceIndex,
    mode: ResolverMode,
}

impl<'a> LocationResolver<'a> {
    /// Resolver whose mode follows the dataset layout
    pub fn new(index: &'a ReferenceIndex) -> Self {
        Self {
            index,
            mode: ResolverMode::for_layout(index.layout()),
        }
    }

    pub fn with_mode(mut self, mode: ResolverMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> ResolverMode {
        self.mode
    }

    /// Resolve a city name, airport name or airport code to a 3-letter code
    #[instrument(level = "debug", skip(self), fields(mode = ?self.mode))]
    pub fn resolve(&self, input: &str) -> ResolvedLocation {
        let input = input.trim();
        if input.is_empty() {
            return ResolvedLocation::Unresolved;
        }

        match self.find(input) {
            Some((stage, code)) => {
                debug!(?stage, code = %code, "Location resolved");
                ResolvedLocation::Code(code)
            }
            None => {
                debug!("No match for location");
                ResolvedLocation::Unresolved
            }
        }
    }

    fn find(&self, input: &str) -> Option<(MatchStage, String)> {
        // A 3-letter input is always a code, even when a city has that name
        if self.mode == ResolverMode::Staged && is_airport_code(input) {
            return Some((MatchStage::DirectCode, input.to_ascii_uppercase()));
        }

        let query = input.to_lowercase();
        let airports = self.index.airports();

        let found = first_code(airports, |a| a.city_key == query)
            .map(|code| (MatchStage::ExactCity, code))
            .or_else(|| {
                first_code(airports, |a| a.city_key.starts_with(&query))
                    .map(|code| (MatchStage::CityPrefix, code))
            });
        if found.is_some() || self.mode == ResolverMode::Flat {
            return found;
        }

        first_code(airports, |a| a.name_key.contains(&query))
            .map(|code| (MatchStage::AirportName, code))
    }
}

fn first_code<F>(airports: &[IndexedAirport], matches: F) -> Option<String>
where
    F: Fn(&IndexedAirport) -> bool,
{
    airports
        .iter()
        .find(|a| matches(a))
        .map(|a| a.record.code.trim().to_uppercase())
}

/// Exactly three ASCII letters
pub fn is_airport_code(input: &str) -> bool {
    input.len() == 3 && input.bytes().all(|b| b.is_ascii_alphabetic())
}

/// Resolve both ends of a trip, failing on the first input that has no match
pub fn resolve_route(
    resolver: &LocationResolver<'_>,
    origin: &str,
    destination: &str,
) -> Result<(String, String), TripError> {
    let origin_code = resolver
        .resolve(origin)
        .into_option()
        .ok_or_else(|| TripError::UnresolvedLocation(origin.trim().to_string()))?;
    let destination_code = resolver
        .resolve(destination)
        .into_option()
        .ok_or_else(|| TripError::UnresolvedLocation(destination.trim().to_string()))?;
    Ok((origin_code, destination_code))
}
