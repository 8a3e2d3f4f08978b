//! # Rust Trip Planner
//!
//! Location handling for a travel-planning request broker. Free-text origins
//! and destinations are resolved to 3-letter airport codes before flight and
//! hotel searches, and generated "famous cities" text is cleaned into a
//! validated city list. Both work over a [`ReferenceIndex`] built once from a
//! static airport dataset.
//!
//! ```rust
//! use rust_trip_planner::{AirportRecord, CityListNormalizer, LocationResolver, ReferenceIndex, ResolvedLocation};
//!
//! let index = ReferenceIndex::from_records(vec![
//!     AirportRecord::new("Paris", "France", "PAR", "Paris Metropolitan Area"),
//!     AirportRecord::new("Lyon", "France", "LYS", "Lyon Saint-Exupéry Airport"),
//! ]);
//!
//! let resolver = LocationResolver::new(&index);
//! assert_eq!(resolver.resolve("paris"), ResolvedLocation::Code("PAR".to_string()));
//!
//! let normalizer = CityListNormalizer::new(&index);
//! let cities = normalizer.normalize("```json\n[\"Paris\", \"Nantes\"]\n```", Some("France"));
//! assert_eq!(cities, vec!["Paris"]);
//! ```

pub mod config;
pub mod dataset;
pub mod logging;
pub mod normalizer;
pub mod reference;
pub mod resolver;

use thiserror::Error;

// Re-export main types for convenience
pub use config::PlannerConfig;
pub use dataset::{AirportDataset, AirportRecord, DatasetError, DatasetLayout};
pub use normalizer::{famous_cities_or_err, CandidateParseError, CityListNormalizer, MAX_CITIES};
pub use reference::ReferenceIndex;
pub use resolver::{resolve_route, LocationResolver, ResolvedLocation, ResolverMode};

/// Error types for caller-facing operations
#[derive(Error, Debug)]
pub enum TripError {
    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Could not resolve location: {0}")]
    UnresolvedLocation(String),

    #[error("No cities found for: {0}")]
    NoCitiesFound(String),

    #[error("Invalid resolver mode: {0}")]
    InvalidMode(String),
}
