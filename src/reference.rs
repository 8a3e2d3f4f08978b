//! Reference index built once from the airport dataset
//!
//! The index is read-only after construction and is shared by the
//! [`LocationResolver`](crate::LocationResolver) and the
//! [`CityListNormalizer`](crate::CityListNormalizer). A failed load yields an
//! empty index; both consumers treat that as "no reference data".

use crate::dataset::{load_dataset, AirportDataset, AirportRecord, DatasetError, DatasetLayout};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{info, warn};

/// Airport record with its case-folded search keys
#[derive(Debug, Clone)]
pub(crate) struct IndexedAirport {
    pub(crate) record: AirportRecord,
    pub(crate) city_key: String,
    pub(crate) name_key: String,
}

/// In-memory lookup structures over the airport dataset
#[derive(Debug, Clone)]
pub struct ReferenceIndex {
    layout: DatasetLayout,
    airports: Vec<IndexedAirport>,
    country_to_cities: HashMap<String, BTreeSet<String>>,
    country_city_frequency: HashMap<(String, String), usize>,
}

impl Default for ReferenceIndex {
    fn default() -> Self {
        Self::empty()
    }
}

impl ReferenceIndex {
    /// Index with no records; every lookup comes back empty
    pub fn empty() -> Self {
        Self {
            layout: DatasetLayout::Records,
            airports: Vec::new(),
            country_to_cities: HashMap::new(),
            country_city_frequency: HashMap::new(),
        }
    }

    /// Load the dataset at `path`, falling back to an empty index on any failure
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(index) => index,
            Err(e) => {
                let cause = match &e {
                    DatasetError::Io(_) => "io",
                    DatasetError::Json(_) => "json",
                    DatasetError::UnexpectedShape(_) => "shape",
                    DatasetError::Csv(_) => "csv",
                };
                warn!(
                    path = %path.display(),
                    cause,
                    error = %e,
                    "Reference dataset unavailable, continuing with an empty index"
                );
                Self::empty()
            }
        }
    }

    /// Load the dataset at `path`, surfacing the typed failure
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        load_dataset(path).map(Self::from_dataset)
    }

    pub fn from_dataset(dataset: AirportDataset) -> Self {
        let mut index = Self::from_records(dataset.records);
        index.layout = dataset.layout;
        index
    }

    /// Build from airport records, keeping their order for first-match lookups
    pub fn from_records(records: Vec<AirportRecord>) -> Self {
        let mut country_to_cities: HashMap<String, BTreeSet<String>> = HashMap::new();
        let mut country_city_frequency: HashMap<(String, String), usize> = HashMap::new();

        let airports: Vec<IndexedAirport> = records
            .into_iter()
            .map(|record| {
                if !record.country.is_empty() && !record.city.is_empty() {
                    country_to_cities
                        .entry(record.country.clone())
                        .or_default()
                        .insert(record.city.clone());
                    *country_city_frequency
                        .entry((record.country.clone(), record.city.clone()))
                        .or_insert(0) += 1;
                }
                IndexedAirport {
                    city_key: record.city.trim().to_lowercase(),
                    name_key: record.name.to_lowercase(),
                    record,
                }
            })
            .collect();

        info!(
            airports = airports.len(),
            countries = country_to_cities.len(),
            "Reference index built"
        );

        Self {
            layout: DatasetLayout::Records,
            airports,
            country_to_cities,
            country_city_frequency,
        }
    }

    /// Build from a flat `city -> code` list, as the older dataset layout provides
    pub fn from_city_codes<I, S, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, C)>,
        S: Into<String>,
        C: Into<String>,
    {
        let records = pairs
            .into_iter()
            .map(|(city, code)| AirportRecord {
                city: city.into(),
                code: code.into(),
                ..Default::default()
            })
            .collect();
        let mut index = Self::from_records(records);
        index.layout = DatasetLayout::CityCodeMap;
        index
    }

    pub fn layout(&self) -> DatasetLayout {
        self.layout
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }

    pub fn len(&self) -> usize {
        self.airports.len()
    }

    pub fn country_count(&self) -> usize {
        self.country_to_cities.len()
    }

    /// Records in dataset order
    pub fn records(&self) -> impl Iterator<Item = &AirportRecord> {
        self.airports.iter().map(|a| &a.record)
    }

    pub(crate) fn airports(&self) -> &[IndexedAirport] {
        &self.airports
    }

    /// Distinct city names recorded under `country`
    ///
    /// The country is trimmed and matched exactly, then case-insensitively.
    pub fn cities_for(&self, country: &str) -> Option<&BTreeSet<String>> {
        self.country_key(country)
            .and_then(|key| self.country_to_cities.get(key))
    }

    /// Number of airport records sharing this `(country, city)` pair
    pub fn city_frequency(&self, country: &str, city: &str) -> usize {
        self.country_key(country)
            .and_then(|key| {
                self.country_city_frequency
                    .get(&(key.to_string(), city.to_string()))
            })
            .copied()
            .unwrap_or(0)
    }

    /// Cities of `country` ranked by airport count, descending, then by name
    pub fn top_cities(&self, country: &str, limit: usize) -> Vec<String> {
        let Some(key) = self.country_key(country) else {
            return Vec::new();
        };
        let Some(cities) = self.country_to_cities.get(key) else {
            return Vec::new();
        };

        let mut ranked: Vec<(&String, usize)> = cities
            .iter()
            .map(|city| {
                let count = self
                    .country_city_frequency
                    .get(&(key.to_string(), city.clone()))
                    .copied()
                    .unwrap_or(0);
                (city, count)
            })
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

        ranked
            .into_iter()
            .take(limit)
            .map(|(city, _)| city.clone())
            .collect()
    }

    fn country_key(&self, country: &str) -> Option<&str> {
        let country = country.trim();
        if country.is_empty() {
            return None;
        }
        if let Some((key, _)) = self.country_to_cities.get_key_value(country) {
            return Some(key.as_str());
        }
        let folded = country.to_lowercase();
        self.country_to_cities
            .keys()
            .find(|key| key.to_lowercase() == folded)
            .map(|key| key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> ReferenceIndex {
        ReferenceIndex::from_records(vec![
            AirportRecord::new("Paris", "France", "CDG", "Charles de Gaulle International Airport"),
            AirportRecord::new("Paris", "France", "ORY", "Paris-Orly Airport"),
            AirportRecord::new("Paris", "France", "LBG", "Paris-Le Bourget Airport"),
            AirportRecord::new("Lyon", "France", "LYS", "Lyon Saint-Exupéry Airport"),
            AirportRecord::new("Nice", "France", "NCE", "Nice-Côte d'Azur Airport"),
            AirportRecord::new("Bordeaux", "France", "BOD", "Bordeaux-Mérignac Airport"),
            AirportRecord::new("Lyon", "France", "LYN", "Lyon-Bron Airport"),
            AirportRecord::new("", "France", "XCR", "Châlons Vatry Airport"),
            AirportRecord::new("Berlin", "Germany", "BER", "Berlin Brandenburg Airport"),
        ])
    }

    #[test]
    fn test_country_index_collects_distinct_cities() {
        let index = sample_index();
        let cities = index.cities_for("France").unwrap();
        let cities: Vec<&str> = cities.iter().map(String::as_str).collect();
        assert_eq!(cities, vec!["Bordeaux", "Lyon", "Nice", "Paris"]);
        assert_eq!(index.country_count(), 2);
        assert_eq!(index.len(), 9);
    }

    #[test]
    fn test_country_lookup_trims_and_folds_case() {
        let index = sample_index();
        assert!(index.cities_for("  france ").is_some());
        assert!(index.cities_for("GERMANY").is_some());
        assert!(index.cities_for("Spain").is_none());
        assert!(index.cities_for("   ").is_none());
    }

    #[test]
    fn test_city_frequency_counts_airports() {
        let index = sample_index();
        assert_eq!(index.city_frequency("France", "Paris"), 3);
        assert_eq!(index.city_frequency("France", "Lyon"), 2);
        assert_eq!(index.city_frequency("France", "Berlin"), 0);
    }

    #[test]
    fn test_top_cities_order() {
        let index = sample_index();
        assert_eq!(
            index.top_cities("France", 12),
            vec!["Paris", "Lyon", "Bordeaux", "Nice"]
        );
        assert_eq!(index.top_cities("France", 2), vec!["Paris", "Lyon"]);
        assert!(index.top_cities("Atlantis", 12).is_empty());
    }

    #[test]
    fn test_empty_index() {
        let index = ReferenceIndex::empty();
        assert!(index.is_empty());
        assert!(index.cities_for("France").is_none());
        assert!(index.top_cities("France", 12).is_empty());
    }

    #[test]
    fn test_load_missing_file_degrades_to_empty() {
        let index = ReferenceIndex::load("/definitely/not/here.json");
        assert!(index.is_empty());
        assert_eq!(index.country_count(), 0);
    }

    #[test]
    fn test_city_code_layout() {
        let index = ReferenceIndex::from_city_codes(vec![("Delhi", "DEL"), ("Bangkok", "BKK")]);
        assert_eq!(index.layout(), DatasetLayout::CityCodeMap);
        assert_eq!(index.len(), 2);
        assert_eq!(index.country_count(), 0);
    }
}
