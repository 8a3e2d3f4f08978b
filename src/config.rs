//! Runtime configuration shared by the binaries

use crate::resolver::ResolverMode;
use crate::TripError;
use std::path::PathBuf;

pub const DATASET_ENV: &str = "TRIP_PLANNER_DATASET";
pub const RESOLVER_MODE_ENV: &str = "TRIP_PLANNER_RESOLVER_MODE";
pub const LOG_DIR_ENV: &str = "TRIP_PLANNER_LOG_DIR";

/// Relative path the dataset conversion tool writes to by default
pub const DEFAULT_DATASET_PATH: &str = "data/iata_codes_full.json";

#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub dataset_path: PathBuf,
    /// `None` picks the mode from the dataset layout
    pub resolver_mode: Option<ResolverMode>,
    pub log_dir: Option<PathBuf>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            resolver_mode: None,
            log_dir: None,
        }
    }
}

impl PlannerConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, TripError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through `lookup`; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, TripError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(DATASET_ENV) {
            config.dataset_path = PathBuf::from(path.trim());
        }
        config.resolver_mode = get(RESOLVER_MODE_ENV)
            .map(|mode| mode.parse::<ResolverMode>())
            .transpose()?;
        config.log_dir = get(LOG_DIR_ENV).map(|dir| PathBuf::from(dir.trim()));

        Ok(config)
    }
}
