//! ETL configuration.
//!
//! Defaults are embedded from `etl.toml` at compile time. A file on disk
//! with the same layout can replace them wholesale.

use std::path::{Path, PathBuf};

use conflict_map_geography_models::ReferenceFields;
use serde::{Deserialize, Serialize};

use crate::EtlError;

const DEFAULT_CONFIG: &str = include_str!("../etl.toml");

/// Raw input dataset paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPaths {
    /// Conflict-episode CSV.
    pub episodes: PathBuf,
    /// Geocoded event CSV.
    pub events: PathBuf,
    /// Country reference polygons (`GeoJSON`).
    pub reference: PathBuf,
}

/// Processed dataset paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputPaths {
    /// Per country-year polygon dataset.
    pub countries: PathBuf,
    /// Per-event point dataset.
    pub events: PathBuf,
}

/// Store connection and index names used by `load`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store base URL.
    pub host: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Index receiving event documents.
    pub events_index: String,
    /// Index receiving country documents.
    pub countries_index: String,
}

/// Complete ETL configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EtlConfig {
    /// Raw inputs.
    pub input: InputPaths,
    /// Processed outputs.
    pub output: OutputPaths,
    /// Reference name fields.
    pub reference: ReferenceFields,
    /// Store settings.
    pub store: StoreConfig,
}

impl EtlConfig {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`EtlError::Config`] if the document is malformed.
    pub fn parse(source: &str) -> Result<Self, EtlError> {
        Ok(toml::from_str(source)?)
    }

    /// Reads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`EtlError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Returns the embedded default configuration.
    ///
    /// # Panics
    ///
    /// Panics if the embedded `etl.toml` is malformed.
    #[must_use]
    pub fn embedded() -> Self {
        Self::parse(DEFAULT_CONFIG)
            .unwrap_or_else(|e| panic!("Failed to parse embedded etl.toml: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_parses() {
        let config = EtlConfig::embedded();
        assert_eq!(config.reference, ReferenceFields::default());
        assert_eq!(config.store.events_index, "conflicts");
        assert_eq!(config.store.countries_index, "conflict_countries");
        assert_eq!(
            config.output.countries,
            PathBuf::from("data/processed/conflict_countries.geojson")
        );
    }

    #[test]
    fn rejects_incomplete_config() {
        assert!(matches!(
            EtlConfig::parse("[input]\nepisodes = \"a.csv\"\n"),
            Err(EtlError::Config(_))
        ));
    }

    #[test]
    fn custom_reference_fields() {
        let source = DEFAULT_CONFIG.replace("NAME_LONG", "NAME_EN");
        let config = EtlConfig::parse(&source).unwrap();
        assert_eq!(config.reference.secondary, "NAME_EN");
    }
}
