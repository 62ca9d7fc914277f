//! Pipeline configuration.
//!
//! Loaded from TOML; every field has a default so an empty file (or no file)
//! describes the standard three-series EIA pipeline. Credentials never live
//! in the file: they come from the environment when the component that needs
//! them starts.

use oilregime_core::domain::{Domain, TableLocation, Tier};
use oilregime_core::transform::InvalidDatePolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Connection string for the relational sink.
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("environment variable {0} is required")]
    MissingEnv(&'static str),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// One upstream series and the tables it feeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Short name: `prices`, `supply`, `storage`. Also the `source_type`
    /// column value and the table-name suffix.
    pub name: String,
    pub series_id: String,
    pub domain: Domain,
}

impl SourceConfig {
    pub fn new(name: &str, series_id: &str, domain: Domain) -> Self {
        Self {
            name: name.to_string(),
            series_id: series_id.to_string(),
            domain,
        }
    }

    /// `{tier}_eia_{name}`, e.g. `silver_eia_prices`.
    pub fn table(&self, tier: Tier) -> TableLocation {
        TableLocation::new(tier, format!("{}_eia_{}", tier.as_str(), self.name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tier roots are `{data_root}/bronze`, `{data_root}/silver`, `{data_root}/gold`.
    pub data_root: PathBuf,
    /// Commodity label written with every sink row.
    pub commodity: String,
    pub invalid_dates: InvalidDatePolicy,
    pub sources: Vec<SourceConfig>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("data"),
            commodity: "wti".to_string(),
            invalid_dates: InvalidDatePolicy::default(),
            sources: vec![
                SourceConfig::new("prices", "PET.RWTC.D", Domain::Price),
                SourceConfig::new("supply", "PET.MCRFPUS2.W", Domain::Supply),
                SourceConfig::new("storage", "PET.WCESTUS1.W", Domain::Storage),
            ],
        }
    }
}

impl PipelineConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.commodity.trim().is_empty() {
            return Err(ConfigError::Invalid("commodity must not be empty".into()));
        }
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("at least one source is required".into()));
        }
        let mut seen = HashSet::new();
        for source in &self.sources {
            let valid_name = !source.name.is_empty()
                && source
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid_name {
                return Err(ConfigError::Invalid(format!(
                    "source name {:?} must be non-empty [A-Za-z0-9_]",
                    source.name
                )));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name {:?}",
                    source.name
                )));
            }
            if source.series_id.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "source {:?} has an empty series_id",
                    source.name
                )));
            }
        }
        Ok(())
    }

    pub fn source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}

/// Read `DATABASE_URL`. Absent or blank is a hard failure for the sink only.
pub fn database_url() -> Result<String, ConfigError> {
    std::env::var(DATABASE_URL_VAR)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingEnv(DATABASE_URL_VAR))
}
