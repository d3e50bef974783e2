//! Run configuration: rank order and classifier formats.
//!
//! Defaults are compiled in from `config/defaults.json`. A user JSON file may
//! replace the rank order and add or replace classifier formats by name.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::rank::{RankOrder, RankOrderError};
use crate::parsing::classifier::{ClassifierFormat, ClassifierRegistry};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid rank order: {0}")]
    Ranks(#[from] RankOrderError),
}

/// Config version for compatibility checking
pub const CONFIG_VERSION: &str = "1.0.0";

/// Serializable configuration file. Every field is optional in user files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ranks: Option<RankOrder>,

    #[serde(default)]
    pub classifiers: Vec<ClassifierFormat>,
}

/// Effective configuration for a run
#[derive(Debug, Clone)]
pub struct Config {
    pub ranks: RankOrder,
    pub classifiers: ClassifierRegistry,
}

impl Config {
    /// Load the embedded default configuration
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the embedded JSON is invalid.
    pub fn load_embedded() -> Result<Self, ConfigError> {
        // Validated at compile time via build.rs
        const EMBEDDED_CONFIG: &str = include_str!("../config/defaults.json");
        Self::from_json(EMBEDDED_CONFIG)
    }

    /// Parse a complete configuration; missing ranks fall back to the default order
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` for invalid JSON or an invalid rank list.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let data: ConfigData = serde_json::from_str(json)?;

        if let Some(version) = &data.version {
            if version != CONFIG_VERSION {
                debug!(
                    "Config version mismatch: expected {}, got {}",
                    CONFIG_VERSION, version
                );
            }
        }

        Ok(Self {
            ranks: data.ranks.unwrap_or_default(),
            classifiers: ClassifierRegistry::new(data.classifiers),
        })
    }

    /// Merge a user configuration file over this one
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadError` if the file cannot be read or
    /// `ConfigError::ParseError` if it is not valid JSON.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let data: ConfigData = serde_json::from_str(&content)?;
        self.merge(data);
        debug!("Merged config from {}", path.display());
        Ok(())
    }

    /// Apply user settings: ranks replace, classifiers add or replace by name
    pub fn merge(&mut self, data: ConfigData) {
        if let Some(ranks) = data.ranks {
            self.ranks = ranks;
        }
        for format in data.classifiers {
            self.classifiers.insert(format);
        }
    }

    /// Replace the rank order from a comma-separated list
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Ranks` if the list is empty or repeats a rank.
    pub fn override_ranks(&mut self, list: &str) -> Result<(), ConfigError> {
        self.ranks = RankOrder::parse_list(list)?;
        Ok(())
    }

    /// Embedded defaults plus optional user file and rank overrides, in that order
    ///
    /// # Errors
    ///
    /// Returns any error from the individual steps.
    pub fn resolve(config_file: Option<&Path>, ranks: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = Self::load_embedded()?;
        if let Some(path) = config_file {
            config.merge_file(path)?;
        }
        if let Some(list) = ranks {
            config.override_ranks(list)?;
        }
        Ok(config)
    }
}
