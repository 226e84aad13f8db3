//! Configuration Management
//!
//! Optional JSON config file with defaults for the CLI. Command-line flags
//! win over the file, and the file wins over gcloud/environment defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// User configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Project to describe
    pub project: Option<String>,
    /// Region stamped on regional records
    pub region: Option<String>,
    /// Zone for zonal resource kinds
    pub zone: Option<String>,
    /// Resource kinds described when none are given on the command line
    pub kinds: Vec<String>,
    /// Base URL overrides, keyed by service name
    pub endpoints: HashMap<String, String>,
    /// How many describe calls may run at once
    pub concurrency: Option<usize>,
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-inventory").join("config.json"))
    }

    /// Load from `path`, or from the default location.
    ///
    /// A missing file yields defaults; an unreadable or malformed one is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Effective project (config > environment/gcloud default)
    pub fn effective_project(&self) -> Option<String> {
        self.project
            .clone()
            .or_else(crate::gcp::auth::get_default_project)
    }

    /// Effective zone (config > environment/gcloud default)
    pub fn effective_zone(&self) -> Option<String> {
        self.zone.clone().or_else(crate::gcp::auth::get_default_zone)
    }

    /// Effective region (config > zone's region > environment/gcloud default)
    pub fn effective_region(&self) -> Option<String> {
        self.region
            .clone()
            .or_else(|| {
                self.zone
                    .as_deref()
                    .map(crate::gcp::auth::region_of_zone)
            })
            .or_else(crate::gcp::auth::get_default_region)
    }
}
