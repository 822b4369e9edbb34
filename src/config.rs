//! Configuration Management
//!
//! Settings come from an optional JSON file, overridden by command-line
//! flags, and are resolved once into a read-only [`RunConfig`].

use crate::model::Location;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Email prefix of service accounts created by the storage automation
pub const DEFAULT_SERVICE_ACCOUNT_PREFIX: &str = "vsa-sa-gcnv";

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Projects to sweep, in order
    pub projects: Vec<String>,
    /// Report only, issue no deletes
    pub dry_run: bool,
    /// Only touch zonal resources in these zones (empty = all)
    pub zones: Vec<String>,
    /// Only touch regional resources in these regions (empty = all)
    pub regions: Vec<String>,
    pub service_account_prefix: String,
    /// Let the sweeper empty and delete buckets
    pub allow_bucket_deletion: bool,
    pub poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            projects: Vec::new(),
            dry_run: true,
            zones: Vec::new(),
            regions: Vec::new(),
            service_account_prefix: DEFAULT_SERVICE_ACCOUNT_PREFIX.to_string(),
            allow_bucket_deletion: false,
            poll_interval_ms: 2000,
        }
    }
}

/// Values given on the command line; they win over the file
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub projects: Vec<String>,
    pub dry_run: Option<bool>,
    pub zones: Vec<String>,
    pub regions: Vec<String>,
    pub service_account_prefix: Option<String>,
    pub allow_bucket_deletion: bool,
}

impl Config {
    /// Default config file path
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("gcp-sweep").join("config.json"))
    }

    /// Load configuration from an explicit path, or the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// Merge command-line overrides and resolve the run configuration.
    ///
    /// Projects: CLI > config file > `default_project`.
    pub fn resolve(self, overrides: Overrides, default_project: Option<String>) -> Result<RunConfig> {
        let projects = if !overrides.projects.is_empty() {
            overrides.projects
        } else if !self.projects.is_empty() {
            self.projects
        } else {
            default_project.into_iter().collect()
        };

        if projects.is_empty() {
            return Err(anyhow::anyhow!(
                "No GCP project configured. Use --project, add \"projects\" to the config file, or set GOOGLE_CLOUD_PROJECT"
            ));
        }

        let pick = |cli: Vec<String>, file: Vec<String>| if cli.is_empty() { file } else { cli };

        Ok(RunConfig {
            projects,
            dry_run: overrides.dry_run.unwrap_or(self.dry_run),
            zones: pick(overrides.zones, self.zones),
            regions: pick(overrides.regions, self.regions),
            service_account_prefix: overrides
                .service_account_prefix
                .unwrap_or(self.service_account_prefix),
            allow_bucket_deletion: overrides.allow_bucket_deletion || self.allow_bucket_deletion,
            poll_interval: Duration::from_millis(self.poll_interval_ms),
        })
    }
}

/// Settings for one run, fixed before the first project is touched
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub projects: Vec<String>,
    pub dry_run: bool,
    pub zones: Vec<String>,
    pub regions: Vec<String>,
    pub service_account_prefix: String,
    pub allow_bucket_deletion: bool,
    pub poll_interval: Duration,
}

impl RunConfig {
    /// Dry-run configuration for a list of projects
    pub fn new(projects: Vec<String>) -> Self {
        Self {
            projects,
            dry_run: true,
            zones: Vec::new(),
            regions: Vec::new(),
            service_account_prefix: DEFAULT_SERVICE_ACCOUNT_PREFIX.to_string(),
            allow_bucket_deletion: false,
            poll_interval: Duration::from_millis(2000),
        }
    }

    pub fn zone_allowed(&self, zone: &str) -> bool {
        self.zones.is_empty() || self.zones.iter().any(|z| z == zone)
    }

    pub fn region_allowed(&self, region: &str) -> bool {
        self.regions.is_empty() || self.regions.iter().any(|r| r == region)
    }

    pub fn location_allowed(&self, location: &Location) -> bool {
        match location {
            Location::Zone(zone) => self.zone_allowed(zone),
            Location::Region(region) => self.region_allowed(region),
        }
    }
}
