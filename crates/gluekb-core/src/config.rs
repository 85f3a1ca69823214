//! Harvest configuration (gluekb.toml and environment)
//!
//! Two values are mandatory: the bucket every snapshot is written to and the
//! role assumed to reach the catalog, query and storage services. Both may
//! come from a TOML file or from the environment; environment variables win.

use crate::model::DEFAULT_CATALOG_NAME;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable holding the target bucket
pub const BUCKET_NAME_VAR: &str = "BUCKET_NAME";

/// Environment variable holding the role to assume
pub const ASSUME_ROLE_ARN_VAR: &str = "ASSUME_ROLE_ARN";

/// Environment variable overriding the catalog name
pub const CATALOG_NAME_VAR: &str = "GLUEKB_CATALOG_NAME";

/// Unvalidated settings as read from file and environment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestSettings {
    /// Target bucket for all snapshots
    #[serde(default)]
    pub bucket_name: Option<String>,

    /// Role assumed to access the services
    #[serde(default)]
    pub assume_role_arn: Option<String>,

    /// Catalog name used in fully-qualified table names
    #[serde(default = "default_catalog_name")]
    pub catalog_name: String,
}

fn default_catalog_name() -> String {
    DEFAULT_CATALOG_NAME.to_string()
}

impl Default for HarvestSettings {
    fn default() -> Self {
        Self {
            bucket_name: None,
            assume_role_arn: None,
            catalog_name: default_catalog_name(),
        }
    }
}

impl HarvestSettings {
    /// Create settings with both required values set
    pub fn new(bucket_name: impl Into<String>, assume_role_arn: impl Into<String>) -> Self {
        Self {
            bucket_name: Some(bucket_name.into()),
            assume_role_arn: Some(assume_role_arn.into()),
            catalog_name: default_catalog_name(),
        }
    }

    /// Set the catalog name
    pub fn with_catalog_name(mut self, catalog_name: impl Into<String>) -> Self {
        self.catalog_name = catalog_name.into();
        self
    }

    /// Load settings from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        Self::from_toml(&contents)
    }

    /// Load settings from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Read settings from the process environment only
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Override fields with any values present in the process environment
    pub fn merge_env(self) -> Self {
        self.merge_lookup(|name| std::env::var(name).ok())
    }

    /// Override fields with values returned by `lookup`
    ///
    /// Empty values are ignored, as if the variable were unset.
    pub fn merge_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let present = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(bucket) = present(BUCKET_NAME_VAR) {
            self.bucket_name = Some(bucket);
        }
        if let Some(role) = present(ASSUME_ROLE_ARN_VAR) {
            self.assume_role_arn = Some(role);
        }
        if let Some(catalog) = present(CATALOG_NAME_VAR) {
            self.catalog_name = catalog;
        }
        self
    }

    /// Check that both required values are present
    ///
    /// The bucket is checked first, so when both are missing the error names
    /// the bucket.
    pub fn validate(&self) -> Result<HarvestConfig, ConfigError> {
        let sink_location = non_empty(&self.bucket_name)
            .ok_or(ConfigError::Missing(BUCKET_NAME_VAR))?;
        let assumed_identity = non_empty(&self.assume_role_arn)
            .ok_or(ConfigError::Missing(ASSUME_ROLE_ARN_VAR))?;

        let catalog_name = if self.catalog_name.is_empty() {
            default_catalog_name()
        } else {
            self.catalog_name.clone()
        };

        Ok(HarvestConfig {
            sink_location,
            assumed_identity,
            catalog_name,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}

/// Validated configuration handed to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarvestConfig {
    /// Bucket all snapshots are written to
    pub sink_location: String,

    /// Role assumed for service access
    pub assumed_identity: String,

    /// Catalog name for fully-qualified table names
    pub catalog_name: String,
}

/// Config error types
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    Missing(&'static str),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}
