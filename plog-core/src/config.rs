//! Configuration parsing and management.

use crate::markdown::classes::{validate_mappings, Mappings};
use crate::markdown::images::asset_link_prefix;
use crate::tree::ScanOrder;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Main configuration struct matching the plog.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub paths: PathsConfig,

    /// Tag name to CSS class injected into every rendered document
    #[serde(default)]
    pub mappings: Mappings,

    #[serde(default = "default_component_extension")]
    pub component_extension: String,

    #[serde(default)]
    pub scan_order: ScanOrder,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_component_extension() -> String {
    String::from("vue")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Markdown source root
    pub docs: PathBuf,
    /// Root the component documents are mirrored into
    pub output: PathBuf,
    /// Asset relocation directory; must contain an `assets` segment
    pub assets: PathBuf,
}

impl Config {
    /// Configuration with default options for the given paths.
    pub fn new(docs: impl Into<PathBuf>, output: impl Into<PathBuf>, assets: impl Into<PathBuf>) -> Self {
        Self {
            paths: PathsConfig {
                docs: docs.into(),
                output: output.into(),
                assets: assets.into(),
            },
            mappings: Mappings::new(),
            component_extension: default_component_extension(),
            scan_order: ScanOrder::default(),
            config_path: None,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::from_yaml(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Parse and validate configuration from YAML text
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the pipeline would only fail on mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ext = self.component_extension.as_str();
        if ext.is_empty() || ext.contains(['.', '/', '\\']) {
            return Err(ConfigError::Invalid {
                field: "component_extension",
                reason: format!("{:?} is not a bare file extension", ext),
            });
        }

        asset_link_prefix(&self.paths.assets).map_err(|err| ConfigError::Invalid {
            field: "paths.assets",
            reason: err.to_string(),
        })?;

        validate_mappings(&self.mappings).map_err(|err| ConfigError::Invalid {
            field: "mappings",
            reason: err.to_string(),
        })?;

        Ok(())
    }

    /// Get the markdown source directory, resolved relative to config file
    pub fn docs_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.docs)
    }

    /// Get the output directory, resolved relative to config file
    pub fn output_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.output)
    }

    /// Get the asset directory, resolved relative to config file
    pub fn assets_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.assets)
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else if let Some(parent) = self.config_path.as_deref().and_then(Path::parent) {
            parent.join(path)
        } else {
            path.to_path_buf()
        }
    }
}
