//! Run configuration
//!
//! Defaults can be set in a `densest.toml` file in the working directory,
//! or in a file passed with `--config`:
//!
//! ```toml
//! [defaults]
//! method = "plain"
//! k = 10
//! epsilon = 0.1
//! alpha = 1.0
//! format = "text"
//! ```
//!
//! Command-line flags override the file, which overrides built-in defaults.

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::density::{DensityMethod, DEFAULT_ALPHA};
use crate::error::{GraphError, Result};
use crate::flow::DEFAULT_EPSILON;
use crate::report::OutputFormat;
use crate::spectral::DEFAULT_K;

/// File name looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "densest.toml";

/// Top-level config file layout
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DensestConfig {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Values used when the corresponding flag is not given
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Defaults {
    pub method: DensityMethod,
    pub k: usize,
    pub epsilon: f64,
    pub alpha: f64,
    pub format: OutputFormat,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            method: DensityMethod::Plain,
            k: DEFAULT_K,
            epsilon: DEFAULT_EPSILON,
            alpha: DEFAULT_ALPHA,
            format: OutputFormat::Text,
        }
    }
}

impl Defaults {
    /// Reject values no engine can run with
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(GraphError::InvalidParameter(
                "k must be at least 1".to_string(),
            ));
        }
        if !(self.epsilon.is_finite() && self.epsilon > 0.0) {
            return Err(GraphError::InvalidParameter(format!(
                "epsilon must be positive, got {}",
                self.epsilon
            )));
        }
        if !(self.alpha.is_finite() && self.alpha >= 0.0) {
            return Err(GraphError::InvalidParameter(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// Load the config from `path`, or from `densest.toml` in the working directory.
///
/// A missing or unreadable file yields the built-in defaults.
pub fn load_config(path: Option<&Path>) -> DensestConfig {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => Path::new(CONFIG_FILE_NAME).to_path_buf(),
    };
    if !path.exists() {
        debug!("No config file at {}", path.display());
        return DensestConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            debug!("Loaded config from {}", path.display());
            config
        }
        Err(e) => {
            warn!("Failed to load {}: {}", path.display(), e);
            DensestConfig::default()
        }
    }
}

fn load_toml_config(path: &Path) -> anyhow::Result<DensestConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: DensestConfig = toml::from_str(&content)?;
    Ok(config)
}
