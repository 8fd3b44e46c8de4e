//! Analyzer configuration loaded from TOML.
//!
//! ```toml
//! [analyzer]
//! incr_threshold_fraction = 0.05
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default fraction of edges that may be invalidated before an update falls
/// back to a full traversal.
pub const DEFAULT_INCR_THRESHOLD_FRACTION: f64 = 0.1;

/// Tuning knobs of the adaptive analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// An update runs the full walker once more than
    /// `edge_count * incr_threshold_fraction` distinct edges were invalidated.
    pub incr_threshold_fraction: f64,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            incr_threshold_fraction: DEFAULT_INCR_THRESHOLD_FRACTION,
        }
    }
}

impl AnalyzerConfig {
    /// Checks that every value is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fraction = self.incr_threshold_fraction;
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(ConfigError::ValidationError(format!(
                "analyzer.incr_threshold_fraction must be a finite non-negative number, got {fraction}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    analyzer: AnalyzerConfig,
}

/// Loads and validates an analyzer configuration file.
pub fn load_config(path: &Path) -> Result<AnalyzerConfig, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    load_config_from_str(&content)
}

/// Parses and validates an analyzer configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<AnalyzerConfig, ConfigError> {
    let file: ConfigFile =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    file.analyzer.validate()?;
    Ok(file.analyzer)
}
