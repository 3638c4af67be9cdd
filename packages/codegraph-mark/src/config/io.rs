//! Configuration I/O (YAML loading)
//!
//! ```yaml
//! version: 1
//! evaluation:
//!   typestate_mode: wpds
//!   parallel: true
//!   num_threads: 8
//!   report_forbidden: true
//! ```

use super::error::{ConfigError, ConfigResult};
use super::EvaluationConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Supported schema versions
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigExportV1 {
    /// Schema version (always 1 for v1)
    pub version: u32,

    #[serde(default)]
    pub evaluation: EvaluationConfig,
}

impl EvaluationConfig {
    /// Load from YAML text
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        let raw: serde_yaml::Value = serde_yaml::from_str(content)?;
        if raw.get("version").is_none() {
            return Err(ConfigError::MissingVersion);
        }

        let export: ConfigExportV1 = serde_yaml::from_value(raw)?;
        if !SUPPORTED_VERSIONS.contains(&export.version) {
            return Err(ConfigError::UnsupportedVersion {
                found: export.version,
                supported: SUPPORTED_VERSIONS.to_vec(),
            });
        }

        export.evaluation.validate()?;
        Ok(export.evaluation)
    }

    /// Load from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Export as a versioned YAML document
    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = ConfigExportV1 {
            version: 1,
            evaluation: self.clone(),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}
