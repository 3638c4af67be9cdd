//! Evaluation Configuration
//!
//! Run-level switches of one evaluation pass:
//! - `typestate_mode`   : `dfa` (intraprocedural) or `wpds` (interprocedural)
//! - `parallel`         : evaluate entities and rules on a rayon pool
//! - `num_threads`      : pool size (default: 3/4 of the logical cores)
//! - `report_forbidden` : report calls matching forbidden op statements
//!
//! # Example
//! ```rust
//! use codegraph_mark::config::{EvaluationConfig, TypestateMode};
//!
//! let config = EvaluationConfig::default()
//!     .typestate_mode(TypestateMode::Wpds)
//!     .num_threads(4);
//! assert!(config.validate().is_ok());
//! ```

pub mod error;
pub mod io;

pub use crate::features::typestate::TypestateMode;
pub use error::{ConfigError, ConfigResult};
pub use io::ConfigExportV1;

use serde::{Deserialize, Serialize};

/// Upper bound for an explicit pool size
pub const MAX_THREADS: usize = 256;

/// Configuration of one evaluation pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EvaluationConfig {
    #[serde(default)]
    pub typestate_mode: TypestateMode,

    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Explicit worker count (1..=256); `None` sizes the pool from the CPU count
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_threads: Option<usize>,

    #[serde(default = "default_true")]
    pub report_forbidden: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            typestate_mode: TypestateMode::default(),
            parallel: true,
            num_threads: None,
            report_forbidden: true,
        }
    }
}

impl EvaluationConfig {
    /// Single-threaded configuration
    pub fn sequential() -> Self {
        Self::default().parallel(false)
    }

    pub fn typestate_mode(mut self, mode: TypestateMode) -> Self {
        self.typestate_mode = mode;
        self
    }

    pub fn parallel(mut self, enabled: bool) -> Self {
        self.parallel = enabled;
        self
    }

    pub fn num_threads(mut self, n: usize) -> Self {
        self.num_threads = Some(n);
        self
    }

    pub fn report_forbidden(mut self, enabled: bool) -> Self {
        self.report_forbidden = enabled;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if let Some(n) = self.num_threads {
            if n == 0 || n > MAX_THREADS {
                return Err(ConfigError::range_with_hint(
                    "num_threads",
                    n,
                    1,
                    MAX_THREADS,
                    "Omit num_threads to size the pool automatically",
                ));
            }
            if !self.parallel {
                tracing::warn!("num_threads = {} is ignored when parallel = false", n);
            }
        }
        Ok(())
    }

    /// Worker count of the evaluation pool
    ///
    /// 75% of the logical cores by default, leaving room for the graph backend.
    pub fn effective_threads(&self) -> usize {
        if !self.parallel {
            return 1;
        }
        self.num_threads
            .unwrap_or_else(|| (num_cpus::get() * 3 / 4).max(1))
    }
}
