//! Typestate checking mode

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Typestate checking mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypestateMode {
    /// Intraprocedural automaton matching along the EOG
    #[default]
    Dfa,

    /// Interprocedural, alias-aware pushdown reachability
    Wpds,
}

impl std::fmt::Display for TypestateMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypestateMode::Dfa => write!(f, "dfa"),
            TypestateMode::Wpds => write!(f, "wpds"),
        }
    }
}

impl FromStr for TypestateMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dfa" => Ok(TypestateMode::Dfa),
            "wpds" => Ok(TypestateMode::Wpds),
            other => Err(format!("unknown typestate mode '{}' (expected dfa or wpds)", other)),
        }
    }
}
