//! Shared models and ports used across all features

pub mod models;
pub mod ports;
