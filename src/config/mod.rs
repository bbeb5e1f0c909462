//! Configuration module
//!
//! This module provides:
//! - Configuration types (`AppConfig`, `RelayConfig`, `StreamConfig`, `PairConfig`)
//! - YAML loading functionality (`load_config`)
//! - Endpoint and stream defaults with environment variable overrides
//! - Logging initialization

pub mod constants;
mod loader;
pub mod logging;
mod types;

pub use types::{AppConfig, PairConfig, RelayConfig, ResolvedPair, StreamConfig};

pub use loader::{config_path, load_config, load_config_from_str, DEFAULT_CONFIG_PATH};
