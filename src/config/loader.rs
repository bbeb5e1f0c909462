//! YAML configuration loading
//!
//! The file path comes from `RELAY_CONFIG` and falls back to `config.yaml`
//! in the working directory. Values present in the file win over the
//! environment defaults in [`super::constants`].

use std::path::{Path, PathBuf};

use crate::error::AppError;

use super::types::AppConfig;

/// Config file used when `RELAY_CONFIG` is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Path of the configuration file to load
pub fn config_path() -> PathBuf {
    std::env::var("RELAY_CONFIG")
        .ok()
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read, parse and validate the configuration at `path`
///
/// # Example
/// ```ignore
/// let config = relay_client::config::load_config(&relay_client::config::config_path())?;
/// let registry = config.token_registry()?;
/// ```
pub fn load_config(path: &Path) -> Result<AppConfig, AppError> {
    if !path.is_file() {
        return Err(AppError::Config(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }
    let yaml = std::fs::read_to_string(path)?;
    parse(&yaml, &path.display().to_string())
}

/// Parse and validate configuration held in memory
pub fn load_config_from_str(yaml_content: &str) -> Result<AppConfig, AppError> {
    parse(yaml_content, "<inline>")
}

fn parse(yaml: &str, source: &str) -> Result<AppConfig, AppError> {
    let config: AppConfig = serde_yaml::from_str(yaml)
        .map_err(|e| AppError::Config(format!("YAML parse error in {}: {}", source, e)))?;
    config.validate()?;
    tracing::debug!(
        source,
        pairs = config.pairs.len(),
        tokens = config.tokens.len(),
        "Configuration parsed"
    );
    Ok(config)
}

// ============================================================================
// Tests
// ============================================================================
