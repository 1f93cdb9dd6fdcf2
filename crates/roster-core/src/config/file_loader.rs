//! File-based configuration loading

use super::model::RosterConfig;
use crate::error::{RosterError, RosterResult};
use std::fs;
use std::path::Path;

/// Load configuration from a file
///
/// Supports JSON, TOML, and YAML formats based on file extension.
/// Returns default config if file doesn't exist.
pub fn load_from_file(path: &Path) -> RosterResult<RosterConfig> {
    if !path.exists() {
        return Ok(RosterConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        RosterError::config_with_context(
            format!("Failed to read config file: {}", e),
            format!("Reading configuration from '{}'", path.display()),
        )
    })?;

    let parse_error = |format: &str, e: String| {
        RosterError::config_with_context(
            format!("Failed to parse {} config: {}", format, e),
            format!("Deserializing configuration from '{}'", path.display()),
        )
    };

    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error("TOML", e.to_string())),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error("YAML", e.to_string()))
        }
        _ => serde_json::from_str(&content).map_err(|e| parse_error("JSON", e.to_string())),
    }
}
