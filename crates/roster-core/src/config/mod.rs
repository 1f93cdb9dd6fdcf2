//! Configuration management
//!
//! Settings are layered: built-in defaults, then an optional file (JSON, TOML
//! or YAML by extension), then `ROSTER_*` environment variables.

mod env_loader;
mod file_loader;
mod model;

pub use env_loader::{apply_env, apply_env_with};
pub use file_loader::load_from_file;
pub use model::{
    DEFAULT_ENDPOINT, LoggingConfig, RosterConfig, TimeoutConfig, default_config_path,
};

use crate::error::RosterResult;
use std::path::Path;
use tracing::debug;

/// Load configuration from defaults, an optional file and the environment
///
/// When `path` is `None` the default location (`~/.roster/config.toml`) is
/// used if it exists.
pub fn load_config(path: Option<&Path>) -> RosterResult<RosterConfig> {
    let mut config = match path {
        Some(path) => load_from_file(path)?,
        None => match default_config_path() {
            Some(path) => load_from_file(&path)?,
            None => RosterConfig::default(),
        },
    };

    apply_env(&mut config)?;
    config.validate()?;

    debug!(
        endpoint = %config.endpoint,
        page_size = config.page_size,
        "Loaded configuration"
    );
    Ok(config)
}
