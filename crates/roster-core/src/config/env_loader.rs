//! Environment variable overrides
//!
//! - `ROSTER_ENDPOINT`
//! - `ROSTER_SESSION_DIR`
//! - `ROSTER_PAGE_SIZE`
//! - `ROSTER_LOG_LEVEL`
//! - `ROSTER_LOG_FORMAT`

use super::model::RosterConfig;
use crate::error::{RosterError, RosterResult};
use std::path::PathBuf;

/// Apply overrides from the process environment
pub fn apply_env(config: &mut RosterConfig) -> RosterResult<()> {
    apply_env_with(config, |key| std::env::var(key).ok())
}

/// Apply overrides from an arbitrary variable lookup
pub fn apply_env_with<F>(config: &mut RosterConfig, lookup: F) -> RosterResult<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(endpoint) = lookup("ROSTER_ENDPOINT") {
        config.endpoint = endpoint;
    }

    if let Some(dir) = lookup("ROSTER_SESSION_DIR") {
        config.session_dir = Some(PathBuf::from(dir));
    }

    if let Some(page_size) = lookup("ROSTER_PAGE_SIZE") {
        config.page_size = page_size.trim().parse().map_err(|_| {
            RosterError::config_with_context(
                "Invalid ROSTER_PAGE_SIZE value",
                format!("Parsing page size '{}'", page_size),
            )
        })?;
    }

    if let Some(level) = lookup("ROSTER_LOG_LEVEL") {
        config.logging.level = level;
    }

    if let Some(format) = lookup("ROSTER_LOG_FORMAT") {
        config.logging.format = format;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = RosterConfig {
            endpoint: "http://from-file/graphql".into(),
            ..RosterConfig::default()
        };
        apply_env_with(
            &mut config,
            lookup(&[
                ("ROSTER_ENDPOINT", "https://from-env/graphql"),
                ("ROSTER_PAGE_SIZE", "20"),
                ("ROSTER_LOG_FORMAT", "json"),
            ]),
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://from-env/graphql");
        assert_eq!(config.page_size, 20);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_page_size() {
        let mut config = RosterConfig::default();
        let err = apply_env_with(&mut config, lookup(&[("ROSTER_PAGE_SIZE", "lots")])).unwrap_err();
        assert_eq!(err.error_code(), "ROSTER_CONFIG");
    }

    #[test]
    fn test_no_variables_changes_nothing() {
        let mut config = RosterConfig::default();
        apply_env_with(&mut config, |_| None).unwrap();
        assert_eq!(config, RosterConfig::default());
    }
}
