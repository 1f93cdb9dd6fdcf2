//! Configuration data model

use crate::error::{RosterError, RosterResult};
use crate::query::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Endpoint used when nothing else is configured
pub const DEFAULT_ENDPOINT: &str = "http://localhost:4000/graphql";

/// `~/.roster/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".roster").join("config.toml"))
}

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// GraphQL endpoint of the directory service
    pub endpoint: String,
    /// Where the session file lives; `~/.roster` when unset
    pub session_dir: Option<PathBuf>,
    /// Rows per dashboard page
    pub page_size: u32,
    pub timeouts: TimeoutConfig,
    pub logging: LoggingConfig,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            session_dir: None,
            page_size: DEFAULT_PAGE_SIZE,
            timeouts: TimeoutConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RosterConfig {
    pub fn validate(&self) -> RosterResult<()> {
        let endpoint = self.endpoint.trim();
        if endpoint.is_empty() {
            return Err(RosterError::config("endpoint must not be empty"));
        }
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(RosterError::config_with_context(
                format!("endpoint must be an http(s) URL, got '{}'", endpoint),
                "Validating endpoint",
            ));
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(RosterError::config(format!(
                "page_size must be between 1 and {}",
                MAX_PAGE_SIZE
            )));
        }
        if self.timeouts.connect_secs == 0 || self.timeouts.request_secs == 0 {
            return Err(RosterError::config("timeouts must be positive"));
        }
        Ok(())
    }

    /// Session directory, falling back to `~/.roster`
    pub fn resolved_session_dir(&self) -> Option<PathBuf> {
        self.session_dir
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".roster")))
    }
}

/// HTTP timeouts for the directory service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = RosterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 50);
        assert_eq!(config.timeouts.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_rejects_bad_endpoint() {
        let config = RosterConfig {
            endpoint: "localhost:4000".into(),
            ..RosterConfig::default()
        };
        assert!(config.validate().is_err());

        let config = RosterConfig {
            endpoint: "  ".into(),
            ..RosterConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_page_size() {
        let config = RosterConfig {
            page_size: 0,
            ..RosterConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
