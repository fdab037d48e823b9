//! Logging configuration shared across binaries.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing_subscriber::EnvFilter;

pub const DEBUG_LOG_SETTINGS_FILE: &str = "config/debug_logging.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Force debug-level output for this crate
    pub enabled: bool,
    /// Directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: "info".to_string(),
        }
    }
}

impl LogConfig {
    pub fn load() -> Self {
        Self::load_from(Path::new(DEBUG_LOG_SETTINGS_FILE))
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(content) => serde_json::from_str(&content).unwrap_or_default(),
            Err(_) => Self::default(),
        }
    }

    pub fn enabled_from_args(args: &[String]) -> bool {
        args.iter().any(|arg| arg == "--debug-log")
    }

    pub fn load_with_args(args: &[String]) -> Self {
        let mut config = Self::load();
        if Self::enabled_from_args(args) {
            config.enabled = true;
        }
        config
    }

    /// Filter directives: `RUST_LOG` wins, then the configured filter
    pub fn env_filter(&self) -> EnvFilter {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.filter.as_str()));
        if self.enabled {
            match "fieldmap=debug".parse() {
                Ok(directive) => filter.add_directive(directive),
                Err(_) => filter,
            }
        } else {
            filter
        }
    }

    /// Install the global fmt subscriber. Logs go to stderr so stdout stays
    /// machine-readable. A second call is a no-op.
    pub fn init_tracing(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.env_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_enables_debug() {
        let args = vec!["fieldmap".to_string(), "--debug-log".to_string()];
        assert!(LogConfig::enabled_from_args(&args));
        assert!(!LogConfig::enabled_from_args(&args[..1]));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let config = LogConfig::load_from(Path::new("/nonexistent/debug_logging.json"));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn partial_json_is_accepted() {
        let config: LogConfig = serde_json::from_str(r#"{ "enabled": true }"#).unwrap();
        assert!(config.enabled);
        assert_eq!(config.filter, "info");
    }
}
