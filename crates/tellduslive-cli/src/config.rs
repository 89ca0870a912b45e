//! Configuration file management.
//!
//! Two files are read here: the user's preferences
//! (`<config dir>/tellduslive/config.toml`) and the optional local YAML file
//! passed with `-L`, which lists TellStick Net controllers.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tellduslive_core::ListenConfig;
use tellduslive_core::discovery::DISCOVERY_TIMEOUT;

/// Seconds between polls when neither `-d` nor the config sets one.
pub const DEFAULT_DELAY: u64 = 5;

/// Application name sent to Telldus Live and shown when authorizing a local
/// gateway.
pub const DEFAULT_APPLICATION: &str = "tellduslive";

/// Configuration file structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between polls in `list -r`
    #[serde(default)]
    pub delay: Option<u64>,

    /// Disable colored output
    #[serde(default)]
    pub no_color: bool,

    /// Application name (`X-Application` header, local token requests)
    #[serde(default)]
    pub application: Option<String>,

    /// Seconds to wait for discovery replies
    #[serde(default)]
    pub discovery_timeout: Option<u64>,
}

impl Config {
    /// Get the config file path
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tellduslive")
            .join("config.toml")
    }

    /// Load config from file, or return default if not found
    pub fn load() -> Self {
        Self::load_from(&Self::path())
    }

    /// Load config from `path`. Unreadable or malformed files yield the
    /// default, with a warning.
    pub fn load_from(path: &Path) -> Self {
        if path.exists() {
            // Logging is not set up yet; the config decides about colors.
            match fs::read_to_string(path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => return config,
                    Err(e) => {
                        eprintln!("Warning: Failed to parse config: {}", e);
                    }
                },
                Err(e) => {
                    eprintln!("Warning: Failed to read config: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Application name, falling back to [`DEFAULT_APPLICATION`].
    pub fn application(&self) -> &str {
        self.application.as_deref().unwrap_or(DEFAULT_APPLICATION)
    }
}

/// Poll delay: `-d`, else the config, else [`DEFAULT_DELAY`].
pub fn resolve_delay(arg: Option<u64>, config: &Config) -> Duration {
    Duration::from_secs(arg.or(config.delay).unwrap_or(DEFAULT_DELAY).max(1))
}

/// Discovery timeout: `-t`, else the config, else five seconds.
pub fn resolve_discovery_timeout(arg: Option<u64>, config: &Config) -> Duration {
    arg.or(config.discovery_timeout)
        .map(Duration::from_secs)
        .unwrap_or(DISCOVERY_TIMEOUT)
}

/// Read the local YAML config passed with `-L`.
pub fn load_listen_config(path: &Path) -> Result<ListenConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read local config: {}", path.display()))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse local config: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // ========================================================================
    // Preferences
    // ========================================================================

    #[test]
    fn test_load_missing_file_is_default() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.toml"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_preferences() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "delay = 30\nno_color = true\napplication = \"cabin\"").unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.delay, Some(30));
        assert!(config.no_color);
        assert_eq!(config.application(), "cabin");
        assert_eq!(config.discovery_timeout, None);
    }

    #[test]
    fn test_load_malformed_is_default() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "delay = \"soon\"").unwrap();
        assert_eq!(Config::load_from(file.path()), Config::default());
    }

    #[test]
    fn test_resolve_delay_precedence() {
        let config = Config {
            delay: Some(30),
            ..Default::default()
        };
        assert_eq!(resolve_delay(Some(1), &config), Duration::from_secs(1));
        assert_eq!(resolve_delay(None, &config), Duration::from_secs(30));
        assert_eq!(
            resolve_delay(None, &Config::default()),
            Duration::from_secs(DEFAULT_DELAY)
        );
    }

    #[test]
    fn test_resolve_discovery_timeout() {
        assert_eq!(
            resolve_discovery_timeout(None, &Config::default()),
            DISCOVERY_TIMEOUT
        );
        assert_eq!(
            resolve_discovery_timeout(Some(2), &Config::default()),
            Duration::from_secs(2)
        );
    }

    // ========================================================================
    // Local YAML config
    // ========================================================================

    #[test]
    fn test_load_listen_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "controllers:\n  - id: 1\n    name: Cabin\n    address: 192.168.0.10\n    port: 42314\n"
        )
        .unwrap();

        let config = load_listen_config(file.path()).unwrap();
        assert_eq!(config.controllers.len(), 1);
        assert_eq!(config.first_address(), Some("192.168.0.10"));
        assert_eq!(config.controllers[0].port, Some(42314));
    }

    #[test]
    fn test_load_listen_config_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "controllers: [unclosed").unwrap();

        let err = load_listen_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse local config"));
    }

    #[test]
    fn test_load_listen_config_missing_file() {
        let err = load_listen_config(Path::new("/nonexistent/local.yml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read local config"));
    }
}
