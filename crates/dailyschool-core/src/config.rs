//! Application configuration management.
//!
//! Holds the API host, the institution tag sent on sign-up, the request
//! timeout and how a stored session is restored at startup.
//!
//! Configuration is stored at `~/.config/dailyschool/config.json`. Every field
//! has a default, so a missing file or a partial file are both fine.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Application name used for the config directory path
const APP_NAME: &str = "dailyschool";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Default remote API host.
pub const DEFAULT_API_BASE_URL: &str = "http://54.180.20.253:8080";

/// Institution tag attached to every sign-up request.
pub const DEFAULT_SCHOOL: &str = "DGSW";

/// Environment variable that overrides `api_base_url`.
pub const API_URL_ENV: &str = "DAILYSCHOOL_API_URL";

/// HTTP request timeout in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// How a session is reconstructed from stored tokens at startup.
///
/// `Optimistic` trusts token presence: startup is instant but the session may
/// turn out to be stale on the first authorized call. `Verify` spends one
/// refresh round trip to prove the refresh token still works.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionRestore {
    #[default]
    Optimistic,
    Verify,
    Never,
}

impl FromStr for SessionRestore {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Ok(SessionRestore::Optimistic),
            "verify" => Ok(SessionRestore::Verify),
            "never" => Ok(SessionRestore::Never),
            other => Err(format!(
                "unknown restore policy '{}' (expected optimistic, verify or never)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub school: String,
    pub request_timeout_secs: u64,
    pub session_restore: SessionRestore,
    pub last_email: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            school: DEFAULT_SCHOOL.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            session_restore: SessionRestore::default(),
            last_email: None,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        let mut config = if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            Self::from_json(&contents)?
        } else {
            Self::default()
        };

        if let Ok(url) = std::env::var(API_URL_ENV) {
            if !url.trim().is_empty() {
                config.api_base_url = url;
            }
        }
        Ok(config)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Failed to parse config file")
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file {}", path.display()))
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    /// Base URL without a trailing slash, ready for path joins.
    pub fn base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_json(r#"{"api_base_url":"http://localhost:9000/"}"#).unwrap();
        assert_eq!(config.base_url(), "http://localhost:9000");
        assert_eq!(config.school, DEFAULT_SCHOOL);
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.session_restore, SessionRestore::Optimistic);
    }

    #[test]
    fn test_session_restore_parse() {
        assert_eq!("verify".parse(), Ok(SessionRestore::Verify));
        assert_eq!("NEVER".parse(), Ok(SessionRestore::Never));
        assert!("sometimes".parse::<SessionRestore>().is_err());

        let config = Config::from_json(r#"{"session_restore":"verify"}"#).unwrap();
        assert_eq!(config.session_restore, SessionRestore::Verify);
    }

    #[test]
    fn test_save_error_names_the_path() {
        let blocker = std::env::temp_dir().join(format!("dailyschool-config-{}", std::process::id()));
        std::fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join(CONFIG_FILE);

        let err = Config::default().save_to(&path).unwrap_err();
        assert!(format!("{:#}", err).contains(&blocker.display().to_string()));

        std::fs::remove_file(&blocker).unwrap();
    }

    #[test]
    fn test_default_points_at_school_api() {
        let config = Config::default();
        assert_eq!(config.base_url(), DEFAULT_API_BASE_URL);
        assert!(config.last_email.is_none());
    }
}
