use std::path::PathBuf;

use aria_cal::timetable::DEFAULT_HORIZON_WEEKS;
use serde::Deserialize;
use tracing::warn;

use crate::error::AriaError;
use crate::store::default_store_path;

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const COMMAND_MAX_TOKENS: u32 = 800;
pub const SCAN_MAX_TOKENS: u32 = 2000;

#[derive(Debug, Deserialize, Default)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    /// Endpoint root, for proxies; the client's default otherwise.
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub command_max_tokens: Option<u32>,
    pub scan_max_tokens: Option<u32>,
    /// Shared password; no password means no gate.
    pub password: Option<String>,
    /// `true` = granted, `false` = denied, unset = not asked yet.
    pub notifications: Option<bool>,
    pub horizon_weeks: Option<u32>,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Default)]
pub struct StoreConfig {
    pub path: Option<PathBuf>,
}

impl Config {
    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn horizon_weeks(&self) -> u32 {
        self.horizon_weeks
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_HORIZON_WEEKS)
    }

    pub fn command_max_tokens(&self) -> u32 {
        self.command_max_tokens.unwrap_or(COMMAND_MAX_TOKENS)
    }

    pub fn scan_max_tokens(&self) -> u32 {
        self.scan_max_tokens.unwrap_or(SCAN_MAX_TOKENS)
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("aria").join("config.toml"))
}

pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };

    let Ok(content) = std::fs::read_to_string(&path) else {
        return Config::default();
    };

    parse_config(&content).unwrap_or_else(|e| {
        warn!(path = %path.display(), error = %e, "Ignoring unreadable config");
        Config::default()
    })
}

pub fn parse_config(content: &str) -> Result<Config, toml::de::Error> {
    toml::from_str(content)
}

pub fn load_api_key(config: &Config) -> Result<String, AriaError> {
    // First, try environment variable
    if let Ok(key) = std::env::var("ANTHROPIC_API_KEY") {
        if !key.is_empty() {
            return Ok(key);
        }
    }

    // Then, try config file
    if let Some(key) = &config.anthropic_api_key {
        if !key.is_empty() {
            return Ok(key.clone());
        }
    }

    Err(AriaError::ApiKeyNotFound)
}

pub fn resolve_store_path(cli_path: Option<PathBuf>, config: &Config) -> PathBuf {
    cli_path
        .or_else(|| config.store.path.clone())
        .unwrap_or_else(default_store_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.model(), DEFAULT_MODEL);
        assert_eq!(config.horizon_weeks(), 12);
        assert_eq!(config.command_max_tokens(), 800);
        assert_eq!(config.scan_max_tokens(), 2000);
        assert_eq!(config.password(), None);
        assert_eq!(config.notifications, None);
    }

    #[test]
    fn full_config() {
        let config = parse_config(
            r#"
            anthropic_api_key = "sk-test"
            base_url = "http://localhost:8787"
            model = "claude-3-5-haiku-latest"
            password = "aria2024"
            notifications = true
            horizon_weeks = 16

            [store]
            path = "/tmp/aria/events.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.model(), "claude-3-5-haiku-latest");
        assert_eq!(config.password(), Some("aria2024"));
        assert_eq!(config.notifications, Some(true));
        assert_eq!(config.horizon_weeks(), 16);
        assert_eq!(
            resolve_store_path(None, &config),
            PathBuf::from("/tmp/aria/events.json")
        );
        assert_eq!(
            resolve_store_path(Some(PathBuf::from("x.json")), &config),
            PathBuf::from("x.json")
        );
    }

    #[test]
    fn zero_horizon_and_empty_password_fall_back() {
        let config = parse_config("horizon_weeks = 0\npassword = \"\"").unwrap();
        assert_eq!(config.horizon_weeks(), 12);
        assert_eq!(config.password(), None);
    }

    #[test]
    fn malformed_config_is_an_error() {
        assert!(parse_config("horizon_weeks = \"many\"").is_err());
    }
}
