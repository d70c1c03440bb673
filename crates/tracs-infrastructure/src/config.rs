//! Application configuration.
//!
//! Settings come from `config.toml` under the platform config directory,
//! with `TRACS_*` environment variables overriding individual fields. A
//! commented template is written on first run so operators have something
//! to edit.

use crate::paths::TracsPaths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracs_core::error::{Result, TracsError};

const DEFAULT_API_BASE_URL: &str = "https://midasbuy-api.com/api/v1/pubg";
const DEFAULT_SUBSCRIPTION_DAYS: i64 = 30;

const CONFIG_TEMPLATE: &str = r#"# TRACS configuration.
# Every value can be overridden by the matching TRACS_* environment variable.

# Base URL of the redemption API (TRACS_API_BASE_URL).
api_base_url = "https://midasbuy-api.com/api/v1/pubg"

# Static API key sent in the X-Api-Key header (TRACS_API_KEY).
api_key = ""

# Actor id of the bot owner; the owner is always authorized and may manage
# the trader registry (TRACS_OWNER_ID).
#owner_id = 123456789

# Subscription length granted to newly registered traders, in days
# (TRACS_SUBSCRIPTION_DAYS).
subscription_days = 30

# Where per-actor operation logs are written; defaults to the platform
# data directory (TRACS_DATA_DIR).
#data_dir = "/var/lib/tracs"
"#;

/// Runtime configuration of the bot process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BotConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default = "default_subscription_days")]
    pub subscription_days: i64,
    /// Override for the operation-log location.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_subscription_days() -> i64 {
    DEFAULT_SUBSCRIPTION_DAYS
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            api_key: String::new(),
            owner_id: None,
            subscription_days: default_subscription_days(),
            data_dir: None,
        }
    }
}

impl BotConfig {
    /// Loads configuration from the default location with environment
    /// overrides applied, creating a template file on first run.
    pub fn load() -> Result<Self> {
        let path = TracsPaths::config_file()
            .map_err(|e| TracsError::config(e.to_string()))?;
        let mut config = Self::load_file(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Loads configuration from a specific file, writing the template if
    /// the file does not exist yet.
    pub fn load_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, CONFIG_TEMPLATE)?;
            tracing::info!("Wrote configuration template to {}", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Applies `TRACS_*` overrides from the given lookup (the environment
    /// in production, a map in tests).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TRACS_API_BASE_URL") {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(key) = lookup("TRACS_API_KEY") {
            self.api_key = key.trim().to_string();
        }
        if let Some(owner) = lookup("TRACS_OWNER_ID")
            && let Ok(id) = owner.trim().parse::<i64>()
        {
            self.owner_id = Some(id);
        }
        if let Some(days) = lookup("TRACS_SUBSCRIPTION_DAYS")
            && let Ok(days) = days.trim().parse::<i64>()
        {
            self.subscription_days = days;
        }
        if let Some(dir) = lookup("TRACS_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }
    }

    /// Rejects configurations the process cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(TracsError::config(
                "api_key is not set (config.toml or TRACS_API_KEY)",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_file_writes_template_on_first_run() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");

        let config = BotConfig::load_file(&path).unwrap();

        assert_eq!(config, BotConfig::default());
        assert!(path.exists());
        // The template itself parses back to the defaults.
        let reloaded = BotConfig::load_file(&path).unwrap();
        assert_eq!(reloaded.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(reloaded.subscription_days, DEFAULT_SUBSCRIPTION_DAYS);
    }

    #[test]
    fn test_load_file_reads_partial_config() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        std::fs::write(&path, "api_key = \"sekrit\"\nowner_id = 42\n").unwrap();

        let config = BotConfig::load_file(&path).unwrap();

        assert_eq!(config.api_key, "sekrit");
        assert_eq!(config.owner_id, Some(42));
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = BotConfig::default();

        config.apply_overrides(|name| match name {
            "TRACS_API_BASE_URL" => Some("https://ledger.example/v2/".to_string()),
            "TRACS_API_KEY" => Some("  key-from-env  ".to_string()),
            "TRACS_OWNER_ID" => Some("99".to_string()),
            "TRACS_SUBSCRIPTION_DAYS" => Some("7".to_string()),
            _ => None,
        });

        assert_eq!(config.api_base_url, "https://ledger.example/v2");
        assert_eq!(config.api_key, "key-from-env");
        assert_eq!(config.owner_id, Some(99));
        assert_eq!(config.subscription_days, 7);
    }

    #[test]
    fn test_apply_overrides_ignores_malformed_numbers() {
        let mut config = BotConfig::default();

        config.apply_overrides(|name| match name {
            "TRACS_OWNER_ID" => Some("not-a-number".to_string()),
            _ => None,
        });

        assert_eq!(config.owner_id, None);
    }

    #[test]
    fn test_validate_requires_api_key() {
        let mut config = BotConfig::default();
        assert!(config.validate().is_err());

        config.api_key = "key".to_string();
        assert!(config.validate().is_ok());
    }
}
