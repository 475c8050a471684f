//! # Configuration Management Module
//!
//! TOML configuration for wardbot, organized into sections:
//!
//! - [`BotConfig`] - bot identity and the chat command prefix
//! - [`StorageConfig`] - snapshot file locations
//! - [`LookupConfig`] - item database client settings
//! - [`LoggingConfig`] - log level and optional log file
//!
//! Values are validated on load; the command prefix is restricted to a small
//! allowed set so a typo in the config can't make the bot answer every line
//! of chat.
//!
//! ```toml
//! [bot]
//! name = "Wardbot"
//! command_prefix = "\\"
//!
//! [storage]
//! data_dir = "./data"
//!
//! [lookup]
//! enabled = false
//! base_url = "https://xivapi.com"
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;

/// Prefixes the bot will accept. Anything else falls back to the default.
const ALLOWED_PREFIXES: &[char] = &['\\', '!', '^', '$', '/', '>'];
const DEFAULT_PREFIX: char = '\\';

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Display name used in the help text.
    pub name: String,
    /// Chat command prefix. Must be one of a hard-coded allowed set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_prefix: Option<String>,
}

impl BotConfig {
    /// Effective prefix character: the configured one if allowed, else `\`.
    pub fn prefix(&self) -> char {
        if let Some(raw) = &self.command_prefix {
            let mut chars = raw.chars();
            if let (Some(c), None) = (chars.next(), chars.next()) {
                if ALLOWED_PREFIXES.contains(&c) {
                    return c;
                }
            }
        }
        DEFAULT_PREFIX
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl StorageConfig {
    pub fn houses_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("houses.json")
    }

    pub fn todos_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join("todo.json")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupConfig {
    /// Enable/disable item lookups. When disabled the `item` command echoes
    /// the query back.
    pub enabled: bool,
    /// Base URL of the XIVAPI-compatible item database.
    pub base_url: String,
    /// Cache TTL in minutes for the most recent lookup
    pub cache_ttl_minutes: u32,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            enabled: false, // Disabled by default until someone opts in
            base_url: "https://xivapi.com".to_string(),
            cache_ttl_minutes: 10,
            timeout_seconds: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                name: "Wardbot".to_string(),
                command_prefix: None,
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
            },
            lookup: LookupConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                file: None,
            },
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

        config.validate()?;
        Ok(config)
    }

    /// Create a default configuration file
    pub async fn create_default(path: &str) -> Result<()> {
        let config = Config::default();
        let content = toml::to_string_pretty(&config)
            .map_err(|e| anyhow!("Failed to serialize default config: {}", e))?;
        fs::write(path, content)
            .await
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path, e))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.storage.data_dir.trim().is_empty() {
            return Err(anyhow!("storage.data_dir must not be empty"));
        }
        if self.lookup.timeout_seconds == 0 {
            return Err(anyhow!("lookup.timeout_seconds must be at least 1"));
        }
        if let Some(raw) = &self.bot.command_prefix {
            let mut chars = raw.chars();
            let ok = matches!(
                (chars.next(), chars.next()),
                (Some(c), None) if ALLOWED_PREFIXES.contains(&c)
            );
            if !ok {
                return Err(anyhow!(
                    "bot.command_prefix '{}' is not in the allowed set {:?}",
                    raw,
                    ALLOWED_PREFIXES
                ));
            }
        }
        Ok(())
    }
}
