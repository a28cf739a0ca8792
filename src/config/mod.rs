//! # Configuration Management Module
//!
//! Punktune reads a single TOML file (default `config.toml`) at startup.
//!
//! ## Configuration Structure
//!
//! - [`BotConfig`] - bot name, command prefix, chat XP cooldown, console defaults
//! - [`StorageConfig`] - where the user store lives
//! - [`LoggingConfig`] - log level and optional log file
//! - [`MusicConfig`] - yt-dlp invocation and accepted link hosts
//!
//! ## Usage
//!
//! ```rust,no_run
//! use punktune::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     println!("Bot: {}", config.bot.name);
//!     Config::create_default("config.toml").await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration File Format
//!
//! ```toml
//! [bot]
//! name = "Punktune"
//! command_prefix = "/"
//! chat_xp_cooldown_secs = 60
//! default_guild = "console"
//! default_voice_channel = "lounge"
//!
//! [storage]
//! data_dir = "./data"
//! users_file = "users.json"
//!
//! [logging]
//! level = "info"
//! file = "punktune.log"
//!
//! [music]
//! ytdlp_path = "yt-dlp"
//! audio_format = "bestaudio[ext=webm]/bestaudio"
//! rate_limit = "1M"
//! allowed_hosts = ["youtube.com", "youtu.be"]
//! ```

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tokio::fs;

/// Prefixes a slash-command line may start with.
const ALLOWED_PREFIXES: &[&str] = &["/", "!", "^", "$", ">", "+"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub name: String,
    /// Must be one of a hard-coded allowed set. Falls back to "/" if unset or invalid.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_prefix: Option<String>,
    /// Minimum gap between two XP-granting chat lines from one user.
    #[serde(default = "default_chat_cooldown")]
    pub chat_xp_cooldown_secs: u64,
    /// Guild assumed for console lines without `@guild`.
    #[serde(default = "default_guild")]
    pub default_guild: String,
    /// Voice channel assumed for console lines without `#channel`.
    #[serde(default)]
    pub default_voice_channel: Option<String>,
}

fn default_chat_cooldown() -> u64 {
    60
}

fn default_guild() -> String {
    "console".to_string()
}

impl BotConfig {
    pub fn prefix(&self) -> &str {
        match self.command_prefix.as_deref() {
            Some(p) if ALLOWED_PREFIXES.contains(&p) => p,
            Some(p) => {
                log::warn!("Invalid command prefix '{}', using '/'", p);
                "/"
            }
            None => "/",
        }
    }

    pub fn chat_cooldown(&self) -> Duration {
        Duration::from_secs(self.chat_xp_cooldown_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_dir: String,
    #[serde(default = "default_users_file")]
    pub users_file: String,
}

fn default_users_file() -> String {
    "users.json".to_string()
}

impl StorageConfig {
    pub fn users_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir).join(&self.users_file)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MusicConfig {
    pub ytdlp_path: String,
    /// yt-dlp `-f` selector.
    pub audio_format: String,
    /// yt-dlp `-r` download rate limit.
    pub rate_limit: String,
    pub allowed_hosts: Vec<String>,
}

impl Default for MusicConfig {
    fn default() -> Self {
        Self {
            ytdlp_path: "yt-dlp".to_string(),
            audio_format: "bestaudio[ext=webm][acodec=opus][asr=48000]/bestaudio".to_string(),
            rate_limit: "1M".to_string(),
            allowed_hosts: vec!["youtube.com".to_string(), "youtu.be".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub music: MusicConfig,
}

impl Config {
    /// Load configuration from a file
    pub async fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| anyhow!("Failed to parse config file {}: {}", path, e))?;

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
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bot: BotConfig {
                name: "Punktune".to_string(),
                command_prefix: Some("/".to_string()),
                chat_xp_cooldown_secs: default_chat_cooldown(),
                default_guild: default_guild(),
                default_voice_channel: Some("lounge".to_string()),
            },
            storage: StorageConfig {
                data_dir: "./data".to_string(),
                users_file: default_users_file(),
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                file: Some("punktune.log".to_string()),
            },
            music: MusicConfig::default(),
        }
    }
}
