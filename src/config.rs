//! Configuration and settings management
//!
//! Loads settings from config files and environment variables and defines
//! relay constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// Default debounce interval for album buffers
pub const DEFAULT_ALBUM_DEBOUNCE_MS: u64 = 2000;

/// Extension used when a video arrives without a file name
pub const DEFAULT_VIDEO_EXTENSION: &str = "mp4";

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token
    pub telegram_token: String,

    /// How long an album buffer stays open after its first fragment
    #[serde(default = "default_album_debounce_ms")]
    pub album_debounce_ms: u64,

    /// Directory for transient download files
    pub temp_dir: Option<PathBuf>,

    /// Comma-separated list of chat IDs the bot serves (empty: everyone)
    #[serde(rename = "allowed_chats")]
    pub allowed_chats_str: Option<String>,
}

const fn default_album_debounce_ms() -> u64 {
    DEFAULT_ALBUM_DEBOUNCE_MS
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails or the bot token is empty.
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
            // Local overrides, not checked into git
            .add_source(File::with_name("config/local").required(false))
            // Eg.. `APP__ALBUM_DEBOUNCE_MS=500 ./target/keep2download`
            .add_source(Environment::with_prefix("APP").separator("__"))
            // UPPER_SNAKE_CASE env vars map onto snake_case keys; empty means unset
            .add_source(Environment::default().ignore_empty(true))
            .build()?;

        let settings: Self = s.try_deserialize()?;

        if settings.telegram_token.trim().is_empty() {
            return Err(ConfigError::Message(
                "TELEGRAM_TOKEN is not set in config files or environment".to_string(),
            ));
        }

        Ok(settings)
    }

    /// Debounce interval applied to every album buffer
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.album_debounce_ms)
    }

    /// Directory where transient download files are created
    #[must_use]
    pub fn transient_dir(&self) -> PathBuf {
        self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    /// Create the transient directory if it does not exist yet
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the directory cannot be created.
    pub fn ensure_directories_exist(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(self.transient_dir())
    }

    /// Returns the set of chat IDs the bot relays for
    #[must_use]
    pub fn allowed_chats(&self) -> HashSet<i64> {
        self.allowed_chats_str
            .as_ref()
            .map(|s| {
                s.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
                    .filter(|token| !token.is_empty())
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Whether updates from `chat_id` should be processed
    #[must_use]
    pub fn is_chat_allowed(&self, chat_id: i64) -> bool {
        let allowed = self.allowed_chats();
        allowed.is_empty() || allowed.contains(&chat_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    fn settings(allowed: Option<&str>) -> Settings {
        Settings {
            telegram_token: "dummy".to_string(),
            album_debounce_ms: DEFAULT_ALBUM_DEBOUNCE_MS,
            temp_dir: None,
            allowed_chats_str: allowed.map(ToString::to_string),
        }
    }

    // Tests touching the environment live in one function to avoid races
    #[test]
    fn test_config_env_loading() -> Result<(), Box<dyn std::error::Error>> {
        // 1. Defaults
        env::set_var("TELEGRAM_TOKEN", "dummy_token");
        let settings = Settings::new()?;
        assert_eq!(settings.telegram_token, "dummy_token");
        assert_eq!(settings.album_debounce_ms, DEFAULT_ALBUM_DEBOUNCE_MS);
        assert_eq!(settings.debounce(), Duration::from_secs(2));

        // 2. Override
        env::set_var("ALBUM_DEBOUNCE_MS", "750");
        let settings = Settings::new()?;
        assert_eq!(settings.debounce(), Duration::from_millis(750));
        env::remove_var("ALBUM_DEBOUNCE_MS");

        // 3. Empty token is fatal
        env::set_var("TELEGRAM_TOKEN", "");
        assert!(Settings::new().is_err());

        env::remove_var("TELEGRAM_TOKEN");
        Ok(())
    }

    #[test]
    fn test_allowed_chats_parsing() {
        let s = settings(Some("123,456; -1007 abc"));
        let allowed = s.allowed_chats();
        assert_eq!(allowed.len(), 3);
        assert!(allowed.contains(&-1007));
        assert!(s.is_chat_allowed(123));
        assert!(!s.is_chat_allowed(999));
    }

    #[test]
    fn test_empty_allow_list_serves_everyone() {
        let s = settings(None);
        assert!(s.is_chat_allowed(42));
    }

    #[test]
    fn test_transient_dir_defaults_to_platform_temp() {
        let mut s = settings(None);
        assert_eq!(s.transient_dir(), std::env::temp_dir());

        s.temp_dir = Some(PathBuf::from("/var/tmp/relay"));
        assert_eq!(s.transient_dir(), PathBuf::from("/var/tmp/relay"));
    }
}
