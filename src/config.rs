use std::env::{self, VarError};

use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "sqlite:data/bot.db";
const DEFAULT_CHECK_TTL_SECONDS: u64 = 60;
const DEFAULT_WARN_COOLDOWN_SECONDS: u64 = 60;
const DEFAULT_WARN_DELETE_AFTER_SECONDS: u64 = 0;
const DEFAULT_MY_GROUPS_LIMIT: usize = 30;

/// Errors raised while reading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required variable is unset or not unicode.
    #[error("Missing environment variable {name}: {source}")]
    Missing {
        /// Variable name.
        name: &'static str,
        /// Why it could not be read.
        #[source]
        source: VarError,
    },
    /// A variable is set to a value that cannot be used.
    #[error("Invalid value for {name}: {value}")]
    Invalid {
        /// Variable name.
        name: &'static str,
        /// The rejected value.
        value: String,
    },
}

/// Represents the application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// The Telegram bot token.
    pub telegram_bot_token: String,
    /// The channel every managed chat requires membership in.
    pub owner_channel: String,
    /// Optional user that is never gated.
    pub owner_id: Option<u64>,
    /// The URL of the database.
    pub database_url: String,
    /// How long a membership lookup result is reused, in seconds.
    pub check_ttl_seconds: u64,
    /// Minimum spacing between warnings to the same user in the same chat, in
    /// seconds.
    pub warn_cooldown_seconds: u64,
    /// Overrides the default "please subscribe" text.
    pub required_message_text: Option<String>,
    /// Delete our own warnings after this many seconds. Zero keeps them.
    pub warn_delete_after_seconds: u64,
    /// Maximum number of groups listed by `/mygroups`.
    pub my_groups_limit: usize,
}

impl Config {
    /// Creates a new `Config` instance from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let owner_channel = required_var("OWNER_CHANNEL")?.trim().to_string();
        if owner_channel.is_empty() {
            return Err(ConfigError::Invalid { name: "OWNER_CHANNEL", value: owner_channel });
        }

        let owner_id = match env::var("OWNER_ID") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => Some(
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name: "OWNER_ID", value: raw.clone() })?,
            ),
            Err(_) => None,
        };

        Ok(Self {
            telegram_bot_token: required_var("TELOXIDE_TOKEN")?,
            owner_channel,
            owner_id,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            check_ttl_seconds: parsed_or("CHECK_TTL_SECONDS", DEFAULT_CHECK_TTL_SECONDS),
            warn_cooldown_seconds: parsed_or(
                "WARN_COOLDOWN_SECONDS",
                DEFAULT_WARN_COOLDOWN_SECONDS,
            ),
            required_message_text: env::var("REQUIRED_MESSAGE_TEXT")
                .ok()
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            warn_delete_after_seconds: parsed_or(
                "WARN_DELETE_AFTER_SECONDS",
                DEFAULT_WARN_DELETE_AFTER_SECONDS,
            ),
            my_groups_limit: parsed_or("MY_GROUPS_LIMIT", DEFAULT_MY_GROUPS_LIMIT),
        })
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|source| ConfigError::Missing { name, source })
}

fn parsed_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name).ok().and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}
