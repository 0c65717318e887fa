//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use phonenumber::country;
use secrecy::SecretString;

use crate::error::ConfigError;

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token. The Telegram channel runs only when set.
    pub telegram_token: Option<SecretString>,
    /// Telegram usernames or numeric ids allowed to use the bot (`*` = everyone).
    pub allowed_users: Vec<String>,
    /// libSQL database file for finalized ads.
    pub db_path: PathBuf,
    /// Wizard sessions idle longer than this are dropped.
    pub session_ttl: Duration,
    /// Region for phone numbers typed without a country code.
    pub default_region: Option<country::Id>,
    /// Whether to run the stdin/stdout channel.
    pub cli_enabled: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            allowed_users: vec!["*".to_string()],
            db_path: PathBuf::from("./data/adpost.db"),
            session_ttl: Duration::from_secs(3600), // 1 hour
            default_region: Some(country::Id::UA),
            cli_enabled: false,
        }
    }
}

impl BotConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary variable source.
    ///
    /// Unset or empty variables fall back to the defaults. The CLI channel
    /// is turned on when no Telegram token is configured.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let telegram_token = var("TELEGRAM_BOT_TOKEN").map(SecretString::from);

        let allowed_users = match var("ADPOST_ALLOWED_USERS") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.allowed_users,
        };

        let db_path = var("ADPOST_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let session_ttl = match var("ADPOST_SESSION_TTL_SECS") {
            Some(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    key: "ADPOST_SESSION_TTL_SECS".into(),
                    message: format!("expected a number of seconds, got {raw:?}"),
                })?;
                if secs == 0 {
                    return Err(ConfigError::InvalidValue {
                        key: "ADPOST_SESSION_TTL_SECS".into(),
                        message: "must be greater than zero".into(),
                    });
                }
                Duration::from_secs(secs)
            }
            None => defaults.session_ttl,
        };

        let default_region = match var("ADPOST_DEFAULT_REGION") {
            Some(raw) if raw.trim().eq_ignore_ascii_case("none") => None,
            Some(raw) => Some(raw.trim().to_uppercase().parse::<country::Id>().map_err(|_| {
                ConfigError::InvalidValue {
                    key: "ADPOST_DEFAULT_REGION".into(),
                    message: format!("unknown region code {raw:?}"),
                }
            })?),
            None => defaults.default_region,
        };

        let cli_enabled = match var("ADPOST_CLI") {
            Some(raw) => parse_flag("ADPOST_CLI", &raw)?,
            None => telegram_token.is_none(),
        };

        if telegram_token.is_none() && !cli_enabled {
            return Err(ConfigError::NoChannel {
                hint: "Set TELEGRAM_BOT_TOKEN or ADPOST_CLI=1.".into(),
            });
        }

        Ok(Self {
            telegram_token,
            allowed_users,
            db_path,
            session_ttl,
            default_region,
            cli_enabled,
        })
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}
