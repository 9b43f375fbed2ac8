//! Process configuration read from the environment (and `.env`).

use std::{env, fmt::Display, str::FromStr, time::Duration};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    /// PEM encoded EC private key; push delivery is disabled without it
    pub vapid_private_key_pem: Option<String>,
    pub vapid_public_key: String,
    pub vapid_subject: String,
    pub reminder_check_interval: Duration,
    pub reminder_initial_delay: Duration,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let interval_secs: u64 = parse_or(&get, "REMINDER_CHECK_INTERVAL_SECS", 60)?;
        if interval_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "REMINDER_CHECK_INTERVAL_SECS",
                message: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            database_max_connections: parse_or(&get, "DATABASE_MAX_CONNECTIONS", 5)?,
            jwt_secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            host: get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or(&get, "PORT", 8080)?,
            // .env files usually carry the PEM on one line with escaped newlines
            vapid_private_key_pem: get("VAPID_PRIVATE_KEY_PEM").map(|pem| pem.replace("\\n", "\n")),
            vapid_public_key: get("VAPID_PUBLIC_KEY").unwrap_or_default(),
            vapid_subject: get("VAPID_SUBJECT")
                .unwrap_or_else(|| "mailto:admin@example.com".to_string()),
            reminder_check_interval: Duration::from_secs(interval_secs),
            reminder_initial_delay: Duration::from_secs(parse_or(
                &get,
                "REMINDER_INITIAL_DELAY_SECS",
                2,
            )?),
            log_dir: get("LOG_DIR"),
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            message: e.to_string(),
        }),
        None => Ok(default),
    }
}
