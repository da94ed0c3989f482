//! Server configuration, read from the environment (and `.env`).

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use catsocial_db::PoolOptions;

/// Placeholder JWT secrets that must not reach production.
pub const PLACEHOLDER_SECRETS: &[&str] = &["dev-secret-change-me", "change-me-to-a-random-string"];

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub pool: PoolOptions,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl: chrono::Duration,
    /// Argon2 iteration count, read from `BCRYPT_SALT`.
    pub hash_cost: u32,
    pub env: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("JWT_SECRET is unset or still a placeholder; refusing to start in production")]
    PlaceholderSecret,

    #[error("invalid bind address {0}")]
    BadAddress(String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        fn parsed<T: FromStr>(
            raw: Option<String>,
            name: &'static str,
            default: T,
        ) -> Result<T, ConfigError> {
            match raw {
                None => Ok(default),
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::Invalid { name, value }),
            }
        }

        let env = var("ENV").unwrap_or_else(|| "development".into());

        let jwt_secret = var("JWT_SECRET").unwrap_or_else(|| PLACEHOLDER_SECRETS[0].into());
        if env == "production" && PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::PlaceholderSecret);
        }

        let hash_cost_raw = var("BCRYPT_SALT").ok_or(ConfigError::MissingEnv("BCRYPT_SALT"))?;
        let hash_cost: u32 = parsed(Some(hash_cost_raw.clone()), "BCRYPT_SALT", 0)?;
        if hash_cost == 0 {
            return Err(ConfigError::Invalid {
                name: "BCRYPT_SALT",
                value: hash_cost_raw,
            });
        }

        let pool = PoolOptions {
            max_readers: parsed(var("DB_MAX_READERS"), "DB_MAX_READERS", 4)?,
            max_lifetime: Duration::from_secs(parsed(
                var("DB_MAX_CONN_LIFETIME_SECS"),
                "DB_MAX_CONN_LIFETIME_SECS",
                3600,
            )?),
            idle_timeout: Duration::from_secs(parsed(
                var("DB_MAX_CONN_IDLE_SECS"),
                "DB_MAX_CONN_IDLE_SECS",
                1800,
            )?),
            busy_timeout: Duration::from_millis(parsed(
                var("DB_BUSY_TIMEOUT_MS"),
                "DB_BUSY_TIMEOUT_MS",
                5000,
            )?),
        };

        let ttl_hours: i64 = parsed(var("JWT_TTL_HOURS"), "JWT_TTL_HOURS", 8)?;
        let token_ttl = chrono::Duration::try_hours(ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| ConfigError::Invalid {
                name: "JWT_TTL_HOURS",
                value: ttl_hours.to_string(),
            })?;

        Ok(Self {
            db_path: var("DB_PATH").unwrap_or_else(|| "catsocial.db".into()).into(),
            pool,
            host: var("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parsed(var("APP_PORT"), "APP_PORT", 8000)?,
            jwt_secret,
            token_ttl,
            hash_cost,
            env,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::BadAddress(raw))
    }

    pub fn uses_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
