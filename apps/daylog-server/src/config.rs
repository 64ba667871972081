//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::Duration;

use daylog_core::services::AuthPolicy;
use daylog_infra::database::DatabaseConfig;

/// Minimum length of the session signing key, in bytes.
pub const MIN_SESSION_KEY_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },

    #[error("SESSION_KEY must be at least 32 bytes")]
    SessionKeyTooShort,
}

/// The login secret, either as given or as a pre-computed PHC hash.
#[derive(Clone)]
pub enum AuthSecret {
    Plain(String),
    Hashed(String),
}

impl std::fmt::Debug for AuthSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("AuthSecret::Plain(..)"),
            Self::Hashed(_) => f.write_str("AuthSecret::Hashed(..)"),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: DatabaseConfig,
    pub session_key: String,
    pub auth_secret: AuthSecret,
    pub upload_dir: PathBuf,
    pub policy: AuthPolicy,
    pub thumbnail_size: u32,
    pub job_queue_workers: usize,
    pub job_queue_max_size: usize,
    pub max_upload_bytes: u64,
    pub login_rate_limit_per_minute: u32,
    pub secure_cookies: bool,
    pub scheduler_enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(lookup);

        let session_key = vars.required("SESSION_KEY")?;
        if session_key.len() < MIN_SESSION_KEY_LEN {
            return Err(ConfigError::SessionKeyTooShort);
        }

        let auth_secret = match (vars.get("AUTH_SECRET_HASH"), vars.get("AUTH_SECRET")) {
            (Some(hash), _) => AuthSecret::Hashed(hash),
            (None, Some(secret)) => AuthSecret::Plain(secret),
            (None, None) => return Err(ConfigError::Missing("AUTH_SECRET")),
        };

        let url = vars
            .get("DATABASE_URL")
            .unwrap_or_else(|| "sqlite://daylog.db?mode=rwc".to_string());
        let database = if url.contains(":memory:") {
            DatabaseConfig::in_memory()
        } else {
            let max_connections = vars.parse("DB_MAX_CONNECTIONS", 5)?;
            DatabaseConfig {
                url,
                max_connections,
                min_connections: 1,
            }
        };

        let policy = AuthPolicy {
            archive_window: Duration::minutes(vars.parse("ARCHIVE_WINDOW_MINUTES", 30)?),
            recency_horizon: Duration::days(vars.parse("RECENCY_HORIZON_DAYS", 7)?),
        };

        let max_upload_mb: u64 = vars.parse("MAX_UPLOAD_MB", 25)?;

        Ok(Self {
            host: vars.get("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: vars.parse("PORT", 3002)?,
            database,
            session_key,
            auth_secret,
            upload_dir: vars
                .get("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("uploads")),
            policy,
            thumbnail_size: vars.parse("THUMBNAIL_SIZE", 500)?,
            job_queue_workers: vars.parse("JOB_QUEUE_WORKERS", 2)?,
            job_queue_max_size: vars.parse("JOB_QUEUE_MAX_SIZE", 256)?,
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            login_rate_limit_per_minute: vars.parse("LOGIN_RATE_LIMIT_PER_MINUTE", 10)?,
            secure_cookies: vars.flag("SECURE_COOKIES", false),
            scheduler_enabled: vars.flag("SCHEDULER_ENABLED", true),
        })
    }
}

struct Vars<F>(F);

impl<F> Vars<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &'static str) -> Result<String, ConfigError> {
        self.get(key).ok_or(ConfigError::Missing(key))
    }

    fn parse<T: FromStr>(&self, key: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(key) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { key, value }),
        }
    }

    fn flag(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map(|v| v != "false" && v != "0")
            .unwrap_or(default)
    }
}
