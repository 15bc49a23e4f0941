//! Environment-driven client configuration.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::watcher::LivenessConfig;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_SESSION_COOKIE: &str = "connect.sid";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: &'static str, value: String },

    #[error("could not resolve a data directory for the session file; set BIZOPS_SESSION_FILE")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the backend API.
    pub api_url: String,
    /// Where the persisted session lives.
    pub session_file: PathBuf,
    /// Cookie carrying the session id on session checks.
    pub session_cookie: String,
    /// Optional request timeout for session checks (none by default).
    pub check_timeout: Option<Duration>,
    pub liveness: LivenessConfig,
}

impl ClientConfig {
    /// Read configuration from `BIZOPS_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = LivenessConfig::default();

        let api_url = lookup("BIZOPS_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_file = match lookup("BIZOPS_SESSION_FILE") {
            Some(path) => PathBuf::from(path),
            None => default_session_file()?,
        };

        let session_cookie =
            lookup("BIZOPS_SESSION_COOKIE").unwrap_or_else(|| DEFAULT_SESSION_COOKIE.to_string());

        let idle_timeout = duration_var(&lookup, "BIZOPS_IDLE_TIMEOUT_SECS", Duration::from_secs)?
            .unwrap_or(defaults.idle_timeout);
        let poll_interval = duration_var(&lookup, "BIZOPS_SESSION_POLL_SECS", Duration::from_secs)?
            .unwrap_or(defaults.poll_interval);
        let activity_throttle =
            duration_var(&lookup, "BIZOPS_ACTIVITY_THROTTLE_MS", Duration::from_millis)?
                .unwrap_or(defaults.activity_throttle);
        let check_timeout =
            duration_var(&lookup, "BIZOPS_CHECK_TIMEOUT_SECS", Duration::from_secs)?;

        Ok(Self {
            api_url,
            session_file,
            session_cookie,
            check_timeout,
            liveness: LivenessConfig {
                idle_timeout,
                poll_interval,
                activity_throttle,
            },
        })
    }
}

fn duration_var<F>(
    lookup: &F,
    key: &'static str,
    unit: fn(u64) -> Duration,
) -> Result<Option<Duration>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };

    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(Some(unit(n))),
        _ => Err(ConfigError::InvalidNumber { key, value: raw }),
    }
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    let base = dirs::data_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
        .ok_or(ConfigError::NoDataDir)?;
    Ok(base.join("bizops").join("session.json"))
}
