//! Process configuration read from environment variables.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use annotate_auth::AuthSettings;

use crate::sync::{SyncSettings, clamp_poll_interval};

const DEFAULT_PORT: u16 = 3001;
const DEFAULT_BIND: &str = "0.0.0.0";
const DEFAULT_DATA_DIR: &str = "./data";
const DEFAULT_GIT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_PANDOC: &str = "pandoc";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} has invalid value {value:?}: {reason}")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(name: &'static str, value: &str, reason: impl ToString) -> Self {
        Self::Invalid {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Documents, the comment file, and the git working tree.
    pub data_dir: PathBuf,
    pub auth: AuthSettings,
    pub sync: SyncSettings,
    /// Upper bound for one git or converter process.
    pub process_timeout: Duration,
    pub pandoc_path: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|e| ConfigError::invalid("PORT", &raw, e))?,
            None => DEFAULT_PORT,
        };
        let bind = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let ip: IpAddr = bind
            .parse()
            .map_err(|e| ConfigError::invalid("BIND_ADDR", &bind, e))?;

        let defaults = AuthSettings::default();
        let auth = AuthSettings {
            production: get("APP_ENV").is_some_and(|v| v.eq_ignore_ascii_case("production")),
            access_enabled: get("CF_ACCESS_ENABLED").is_some_and(|v| v.eq_ignore_ascii_case("true")),
            team_domain: get("CF_ACCESS_TEAM_DOMAIN"),
            audience: get("CF_ACCESS_AUD"),
            dev_email: get("DEV_USER_EMAIL").unwrap_or(defaults.dev_email),
            dev_name: get("DEV_USER_NAME").unwrap_or(defaults.dev_name),
        };

        let sync_defaults = SyncSettings::default();
        let poll_interval = match get("SYNC_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|e| ConfigError::invalid("SYNC_INTERVAL_SECS", &raw, e))?,
            None => sync_defaults.poll_interval,
        };
        let sync = SyncSettings {
            repo_url: get("GIT_REPO_URL"),
            username: get("GIT_USERNAME").unwrap_or(sync_defaults.username),
            token: get("GIT_TOKEN"),
            comments_file: sync_defaults.comments_file,
            poll_interval: clamp_poll_interval(poll_interval),
        };

        let timeout_secs = match get("GIT_TIMEOUT_SECS") {
            Some(raw) => match raw.parse::<u64>() {
                Ok(0) => return Err(ConfigError::invalid("GIT_TIMEOUT_SECS", &raw, "must be positive")),
                Ok(secs) => secs,
                Err(e) => return Err(ConfigError::invalid("GIT_TIMEOUT_SECS", &raw, e)),
            },
            None => DEFAULT_GIT_TIMEOUT_SECS,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(ip, port),
            data_dir: PathBuf::from(get("DATA_DIR").unwrap_or_else(|| DEFAULT_DATA_DIR.to_string())),
            auth,
            sync,
            process_timeout: Duration::from_secs(timeout_secs),
            pandoc_path: get("PANDOC_PATH").unwrap_or_else(|| DEFAULT_PANDOC.to_string()),
        })
    }

    /// Path of the comment database inside the data directory.
    pub fn comments_path(&self) -> PathBuf {
        self.data_dir.join(&self.sync.comments_file)
    }
}
