use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;

const APP_DIR: &str = "football_ingest";
const DB_FILE: &str = "football.sqlite";

pub const DEFAULT_API_BASE_URL: &str = "https://api-football-v1.p.rapidapi.com/v3";
pub const DEFAULT_API_HOST: &str = "api-football-v1.p.rapidapi.com";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: Option<String>,
    pub api_host: String,
    pub api_base_url: String,
    pub request_timeout: Option<Duration>,
    pub db_path: Option<PathBuf>,
}

impl Config {
    /// Reads `.env.local` and `.env` (if present) before consulting the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::from_filename(".env.local");
        let _ = dotenvy::from_filename(".env");

        let request_timeout = match non_empty_var("FOOTBALL_API_TIMEOUT_SECS") {
            Some(raw) => {
                let secs = raw
                    .parse::<u64>()
                    .map_err(|err| ConfigError::InvalidEnvValue {
                        var: "FOOTBALL_API_TIMEOUT_SECS".to_string(),
                        reason: err.to_string(),
                    })?;
                Some(Duration::from_secs(secs))
            }
            None => None,
        };

        Ok(Self {
            api_key: non_empty_var("FOOTBALL_API_KEY"),
            api_host: non_empty_var("FOOTBALL_API_HOST")
                .unwrap_or_else(|| DEFAULT_API_HOST.to_string()),
            api_base_url: non_empty_var("FOOTBALL_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string()),
            request_timeout,
            db_path: non_empty_var("FOOTBALL_DB_PATH")
                .map(PathBuf::from)
                .or_else(default_db_path),
        })
    }

    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar("FOOTBALL_API_KEY".to_string()))
    }

    pub fn require_db_path(&self) -> Result<PathBuf, ConfigError> {
        self.db_path.clone().ok_or(ConfigError::NoDatabasePath)
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    let raw = std::env::var(key).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}
