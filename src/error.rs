use rusqlite::ErrorCode;
use rusqlite::ffi;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("http {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("invalid json from upstream: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("upstream reported errors: {0}")]
    Upstream(String),
    #[error("{0} not found upstream")]
    NotFound(String),
    #[error("invalid request header: {0}")]
    InvalidHeader(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key: {0}")]
    Duplicate(String),
    #[error("foreign key violation: {0}")]
    ForeignKey(String),
    #[error(transparent)]
    Sqlite(rusqlite::Error),
}

impl StoreError {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate(_))
    }

    pub fn is_foreign_key(&self) -> bool {
        matches!(self, StoreError::ForeignKey(_))
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        let rusqlite::Error::SqliteFailure(code, msg) = &err else {
            return StoreError::Sqlite(err);
        };
        if code.code != ErrorCode::ConstraintViolation {
            return StoreError::Sqlite(err);
        }
        let detail = msg.clone().unwrap_or_else(|| code.to_string());
        match code.extended_code {
            ffi::SQLITE_CONSTRAINT_FOREIGNKEY => StoreError::ForeignKey(detail),
            ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => {
                StoreError::Duplicate(detail)
            }
            _ => StoreError::Sqlite(err),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue { var: String, reason: String },
    #[error("unable to resolve a database path; set FOOTBALL_DB_PATH")]
    NoDatabasePath,
}
