//! Error types shared by every module of the core.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Bad credentials or an unusable login response. The message is meant
    /// for the login form.
    #[error("{0}")]
    Auth(String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Unexpected response shape: {0}")]
    DataShape(String),

    #[error("Credential store error: {0}")]
    CredentialStore(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got '{value}'")]
    InvalidNumber { key: String, value: String },

    #[error("{key} must be an http(s) URL, got '{value}'")]
    InvalidUrl { key: String, value: String },
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<keyring::Error> for Error {
    fn from(err: keyring::Error) -> Self {
        Error::CredentialStore(err.to_string())
    }
}
