//! Error types for pipeset.

use thiserror::Error;

use crate::TargetName;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to authenticate: {0}")]
    Authentication(String),

    #[error("Version mismatch: client is {client}, server is {server}")]
    VersionMismatch {
        client: String,
        server: String,
        target: TargetName,
    },

    #[error("invalid version '{version}': {message}")]
    VersionParse { version: String, message: String },

    #[error("pipeline config has errors: {}", .errors.join("; "))]
    PipelineConfig { errors: Vec<String> },

    #[error("invalid configuration: {}", .errors.join("; "))]
    InvalidConfig { errors: Vec<String> },

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("unexpected response ({status}): {body}")]
    UnexpectedResponse { status: u16, body: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("CA Cert not valid: {0}")]
    InvalidCaCert(String),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
