use core_types::{CoreError, SourceKind};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CollectorError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The {kind} API returned HTTP {status}: {body}")]
    Api {
        kind: SourceKind,
        status: u16,
        body: String,
    },

    #[error("Failed to deserialize the {kind} response: {message}")]
    Deserialization { kind: SourceKind, message: String },

    #[error("Invalid data from the {kind} API: {message}")]
    InvalidData { kind: SourceKind, message: String },

    #[error("KEY_ERROR: the secondary marketplace session key is missing or expired")]
    SessionExpired,

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Collected snapshot is invalid: {0}")]
    Snapshot(#[from] CoreError),

    #[error("Collector task failed: {0}")]
    Task(String),
}

impl CollectorError {
    pub(crate) fn invalid(kind: SourceKind, message: impl Into<String>) -> Self {
        CollectorError::InvalidData {
            kind,
            message: message.into(),
        }
    }
}
