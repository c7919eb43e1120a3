//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Everything that can make a single submission fail.
///
/// Missing fields deep inside a packet are not errors; the extractor
/// substitutes defaults for those.
#[derive(Error, Debug)]
pub enum Error {
    /// The request body was not a `{videoId, data}` JSON object.
    #[error("Malformed submission: {0}")]
    MalformedSubmission(String),

    /// The request body exceeded the configured size limit.
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// A message with this id is already stored.
    #[error("Duplicate message id: {id:?}")]
    Duplicate { id: String },

    #[error("Storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Discriminant of [`Error`], used to map failures to responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MalformedSubmission,
    PayloadTooLarge,
    Duplicate,
    Storage,
    Io,
    Serialization,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MalformedSubmission(_) => ErrorKind::MalformedSubmission,
            Error::PayloadTooLarge(_) => ErrorKind::PayloadTooLarge,
            Error::Duplicate { .. } => ErrorKind::Duplicate,
            Error::Storage(_) => ErrorKind::Storage,
            Error::Io(_) => ErrorKind::Io,
            Error::Serialization(_) => ErrorKind::Serialization,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
