//! Error types for weekplan-core

use thiserror::Error;

use crate::time::TimeParseError;
use crate::types::Weekday;

/// Main error type for the weekplan-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Unparseable time token or range
    #[error(transparent)]
    Time(#[from] TimeParseError),

    /// Caller addressed a task slot that does not exist
    #[error("no task at index {index} on {day} (day has {len} task(s))")]
    IndexOutOfRange {
        day: Weekday,
        index: usize,
        len: usize,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// LLM error
    #[error("LLM error: {0}")]
    Llm(String),

    /// Calendar API error
    #[error("calendar error: {0}")]
    Calendar(String),

    /// Key-value store error
    #[error("store error: {0}")]
    Store(String),
}

/// Result type alias for weekplan-core
pub type Result<T> = std::result::Result<T, Error>;
