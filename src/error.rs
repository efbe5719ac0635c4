//! Error types for the selection set.

use thiserror::Error;

/// Main error type for set operations.
///
/// Every variant is returned before the set is touched: a failed call leaves
/// the entries, the selection and the event stream exactly as they were.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SetError {
    #[error("Entry already present at index {index}")]
    DuplicateEntry { index: usize },

    #[error("Index {index} out of range (len is {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Entry not found")]
    EntryNotFound,

    #[error("Invalid initial state: {0}")]
    InvalidInitialState(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for SetError {
    fn from(e: serde_json::Error) -> Self {
        SetError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for SetError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        SetError::Serialization(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SetError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        SetError::Deserialization(e.to_string())
    }
}

/// Result type for set operations.
pub type Result<T> = std::result::Result<T, SetError>;
