//! Error types for the store

use thiserror::Error;

/// Errors raised synchronously by the reducer.
///
/// A reducer call that returns an error leaves the caller's `State` as it was;
/// no partially applied state is ever produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0}")]
    DuplicateId(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),
}

impl StoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        StoreError::InvalidAction(reason.into())
    }
}

/// Errors from loading a [`StoreConfig`](crate::StoreConfig).
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
