use crate::errors::StoreError;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;
