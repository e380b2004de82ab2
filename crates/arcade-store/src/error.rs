/// Errors from document store operations.
///
/// An absent object is not an error; see [`DocumentStore::fetch`](crate::DocumentStore::fetch).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key cannot address an object in this store.
    #[error("invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Storage backend is unreachable or refused the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
