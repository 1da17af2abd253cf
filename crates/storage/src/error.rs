/// All errors that can be returned by a LedgerStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Keys are never empty; the empty key is reserved as the open range bound.
    #[error("ledger key must not be empty")]
    EmptyKey,

    /// An empty value is indistinguishable from an absent key, so it cannot be written.
    #[error("refusing to write an empty value at key {key}")]
    EmptyValue { key: String },

    /// Range scan with a start key that sorts after its end key.
    #[error("invalid range: start key {start:?} sorts after end key {end:?}")]
    InvalidRange { start: String, end: String },

    /// `next()` was called on a cursor after it was closed.
    #[error("cursor already closed")]
    CursorClosed,

    /// A backend-specific storage error (connectivity, I/O, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}
