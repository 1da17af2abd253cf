use std::sync::Arc;

use async_trait::async_trait;

use crate::cursor::BoxCursor;
use crate::error::StorageError;
use crate::record::{KeyModification, LedgerEntry};
use crate::selector::Selector;

/// The storage trait for the versioned key-value ledger.
///
/// A `LedgerStore` holds opaque byte values under string keys, ordered by
/// key, and keeps every committed version of every key.
///
/// ## Absence
///
/// `get` never fails for a missing key: absence is signalled by an empty
/// value. Because of that, writing an empty value is rejected with
/// `StorageError::EmptyValue`.
///
/// ## Cursors
///
/// Range scans, rich queries and history lookups return a [`BoxCursor`].
/// Callers must drain and close it; use [`crate::drain`] or
/// [`crate::drain_map`], which close on every path.
///
/// ## Concurrency
///
/// The trait makes no promise about concurrent read-modify-write on one key.
/// Serializing or rejecting conflicting commits is the ledger platform's job.
///
/// Implementations must be `Send + Sync + 'static` so a store handle can be
/// shared across async task boundaries.
#[async_trait]
pub trait LedgerStore: Send + Sync + 'static {
    // ── Point operations ──────────────────────────────────────────────────────

    /// Read the current value at `key`; empty when the key is absent or deleted.
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write `value` at `key`, recording a new version in the key's history.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError>;

    /// Delete `key`, recording a delete marker in the key's history.
    ///
    /// Deleting an absent key is a no-op and records nothing.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    // ── Cursor operations ─────────────────────────────────────────────────────

    /// Scan live keys in `[start_key, end_key)`, in key order.
    ///
    /// An empty `start_key` or `end_key` leaves that side of the range open,
    /// so `range_scan("", "")` enumerates the whole key space.
    async fn range_scan(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<BoxCursor<LedgerEntry>, StorageError>;

    /// Return live entries whose JSON value satisfies `selector`.
    ///
    /// Values that are not JSON documents are never matched.
    async fn rich_query(&self, selector: &Selector) -> Result<BoxCursor<LedgerEntry>, StorageError>;

    /// Return every committed version of `key`, earliest first.
    ///
    /// A key that was never written yields an empty cursor, not an error.
    async fn history_of(&self, key: &str) -> Result<BoxCursor<KeyModification>, StorageError>;
}

#[async_trait]
impl<S: LedgerStore + ?Sized> LedgerStore for Arc<S> {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        (**self).put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        (**self).delete(key).await
    }

    async fn range_scan(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<BoxCursor<LedgerEntry>, StorageError> {
        (**self).range_scan(start_key, end_key).await
    }

    async fn rich_query(&self, selector: &Selector) -> Result<BoxCursor<LedgerEntry>, StorageError> {
        (**self).rich_query(selector).await
    }

    async fn history_of(&self, key: &str) -> Result<BoxCursor<KeyModification>, StorageError> {
        (**self).history_of(key).await
    }
}
