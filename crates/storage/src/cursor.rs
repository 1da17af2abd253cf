//! Cursors over range scans, rich queries and key history.
//!
//! A cursor is a server-side handle: it must be drained and then closed, on
//! every exit path. Callers should not drive `next()`/`close()` by hand;
//! [`drain`] and [`drain_map`] consume the whole cursor into an owned `Vec`
//! and always close it, whether iteration succeeds, the backend fails
//! mid-stream, or the mapping function rejects an item.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageError;

/// An iteration handle over a ledger query result.
#[async_trait]
pub trait Cursor: Send {
    type Item: Send;

    /// Yield the next item, or `None` once exhausted.
    ///
    /// Returns `Err(StorageError::CursorClosed)` if called after `close()`.
    async fn next(&mut self) -> Result<Option<Self::Item>, StorageError>;

    /// Release the cursor. Closing twice is a no-op.
    async fn close(&mut self) -> Result<(), StorageError>;
}

/// Boxed cursor as returned by `LedgerStore` query methods.
pub type BoxCursor<T> = Box<dyn Cursor<Item = T>>;

/// Drain a cursor into a `Vec`, closing it on every path.
pub async fn drain<T: Send>(cursor: BoxCursor<T>) -> Result<Vec<T>, StorageError> {
    drain_map(cursor, |item| Ok::<_, StorageError>(Some(item))).await
}

/// Drain a cursor, mapping each item through `f`, closing it on every path.
///
/// `f` returns `Ok(None)` to skip an item. The first error from either the
/// cursor or `f` stops iteration; the cursor is still closed before the error
/// is returned. If iteration succeeded but `close()` fails, the close error
/// is returned.
pub async fn drain_map<T, U, E, F>(mut cursor: BoxCursor<T>, mut f: F) -> Result<Vec<U>, E>
where
    T: Send,
    E: From<StorageError>,
    F: FnMut(T) -> Result<Option<U>, E>,
{
    let mut out = Vec::new();
    let drained: Result<(), E> = loop {
        match cursor.next().await {
            Ok(Some(item)) => match f(item) {
                Ok(Some(mapped)) => out.push(mapped),
                Ok(None) => {}
                Err(e) => break Err(e),
            },
            Ok(None) => break Ok(()),
            Err(e) => break Err(E::from(e)),
        }
    };

    let closed = cursor.close().await;
    match (drained, closed) {
        (Ok(()), Ok(())) => Ok(out),
        (Ok(()), Err(close_err)) => Err(E::from(close_err)),
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(close_err)) => {
            tracing::warn!(
                target: "vendorchain::ledger",
                error = %close_err,
                "cursor close failed after iteration error"
            );
            Err(e)
        }
    }
}

// ── VecCursor ────────────────────────────────────────────────────────────────

/// A cursor over an already-materialized result set.
///
/// Backends that evaluate queries eagerly (like `MemoryLedger`) hand these
/// out. When created with an open-cursor counter, the counter is incremented
/// on creation and decremented on the first `close()`, so a leaked cursor
/// stays visible in the count.
pub struct VecCursor<T> {
    items: std::vec::IntoIter<T>,
    yielded: usize,
    fail_after: Option<usize>,
    open: Option<Arc<AtomicUsize>>,
    closed: bool,
}

impl<T> VecCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
            yielded: 0,
            fail_after: None,
            open: None,
            closed: false,
        }
    }

    /// Register this cursor with an open-cursor counter.
    pub fn tracked(mut self, open: Arc<AtomicUsize>) -> Self {
        open.fetch_add(1, Ordering::SeqCst);
        self.open = Some(open);
        self
    }

    /// Make `next()` fail with a backend error once `n` items have been yielded.
    pub fn fail_after(mut self, n: Option<usize>) -> Self {
        self.fail_after = n;
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[async_trait]
impl<T: Send> Cursor for VecCursor<T> {
    type Item = T;

    async fn next(&mut self) -> Result<Option<T>, StorageError> {
        if self.closed {
            return Err(StorageError::CursorClosed);
        }
        if let Some(limit) = self.fail_after {
            if self.yielded >= limit {
                return Err(StorageError::Backend(format!(
                    "cursor failed after {} items",
                    limit
                )));
            }
        }
        let item = self.items.next();
        if item.is_some() {
            self.yielded += 1;
        }
        Ok(item)
    }

    async fn close(&mut self) -> Result<(), StorageError> {
        if !self.closed {
            self.closed = true;
            if let Some(open) = &self.open {
                open.fetch_sub(1, Ordering::SeqCst);
            }
        }
        Ok(())
    }
}
