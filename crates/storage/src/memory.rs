//! In-memory `LedgerStore` backend.
//!
//! `MemoryLedger` keeps live state in an ordered map and every committed
//! version in a per-key history. Each write is its own committed
//! transaction, identified by a SHA-256 transaction id.
//!
//! It also carries test hooks: an open-cursor counter (cursors that are
//! never closed stay counted), and fault injection for writes and cursors.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use sha2::{Digest, Sha256};
use tokio::sync::Mutex;

use crate::cursor::{BoxCursor, VecCursor};
use crate::error::StorageError;
use crate::record::{KeyModification, LedgerEntry, LedgerTimestamp};
use crate::selector::Selector;
use crate::traits::LedgerStore;

#[derive(Default)]
struct Inner {
    state: BTreeMap<String, Vec<u8>>,
    history: HashMap<String, Vec<KeyModification>>,
    tx_counter: u64,
    fail_writes: bool,
    cursor_fault: Option<usize>,
}

impl Inner {
    fn next_tx_id(&mut self, key: &str, at: LedgerTimestamp) -> String {
        self.tx_counter += 1;
        let digest = Sha256::digest(
            format!("{}:{}:{}.{}", self.tx_counter, key, at.seconds, at.nanos).as_bytes(),
        );
        digest.iter().map(|b| format!("{:02x}", b)).collect()
    }

    fn record(&mut self, key: &str, is_delete: bool, value: Vec<u8>) {
        let timestamp = LedgerTimestamp::now();
        let tx_id = self.next_tx_id(key, timestamp);
        self.history
            .entry(key.to_string())
            .or_default()
            .push(KeyModification {
                tx_id,
                timestamp,
                is_delete,
                value,
            });
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Backend(
                "ledger rejected the write".to_string(),
            ));
        }
        Ok(())
    }
}

/// A cloneable in-memory ledger. Clones share the same state.
#[derive(Clone, Default)]
pub struct MemoryLedger {
    inner: Arc<Mutex<Inner>>,
    open_cursors: Arc<AtomicUsize>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cursors handed out and not yet closed.
    pub fn open_cursors(&self) -> usize {
        self.open_cursors.load(Ordering::SeqCst)
    }

    /// Total number of committed transactions (puts and deletes).
    pub async fn tx_count(&self) -> u64 {
        self.inner.lock().await.tx_counter
    }

    /// Make every subsequent `put`/`delete` fail with a backend error.
    pub async fn fail_writes(&self, fail: bool) {
        self.inner.lock().await.fail_writes = fail;
    }

    /// Make cursors opened from now on fail after yielding `n` items.
    pub async fn fail_cursors_after(&self, n: Option<usize>) {
        self.inner.lock().await.cursor_fault = n;
    }

    fn cursor<T: Send + 'static>(&self, items: Vec<T>, fault: Option<usize>) -> BoxCursor<T> {
        Box::new(
            VecCursor::new(items)
                .tracked(Arc::clone(&self.open_cursors))
                .fail_after(fault),
        )
    }
}

fn check_key(key: &str) -> Result<(), StorageError> {
    if key.is_empty() {
        return Err(StorageError::EmptyKey);
    }
    Ok(())
}

fn bound(key: &str, included: bool) -> Bound<&str> {
    match (key.is_empty(), included) {
        (true, _) => Bound::Unbounded,
        (false, true) => Bound::Included(key),
        (false, false) => Bound::Excluded(key),
    }
}

#[async_trait]
impl LedgerStore for MemoryLedger {
    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(key)?;
        let inner = self.inner.lock().await;
        Ok(inner.state.get(key).cloned().unwrap_or_default())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
        check_key(key)?;
        if value.is_empty() {
            return Err(StorageError::EmptyValue {
                key: key.to_string(),
            });
        }
        let mut inner = self.inner.lock().await;
        inner.check_writable()?;
        inner.state.insert(key.to_string(), value.clone());
        inner.record(key, false, value);
        tracing::debug!(target: "vendorchain::ledger", key, tx = inner.tx_counter, "put committed");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        check_key(key)?;
        let mut inner = self.inner.lock().await;
        inner.check_writable()?;
        if inner.state.remove(key).is_some() {
            inner.record(key, true, Vec::new());
            tracing::debug!(target: "vendorchain::ledger", key, tx = inner.tx_counter, "delete committed");
        }
        Ok(())
    }

    async fn range_scan(
        &self,
        start_key: &str,
        end_key: &str,
    ) -> Result<BoxCursor<LedgerEntry>, StorageError> {
        if !start_key.is_empty() && !end_key.is_empty() && start_key > end_key {
            return Err(StorageError::InvalidRange {
                start: start_key.to_string(),
                end: end_key.to_string(),
            });
        }
        let inner = self.inner.lock().await;
        let entries: Vec<LedgerEntry> = inner
            .state
            .range::<str, _>((bound(start_key, true), bound(end_key, false)))
            .map(|(k, v)| LedgerEntry::new(k.clone(), v.clone()))
            .collect();
        Ok(self.cursor(entries, inner.cursor_fault))
    }

    async fn rich_query(&self, selector: &Selector) -> Result<BoxCursor<LedgerEntry>, StorageError> {
        let inner = self.inner.lock().await;
        let entries: Vec<LedgerEntry> = inner
            .state
            .iter()
            .filter(|(_, v)| {
                serde_json::from_slice::<serde_json::Value>(v)
                    .map(|doc| selector.matches(&doc))
                    .unwrap_or(false)
            })
            .map(|(k, v)| LedgerEntry::new(k.clone(), v.clone()))
            .collect();
        Ok(self.cursor(entries, inner.cursor_fault))
    }

    async fn history_of(&self, key: &str) -> Result<BoxCursor<KeyModification>, StorageError> {
        check_key(key)?;
        let inner = self.inner.lock().await;
        let versions = inner.history.get(key).cloned().unwrap_or_default();
        Ok(self.cursor(versions, inner.cursor_fault))
    }
}
