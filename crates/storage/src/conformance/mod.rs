//! Conformance test suite for `LedgerStore` implementations.
//!
//! This module provides a backend-agnostic test suite that any `LedgerStore`
//! implementation can run to verify correctness. The suite covers:
//!
//! - **State**: point get/put/delete, empty-value absence semantics, key validation
//! - **Range**: key ordering, inclusive start / exclusive end, open bounds
//! - **Query**: selector evaluation, non-JSON values, deleted keys
//! - **History**: version ordering, delete markers, transaction ids
//! - **Cursor**: close semantics, drain on failure
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory function that
//! creates a fresh, empty ledger for each test:
//!
//! ```ignore
//! use vendorchain_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn couch_conformance() {
//!     let report = run_conformance_suite(|| async {
//!         create_test_couch_ledger().await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod cursor;
mod history;
mod query;
mod range;
mod state;

use std::fmt;
use std::future::Future;

use crate::LedgerStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "state", "range", "history").
    pub category: String,
    /// Test name (e.g. "get_absent_key_returns_empty").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a ledger backend.
///
/// The `factory` function is called once per test to create a fresh, empty
/// ledger, ensuring test isolation.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(state::run_state_tests(&factory).await);
    results.extend(range::run_range_tests(&factory).await);
    results.extend(query::run_query_tests(&factory).await);
    results.extend(history::run_history_tests(&factory).await);
    results.extend(cursor::run_cursor_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn json_bytes(value: serde_json::Value) -> Vec<u8> {
    value.to_string().into_bytes()
}

fn contract_doc(id: &str, vendor: &str, status: &str, expiry: &str) -> Vec<u8> {
    json_bytes(serde_json::json!({
        "contractId": id,
        "docType": "contract",
        "vendorId": vendor,
        "status": status,
        "expiryDate": expiry,
        "totalValue": 1000,
    }))
}

/// Write each `(key, value)` pair in order.
async fn seed<S: LedgerStore>(s: &S, entries: &[(&str, Vec<u8>)]) -> Result<(), String> {
    for (key, value) in entries {
        s.put(key, value.clone())
            .await
            .map_err(|e| format!("put {}: {}", key, e))?;
    }
    Ok(())
}

async fn scan_keys<S: LedgerStore>(s: &S, start: &str, end: &str) -> Result<Vec<String>, String> {
    let cursor = s.range_scan(start, end).await.map_err(|e| e.to_string())?;
    let entries = crate::drain(cursor).await.map_err(|e| e.to_string())?;
    Ok(entries.into_iter().map(|e| e.key).collect())
}
