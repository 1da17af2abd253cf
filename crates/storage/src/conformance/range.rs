use std::future::Future;

use super::{scan_keys, seed, TestResult};
use crate::{LedgerStore, StorageError};

pub(super) async fn run_range_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "range",
        "full_scan_on_empty_ledger_is_empty",
        full_scan_on_empty_ledger_is_empty(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "full_scan_returns_keys_in_lexicographic_order",
        full_scan_returns_keys_in_lexicographic_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "start_inclusive_end_exclusive",
        start_inclusive_end_exclusive(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "open_start_and_open_end",
        open_start_and_open_end(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "deleted_keys_are_not_scanned",
        deleted_keys_are_not_scanned(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "scan_pairs_each_key_with_its_value",
        scan_pairs_each_key_with_its_value(factory).await,
    ));
    results.push(TestResult::from_result(
        "range",
        "inverted_range_is_rejected",
        inverted_range_is_rejected(factory).await,
    ));

    results
}

// ── Ordering ─────────────────────────────────────────────────────────────────

async fn full_scan_on_empty_ledger_is_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let keys = scan_keys(&s, "", "").await?;
    if !keys.is_empty() {
        return Err(format!("expected no keys, got {:?}", keys));
    }
    Ok(())
}

/// Insertion order must not leak into scan order.
async fn full_scan_returns_keys_in_lexicographic_order<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("CONTRACT003", b"c".to_vec()),
            ("CONTRACT001", b"a".to_vec()),
            ("CONTRACT010", b"d".to_vec()),
            ("CONTRACT002", b"b".to_vec()),
        ],
    )
    .await?;
    let keys = scan_keys(&s, "", "").await?;
    let expected = vec!["CONTRACT001", "CONTRACT002", "CONTRACT003", "CONTRACT010"];
    if keys != expected {
        return Err(format!("expected {:?}, got {:?}", expected, keys));
    }
    Ok(())
}

// ── Bounds ───────────────────────────────────────────────────────────────────

async fn start_inclusive_end_exclusive<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("A", b"1".to_vec()),
            ("B", b"2".to_vec()),
            ("C", b"3".to_vec()),
            ("D", b"4".to_vec()),
        ],
    )
    .await?;
    let keys = scan_keys(&s, "B", "D").await?;
    if keys != vec!["B", "C"] {
        return Err(format!("expected [B, C], got {:?}", keys));
    }
    Ok(())
}

async fn open_start_and_open_end<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("A", b"1".to_vec()),
            ("B", b"2".to_vec()),
            ("C", b"3".to_vec()),
        ],
    )
    .await?;
    let head = scan_keys(&s, "", "B").await?;
    if head != vec!["A"] {
        return Err(format!("open start: expected [A], got {:?}", head));
    }
    let tail = scan_keys(&s, "B", "").await?;
    if tail != vec!["B", "C"] {
        return Err(format!("open end: expected [B, C], got {:?}", tail));
    }
    Ok(())
}

// ── Contents ─────────────────────────────────────────────────────────────────

async fn deleted_keys_are_not_scanned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, &[("A", b"1".to_vec()), ("B", b"2".to_vec())]).await?;
    s.delete("A").await.map_err(|e| e.to_string())?;
    let keys = scan_keys(&s, "", "").await?;
    if keys != vec!["B"] {
        return Err(format!("expected [B], got {:?}", keys));
    }
    Ok(())
}

async fn scan_pairs_each_key_with_its_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, &[("A", b"alpha".to_vec()), ("B", b"beta".to_vec())]).await?;
    let cursor = s.range_scan("", "").await.map_err(|e| e.to_string())?;
    let entries = crate::drain(cursor).await.map_err(|e| e.to_string())?;
    for entry in &entries {
        let expected: &[u8] = match entry.key.as_str() {
            "A" => b"alpha",
            "B" => b"beta",
            other => return Err(format!("unexpected key {:?}", other)),
        };
        if entry.value != expected {
            return Err(format!("value mismatch for key {}", entry.key));
        }
    }
    if entries.len() != 2 {
        return Err(format!("expected 2 entries, got {}", entries.len()));
    }
    Ok(())
}

// ── Errors ───────────────────────────────────────────────────────────────────

async fn inverted_range_is_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.range_scan("Z", "A").await {
        Err(StorageError::InvalidRange { start, end }) => {
            if start != "Z" || end != "A" {
                return Err(format!(
                    "expected start \"Z\" end \"A\", got \"{}\" \"{}\"",
                    start, end
                ));
            }
            Ok(())
        }
        Err(other) => Err(format!("expected InvalidRange, got {:?}", other)),
        Ok(_) => Err("expected InvalidRange, got a cursor".to_string()),
    }
}
