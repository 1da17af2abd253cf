use std::future::Future;

use super::{seed, TestResult};
use crate::{LedgerStore, StorageError};

pub(super) async fn run_cursor_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "cursor",
        "exhausted_cursor_keeps_returning_none",
        exhausted_cursor_keeps_returning_none(factory).await,
    ));
    results.push(TestResult::from_result(
        "cursor",
        "close_is_idempotent",
        close_is_idempotent(factory).await,
    ));
    results.push(TestResult::from_result(
        "cursor",
        "next_after_close_is_rejected",
        next_after_close_is_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "cursor",
        "cursor_is_a_snapshot_of_open_time",
        cursor_is_a_snapshot_of_open_time(factory).await,
    ));

    results
}

async fn exhausted_cursor_keeps_returning_none<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, &[("A", b"1".to_vec())]).await?;
    let mut cursor = s.range_scan("", "").await.map_err(|e| e.to_string())?;
    let first = cursor.next().await.map_err(|e| e.to_string())?;
    if first.map(|e| e.key).as_deref() != Some("A") {
        return Err("expected first entry A".to_string());
    }
    for _ in 0..2 {
        if cursor.next().await.map_err(|e| e.to_string())?.is_some() {
            return Err("exhausted cursor yielded an item".to_string());
        }
    }
    cursor.close().await.map_err(|e| e.to_string())
}

async fn close_is_idempotent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let mut cursor = s.history_of("A").await.map_err(|e| e.to_string())?;
    cursor.close().await.map_err(|e| format!("first close: {e}"))?;
    cursor.close().await.map_err(|e| format!("second close: {e}"))
}

async fn next_after_close_is_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, &[("A", b"1".to_vec())]).await?;
    let mut cursor = s.range_scan("", "").await.map_err(|e| e.to_string())?;
    cursor.close().await.map_err(|e| e.to_string())?;
    match cursor.next().await {
        Err(StorageError::CursorClosed) => Ok(()),
        other => Err(format!(
            "expected CursorClosed, got {:?}",
            other.map(|o| o.map(|e| e.key))
        )),
    }
}

/// Writes after a cursor is opened are not observed by it.
async fn cursor_is_a_snapshot_of_open_time<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s, &[("A", b"1".to_vec())]).await?;
    let cursor = s.range_scan("", "").await.map_err(|e| e.to_string())?;
    s.put("B", b"2".to_vec()).await.map_err(|e| e.to_string())?;
    let entries = crate::drain(cursor).await.map_err(|e| e.to_string())?;
    let keys: Vec<String> = entries.into_iter().map(|e| e.key).collect();
    if keys != vec!["A"] {
        return Err(format!("expected [A], got {:?}", keys));
    }
    Ok(())
}
