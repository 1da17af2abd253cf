use std::future::Future;
use std::sync::Arc;

use super::{json_bytes, TestResult};
use crate::{LedgerStore, StorageError};

/// Number of concurrent writers in the concurrency test.
const N: usize = 10;

pub(super) async fn run_state_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "state",
        "get_absent_key_returns_empty",
        get_absent_key_returns_empty(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "put_then_get_returns_value",
        put_then_get_returns_value(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "put_overwrites_full_value",
        put_overwrites_full_value(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "delete_makes_key_absent",
        delete_makes_key_absent(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "delete_absent_key_is_noop",
        delete_absent_key_is_noop(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "empty_key_is_rejected",
        empty_key_is_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "empty_value_is_rejected",
        empty_value_is_rejected(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "keys_are_independent",
        keys_are_independent(factory).await,
    ));
    results.push(TestResult::from_result(
        "state",
        "concurrent_puts_to_distinct_keys_all_land",
        concurrent_puts_to_distinct_keys_all_land(factory).await,
    ));

    results
}

// ── 1. Absence is an empty value, not an error ───────────────────────────────

async fn get_absent_key_returns_empty<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let value = s.get("CONTRACT999").await.map_err(|e| e.to_string())?;
    if !value.is_empty() {
        return Err(format!("expected empty value, got {} bytes", value.len()));
    }
    Ok(())
}

// ── 2. Point write is visible to point read ──────────────────────────────────

async fn put_then_get_returns_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let value = json_bytes(serde_json::json!({"contractId": "C1"}));
    s.put("C1", value.clone())
        .await
        .map_err(|e| e.to_string())?;
    let read = s.get("C1").await.map_err(|e| e.to_string())?;
    if read != value {
        return Err(format!(
            "expected {:?}, got {:?}",
            String::from_utf8_lossy(&value),
            String::from_utf8_lossy(&read)
        ));
    }
    Ok(())
}

// ── 3. A second put replaces the whole value ─────────────────────────────────

async fn put_overwrites_full_value<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"first-version-longer".to_vec())
        .await
        .map_err(|e| e.to_string())?;
    s.put("C1", b"second".to_vec())
        .await
        .map_err(|e| e.to_string())?;
    let read = s.get("C1").await.map_err(|e| e.to_string())?;
    if read != b"second" {
        return Err(format!(
            "expected \"second\", got {:?}",
            String::from_utf8_lossy(&read)
        ));
    }
    Ok(())
}

// ── 4. delete → get returns empty ────────────────────────────────────────────

async fn delete_makes_key_absent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"v".to_vec()).await.map_err(|e| e.to_string())?;
    s.delete("C1").await.map_err(|e| e.to_string())?;
    let read = s.get("C1").await.map_err(|e| e.to_string())?;
    if !read.is_empty() {
        return Err("deleted key still readable".to_string());
    }
    Ok(())
}

// ── 5. delete of an absent key succeeds and records nothing ──────────────────

async fn delete_absent_key_is_noop<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.delete("NEVER").await.map_err(|e| e.to_string())?;
    let cursor = s.history_of("NEVER").await.map_err(|e| e.to_string())?;
    let history = crate::drain(cursor).await.map_err(|e| e.to_string())?;
    if !history.is_empty() {
        return Err(format!(
            "expected no history for absent key, got {} versions",
            history.len()
        ));
    }
    Ok(())
}

// ── 6. Empty key rejected on every point operation ───────────────────────────

async fn empty_key_is_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get("").await {
        Err(StorageError::EmptyKey) => {}
        other => return Err(format!("get: expected EmptyKey, got {:?}", other)),
    }
    match s.put("", b"v".to_vec()).await {
        Err(StorageError::EmptyKey) => {}
        other => return Err(format!("put: expected EmptyKey, got {:?}", other)),
    }
    match s.delete("").await {
        Err(StorageError::EmptyKey) => Ok(()),
        other => Err(format!("delete: expected EmptyKey, got {:?}", other)),
    }
}

// ── 7. Empty value would read back as absence, so it is refused ──────────────

async fn empty_value_is_rejected<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.put("C1", Vec::new()).await {
        Err(StorageError::EmptyValue { key }) => {
            if key != "C1" {
                return Err(format!("expected key \"C1\", got \"{}\"", key));
            }
            Ok(())
        }
        other => Err(format!("expected EmptyValue, got {:?}", other)),
    }
}

// ── 8. Writing one key does not touch another ────────────────────────────────

async fn keys_are_independent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"one".to_vec()).await.map_err(|e| e.to_string())?;
    s.put("C2", b"two".to_vec()).await.map_err(|e| e.to_string())?;
    s.delete("C1").await.map_err(|e| e.to_string())?;
    let read = s.get("C2").await.map_err(|e| e.to_string())?;
    if read != b"two" {
        return Err(format!(
            "C2 changed after writes to C1: {:?}",
            String::from_utf8_lossy(&read)
        ));
    }
    Ok(())
}

// ── 9. Concurrent writers to distinct keys ───────────────────────────────────

/// N tasks write N distinct keys in parallel; every key must be readable after.
async fn concurrent_puts_to_distinct_keys_all_land<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = Arc::clone(&s);
        handles.push(tokio::spawn(async move {
            let key = format!("CONTRACT{:03}", i);
            s.put(&key, key.clone().into_bytes()).await
        }));
    }
    for handle in handles {
        handle
            .await
            .map_err(|e| format!("task panicked: {e}"))?
            .map_err(|e| format!("put: {e}"))?;
    }

    for i in 0..N {
        let key = format!("CONTRACT{:03}", i);
        let read = s.get(&key).await.map_err(|e| e.to_string())?;
        if read != key.as_bytes() {
            return Err(format!("{} missing or wrong after concurrent puts", key));
        }
    }
    Ok(())
}
