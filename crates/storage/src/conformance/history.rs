use std::collections::HashSet;
use std::future::Future;

use super::TestResult;
use crate::{drain, KeyModification, LedgerStore};

pub(super) async fn run_history_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "history",
        "versions_are_returned_earliest_first",
        versions_are_returned_earliest_first(factory).await,
    ));
    results.push(TestResult::from_result(
        "history",
        "delete_is_recorded_as_marker",
        delete_is_recorded_as_marker(factory).await,
    ));
    results.push(TestResult::from_result(
        "history",
        "tx_ids_are_unique",
        tx_ids_are_unique(factory).await,
    ));
    results.push(TestResult::from_result(
        "history",
        "timestamps_do_not_go_backwards",
        timestamps_do_not_go_backwards(factory).await,
    ));
    results.push(TestResult::from_result(
        "history",
        "unknown_key_has_empty_history",
        unknown_key_has_empty_history(factory).await,
    ));
    results.push(TestResult::from_result(
        "history",
        "history_is_per_key",
        history_is_per_key(factory).await,
    ));

    results
}

async fn history<S: LedgerStore>(s: &S, key: &str) -> Result<Vec<KeyModification>, String> {
    let cursor = s.history_of(key).await.map_err(|e| e.to_string())?;
    drain(cursor).await.map_err(|e| e.to_string())
}

async fn versions_are_returned_earliest_first<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for v in ["v1", "v2", "v3"] {
        s.put("C1", v.as_bytes().to_vec())
            .await
            .map_err(|e| e.to_string())?;
    }
    let versions = history(&s, "C1").await?;
    let values: Vec<String> = versions
        .iter()
        .map(|m| String::from_utf8_lossy(&m.value).into_owned())
        .collect();
    if values != vec!["v1", "v2", "v3"] {
        return Err(format!("expected [v1, v2, v3], got {:?}", values));
    }
    if versions.iter().any(|m| m.is_delete) {
        return Err("put recorded as delete".to_string());
    }
    Ok(())
}

async fn delete_is_recorded_as_marker<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"v1".to_vec()).await.map_err(|e| e.to_string())?;
    s.delete("C1").await.map_err(|e| e.to_string())?;
    let versions = history(&s, "C1").await?;
    if versions.len() != 2 {
        return Err(format!("expected 2 versions, got {}", versions.len()));
    }
    let marker = &versions[1];
    if !marker.is_delete {
        return Err("last version is not a delete marker".to_string());
    }
    if !marker.value.is_empty() {
        return Err(format!(
            "delete marker carries {} bytes of value",
            marker.value.len()
        ));
    }
    Ok(())
}

async fn tx_ids_are_unique<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"a".to_vec()).await.map_err(|e| e.to_string())?;
    s.put("C1", b"a".to_vec()).await.map_err(|e| e.to_string())?;
    s.delete("C1").await.map_err(|e| e.to_string())?;
    s.put("C1", b"a".to_vec()).await.map_err(|e| e.to_string())?;
    let versions = history(&s, "C1").await?;
    let ids: HashSet<&str> = versions.iter().map(|m| m.tx_id.as_str()).collect();
    if ids.len() != versions.len() {
        return Err(format!(
            "{} versions share {} tx ids",
            versions.len(),
            ids.len()
        ));
    }
    if ids.iter().any(|id| id.is_empty()) {
        return Err("empty tx id".to_string());
    }
    Ok(())
}

async fn timestamps_do_not_go_backwards<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    for v in ["a", "b", "c", "d"] {
        s.put("C1", v.as_bytes().to_vec())
            .await
            .map_err(|e| e.to_string())?;
    }
    let versions = history(&s, "C1").await?;
    for pair in versions.windows(2) {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(format!(
                "timestamp went backwards: {:?} then {:?}",
                pair[0].timestamp, pair[1].timestamp
            ));
        }
    }
    Ok(())
}

async fn unknown_key_has_empty_history<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let versions = history(&s, "NOPE").await?;
    if !versions.is_empty() {
        return Err(format!("expected empty history, got {}", versions.len()));
    }
    Ok(())
}

async fn history_is_per_key<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", b"one".to_vec()).await.map_err(|e| e.to_string())?;
    s.put("C2", b"two".to_vec()).await.map_err(|e| e.to_string())?;
    s.put("C2", b"two-b".to_vec()).await.map_err(|e| e.to_string())?;
    let c1 = history(&s, "C1").await?;
    let c2 = history(&s, "C2").await?;
    if c1.len() != 1 || c2.len() != 2 {
        return Err(format!(
            "expected 1 and 2 versions, got {} and {}",
            c1.len(),
            c2.len()
        ));
    }
    Ok(())
}
