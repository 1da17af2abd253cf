use std::future::Future;

use super::{contract_doc, json_bytes, seed, TestResult};
use crate::{drain, LedgerEntry, LedgerStore, Selector};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "query",
        "equality_selector_filters_by_field",
        equality_selector_filters_by_field(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "range_and_ne_conditions_combine",
        range_and_ne_conditions_combine(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "non_json_values_are_skipped",
        non_json_values_are_skipped(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "deleted_documents_are_not_returned",
        deleted_documents_are_not_returned(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "results_are_in_key_order",
        results_are_in_key_order(factory).await,
    ));
    results.push(TestResult::from_result(
        "query",
        "latest_version_is_matched",
        latest_version_is_matched(factory).await,
    ));

    results
}

async fn query_keys<S: LedgerStore>(s: &S, selector: &Selector) -> Result<Vec<String>, String> {
    let cursor = s.rich_query(selector).await.map_err(|e| e.to_string())?;
    let entries: Vec<LedgerEntry> = drain(cursor).await.map_err(|e| e.to_string())?;
    Ok(entries.into_iter().map(|e| e.key).collect())
}

async fn equality_selector_filters_by_field<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("C1", contract_doc("C1", "V1", "CREATED", "2025-12-31")),
            ("C2", contract_doc("C2", "V2", "CREATED", "2025-12-31")),
            ("C3", contract_doc("C3", "V1", "SUBMITTED", "2025-12-31")),
        ],
    )
    .await?;
    let keys = query_keys(&s, &Selector::new().eq("vendorId", "V1")).await?;
    if keys != vec!["C1", "C3"] {
        return Err(format!("expected [C1, C3], got {:?}", keys));
    }
    Ok(())
}

async fn range_and_ne_conditions_combine<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("C1", contract_doc("C1", "V1", "CREATED", "2025-09-10")),
            ("C2", contract_doc("C2", "V1", "SUBMITTED", "2025-09-10")),
            ("C3", contract_doc("C3", "V1", "VERIFIED", "2025-09-30")),
            ("C4", contract_doc("C4", "V1", "VERIFIED", "2025-10-01")),
            ("C5", contract_doc("C5", "V1", "CREATED", "2025-08-31")),
        ],
    )
    .await?;
    let selector = Selector::new()
        .eq("docType", "contract")
        .ne("status", "SUBMITTED")
        .gte("expiryDate", "2025-09-01")
        .lte("expiryDate", "2025-09-30");
    let keys = query_keys(&s, &selector).await?;
    if keys != vec!["C1", "C3"] {
        return Err(format!("expected [C1, C3], got {:?}", keys));
    }
    Ok(())
}

async fn non_json_values_are_skipped<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("B", b"\x00\x01 not json".to_vec()),
            ("C1", contract_doc("C1", "V1", "CREATED", "2025-12-31")),
        ],
    )
    .await?;
    let keys = query_keys(&s, &Selector::new().eq("docType", "contract")).await?;
    if keys != vec!["C1"] {
        return Err(format!("expected [C1], got {:?}", keys));
    }
    Ok(())
}

async fn deleted_documents_are_not_returned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("C1", contract_doc("C1", "V1", "CREATED", "2025-12-31")),
            ("C2", contract_doc("C2", "V1", "CREATED", "2025-12-31")),
        ],
    )
    .await?;
    s.delete("C1").await.map_err(|e| e.to_string())?;
    let keys = query_keys(&s, &Selector::new().eq("vendorId", "V1")).await?;
    if keys != vec!["C2"] {
        return Err(format!("expected [C2], got {:?}", keys));
    }
    Ok(())
}

async fn results_are_in_key_order<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(
        &s,
        &[
            ("C3", contract_doc("C3", "V1", "CREATED", "2025-12-31")),
            ("C1", contract_doc("C1", "V1", "CREATED", "2025-12-31")),
            ("C2", contract_doc("C2", "V1", "CREATED", "2025-12-31")),
        ],
    )
    .await?;
    let keys = query_keys(&s, &Selector::new()).await?;
    if keys != vec!["C1", "C2", "C3"] {
        return Err(format!("expected [C1, C2, C3], got {:?}", keys));
    }
    Ok(())
}

/// Selectors see the current value only, never superseded versions.
async fn latest_version_is_matched<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: LedgerStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.put("C1", json_bytes(serde_json::json!({"status": "CREATED"})))
        .await
        .map_err(|e| e.to_string())?;
    s.put("C1", json_bytes(serde_json::json!({"status": "VERIFIED"})))
        .await
        .map_err(|e| e.to_string())?;
    let created = query_keys(&s, &Selector::new().eq("status", "CREATED")).await?;
    if !created.is_empty() {
        return Err(format!("superseded version matched: {:?}", created));
    }
    let verified = query_keys(&s, &Selector::new().eq("status", "VERIFIED")).await?;
    if verified != vec!["C1"] {
        return Err(format!("expected [C1], got {:?}", verified));
    }
    Ok(())
}
