//! End-to-end lifecycle tests against the in-memory ledger.

use rust_decimal::Decimal;
use time::macros::datetime;
use vendorchain_contract::{
    CallContext, ContractConfig, ContractError, ContractService, ContractStatus, CreateContract,
    CreatePolicy, ErrorKind, RecordPayment,
};
use vendorchain_storage::{LedgerStore, MemoryLedger};

fn ctx(caller: &str) -> CallContext {
    CallContext::new(caller, datetime!(2025-08-19 10:00 UTC))
}

fn create_c1() -> CreateContract {
    CreateContract {
        contract_id: "C1".into(),
        vendor_id: "V1".into(),
        vendor_name: "Acme".into(),
        contract_type: "Service".into(),
        expiry_date: "2025-12-31".into(),
        total_value: "75000".into(),
    }
}

fn pay(amount: &str, reference: &str) -> RecordPayment {
    RecordPayment {
        contract_id: "C1".into(),
        amount: amount.into(),
        date: "2025-08-19".into(),
        reference: reference.into(),
    }
}

fn service() -> (MemoryLedger, ContractService<MemoryLedger>) {
    let ledger = MemoryLedger::new();
    (ledger.clone(), ContractService::new(ledger))
}

async fn submitted_c1(svc: &ContractService<MemoryLedger>) {
    svc.create(&ctx("creator"), &create_c1()).await.unwrap();
    svc.verify(&ctx("verifier"), "C1").await.unwrap();
    svc.submit(&ctx("admin"), "C1").await.unwrap();
}

#[tokio::test]
async fn create_verify_submit_pay_scenario() {
    let (_, svc) = service();

    let created = svc.create(&ctx("creator"), &create_c1()).await.unwrap();
    assert_eq!(created.status, ContractStatus::Created);
    assert_eq!(created.total_value, Decimal::from(75000));
    assert_eq!(created.remaining_amount, Decimal::from(75000));
    assert_eq!(created.paid_amount, Decimal::ZERO);

    let verified = svc.verify(&ctx("verifier"), "C1").await.unwrap();
    assert_eq!(verified.status, ContractStatus::Verified);
    assert_eq!(verified.verified_by, "verifier");
    assert!(!verified.verified_at.is_empty());

    let submitted = svc.submit(&ctx("admin"), "C1").await.unwrap();
    assert_eq!(submitted.status, ContractStatus::Submitted);
    assert!(!submitted.submitted_at.is_empty());

    let paid = svc
        .record_payment(&ctx("admin"), &pay("25000", "PAY1"))
        .await
        .unwrap();
    assert_eq!(paid.paid_amount, Decimal::from(25000));
    assert_eq!(paid.remaining_amount, Decimal::from(50000));
    assert_eq!(paid.payment_history.len(), 1);
    assert_eq!(paid.payment_history[0].reference, "PAY1");

    let stored = svc.get_one("C1").await.unwrap();
    assert_eq!(stored, paid);
}

#[tokio::test]
async fn history_has_one_entry_per_write_earliest_first() {
    let (_, svc) = service();
    submitted_c1(&svc).await;
    svc.record_payment(&ctx("admin"), &pay("25000", "PAY1"))
        .await
        .unwrap();

    let history = svc.get_history("C1").await.unwrap();
    let statuses: Vec<ContractStatus> = history
        .iter()
        .map(|h| h.value.as_ref().unwrap().status)
        .collect();
    assert_eq!(
        statuses,
        vec![
            ContractStatus::Created,
            ContractStatus::Verified,
            ContractStatus::Submitted,
            ContractStatus::Submitted,
        ]
    );
    assert!(history.iter().all(|h| !h.is_delete));
    assert_eq!(
        history[3].value.as_ref().unwrap().paid_amount,
        Decimal::from(25000)
    );
}

#[tokio::test]
async fn out_of_order_transitions_name_the_required_status() {
    let (ledger, svc) = service();
    svc.create(&ctx("creator"), &create_c1()).await.unwrap();
    let writes = ledger.tx_count().await;

    let err = svc.submit(&ctx("admin"), "C1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert!(err.to_string().contains("is not in VERIFIED status"), "{err}");

    let err = svc
        .record_payment(&ctx("admin"), &pay("10", "P"))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("is not in SUBMITTED status"), "{err}");

    svc.verify(&ctx("verifier"), "C1").await.unwrap();
    let err = svc.verify(&ctx("verifier"), "C1").await.unwrap_err();
    assert!(err.to_string().contains("is not in CREATED status"), "{err}");

    // Only the successful verify wrote.
    assert_eq!(ledger.tx_count().await, writes + 1);
}

#[tokio::test]
async fn missing_contract_is_not_found_and_writes_nothing() {
    let (ledger, svc) = service();
    for result in [
        svc.verify(&ctx("v"), "NONEXISTENT").await,
        svc.submit(&ctx("a"), "NONEXISTENT").await,
        svc.get_one("NONEXISTENT").await,
        svc.record_payment(
            &ctx("a"),
            &RecordPayment {
                contract_id: "NONEXISTENT".into(),
                ..pay("1", "P")
            },
        )
        .await,
    ] {
        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "Contract NONEXISTENT does not exist");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
    assert_eq!(ledger.tx_count().await, 0);
}

#[tokio::test]
async fn create_with_empty_field_names_it_and_writes_nothing() {
    let (ledger, svc) = service();
    let mut request = create_c1();
    request.vendor_name = String::new();
    match svc.create(&ctx("creator"), &request).await {
        Err(ContractError::Validation { field, .. }) => assert_eq!(field, "vendorName"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ledger.tx_count().await, 0);
    assert!(!svc.contract_exists("C1").await.unwrap());
}

#[tokio::test]
async fn payments_accumulate_until_fully_paid() {
    let (_, svc) = service();
    submitted_c1(&svc).await;
    let mut expected_paid = Decimal::ZERO;
    for (i, amount) in ["10000", "2500.50", "62499.50"].iter().enumerate() {
        let c = svc
            .record_payment(&ctx("admin"), &pay(amount, &format!("PAY{i}")))
            .await
            .unwrap();
        expected_paid += amount.parse::<Decimal>().unwrap();
        assert_eq!(c.paid_amount, expected_paid);
        assert_eq!(c.remaining_amount, c.total_value - c.paid_amount);
        assert_eq!(c.payment_history.len(), i + 1);
    }

    let err = svc
        .record_payment(&ctx("admin"), &pay("1", "OVER"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(svc.get_one("C1").await.unwrap().payment_history.len(), 3);
}

#[tokio::test]
async fn overpayment_allowed_by_config() {
    let mut config = ContractConfig::default();
    config.lifecycle.allow_overpayment = true;
    let svc = ContractService::with_config(MemoryLedger::new(), config);
    submitted_c1(&svc).await;
    let c = svc
        .record_payment(&ctx("admin"), &pay("80000", "BIG"))
        .await
        .unwrap();
    assert_eq!(c.remaining_amount, Decimal::from(-5000));
}

#[tokio::test]
async fn create_over_existing_id_is_rejected_by_default() {
    let (_, svc) = service();
    submitted_c1(&svc).await;
    let err = svc.create(&ctx("creator"), &create_c1()).await.unwrap_err();
    assert!(matches!(err, ContractError::AlreadyExists { .. }));
    assert_eq!(
        svc.get_one("C1").await.unwrap().status,
        ContractStatus::Submitted
    );
}

#[tokio::test]
async fn create_over_existing_id_overwrites_when_configured() {
    let mut config = ContractConfig::default();
    config.lifecycle.create_policy = CreatePolicy::Overwrite;
    let svc = ContractService::with_config(MemoryLedger::new(), config);
    submitted_c1(&svc).await;
    let again = svc.create(&ctx("creator"), &create_c1()).await.unwrap();
    assert_eq!(again.status, ContractStatus::Created);
    assert_eq!(svc.get_history("C1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn failed_write_keeps_last_good_record() {
    let (ledger, svc) = service();
    svc.create(&ctx("creator"), &create_c1()).await.unwrap();

    ledger.fail_writes(true).await;
    let err = svc.verify(&ctx("verifier"), "C1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Store);
    ledger.fail_writes(false).await;

    let stored = svc.get_one("C1").await.unwrap();
    assert_eq!(stored.status, ContractStatus::Created);
    assert_eq!(stored.verified_by, "");
}

#[tokio::test]
async fn init_ledger_seeds_submitted_contracts_under_their_ids() {
    let (ledger, svc) = service();
    let seeds = svc.init_ledger(&ctx("init")).await.unwrap();
    assert!(!seeds.is_empty());
    for seed in &seeds {
        let stored = svc.get_one(&seed.contract_id).await.unwrap();
        assert_eq!(stored.status, ContractStatus::Submitted);
        assert_eq!(stored.doc_type, "contract");
    }
    // Re-running overwrites the same keys.
    svc.init_ledger(&ctx("init")).await.unwrap();
    assert_eq!(ledger.tx_count().await, 2 * seeds.len() as u64);
    assert_eq!(svc.get_all().await.unwrap().len(), seeds.len());
}

#[tokio::test]
async fn stored_record_is_flat_json_with_numeric_amounts() {
    let (ledger, svc) = service();
    svc.create(&ctx("creator"), &create_c1()).await.unwrap();
    let raw: serde_json::Value = serde_json::from_slice(&ledger.get("C1").await.unwrap()).unwrap();
    assert_eq!(raw["totalValue"], serde_json::json!(75000));
    assert_eq!(raw["paidAmount"], serde_json::json!(0));
    assert_eq!(raw["remainingAmount"], serde_json::json!(75000));
    assert_eq!(raw["createdBy"], "creator");
    assert_eq!(raw["createdAt"], "2025-08-19T10:00:00.000Z");
    assert_eq!(raw["verifiedBy"], "");
    assert_eq!(raw["paymentHistory"], serde_json::json!([]));
}

#[tokio::test]
async fn amounts_beyond_json_precision_are_rejected_before_writing() {
    let (ledger, svc) = service();
    let mut request = create_c1();
    request.total_value = "12345678901234567.5".into();
    match svc.create(&ctx("creator"), &request).await {
        Err(ContractError::Validation { field, .. }) => assert_eq!(field, "totalValue"),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(ledger.tx_count().await, 0);

    // Both inputs fit, but the remaining amount would not.
    request.total_value = "99999999999999".into();
    svc.create(&ctx("creator"), &request).await.unwrap();
    svc.verify(&ctx("verifier"), "C1").await.unwrap();
    svc.submit(&ctx("admin"), "C1").await.unwrap();
    let writes = ledger.tx_count().await;
    let err = svc
        .record_payment(&ctx("admin"), &pay("0.001", "TINY"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(ledger.tx_count().await, writes);
}

#[tokio::test]
async fn stored_amounts_keep_remaining_equal_to_total_minus_paid() {
    let (_, svc) = service();
    let mut request = create_c1();
    request.total_value = "1234567890123.45".into();
    let created = svc.create(&ctx("creator"), &request).await.unwrap();
    assert_eq!(svc.get_one("C1").await.unwrap(), created);

    svc.verify(&ctx("verifier"), "C1").await.unwrap();
    svc.submit(&ctx("admin"), "C1").await.unwrap();
    let paid = svc
        .record_payment(&ctx("admin"), &pay("0.25", "PAY1"))
        .await
        .unwrap();

    let stored = svc.get_one("C1").await.unwrap();
    assert_eq!(stored, paid);
    assert_eq!(
        stored.remaining_amount,
        stored.total_value - stored.paid_amount
    );
}
