//! The contract lifecycle state machine.
//!
//! ```text
//! CREATED --verify--> VERIFIED --submit--> SUBMITTED --recordPayment--+
//!                                              ^                     |
//!                                              +---------------------+
//! ```
//!
//! Every operation is one read, a pure validation step, and one full-record
//! write. The pure steps (`new_contract`, `apply_verify`, `apply_submit`,
//! `apply_payment`) never touch the ledger, so a rejected operation performs
//! no write.

use rust_decimal::Decimal;
use vendorchain_storage::LedgerStore;

use crate::config::{ContractConfig, CreatePolicy};
use crate::context::{format_date, parse_date, CallContext};
use crate::error::ContractError;
use crate::numeric::{parse_amount, stores_exactly};
use crate::repository::ContractRepository;
use crate::types::{Contract, ContractStatus, Payment, DOC_TYPE};

const LOG_TARGET: &str = "vendorchain::lifecycle";

// ── Requests ─────────────────────────────────────────────────────────────────

/// Arguments of `create`, as received: every field is a raw string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateContract {
    pub contract_id: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub contract_type: String,
    pub expiry_date: String,
    pub total_value: String,
}

/// Arguments of `record_payment`, as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPayment {
    pub contract_id: String,
    pub amount: String,
    pub date: String,
    pub reference: String,
}

// ── Pure transitions ─────────────────────────────────────────────────────────

pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str, ContractError> {
    if value.trim().is_empty() {
        return Err(ContractError::validation(
            field,
            format!("{} is required", field_label(field)),
        ));
    }
    Ok(value)
}

/// `vendorName` → `Vendor name`, `contractId` → `Contract ID`.
fn field_label(field: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    for ch in field.chars() {
        if ch.is_uppercase() || words.is_empty() {
            words.push(ch.to_lowercase().collect());
        } else if let Some(word) = words.last_mut() {
            word.push(ch);
        }
    }
    let mut label = words
        .iter()
        .map(|w| if w == "id" { "ID" } else { w.as_str() })
        .collect::<Vec<_>>()
        .join(" ");
    if let Some(first) = label.get(..1).map(str::to_uppercase) {
        label.replace_range(..1, &first);
    }
    label
}

fn require_status(contract: &Contract, required: ContractStatus) -> Result<(), ContractError> {
    if contract.status != required {
        return Err(ContractError::InvalidTransition {
            contract_id: contract.contract_id.clone(),
            required,
            actual: contract.status,
        });
    }
    Ok(())
}

/// Validate a create request and build the CREATED record.
pub fn new_contract(ctx: &CallContext, request: &CreateContract) -> Result<Contract, ContractError> {
    let contract_id = require("contractId", &request.contract_id)?;
    let vendor_id = require("vendorId", &request.vendor_id)?;
    let vendor_name = require("vendorName", &request.vendor_name)?;
    let contract_type = require("contractType", &request.contract_type)?;
    let expiry = parse_date("expiryDate", &request.expiry_date)?;
    let total_value = parse_amount("totalValue", &request.total_value)?;
    if total_value < Decimal::ZERO {
        return Err(ContractError::validation("totalValue", "must not be negative"));
    }

    Ok(Contract {
        contract_id: contract_id.to_string(),
        doc_type: DOC_TYPE.to_string(),
        vendor_id: vendor_id.to_string(),
        vendor_name: vendor_name.to_string(),
        contract_type: contract_type.to_string(),
        status: ContractStatus::Created,
        created_by: ctx.caller.clone(),
        created_at: ctx.timestamp_iso(),
        expiry_date: format_date(expiry),
        total_value,
        paid_amount: Decimal::ZERO,
        remaining_amount: total_value,
        ..Contract::default()
    })
}

pub fn apply_verify(mut contract: Contract, ctx: &CallContext) -> Result<Contract, ContractError> {
    require_status(&contract, ContractStatus::Created)?;
    contract.status = ContractStatus::Verified;
    contract.verified_by = ctx.caller.clone();
    contract.verified_at = ctx.timestamp_iso();
    Ok(contract)
}

pub fn apply_submit(mut contract: Contract, ctx: &CallContext) -> Result<Contract, ContractError> {
    require_status(&contract, ContractStatus::Verified)?;
    contract.status = ContractStatus::Submitted;
    contract.submitted_at = ctx.timestamp_iso();
    Ok(contract)
}

/// Append a payment and recompute the derived amounts.
///
/// Unless `allow_overpayment` is set, `paid_amount` may not exceed
/// `total_value`.
pub fn apply_payment(
    mut contract: Contract,
    ctx: &CallContext,
    request: &RecordPayment,
    allow_overpayment: bool,
) -> Result<Contract, ContractError> {
    require_status(&contract, ContractStatus::Submitted)?;
    let amount = parse_amount("amount", &request.amount)?;
    if amount <= Decimal::ZERO {
        return Err(ContractError::validation("amount", "must be greater than zero"));
    }

    let paid = contract
        .paid_amount
        .checked_add(amount)
        .ok_or_else(|| ContractError::validation("amount", "paid amount overflows"))?;
    if !allow_overpayment && paid > contract.total_value {
        return Err(ContractError::validation(
            "amount",
            format!(
                "payment of {} exceeds remaining amount {}",
                amount,
                contract.total_value - contract.paid_amount
            ),
        ));
    }
    let remaining = contract
        .total_value
        .checked_sub(paid)
        .ok_or_else(|| ContractError::validation("amount", "remaining amount overflows"))?;

    for (name, value) in [("paidAmount", paid), ("remainingAmount", remaining)] {
        if !stores_exactly(value) {
            return Err(ContractError::validation(
                "amount",
                format!(
                    "resulting {} {} has more significant digits than a stored amount keeps",
                    name, value
                ),
            ));
        }
    }

    contract.payment_history.push(Payment {
        amount,
        date: request.date.clone(),
        reference: request.reference.clone(),
        recorded_by: ctx.caller.clone(),
        recorded_at: ctx.timestamp_iso(),
    });
    contract.paid_amount = paid;
    contract.remaining_amount = remaining;
    Ok(contract)
}

/// Fixture records written by `init_ledger`.
pub fn seed_contracts(ctx: &CallContext) -> Vec<Contract> {
    let at = ctx.timestamp_iso();
    let total_value = Decimal::from(100_000);
    vec![Contract {
        contract_id: "CONTRACT001".to_string(),
        vendor_id: "VENDOR001".to_string(),
        vendor_name: "Acme Supplies".to_string(),
        contract_type: "Service Agreement".to_string(),
        status: ContractStatus::Submitted,
        created_by: ctx.caller.clone(),
        created_at: at.clone(),
        verified_by: ctx.caller.clone(),
        verified_at: at.clone(),
        submitted_at: at,
        expiry_date: "2025-12-31".to_string(),
        total_value,
        paid_amount: Decimal::ZERO,
        remaining_amount: total_value,
        ..Contract::default()
    }]
}

// ── Service ──────────────────────────────────────────────────────────────────

/// Contract operations over a ledger store.
///
/// The service holds no per-call state: identity and time arrive in the
/// [`CallContext`] of each call.
#[derive(Debug, Clone)]
pub struct ContractService<S> {
    pub(crate) repo: ContractRepository<S>,
    pub(crate) config: ContractConfig,
}

impl<S: LedgerStore> ContractService<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, ContractConfig::default())
    }

    pub fn with_config(store: S, config: ContractConfig) -> Self {
        Self {
            repo: ContractRepository::new(store),
            config,
        }
    }

    pub fn config(&self) -> &ContractConfig {
        &self.config
    }

    pub fn repository(&self) -> &ContractRepository<S> {
        &self.repo
    }

    /// Write the fixture contracts, overwriting whatever is stored at their keys.
    pub async fn init_ledger(&self, ctx: &CallContext) -> Result<Vec<Contract>, ContractError> {
        let seeds = seed_contracts(ctx);
        for contract in &seeds {
            self.repo.put(contract).await?;
        }
        tracing::info!(target: LOG_TARGET, count = seeds.len(), caller = %ctx.caller, "ledger initialized");
        Ok(seeds)
    }

    pub async fn create(
        &self,
        ctx: &CallContext,
        request: &CreateContract,
    ) -> Result<Contract, ContractError> {
        let contract = new_contract(ctx, request).inspect_err(|e| {
            tracing::warn!(target: LOG_TARGET, contract_id = %request.contract_id, error = %e, "create rejected");
        })?;

        if self.repo.exists(&contract.contract_id).await? {
            match self.config.lifecycle.create_policy {
                CreatePolicy::RejectExisting => {
                    tracing::warn!(target: LOG_TARGET, contract_id = %contract.contract_id, "create rejected: contract exists");
                    return Err(ContractError::AlreadyExists {
                        contract_id: contract.contract_id,
                    });
                }
                CreatePolicy::Overwrite => {
                    tracing::warn!(target: LOG_TARGET, contract_id = %contract.contract_id, "overwriting existing contract");
                }
            }
        }

        self.repo.put(&contract).await?;
        tracing::info!(
            target: LOG_TARGET,
            contract_id = %contract.contract_id,
            vendor_id = %contract.vendor_id,
            caller = %ctx.caller,
            "contract created"
        );
        Ok(contract)
    }

    pub async fn verify(&self, ctx: &CallContext, contract_id: &str) -> Result<Contract, ContractError> {
        self.transition(ctx, contract_id, "verify", |c| apply_verify(c, ctx))
            .await
    }

    pub async fn submit(&self, ctx: &CallContext, contract_id: &str) -> Result<Contract, ContractError> {
        self.transition(ctx, contract_id, "submit", |c| apply_submit(c, ctx))
            .await
    }

    pub async fn record_payment(
        &self,
        ctx: &CallContext,
        request: &RecordPayment,
    ) -> Result<Contract, ContractError> {
        let allow = self.config.lifecycle.allow_overpayment;
        self.transition(ctx, &request.contract_id, "recordPayment", |c| {
            apply_payment(c, ctx, request, allow)
        })
        .await
    }

    /// Load, apply a pure transition, write back.
    async fn transition<F>(
        &self,
        ctx: &CallContext,
        contract_id: &str,
        operation: &'static str,
        apply: F,
    ) -> Result<Contract, ContractError>
    where
        F: FnOnce(Contract) -> Result<Contract, ContractError>,
    {
        require("contractId", contract_id)?;
        let current = self.repo.get(contract_id).await?;
        let updated = apply(current).inspect_err(|e| {
            tracing::warn!(target: LOG_TARGET, contract_id, operation, error = %e, "transition rejected");
        })?;
        self.repo.put(&updated).await?;
        tracing::info!(
            target: LOG_TARGET,
            contract_id,
            operation,
            status = %updated.status,
            caller = %ctx.caller,
            "contract updated"
        );
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use time::macros::datetime;

    fn ctx(caller: &str) -> CallContext {
        CallContext::new(caller, datetime!(2025-08-19 10:00 UTC))
    }

    fn request() -> CreateContract {
        CreateContract {
            contract_id: "C1".into(),
            vendor_id: "V1".into(),
            vendor_name: "Acme".into(),
            contract_type: "Service".into(),
            expiry_date: "2025-12-31".into(),
            total_value: "75000".into(),
        }
    }

    fn payment(amount: &str) -> RecordPayment {
        RecordPayment {
            contract_id: "C1".into(),
            amount: amount.into(),
            date: "2025-08-19".into(),
            reference: "PAY1".into(),
        }
    }

    fn submitted() -> Contract {
        let c = new_contract(&ctx("creator"), &request()).unwrap();
        let c = apply_verify(c, &ctx("verifier")).unwrap();
        apply_submit(c, &ctx("admin")).unwrap()
    }

    #[test]
    fn new_contract_starts_created_and_unpaid() {
        let c = new_contract(&ctx("creator"), &request()).unwrap();
        assert_eq!(c.status, ContractStatus::Created);
        assert_eq!(c.total_value, Decimal::from(75000));
        assert_eq!(c.remaining_amount, Decimal::from(75000));
        assert_eq!(c.paid_amount, Decimal::ZERO);
        assert_eq!(c.created_by, "creator");
        assert_eq!(c.created_at, "2025-08-19T10:00:00.000Z");
        assert_eq!(c.verified_by, "");
        assert_eq!(c.submitted_at, "");
    }

    #[test]
    fn each_required_field_is_named_when_empty() {
        let cases: [(&str, fn(&mut CreateContract)); 3] = [
            ("vendorId", |r: &mut CreateContract| r.vendor_id.clear()),
            ("vendorName", |r: &mut CreateContract| r.vendor_name = "  ".into()),
            ("contractType", |r: &mut CreateContract| r.contract_type.clear()),
        ];
        for (field, mutate) in cases {
            let mut r = request();
            mutate(&mut r);
            match new_contract(&ctx("creator"), &r) {
                Err(ContractError::Validation { field: f, .. }) => assert_eq!(f, field),
                other => panic!("expected validation error on {field}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_field_message_names_the_field_and_its_label() {
        let mut r = request();
        r.vendor_name.clear();
        let err = new_contract(&ctx("creator"), &r).unwrap_err();
        assert_eq!(err.to_string(), "vendorName: Vendor name is required");

        r = request();
        r.contract_id = " ".into();
        let err = new_contract(&ctx("creator"), &r).unwrap_err();
        assert!(err.to_string().contains("Contract ID is required"), "{err}");
    }

    #[test]
    fn labels_split_camel_case() {
        assert_eq!(field_label("contractType"), "Contract type");
        assert_eq!(field_label("expectedHash"), "Expected hash");
        assert_eq!(field_label("vendorId"), "Vendor ID");
    }

    #[test]
    fn total_value_must_be_a_non_negative_number() {
        let mut r = request();
        r.total_value = "abc".into();
        assert!(matches!(
            new_contract(&ctx("c"), &r),
            Err(ContractError::Validation { field, .. }) if field == "totalValue"
        ));
        r.total_value = "-1".into();
        assert!(new_contract(&ctx("c"), &r).is_err());
        r.total_value = "0".into();
        assert!(new_contract(&ctx("c"), &r).is_ok());
    }

    #[test]
    fn transitions_cannot_skip_or_repeat() {
        let created = new_contract(&ctx("c"), &request()).unwrap();
        match apply_submit(created.clone(), &ctx("a")) {
            Err(ContractError::InvalidTransition { required, .. }) => {
                assert_eq!(required, ContractStatus::Verified)
            }
            other => panic!("expected InvalidTransition, got {other:?}"),
        }
        let verified = apply_verify(created, &ctx("v")).unwrap();
        assert!(apply_verify(verified, &ctx("v")).is_err());
        let done = submitted();
        assert!(apply_verify(done.clone(), &ctx("v")).is_err());
        assert!(apply_submit(done, &ctx("a")).is_err());
    }

    #[test]
    fn payment_accumulates_and_keeps_remaining_derived() {
        let c = apply_payment(submitted(), &ctx("admin"), &payment("25000"), false).unwrap();
        assert_eq!(c.paid_amount, Decimal::from(25000));
        assert_eq!(c.remaining_amount, Decimal::from(50000));
        let c = apply_payment(c, &ctx("admin"), &payment("0.5"), false).unwrap();
        assert_eq!(c.paid_amount, Decimal::from_str("25000.5").unwrap());
        assert_eq!(c.remaining_amount, c.total_value - c.paid_amount);
        assert_eq!(c.payment_history.len(), 2);
        assert_eq!(c.payment_history[0].reference, "PAY1");
        assert_eq!(c.payment_history[0].recorded_by, "admin");
        assert_eq!(c.status, ContractStatus::Submitted);
    }

    #[test]
    fn payment_requires_submitted_status() {
        let c = new_contract(&ctx("c"), &request()).unwrap();
        let err = apply_payment(c, &ctx("a"), &payment("1"), false).unwrap_err();
        assert!(err.to_string().contains("is not in SUBMITTED status"), "{err}");
    }

    #[test]
    fn payment_amount_must_be_positive() {
        for bad in ["0", "-5", "five"] {
            match apply_payment(submitted(), &ctx("a"), &payment(bad), false) {
                Err(ContractError::Validation { field, .. }) => assert_eq!(field, "amount"),
                other => panic!("expected validation error for {bad:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn overpayment_is_rejected_unless_allowed() {
        assert!(apply_payment(submitted(), &ctx("a"), &payment("75000.01"), false).is_err());
        let c = apply_payment(submitted(), &ctx("a"), &payment("75000"), false).unwrap();
        assert_eq!(c.remaining_amount, Decimal::ZERO);
        let c = apply_payment(submitted(), &ctx("a"), &payment("80000"), true).unwrap();
        assert_eq!(c.remaining_amount, Decimal::from(-5000));
    }

    #[test]
    fn seeds_are_submitted_contracts() {
        let seeds = seed_contracts(&ctx("init"));
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].contract_id, "CONTRACT001");
        assert_eq!(seeds[0].doc_type, DOC_TYPE);
        assert_eq!(seeds[0].status, ContractStatus::Submitted);
    }
}
