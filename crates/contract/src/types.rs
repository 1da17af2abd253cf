//! Contract record types as persisted on the ledger and returned by queries.
//!
//! Every field of [`Contract`] is always present on the wire. Records written
//! by older or partial writers still decode: missing fields fall back to
//! their empty defaults.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use vendorchain_storage::LedgerTimestamp;

/// Record-kind tag shared by every contract in the ledger namespace.
pub const DOC_TYPE: &str = "contract";

// ── Status ───────────────────────────────────────────────────────────────────

/// Lifecycle stage of a contract. Only ever advances, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    #[default]
    Created,
    Verified,
    Submitted,
}

impl ContractStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ContractStatus::Created => "CREATED",
            ContractStatus::Verified => "VERIFIED",
            ContractStatus::Submitted => "SUBMITTED",
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Contract ─────────────────────────────────────────────────────────────────

/// The aggregate root, stored as one flat JSON object under `contract_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contract {
    pub contract_id: String,
    pub doc_type: String,
    pub vendor_id: String,
    pub vendor_name: String,
    pub contract_type: String,
    pub status: ContractStatus,
    pub created_by: String,
    pub created_at: String,
    pub verified_by: String,
    pub verified_at: String,
    pub submitted_at: String,
    pub expiry_date: String,
    #[serde(with = "crate::numeric::amount")]
    pub total_value: Decimal,
    #[serde(with = "crate::numeric::amount")]
    pub paid_amount: Decimal,
    /// Always `total_value - paid_amount` on a written record.
    #[serde(with = "crate::numeric::amount")]
    pub remaining_amount: Decimal,
    pub payment_history: Vec<Payment>,
    /// Opaque document references, carried through untouched.
    pub documents: Vec<serde_json::Value>,
}

impl Default for Contract {
    fn default() -> Self {
        Self {
            contract_id: String::new(),
            doc_type: DOC_TYPE.to_string(),
            vendor_id: String::new(),
            vendor_name: String::new(),
            contract_type: String::new(),
            status: ContractStatus::Created,
            created_by: String::new(),
            created_at: String::new(),
            verified_by: String::new(),
            verified_at: String::new(),
            submitted_at: String::new(),
            expiry_date: String::new(),
            total_value: Decimal::ZERO,
            paid_amount: Decimal::ZERO,
            remaining_amount: Decimal::ZERO,
            payment_history: Vec::new(),
            documents: Vec::new(),
        }
    }
}

impl Contract {
    pub fn is_contract_record(&self) -> bool {
        self.doc_type == DOC_TYPE
    }
}

/// One recorded payment, embedded in `Contract::payment_history`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    #[serde(with = "crate::numeric::amount")]
    pub amount: Decimal,
    pub date: String,
    pub reference: String,
    pub recorded_by: String,
    pub recorded_at: String,
}

// ── Query result shapes ──────────────────────────────────────────────────────

/// Entry of a range or selector query: `{Key, Record}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    #[serde(rename = "Key")]
    pub key: String,
    #[serde(rename = "Record")]
    pub record: Contract,
}

/// Entry of a history query: `{TxId, Timestamp, IsDelete, Value}`.
///
/// `value` is `None` (serialized as `null`) for delete markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    #[serde(rename = "TxId")]
    pub tx_id: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: LedgerTimestamp,
    #[serde(rename = "IsDelete")]
    pub is_delete: bool,
    #[serde(rename = "Value")]
    pub value: Option<Contract>,
}
