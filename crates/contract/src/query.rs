//! Read-only queries: point reads, range scans, selector queries and history.
//!
//! Every cursor is consumed through `drain_map`, which closes it on success
//! and on failure alike.

use time::Date;
use vendorchain_storage::{drain_map, KeyModification, LedgerEntry, LedgerStore, Selector};

use crate::context::{format_date, CallContext};
use crate::error::ContractError;
use crate::lifecycle::{require, ContractService};
use crate::numeric::parse_days;
use crate::repository::{decode, keyed};
use crate::types::{Contract, ContractStatus, HistoryRecord, QueryRecord, DOC_TYPE};

const LOG_TARGET: &str = "vendorchain::query";

/// Contracts belonging to `vendor_id`.
pub fn vendor_selector(vendor_id: &str) -> Selector {
    Selector::new()
        .eq("docType", DOC_TYPE)
        .eq("vendorId", vendor_id)
}

/// Contracts not yet SUBMITTED whose expiry date lies in `[from, to]`.
pub fn expiring_selector(from: Date, to: Date) -> Selector {
    Selector::new()
        .eq("docType", DOC_TYPE)
        .ne("status", ContractStatus::Submitted.as_str())
        .gte("expiryDate", format_date(from))
        .lte("expiryDate", format_date(to))
}

/// Range-scan entries that are not JSON objects tagged as contracts are
/// skipped; they belong to other record kinds sharing the namespace.
fn scanned_record(entry: LedgerEntry) -> Result<Option<QueryRecord>, ContractError> {
    let Ok(doc) = serde_json::from_slice::<serde_json::Value>(&entry.value) else {
        return Ok(None);
    };
    if doc.get("docType").and_then(|t| t.as_str()) != Some(DOC_TYPE) {
        return Ok(None);
    }
    let record: Contract = serde_json::from_value(doc).map_err(|source| ContractError::Decode {
        key: entry.key.clone(),
        source,
    })?;
    Ok(Some(QueryRecord {
        record: keyed(&entry.key, record),
        key: entry.key,
    }))
}

fn selected_record(entry: LedgerEntry) -> Result<Option<QueryRecord>, ContractError> {
    let record = decode(&entry.key, &entry.value)?;
    Ok(Some(QueryRecord {
        key: entry.key,
        record,
    }))
}

fn history_record(key: &str, m: KeyModification) -> Result<Option<HistoryRecord>, ContractError> {
    let value = if m.is_delete || m.value.is_empty() {
        None
    } else {
        Some(decode(key, &m.value)?)
    };
    Ok(Some(HistoryRecord {
        tx_id: m.tx_id,
        timestamp: m.timestamp,
        is_delete: m.is_delete,
        value,
    }))
}

impl<S: LedgerStore> ContractService<S> {
    /// The stored record for `contract_id`, unchanged.
    pub async fn get_one(&self, contract_id: &str) -> Result<Contract, ContractError> {
        require("contractId", contract_id)?;
        self.repo.get(contract_id).await
    }

    pub async fn contract_exists(&self, contract_id: &str) -> Result<bool, ContractError> {
        require("contractId", contract_id)?;
        self.repo.exists(contract_id).await
    }

    /// Every contract in the ledger, in key order.
    pub async fn get_all(&self) -> Result<Vec<QueryRecord>, ContractError> {
        let cursor = self.repo.store().range_scan("", "").await?;
        let records = drain_map(cursor, scanned_record).await?;
        tracing::debug!(target: LOG_TARGET, query = "getAll", count = records.len(), "cursor drained");
        Ok(records)
    }

    pub async fn get_by_vendor(&self, vendor_id: &str) -> Result<Vec<QueryRecord>, ContractError> {
        require("vendorId", vendor_id)?;
        let selector = vendor_selector(vendor_id);
        let cursor = self.repo.store().rich_query(&selector).await?;
        let records = drain_map(cursor, selected_record).await?;
        tracing::debug!(
            target: LOG_TARGET,
            query = "getByVendor",
            vendor_id,
            count = records.len(),
            "cursor drained"
        );
        Ok(records)
    }

    /// Contracts not yet SUBMITTED that expire between today and
    /// `days_ahead` days from today, both inclusive.
    pub async fn get_expiring(
        &self,
        ctx: &CallContext,
        days_ahead: &str,
    ) -> Result<Vec<QueryRecord>, ContractError> {
        let days = parse_days("daysAhead", days_ahead)?;
        let max = self.config.queries.max_expiry_window_days;
        if !(0..=max).contains(&days) {
            return Err(ContractError::validation(
                "daysAhead",
                format!("must be between 0 and {}, got {}", max, days),
            ));
        }
        let from = ctx.today();
        let to = ctx
            .days_ahead(days)
            .ok_or_else(|| ContractError::validation("daysAhead", "date out of range"))?;

        let selector = expiring_selector(from, to);
        let cursor = self.repo.store().rich_query(&selector).await?;
        let records = drain_map(cursor, selected_record).await?;
        tracing::debug!(
            target: LOG_TARGET,
            query = "getExpiring",
            from = %format_date(from),
            to = %format_date(to),
            count = records.len(),
            "cursor drained"
        );
        Ok(records)
    }

    /// Every committed version of `contract_id`, earliest first.
    ///
    /// A key that was never written is `NotFound`.
    pub async fn get_history(&self, contract_id: &str) -> Result<Vec<HistoryRecord>, ContractError> {
        require("contractId", contract_id)?;
        let cursor = self.repo.store().history_of(contract_id).await?;
        let records = drain_map(cursor, |m| history_record(contract_id, m)).await?;
        if records.is_empty() {
            return Err(ContractError::not_found(contract_id));
        }
        tracing::debug!(
            target: LOG_TARGET,
            query = "getHistory",
            contract_id,
            count = records.len(),
            "cursor drained"
        );
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::date;
    use vendorchain_storage::LedgerTimestamp;

    #[test]
    fn vendor_selector_filters_on_doc_type() {
        assert_eq!(
            vendor_selector("V1").to_query(),
            json!({"selector": {"docType": "contract", "vendorId": "V1"}})
        );
    }

    #[test]
    fn expiring_selector_excludes_submitted_within_window() {
        let sel = expiring_selector(date!(2025-08-19), date!(2025-09-18));
        assert_eq!(
            sel.to_query(),
            json!({"selector": {
                "docType": "contract",
                "expiryDate": {"$gte": "2025-08-19", "$lte": "2025-09-18"},
                "status": {"$ne": "SUBMITTED"},
            }})
        );
        let doc = |status: &str, expiry: &str| {
            json!({"docType": "contract", "status": status, "expiryDate": expiry})
        };
        assert!(sel.matches(&doc("CREATED", "2025-08-19")));
        assert!(sel.matches(&doc("VERIFIED", "2025-09-18")));
        assert!(!sel.matches(&doc("SUBMITTED", "2025-09-01")));
        assert!(!sel.matches(&doc("CREATED", "2025-09-19")));
    }

    #[test]
    fn scan_skips_foreign_records() {
        let foreign = LedgerEntry::new("VENDOR001", json!({"docType": "vendor"}).to_string());
        assert!(scanned_record(foreign).unwrap().is_none());
        let binary = LedgerEntry::new("BLOB", vec![0xff, 0x00]);
        assert!(scanned_record(binary).unwrap().is_none());
        let contract = LedgerEntry::new(
            "C1",
            json!({"docType": "contract", "contractId": "C1"}).to_string(),
        );
        let record = scanned_record(contract).unwrap().unwrap();
        assert_eq!(record.key, "C1");
        assert_eq!(record.record.contract_id, "C1");
    }

    #[test]
    fn delete_marker_has_null_value() {
        let m = KeyModification {
            tx_id: "t".into(),
            timestamp: LedgerTimestamp { seconds: 1, nanos: 0 },
            is_delete: true,
            value: Vec::new(),
        };
        let record = history_record("C1", m).unwrap().unwrap();
        assert!(record.is_delete);
        assert!(record.value.is_none());
    }
}
