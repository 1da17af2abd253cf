//! Tamper detection digests.
//!
//! A digest is SHA-256 over the compact JSON of a fixed projection of the
//! contract, keys sorted. An off-ledger copy that records the digest can
//! later be checked against the ledger with `verify_integrity`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use vendorchain_storage::LedgerStore;

use crate::error::ContractError;
use crate::lifecycle::{require, ContractService};
use crate::types::Contract;

#[derive(Serialize)]
struct Amount(#[serde(with = "crate::numeric::amount")] rust_decimal::Decimal);

/// Outcome of comparing a caller-held digest with the ledger's record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrityReport {
    pub contract_id: String,
    pub expected_hash: String,
    pub actual_hash: String,
    pub matches: bool,
}

/// Lowercase hex SHA-256 of the contract's integrity projection.
pub fn contract_digest(contract: &Contract) -> Result<String, ContractError> {
    let mut projection: BTreeMap<&str, serde_json::Value> = BTreeMap::new();
    projection.insert("contractId", contract.contract_id.clone().into());
    projection.insert("vendorId", contract.vendor_id.clone().into());
    projection.insert("contractType", contract.contract_type.clone().into());
    projection.insert(
        "totalValue",
        serde_json::to_value(Amount(contract.total_value)).map_err(ContractError::Encode)?,
    );
    projection.insert("expiryDate", contract.expiry_date.clone().into());
    projection.insert("status", contract.status.as_str().into());

    let canonical = serde_json::to_string(&projection).map_err(ContractError::Encode)?;
    let hash = Sha256::digest(canonical.as_bytes());
    Ok(hash.iter().map(|b| format!("{:02x}", b)).collect())
}

impl<S: LedgerStore> ContractService<S> {
    pub async fn contract_hash(&self, contract_id: &str) -> Result<String, ContractError> {
        require("contractId", contract_id)?;
        let contract = self.repo.get(contract_id).await?;
        contract_digest(&contract)
    }

    /// Recompute the digest of the stored record and compare it with
    /// `expected_hash` (hex, case-insensitive).
    pub async fn verify_integrity(
        &self,
        contract_id: &str,
        expected_hash: &str,
    ) -> Result<IntegrityReport, ContractError> {
        require("expectedHash", expected_hash)?;
        let actual_hash = self.contract_hash(contract_id).await?;
        let expected_hash = expected_hash.trim().to_ascii_lowercase();
        let matches = expected_hash == actual_hash;
        if !matches {
            tracing::warn!(
                target: "vendorchain::lifecycle",
                contract_id,
                expected = %expected_hash,
                actual = %actual_hash,
                "integrity mismatch"
            );
        }
        Ok(IntegrityReport {
            contract_id: contract_id.to_string(),
            expected_hash,
            actual_hash,
            matches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ContractStatus;
    use rust_decimal::Decimal;

    fn contract() -> Contract {
        Contract {
            contract_id: "C1".into(),
            vendor_id: "V1".into(),
            contract_type: "Service".into(),
            expiry_date: "2025-12-31".into(),
            total_value: Decimal::from(75000),
            ..Contract::default()
        }
    }

    #[test]
    fn digest_is_sha256_of_sorted_projection() {
        let canonical = r#"{"contractId":"C1","contractType":"Service","expiryDate":"2025-12-31","status":"CREATED","totalValue":75000,"vendorId":"V1"}"#;
        let expected: String = Sha256::digest(canonical.as_bytes())
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect();
        assert_eq!(contract_digest(&contract()).unwrap(), expected);
    }

    #[test]
    fn digest_ignores_payment_fields_but_tracks_status() {
        let base = contract_digest(&contract()).unwrap();
        let mut paid = contract();
        paid.paid_amount = Decimal::from(10);
        paid.vendor_name = "Renamed".into();
        assert_eq!(contract_digest(&paid).unwrap(), base);
        let mut verified = contract();
        verified.status = ContractStatus::Verified;
        assert_ne!(contract_digest(&verified).unwrap(), base);
    }

    #[test]
    fn equal_amounts_at_different_scales_hash_alike() {
        let mut scaled = contract();
        scaled.total_value = Decimal::new(7_500_000, 2);
        assert_eq!(
            contract_digest(&scaled).unwrap(),
            contract_digest(&contract()).unwrap()
        );
    }
}
