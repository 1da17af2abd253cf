//! Named-operation entry point.
//!
//! The ledger platform invokes functions by name with positional string
//! arguments and expects a JSON string back. `invoke` checks the name and
//! argument count, routes to the typed operation and serializes the result.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use vendorchain_storage::LedgerStore;

use crate::context::CallContext;
use crate::error::ContractError;
use crate::lifecycle::{ContractService, CreateContract, RecordPayment};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    InitLedger,
    CreateContract,
    VerifyContract,
    SubmitContract,
    RecordPayment,
    QueryContract,
    QueryAllContracts,
    GetContractsByVendor,
    GetExpiringContracts,
    GetContractHistory,
    ContractExists,
    GetContractHash,
    VerifyContractIntegrity,
}

impl Operation {
    pub const ALL: [Operation; 13] = [
        Operation::InitLedger,
        Operation::CreateContract,
        Operation::VerifyContract,
        Operation::SubmitContract,
        Operation::RecordPayment,
        Operation::QueryContract,
        Operation::QueryAllContracts,
        Operation::GetContractsByVendor,
        Operation::GetExpiringContracts,
        Operation::GetContractHistory,
        Operation::ContractExists,
        Operation::GetContractHash,
        Operation::VerifyContractIntegrity,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::InitLedger => "initLedger",
            Operation::CreateContract => "createContract",
            Operation::VerifyContract => "verifyContract",
            Operation::SubmitContract => "submitContract",
            Operation::RecordPayment => "recordPayment",
            Operation::QueryContract => "queryContract",
            Operation::QueryAllContracts => "queryAllContracts",
            Operation::GetContractsByVendor => "getContractsByVendor",
            Operation::GetExpiringContracts => "getExpiringContracts",
            Operation::GetContractHistory => "getContractHistory",
            Operation::ContractExists => "contractExists",
            Operation::GetContractHash => "getContractHash",
            Operation::VerifyContractIntegrity => "verifyContractIntegrity",
        }
    }

    /// Number of positional arguments.
    pub fn arity(self) -> usize {
        match self {
            Operation::InitLedger | Operation::QueryAllContracts => 0,
            Operation::VerifyContract
            | Operation::SubmitContract
            | Operation::QueryContract
            | Operation::GetContractsByVendor
            | Operation::GetExpiringContracts
            | Operation::GetContractHistory
            | Operation::ContractExists
            | Operation::GetContractHash => 1,
            Operation::VerifyContractIntegrity => 2,
            Operation::RecordPayment => 4,
            Operation::CreateContract => 6,
        }
    }

    /// True for operations that never write to the ledger.
    pub fn is_read_only(self) -> bool {
        !matches!(
            self,
            Operation::InitLedger
                | Operation::CreateContract
                | Operation::VerifyContract
                | Operation::SubmitContract
                | Operation::RecordPayment
        )
    }
}

impl FromStr for Operation {
    type Err = ContractError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| ContractError::UnknownOperation(s.to_string()))
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, ContractError> {
    serde_json::to_string(value).map_err(ContractError::Encode)
}

impl<S: LedgerStore> ContractService<S> {
    /// Run the operation called `name` with positional `args`, returning its
    /// result as a JSON string.
    pub async fn invoke<A: AsRef<str>>(
        &self,
        ctx: &CallContext,
        name: &str,
        args: &[A],
    ) -> Result<String, ContractError> {
        let op: Operation = name.parse()?;
        if args.len() != op.arity() {
            return Err(ContractError::Arity {
                operation: op.name().to_string(),
                expected: op.arity(),
                got: args.len(),
            });
        }
        let arg = |i: usize| args[i].as_ref();

        match op {
            Operation::InitLedger => to_json(&self.init_ledger(ctx).await?),
            Operation::CreateContract => {
                let request = CreateContract {
                    contract_id: arg(0).to_string(),
                    vendor_id: arg(1).to_string(),
                    vendor_name: arg(2).to_string(),
                    contract_type: arg(3).to_string(),
                    expiry_date: arg(4).to_string(),
                    total_value: arg(5).to_string(),
                };
                to_json(&self.create(ctx, &request).await?)
            }
            Operation::VerifyContract => to_json(&self.verify(ctx, arg(0)).await?),
            Operation::SubmitContract => to_json(&self.submit(ctx, arg(0)).await?),
            Operation::RecordPayment => {
                let request = RecordPayment {
                    contract_id: arg(0).to_string(),
                    amount: arg(1).to_string(),
                    date: arg(2).to_string(),
                    reference: arg(3).to_string(),
                };
                to_json(&self.record_payment(ctx, &request).await?)
            }
            Operation::QueryContract => to_json(&self.get_one(arg(0)).await?),
            Operation::QueryAllContracts => to_json(&self.get_all().await?),
            Operation::GetContractsByVendor => to_json(&self.get_by_vendor(arg(0)).await?),
            Operation::GetExpiringContracts => to_json(&self.get_expiring(ctx, arg(0)).await?),
            Operation::GetContractHistory => to_json(&self.get_history(arg(0)).await?),
            Operation::ContractExists => to_json(&self.contract_exists(arg(0)).await?),
            Operation::GetContractHash => to_json(&self.contract_hash(arg(0)).await?),
            Operation::VerifyContractIntegrity => {
                to_json(&self.verify_integrity(arg(0), arg(1)).await?)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_name_round_trips() {
        for op in Operation::ALL {
            assert_eq!(op.name().parse::<Operation>().unwrap(), op);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        assert!(matches!(
            "deleteContract".parse::<Operation>(),
            Err(ContractError::UnknownOperation(name)) if name == "deleteContract"
        ));
    }

    #[test]
    fn only_lifecycle_operations_write() {
        let writers: Vec<_> = Operation::ALL
            .into_iter()
            .filter(|op| !op.is_read_only())
            .map(Operation::name)
            .collect();
        assert_eq!(
            writers,
            vec![
                "initLedger",
                "createContract",
                "verifyContract",
                "submitContract",
                "recordPayment"
            ]
        );
    }
}
