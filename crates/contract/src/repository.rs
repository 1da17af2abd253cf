use vendorchain_storage::LedgerStore;

use crate::error::ContractError;
use crate::types::Contract;

/// Maps contracts onto ledger keys. One contract per key, stored as JSON.
#[derive(Debug, Clone)]
pub struct ContractRepository<S> {
    store: S,
}

impl<S: LedgerStore> ContractRepository<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Load the contract stored at `contract_id`.
    ///
    /// An absent key (empty value) is `NotFound`. A record stored without
    /// its own `contractId` takes the key it was stored under.
    pub async fn get(&self, contract_id: &str) -> Result<Contract, ContractError> {
        let bytes = self.store.get(contract_id).await?;
        if bytes.is_empty() {
            return Err(ContractError::not_found(contract_id));
        }
        decode(contract_id, &bytes)
    }

    /// Overwrite the full record at `contract.contract_id`.
    pub async fn put(&self, contract: &Contract) -> Result<(), ContractError> {
        let bytes = encode(contract)?;
        self.store.put(&contract.contract_id, bytes).await?;
        Ok(())
    }

    pub async fn exists(&self, contract_id: &str) -> Result<bool, ContractError> {
        Ok(!self.store.get(contract_id).await?.is_empty())
    }
}

pub(crate) fn decode(key: &str, bytes: &[u8]) -> Result<Contract, ContractError> {
    let contract: Contract = serde_json::from_slice(bytes).map_err(|source| ContractError::Decode {
        key: key.to_string(),
        source,
    })?;
    Ok(keyed(key, contract))
}

/// Give a record stored without its own `contractId` the key it lives under.
pub(crate) fn keyed(key: &str, mut contract: Contract) -> Contract {
    if contract.contract_id.is_empty() {
        contract.contract_id = key.to_string();
    }
    contract
}

pub(crate) fn encode(contract: &Contract) -> Result<Vec<u8>, ContractError> {
    serde_json::to_vec(contract).map_err(ContractError::Encode)
}
