use vendorchain_storage::StorageError;

use crate::types::ContractStatus;

/// Coarse classification of a [`ContractError`], for callers that map
/// failures onto transport status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidTransition,
    Store,
    Internal,
}

/// All errors returned by contract operations.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    /// A required argument is missing or empty, or fails to parse.
    #[error("{field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("Contract {contract_id} does not exist")]
    NotFound { contract_id: String },

    /// The contract is not in the status the operation requires.
    #[error("Contract {contract_id} is not in {required} status (current status: {actual})")]
    InvalidTransition {
        contract_id: String,
        required: ContractStatus,
        actual: ContractStatus,
    },

    #[error("Contract {contract_id} already exists")]
    AlreadyExists { contract_id: String },

    /// A stored value could not be decoded as a contract.
    #[error("value stored at {key} is not a valid contract: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not encode result: {0}")]
    Encode(#[source] serde_json::Error),

    /// Ledger failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StorageError),

    #[error("unknown operation: {0}")]
    UnknownOperation(String),

    #[error("{operation} expects {expected} argument(s), got {got}")]
    Arity {
        operation: String,
        expected: usize,
        got: usize,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ContractError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ContractError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn not_found(contract_id: impl Into<String>) -> Self {
        ContractError::NotFound {
            contract_id: contract_id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ContractError::Validation { .. }
            | ContractError::AlreadyExists { .. }
            | ContractError::UnknownOperation(_)
            | ContractError::Arity { .. } => ErrorKind::Validation,
            ContractError::NotFound { .. } => ErrorKind::NotFound,
            ContractError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            ContractError::Store(_) => ErrorKind::Store,
            ContractError::Decode { .. } | ContractError::Encode(_) | ContractError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_is_exact() {
        assert_eq!(
            ContractError::not_found("NONEXISTENT").to_string(),
            "Contract NONEXISTENT does not exist"
        );
    }

    #[test]
    fn invalid_transition_names_required_status() {
        let err = ContractError::InvalidTransition {
            contract_id: "C1".into(),
            required: ContractStatus::Created,
            actual: ContractStatus::Verified,
        };
        let msg = err.to_string();
        assert!(msg.contains("is not in CREATED status"), "{msg}");
        assert!(msg.contains("VERIFIED"), "{msg}");
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    }

    #[test]
    fn store_errors_pass_through_unchanged() {
        let err = ContractError::from(StorageError::Backend("disk full".into()));
        assert_eq!(err.to_string(), "storage backend error: disk full");
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[test]
    fn validation_names_the_field() {
        let err = ContractError::validation("vendorName", "vendor name is required");
        assert_eq!(err.to_string(), "vendorName: vendor name is required");
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
