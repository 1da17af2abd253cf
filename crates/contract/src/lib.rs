//! Vendor contract lifecycle over a versioned key-value ledger.
//!
//! A contract moves CREATED → VERIFIED → SUBMITTED, then accumulates
//! payments. [`ContractService`] runs the lifecycle, the read queries and
//! the integrity checks against any [`vendorchain_storage::LedgerStore`],
//! and [`ContractService::invoke`] exposes them as named operations with
//! JSON results.

pub mod config;
pub mod context;
pub mod dispatch;
pub mod error;
pub mod integrity;
pub mod lifecycle;
pub mod numeric;
pub mod query;
pub mod repository;
pub mod types;

pub use config::{read_contract_config, ContractConfig, CreatePolicy};
pub use context::{CallContext, IdentityProvider, StaticIdentity};
pub use dispatch::Operation;
pub use error::{ContractError, ErrorKind};
pub use integrity::{contract_digest, IntegrityReport};
pub use lifecycle::{ContractService, CreateContract, RecordPayment};
pub use repository::ContractRepository;
pub use types::{Contract, ContractStatus, HistoryRecord, Payment, QueryRecord, DOC_TYPE};
