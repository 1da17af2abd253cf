pub mod conformance;
mod cursor;
mod error;
mod memory;
mod record;
mod selector;
mod traits;

pub use cursor::{drain, drain_map, BoxCursor, Cursor, VecCursor};
pub use error::StorageError;
pub use memory::MemoryLedger;
pub use record::{KeyModification, LedgerEntry, LedgerTimestamp};
pub use selector::{Condition, Selector};
pub use traits::LedgerStore;
