use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A single key/value pair yielded by a range scan or rich query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub key: String,
    pub value: Vec<u8>,
}

impl LedgerEntry {
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Commit time of a ledger transaction, in the platform's `{seconds, nanos}` shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerTimestamp {
    /// Seconds since the Unix epoch (UTC).
    pub seconds: i64,
    /// Sub-second nanoseconds, `0..1_000_000_000`.
    pub nanos: i32,
}

impl LedgerTimestamp {
    pub fn from_datetime(at: OffsetDateTime) -> Self {
        Self {
            seconds: at.unix_timestamp(),
            nanos: at.nanosecond() as i32,
        }
    }

    pub fn now() -> Self {
        Self::from_datetime(OffsetDateTime::now_utc())
    }
}

/// One historical version of a key, as returned by `history_of`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyModification {
    pub tx_id: String,
    pub timestamp: LedgerTimestamp,
    /// True when this version records a deletion; `value` is then empty.
    pub is_delete: bool,
    pub value: Vec<u8>,
}
