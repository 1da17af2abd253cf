//! Caller identity and the per-call context handed to every operation.
//!
//! Nothing here reads ambient state on its own: operations receive a
//! [`CallContext`] explicitly, so tests can pin both the caller and the clock.

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime, UtcOffset};

use crate::error::ContractError;

/// Source of the identity string for the current caller.
pub trait IdentityProvider: Send + Sync {
    fn caller_id(&self) -> String;
}

/// An identity provider that always reports the same caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticIdentity(String);

impl StaticIdentity {
    pub fn new(caller: impl Into<String>) -> Self {
        Self(caller.into())
    }
}

impl IdentityProvider for StaticIdentity {
    fn caller_id(&self) -> String {
        self.0.clone()
    }
}

/// Who is calling, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallContext {
    pub caller: String,
    pub timestamp: OffsetDateTime,
}

impl CallContext {
    pub fn new(caller: impl Into<String>, timestamp: OffsetDateTime) -> Self {
        Self {
            caller: caller.into(),
            timestamp,
        }
    }

    /// Capture the provider's caller and the current UTC time.
    pub fn capture(identity: &dyn IdentityProvider) -> Self {
        Self::new(identity.caller_id(), OffsetDateTime::now_utc())
    }

    /// `YYYY-MM-DDTHH:MM:SS.mmmZ`, always in UTC.
    pub fn timestamp_iso(&self) -> String {
        let t = self.timestamp.to_offset(UtcOffset::UTC);
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            t.year(),
            t.month() as u8,
            t.day(),
            t.hour(),
            t.minute(),
            t.second(),
            t.millisecond()
        )
    }

    /// The calendar date of the call, in UTC.
    pub fn today(&self) -> Date {
        self.timestamp.to_offset(UtcOffset::UTC).date()
    }

    /// `today() + days`, or `None` past the end of the calendar.
    pub fn days_ahead(&self, days: i64) -> Option<Date> {
        let offset = days.checked_mul(86_400).map(Duration::seconds)?;
        self.today().checked_add(offset)
    }
}

/// Parse a `YYYY-MM-DD` date argument.
pub fn parse_date(field: &str, raw: &str) -> Result<Date, ContractError> {
    let format = format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), format).map_err(|_| {
        ContractError::validation(field, format!("{:?} is not a YYYY-MM-DD date", raw))
    })
}

pub fn format_date(date: Date) -> String {
    format!(
        "{:04}-{:02}-{:02}",
        date.year(),
        date.month() as u8,
        date.day()
    )
}
