//! Monetary amounts and day counts parsed at the string boundary.
//!
//! All money is `rust_decimal::Decimal`; nothing in the lifecycle does `f64`
//! arithmetic. Floats only appear when a non-integral amount is written to
//! JSON, so every amount that reaches the ledger must survive that write.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::ContractError;

/// Parse a monetary amount supplied as a string argument.
///
/// Accepts plain decimals (`"75000"`, `"250.50"`) and scientific notation
/// (`"7.5e4"`). Surrounding whitespace is ignored.
pub fn parse_amount(field: &str, raw: &str) -> Result<Decimal, ContractError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ContractError::validation(field, "a number is required"));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map(|d| d.normalize())
        .map_err(|_| ContractError::validation(field, format!("{:?} is not a number", raw)))
        .and_then(|d| {
            if stores_exactly(d) {
                Ok(d)
            } else {
                Err(ContractError::validation(
                    field,
                    format!("{:?} has more significant digits than a stored amount keeps", raw),
                ))
            }
        })
}

/// True when `value` reads back unchanged after the [`amount`] adapter
/// writes it as a JSON number.
pub fn stores_exactly(value: Decimal) -> bool {
    if value.fract().is_zero() && value.to_i64().is_some() {
        return true;
    }
    value
        .to_f64()
        .and_then(|f| Decimal::from_str(&f.to_string()).ok())
        .is_some_and(|back| back == value)
}

/// Parse a whole number of days.
pub fn parse_days(field: &str, raw: &str) -> Result<i64, ContractError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ContractError::validation(field, format!("{:?} is not an integer", raw)))
}

/// Serde adapter writing a `Decimal` as a JSON number.
///
/// Integral values are written as integers, everything else as a float.
/// Reads integers, floats and numeric strings.
pub mod amount {
    use std::str::FromStr;

    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal::Decimal;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        if value.fract().is_zero() {
            if let Some(i) = value.to_i64() {
                return serializer.serialize_i64(i);
            }
        }
        match value.to_f64() {
            Some(f) => serializer.serialize_f64(f),
            None => serializer.serialize_str(&value.to_string()),
        }
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        Int(i64),
        Float(f64),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        match Wire::deserialize(deserializer)? {
            Wire::Int(i) => Ok(Decimal::from(i)),
            // Shortest round-trip text, so 0.1 reads back as 0.1.
            Wire::Float(f) => Decimal::from_str(&f.to_string())
                .or_else(|_| Decimal::from_scientific(&format!("{:e}", f)))
                .map_err(de::Error::custom),
            Wire::Text(s) => Decimal::from_str(s.trim()).map_err(de::Error::custom),
        }
    }
}
