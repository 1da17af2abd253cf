//! Contract service configuration.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all, via `ContractConfig::default()`) is a valid configuration.
//!
//! # Example
//!
//! ```toml
//! [lifecycle]
//! create_policy = "reject_existing"   # or "overwrite"
//! allow_overpayment = false
//!
//! [queries]
//! max_expiry_window_days = 3650
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ContractError;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContractConfig {
    pub lifecycle: LifecycleConfig,
    pub queries: QueryConfig,
}

/// `[lifecycle]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleConfig {
    /// What `create` does when the contract id is already stored.
    pub create_policy: CreatePolicy,
    /// Accept payments that push `paidAmount` past `totalValue`.
    pub allow_overpayment: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatePolicy {
    /// Fail with `AlreadyExists`.
    #[default]
    RejectExisting,
    /// Replace the stored record with a fresh CREATED one.
    Overwrite,
}

/// Upper bound for `queries.max_expiry_window_days`, one hundred years.
pub const MAX_EXPIRY_WINDOW_DAYS: i64 = 36_500;

/// `[queries]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueryConfig {
    /// Largest `daysAhead` accepted by the expiring-contracts query.
    pub max_expiry_window_days: i64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            max_expiry_window_days: 3650,
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

impl ContractConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ContractError> {
        let config: ContractConfig =
            toml::from_str(content).map_err(|e| ContractError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ContractError> {
        let window = self.queries.max_expiry_window_days;
        if !(0..=MAX_EXPIRY_WINDOW_DAYS).contains(&window) {
            return Err(ContractError::Config(format!(
                "queries.max_expiry_window_days must be between 0 and {}, got {}",
                MAX_EXPIRY_WINDOW_DAYS, window
            )));
        }
        Ok(())
    }
}

/// Read and parse a contract config TOML file from `path`.
pub fn read_contract_config(path: &Path) -> Result<ContractConfig, ContractError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        ContractError::Config(format!("could not read '{}': {}", path.display(), e))
    })?;

    ContractConfig::from_toml_str(&content).map_err(|e| match e {
        ContractError::Config(msg) => {
            ContractError::Config(format!("could not parse '{}': {}", path.display(), msg))
        }
        other => other,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_document_gives_defaults() {
        let config = ContractConfig::from_toml_str("").unwrap();
        assert_eq!(config, ContractConfig::default());
        assert_eq!(config.lifecycle.create_policy, CreatePolicy::RejectExisting);
        assert!(!config.lifecycle.allow_overpayment);
        assert_eq!(config.queries.max_expiry_window_days, 3650);
    }

    #[test]
    fn parses_every_section() {
        let config = ContractConfig::from_toml_str(
            r#"
[lifecycle]
create_policy = "overwrite"
allow_overpayment = true

[queries]
max_expiry_window_days = 90
"#,
        )
        .unwrap();
        assert_eq!(config.lifecycle.create_policy, CreatePolicy::Overwrite);
        assert!(config.lifecycle.allow_overpayment);
        assert_eq!(config.queries.max_expiry_window_days, 90);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ContractConfig::from_toml_str("[lifecycle]\nstrict = true\n").unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));
    }

    #[test]
    fn negative_window_is_rejected() {
        let err =
            ContractConfig::from_toml_str("[queries]\nmax_expiry_window_days = -1\n").unwrap_err();
        assert!(err.to_string().contains("max_expiry_window_days"), "{err}");
    }

    #[test]
    fn oversized_window_is_rejected() {
        let err = ContractConfig::from_toml_str(
            "[queries]\nmax_expiry_window_days = 9223372036854775807\n",
        )
        .unwrap_err();
        assert!(matches!(err, ContractError::Config(_)));
        assert!(ContractConfig::from_toml_str("[queries]\nmax_expiry_window_days = 36500\n").is_ok());
    }

    #[test]
    fn reads_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[lifecycle]\nallow_overpayment = true").unwrap();
        let config = read_contract_config(file.path()).unwrap();
        assert!(config.lifecycle.allow_overpayment);
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = read_contract_config(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"), "{err}");
    }
}
