use serde::Deserialize;
use thiserror::Error;

use std::fs;
use std::path::Path;

/// Errors that can occur while loading a ledger configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Tunables of a ledger. Any field missing from a config file keeps its
/// default.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Balance credited to every new account
    pub starting_balance: f64,

    /// Amount credited to the account whose nonce wins a block
    pub mining_reward: f64,

    /// Registration attempts before an identifier collision is a conflict
    pub id_retry_limit: usize,

    /// Length of the alphabetic suffix appended on identifier collision
    pub id_suffix_len: usize,

    /// Nonces each account tries before the turn moves to the next account
    pub attempts_per_turn: u32,

    /// Upper bound on the pending pool; `None` means unbounded
    pub max_pending_transactions: Option<usize>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        LedgerConfig {
            starting_balance: 5.0,
            mining_reward: 6.25,
            id_retry_limit: 5,
            id_suffix_len: 4,
            attempts_per_turn: 1,
            max_pending_transactions: None,
        }
    }
}

impl LedgerConfig {
    /// Loads and validates a JSON config file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Parses and validates a JSON config document
    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: LedgerConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("starting_balance", self.starting_balance),
            ("mining_reward", self.mining_reward),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be a non-negative number, got {}",
                    name, value
                )));
            }
        }

        if self.id_retry_limit == 0 {
            return Err(ConfigError::Invalid("id_retry_limit must be at least 1".to_string()));
        }
        if self.id_suffix_len == 0 {
            return Err(ConfigError::Invalid("id_suffix_len must be at least 1".to_string()));
        }
        if self.attempts_per_turn == 0 {
            return Err(ConfigError::Invalid(
                "attempts_per_turn must be at least 1".to_string(),
            ));
        }
        if self.max_pending_transactions == Some(0) {
            return Err(ConfigError::Invalid(
                "max_pending_transactions must be at least 1 when set".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::default();
        assert_eq!(config.starting_balance, 5.0);
        assert_eq!(config.mining_reward, 6.25);
        assert_eq!(config.id_retry_limit, 5);
        assert_eq!(config.attempts_per_turn, 1);
        assert!(config.max_pending_transactions.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LedgerConfig::from_json_str(r#"{ "mining_reward": 12.5 }"#).unwrap();
        assert_eq!(config.mining_reward, 12.5);
        assert_eq!(config.starting_balance, 5.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LedgerConfig::from_json_str(r#"{ "starting_balance": -1.0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LedgerConfig::from_json_str(r#"{ "attempts_per_turn": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            LedgerConfig::from_json_str(r#"{ "max_pending_transactions": 0 }"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            LedgerConfig::from_json_str("{ not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            LedgerConfig::from_json_file("/nonexistent/pow_ledger.json"),
            Err(ConfigError::Io(_))
        ));
    }
}
