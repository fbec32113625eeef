use serde::Serialize;
use thiserror::Error;

use std::fmt;
use std::str::FromStr;

/// Field separator of the wire encoding
pub const SEPARATOR: char = '-';

/// Errors that can occur during transaction operations
#[derive(Debug, Error, PartialEq)]
pub enum TransactionError {
    #[error("Illegal transaction format, should be sender-receiver-amount: {0}")]
    Format(String),
}

/// A transfer of `amount` from `sender` to `receiver`.
///
/// On the wire a transaction is the string `sender-receiver-amount`. Hyphens
/// inside identifiers are not escaped, so an identifier containing `-` does
/// not survive a round trip.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    /// Sender's identifier
    pub sender: String,

    /// Receiver's identifier
    pub receiver: String,

    /// Amount being transferred
    pub amount: f64,
}

impl Transaction {
    /// Creates a new transaction
    pub fn new(sender: impl Into<String>, receiver: impl Into<String>, amount: f64) -> Self {
        Transaction {
            sender: sender.into(),
            receiver: receiver.into(),
            amount,
        }
    }

    /// Canonical `sender-receiver-amount` encoding. This exact string is what
    /// gets signed.
    ///
    /// The amount uses the shortest decimal that reads back to the same
    /// `f64` (`2.0` encodes as `2`), not a fixed six-digit form such as
    /// `2.000000`. Signed bytes and memo-pool hashes therefore differ from
    /// systems that print fixed decimals, though `parse` accepts both.
    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.sender,
            self.receiver,
            self.amount,
            sep = SEPARATOR
        )
    }

    /// Parses a raw transaction string.
    ///
    /// The string is split on `-` into at most three fields, so a leading
    /// minus sign on the amount stays with the amount. Fewer than three
    /// fields, a `-` anywhere else in the amount field (a fourth field), or
    /// an amount that is not a number, is a format error.
    pub fn parse(raw: &str) -> Result<Self, TransactionError> {
        let fields: Vec<&str> = raw.splitn(3, SEPARATOR).collect();
        if fields.len() != 3 {
            return Err(TransactionError::Format(format!(
                "expected 3 fields, got {} in {:?}",
                fields.len(),
                raw
            )));
        }

        if fields[2]
            .char_indices()
            .any(|(index, ch)| ch == SEPARATOR && index > 0)
        {
            return Err(TransactionError::Format(format!(
                "more than 3 fields in {:?}",
                raw
            )));
        }

        let amount = fields[2].parse::<f64>().map_err(|_| {
            TransactionError::Format(format!("amount is not a number: {:?}", fields[2]))
        })?;

        Ok(Transaction::new(fields[0], fields[1], amount))
    }

    /// Whether the amount can be moved at all: finite and not negative
    pub fn has_valid_amount(&self) -> bool {
        self.amount.is_finite() && self.amount >= 0.0
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Transaction {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transaction::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode() {
        assert_eq!(Transaction::new("alice", "bob", 2.0).encode(), "alice-bob-2");
        assert_eq!(Transaction::new("alice", "bob", 0.5).encode(), "alice-bob-0.5");
    }

    #[test]
    fn test_parse_round_trip() {
        for amount in [0.0, 2.0, 0.1, 6.25, 1234.5678, f64::MAX, 1e-9] {
            let transaction = Transaction::new("alice", "bob", amount);
            let parsed = Transaction::parse(&transaction.encode()).unwrap();
            assert_eq!(parsed, transaction);
        }
    }

    #[test]
    fn test_parse_accepts_foreign_decimal_forms() {
        let parsed = Transaction::parse("alice-bob-2.000000").unwrap();
        assert_eq!(parsed, Transaction::new("alice", "bob", 2.0));
    }

    #[test]
    fn test_negative_amount_parses_but_is_invalid() {
        let parsed = Transaction::parse("alice-bob--1").unwrap();
        assert_eq!(parsed.amount, -1.0);
        assert!(!parsed.has_valid_amount());
    }

    #[test]
    fn test_non_finite_amount_is_invalid() {
        assert!(!Transaction::parse("alice-bob-NaN").unwrap().has_valid_amount());
        assert!(!Transaction::parse("alice-bob-inf").unwrap().has_valid_amount());
        assert!(Transaction::new("alice", "bob", 0.0).has_valid_amount());
    }

    #[test]
    fn test_too_few_fields() {
        assert!(matches!(
            Transaction::parse("alice-bob"),
            Err(TransactionError::Format(_))
        ));
        assert!(Transaction::parse("").is_err());
    }

    #[test]
    fn test_amount_not_a_number() {
        assert!(matches!(
            Transaction::parse("alice-bob-lots"),
            Err(TransactionError::Format(_))
        ));
    }

    #[test]
    fn test_more_than_three_fields() {
        for raw in ["alice-bob-1-2", "alice-bob-1e-5", "alice-bob--1-2", "alice-bob-1-"] {
            assert!(
                matches!(Transaction::parse(raw), Err(TransactionError::Format(_))),
                "{} should not parse",
                raw
            );
        }
        // Exponents without a minus sign still parse
        assert_eq!(Transaction::parse("alice-bob-1e2").unwrap().amount, 100.0);
    }

    #[test]
    fn test_serializes_parsed_fields() {
        let transaction = Transaction::parse("alice-bob-2.5").unwrap();
        let json = serde_json::to_value(&transaction).unwrap();

        assert_eq!(json["sender"], "alice");
        assert_eq!(json["receiver"], "bob");
        assert_eq!(json["amount"], 2.5);
    }

    #[test]
    fn test_hyphenated_identifier_corrupts_parsing() {
        let transaction = Transaction::new("mary-jane", "bob", 1.0);
        assert!(Transaction::parse(&transaction.encode()).is_err());

        let transaction = Transaction::new("alice", "x-1", 1.0);
        assert!(Transaction::parse(&transaction.encode()).is_err());
    }
}
