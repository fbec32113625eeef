// Blockchain module
//
// This module contains the ledger implementation including:
// - Accounts and their keypairs
// - The ledger (account registry, pending pool, mining, settlement)
// - Transaction encoding
// - Cryptography utilities
// - Proof of work target
// - Mined block records

pub mod account;
pub mod block;
pub mod config;
pub mod crypto;
pub mod ledger;
pub mod pow;
pub mod transaction;

// Re-export main components for easier access
pub use account::Account;
pub use block::Block;
pub use config::{ConfigError, LedgerConfig};
pub use crypto::{DigitalSignature, KeyPair, PublicKey};
pub use ledger::{Ledger, LedgerError};
pub use pow::CancelToken;
pub use transaction::{Transaction, TransactionError};
