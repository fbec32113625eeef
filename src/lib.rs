//! A single-process proof-of-work ledger.
//!
//! Accounts hold ed25519 keypairs and submit signed `sender-receiver-amount`
//! transfers to a [`Ledger`]. The ledger admits them into a pending pool and
//! settles the pool when some account's random nonce makes the pool's
//! SHA-256 hash meet the target.
//!
//! ```no_run
//! use pow_ledger::Ledger;
//!
//! let ledger = Ledger::new();
//! let alice = ledger.add_account("alice")?;
//! ledger.add_account("bob")?;
//!
//! alice.transfer_money("bob", 2.0)?;
//! let block = ledger.mine()?;
//! println!("{} won with nonce {}", block.miner, block.nonce);
//! # Ok::<(), pow_ledger::LedgerError>(())
//! ```

pub mod blockchain;

pub use blockchain::{
    Account, Block, CancelToken, DigitalSignature, Ledger, LedgerConfig, LedgerError,
    Transaction,
};
