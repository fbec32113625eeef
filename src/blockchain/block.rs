use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents a mined block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    /// Position of the block in the session's history, starting at 0
    pub index: u64,

    /// Timestamp when the block was mined
    pub timestamp: DateTime<Utc>,

    /// Identifier of the account whose nonce won
    pub miner: String,

    /// The winning nonce
    pub nonce: u64,

    /// SHA-256 of the memo pool followed by the nonce
    pub hash: String,

    /// Raw transactions the block included, in pool order
    pub transactions: Vec<String>,

    /// Subset of `transactions` left unapplied because the sender could no
    /// longer cover them at settlement
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub dropped: Vec<String>,

    /// Number of hashes computed before the winning one, inclusive
    pub attempts: u64,
}

impl Block {
    /// The concatenation of the block's transactions that was hashed
    pub fn memo_pool(&self) -> String {
        self.transactions.concat()
    }
}
