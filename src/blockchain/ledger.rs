use chrono::Utc;
use log::{debug, info, warn};
use rand::Rng;
use thiserror::Error;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::account::Account;
use super::block::Block;
use super::config::{ConfigError, LedgerConfig};
use super::crypto::{verify_signature, DigitalSignature};
use super::pow::{hash_attempt, meets_target, CancelToken};
use super::transaction::{Transaction, TransactionError};

/// Errors that can occur during ledger operations
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Identifier is in conflict: {id}")]
    Conflict { id: String },

    #[error("Account not found: {0}")]
    NotFound(String),

    #[error("Transaction error: {0}")]
    TransactionError(#[from] TransactionError),

    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),

    #[error("No accounts registered to mine")]
    NoMiners,

    #[error("Account has outlived its ledger")]
    Detached,

    #[error("Settlement failed: {0}")]
    Settlement(String),

    #[error("System error: {0}")]
    SystemError(String),
}

/// Why a submission was turned away. Rejection is not an error; callers
/// only see `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    InvalidAmount,
    UnknownSender,
    UnknownReceiver,
    BadSignature,
    InsufficientFunds,
    PoolFull,
}

#[derive(Debug)]
struct AccountEntry {
    account: Arc<Account>,
    balance: f64,
}

#[derive(Debug, Default)]
struct LedgerState {
    /// Registered accounts in registration order
    accounts: Vec<AccountEntry>,

    /// Admitted, not yet settled raw transactions
    pending: Vec<String>,

    /// Blocks mined this session
    blocks: Vec<Block>,
}

impl LedgerState {
    fn position(&self, id: &str) -> Option<usize> {
        self.accounts.iter().position(|entry| entry.account.id() == id)
    }

    fn entry(&self, id: &str) -> Option<&AccountEntry> {
        self.accounts.iter().find(|entry| entry.account.id() == id)
    }
}

/// Miners and pool captured at the start of a search
struct MiningSnapshot {
    miners: Vec<Arc<Account>>,
    pool: Vec<String>,
}

struct WinningNonce {
    miner: Arc<Account>,
    nonce: u64,
    hash: String,
    attempts: u64,
}

#[derive(Debug)]
pub(crate) struct LedgerShared {
    config: LedgerConfig,

    /// Every balance and pool mutation happens under this lock
    state: Mutex<LedgerState>,

    /// Held for the whole of a `mine` call
    mining: Mutex<()>,
}

/// The account registry, pending pool and mining authority.
///
/// `Ledger` is a handle; clones share the same state.
#[derive(Debug, Clone)]
pub struct Ledger {
    shared: Arc<LedgerShared>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    /// Creates an empty ledger with the default configuration
    pub fn new() -> Self {
        Self::build(LedgerConfig::default())
    }

    /// Creates an empty ledger after validating `config`
    pub fn with_config(config: LedgerConfig) -> Result<Self, LedgerError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: LedgerConfig) -> Self {
        Ledger {
            shared: Arc::new(LedgerShared {
                config,
                state: Mutex::new(LedgerState::default()),
                mining: Mutex::new(()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<LedgerShared>) -> Self {
        Ledger { shared }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.shared.config
    }

    fn state(&self) -> MutexGuard<'_, LedgerState> {
        self.shared
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new account under `desired_id`.
    ///
    /// When the identifier is taken, a random lowercase suffix is appended
    /// and registration is retried, up to `id_retry_limit` attempts in
    /// total. The realized identifier is available from `Account::id`.
    pub fn add_account(&self, desired_id: &str) -> Result<Arc<Account>, LedgerError> {
        let config = self.config();
        let mut state = self.state();

        for attempt in 0..config.id_retry_limit {
            let candidate = if attempt == 0 {
                desired_id.to_string()
            } else {
                format!("{}{}", desired_id, random_suffix(config.id_suffix_len))
            };

            if state.position(&candidate).is_some() {
                debug!("Identifier {} is taken (attempt {})", candidate, attempt + 1);
                continue;
            }

            let account = Arc::new(Account::new(candidate, Arc::downgrade(&self.shared)));
            state.accounts.push(AccountEntry {
                account: Arc::clone(&account),
                balance: config.starting_balance,
            });
            info!(
                "Registered account {} with balance {}",
                account.id(),
                config.starting_balance
            );
            return Ok(account);
        }

        Err(LedgerError::Conflict {
            id: desired_id.to_string(),
        })
    }

    /// Gets the balance of the account with exactly this identifier
    pub fn get_balance(&self, id: &str) -> Result<f64, LedgerError> {
        self.state()
            .entry(id)
            .map(|entry| entry.balance)
            .ok_or_else(|| LedgerError::NotFound(id.to_string()))
    }

    /// Looks up an account; absence is `None`, not an error
    pub fn get_account(&self, id: &str) -> Option<Arc<Account>> {
        self.state()
            .entry(id)
            .map(|entry| Arc::clone(&entry.account))
    }

    /// Splits a raw transaction into (sender, receiver, amount)
    pub fn parse_transaction(raw: &str) -> Result<(String, String, f64), LedgerError> {
        let transaction = Transaction::parse(raw)?;
        Ok((transaction.sender, transaction.receiver, transaction.amount))
    }

    /// Admits a signed raw transaction into the pending pool.
    ///
    /// A string that does not parse is an error. Every other failed check
    /// (bad amount, unknown party, signature mismatch, insufficient funds,
    /// full pool) is `Ok(false)` and leaves the pool unchanged. Admission
    /// reserves nothing; funds are checked again at settlement.
    pub fn submit_transaction(
        &self,
        raw: &str,
        signature: &DigitalSignature,
    ) -> Result<bool, LedgerError> {
        let transaction = Transaction::parse(raw)?;
        let mut state = self.state();

        match self.admission(&state, &transaction, raw, signature) {
            Ok(()) => {
                state.pending.push(raw.to_string());
                debug!("Admitted transaction {}", raw);
                Ok(true)
            }
            Err(rejection) => {
                debug!("Rejected transaction {}: {:?}", raw, rejection);
                Ok(false)
            }
        }
    }

    fn admission(
        &self,
        state: &LedgerState,
        transaction: &Transaction,
        raw: &str,
        signature: &DigitalSignature,
    ) -> Result<(), Rejection> {
        if !transaction.has_valid_amount() {
            return Err(Rejection::InvalidAmount);
        }

        let sender = state
            .entry(&transaction.sender)
            .ok_or(Rejection::UnknownSender)?;
        if state.entry(&transaction.receiver).is_none() {
            return Err(Rejection::UnknownReceiver);
        }

        match verify_signature(raw.as_bytes(), signature, sender.account.public_key()) {
            Ok(true) => {}
            Ok(false) => return Err(Rejection::BadSignature),
            Err(e) => {
                debug!("Undecodable signature on {}: {}", raw, e);
                return Err(Rejection::BadSignature);
            }
        }

        if sender.balance < transaction.amount {
            return Err(Rejection::InsufficientFunds);
        }

        if let Some(limit) = self.config().max_pending_transactions {
            if state.pending.len() >= limit {
                return Err(Rejection::PoolFull);
            }
        }

        Ok(())
    }

    /// Mines a block over the current pending pool.
    ///
    /// Blocks until some account's nonce wins; there is no upper bound on
    /// the number of attempts. See `mine_until` for a cancellable form.
    pub fn mine(&self) -> Result<Block, LedgerError> {
        self.mine_until(&CancelToken::new())?.ok_or_else(|| {
            LedgerError::SystemError("mining stopped without a cancellation request".to_string())
        })
    }

    /// Mines a block, giving up with `Ok(None)` once `cancel` is signalled.
    ///
    /// Accounts take turns in registration order, each trying
    /// `attempts_per_turn` fresh nonces, until a hash of the memo pool plus
    /// a nonce meets the target. The winner is credited the reward, then
    /// every transaction pooled when the search began is applied and removed
    /// from the pool. Settlement
    /// is all-or-nothing: if any entry is malformed or names an unknown
    /// account, nothing changes and the error is returned.
    pub fn mine_until(&self, cancel: &CancelToken) -> Result<Option<Block>, LedgerError> {
        let _mining = self
            .shared
            .mining
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let snapshot = self.snapshot()?;
        match self.search(&snapshot, cancel) {
            Some(found) => self.commit(snapshot, found).map(Some),
            None => Ok(None),
        }
    }

    /// Captures the miners and the pool a search runs over. Only these pool
    /// entries are settled by the resulting block.
    fn snapshot(&self) -> Result<MiningSnapshot, LedgerError> {
        let state = self.state();
        if state.accounts.is_empty() {
            return Err(LedgerError::NoMiners);
        }

        Ok(MiningSnapshot {
            miners: state
                .accounts
                .iter()
                .map(|entry| Arc::clone(&entry.account))
                .collect(),
            pool: state.pending.clone(),
        })
    }

    /// Runs the nonce search without holding the state lock. `None` means
    /// cancelled.
    fn search(&self, snapshot: &MiningSnapshot, cancel: &CancelToken) -> Option<WinningNonce> {
        let memo_pool = snapshot.pool.concat();
        let attempts_per_turn = self.config().attempts_per_turn;
        let mut attempts: u64 = 0;

        loop {
            for account in &snapshot.miners {
                for _ in 0..attempts_per_turn {
                    if cancel.is_cancelled() {
                        info!("Mining cancelled after {} attempts", attempts);
                        return None;
                    }

                    let nonce = account.generate_nonce();
                    let hash = hash_attempt(&memo_pool, nonce);
                    attempts += 1;

                    if meets_target(&hash) {
                        info!(
                            "Account {} mined a block, nonce: {}, hash: {}, attempts: {}",
                            account.id(),
                            nonce,
                            hash,
                            attempts
                        );
                        return Some(WinningNonce {
                            miner: Arc::clone(account),
                            nonce,
                            hash,
                            attempts,
                        });
                    }
                }
            }
        }
    }

    /// Settles the snapshotted pool, removes exactly those entries from the
    /// pending pool and records the block. Entries admitted after the
    /// snapshot stay pending.
    fn commit(&self, snapshot: MiningSnapshot, found: WinningNonce) -> Result<Block, LedgerError> {
        let MiningSnapshot { pool, .. } = snapshot;
        let mut state = self.state();
        let dropped = self.settle(&mut state, found.miner.id(), &pool)?;

        state.pending.drain(..pool.len());

        let block = Block {
            index: state.blocks.len() as u64,
            timestamp: Utc::now(),
            miner: found.miner.id().to_string(),
            nonce: found.nonce,
            hash: found.hash,
            transactions: pool,
            dropped,
            attempts: found.attempts,
        };
        state.blocks.push(block.clone());

        Ok(block)
    }

    /// Credits the reward and applies `pool` to a scratch copy of the
    /// balances, committing only if every entry is sound. Returns the
    /// entries skipped for lack of funds.
    fn settle(
        &self,
        state: &mut LedgerState,
        miner: &str,
        pool: &[String],
    ) -> Result<Vec<String>, LedgerError> {
        let mut balances: Vec<f64> = state.accounts.iter().map(|entry| entry.balance).collect();
        let mut dropped = Vec::new();

        let miner_index = state
            .position(miner)
            .ok_or_else(|| LedgerError::Settlement(format!("miner {} is not registered", miner)))?;
        balances[miner_index] += self.config().mining_reward;

        for raw in pool {
            let transaction = Transaction::parse(raw)?;
            if !transaction.has_valid_amount() {
                return Err(LedgerError::Settlement(format!(
                    "pooled transaction {} has an invalid amount",
                    raw
                )));
            }

            let (sender, receiver) = match (
                state.position(&transaction.sender),
                state.position(&transaction.receiver),
            ) {
                (Some(sender), Some(receiver)) => (sender, receiver),
                _ => {
                    return Err(LedgerError::Settlement(format!(
                        "pooled transaction {} references an unknown account",
                        raw
                    )))
                }
            };

            if balances[sender] < transaction.amount {
                warn!(
                    "Dropping {}: sender balance {} no longer covers it",
                    raw, balances[sender]
                );
                dropped.push(raw.clone());
                continue;
            }

            balances[sender] -= transaction.amount;
            balances[receiver] += transaction.amount;
        }

        for (entry, balance) in state.accounts.iter_mut().zip(balances) {
            entry.balance = balance;
        }

        Ok(dropped)
    }

    /// Raw transactions waiting to be mined, in admission order
    pub fn pending_transactions(&self) -> Vec<String> {
        self.state().pending.clone()
    }

    /// (identifier, balance) of every account in registration order
    pub fn accounts(&self) -> Vec<(String, f64)> {
        self.state()
            .accounts
            .iter()
            .map(|entry| (entry.account.id().to_string(), entry.balance))
            .collect()
    }

    /// Sum of all balances
    pub fn total_supply(&self) -> f64 {
        self.state().accounts.iter().map(|entry| entry.balance).sum()
    }

    /// Blocks mined this session, oldest first
    pub fn chain(&self) -> Vec<Block> {
        self.state().blocks.clone()
    }

    /// Number of blocks mined this session
    pub fn height(&self) -> u64 {
        self.state().blocks.len() as u64
    }
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len).map(|_| rng.gen_range(b'a'..=b'z') as char).collect()
}
