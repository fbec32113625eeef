use log::debug;
use rand::rngs::OsRng;
use rand::RngCore;

use std::sync::Weak;

use super::crypto::{DigitalSignature, KeyPair, PublicKey};
use super::ledger::{Ledger, LedgerError, LedgerShared};
use super::transaction::Transaction;

/// An identity holding a keypair. Its balance lives in the ledger that
/// registered it.
#[derive(Debug)]
pub struct Account {
    /// The account's identifier, unique within its ledger
    id: String,

    /// The account's keypair
    keypair: KeyPair,

    /// Back-reference to the registering ledger; never keeps it alive
    ledger: Weak<LedgerShared>,
}

impl Account {
    /// Creates an account with a fresh keypair. Uniqueness of `id` is up to
    /// the caller, see `Ledger::add_account`.
    pub(crate) fn new(id: String, ledger: Weak<LedgerShared>) -> Self {
        Account {
            id,
            keypair: KeyPair::generate(),
            ledger,
        }
    }

    /// Gets the account's identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Gets the account's public key
    pub fn public_key(&self) -> &PublicKey {
        self.keypair.public_key()
    }

    fn ledger(&self) -> Result<Ledger, LedgerError> {
        self.ledger
            .upgrade()
            .map(Ledger::from_shared)
            .ok_or(LedgerError::Detached)
    }

    /// Gets the account's current balance from its ledger
    pub fn balance(&self) -> Result<f64, LedgerError> {
        self.ledger()?.get_balance(&self.id)
    }

    /// Signs a message with the account's private key
    pub fn sign(&self, message: &str) -> DigitalSignature {
        self.keypair.sign(message.as_bytes())
    }

    /// Sends `amount` to `receiver` by submitting a signed transaction.
    ///
    /// Returns `Ok(false)` without submitting when the balance is too low or
    /// the receiver is unknown, otherwise the ledger's admission result. The
    /// balance is not touched until the transaction is mined.
    pub fn transfer_money(&self, receiver: &str, amount: f64) -> Result<bool, LedgerError> {
        let ledger = self.ledger()?;

        if ledger.get_balance(&self.id)? < amount {
            debug!("{} cannot cover a transfer of {}", self.id, amount);
            return Ok(false);
        }
        if ledger.get_account(receiver).is_none() {
            debug!("{} tried to pay unknown receiver {}", self.id, receiver);
            return Ok(false);
        }

        let raw = Transaction::new(self.id.as_str(), receiver, amount).encode();
        let signature = self.sign(&raw);
        ledger.submit_transaction(&raw, &signature)
    }

    /// A uniformly distributed nonce drawn fresh from the OS entropy source
    pub fn generate_nonce(&self) -> u64 {
        OsRng.next_u64()
    }
}
