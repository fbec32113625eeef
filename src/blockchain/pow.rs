//! Proof-of-work target and the cancellation signal for the search loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::crypto::sha256_hex;

/// Number of leading hex characters of a hash that are scanned.
pub const TARGET_WINDOW: usize = 10;

/// Length of the run of `'0'` characters that wins a block.
pub const TARGET_ZERO_RUN: usize = 3;

/// Hash of one mining attempt: SHA-256 over the memo pool followed by the
/// decimal nonce.
pub fn hash_attempt(memo_pool: &str, nonce: u64) -> String {
    let mut input = String::with_capacity(memo_pool.len() + 20);
    input.push_str(memo_pool);
    input.push_str(&nonce.to_string());
    sha256_hex(input.as_bytes())
}

/// Whether `hash` has `TARGET_ZERO_RUN` consecutive `'0'` characters
/// somewhere inside its first `TARGET_WINDOW` characters.
pub fn meets_target(hash: &str) -> bool {
    let mut run = 0;
    for ch in hash.chars().take(TARGET_WINDOW) {
        if ch != '0' {
            run = 0;
            continue;
        }
        run += 1;
        if run == TARGET_ZERO_RUN {
            return true;
        }
    }
    false
}

/// Cooperative stop signal for a running search. Clones share the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_at_start() {
        assert!(meets_target("000abcdef1234"));
    }

    #[test]
    fn test_run_in_middle() {
        assert!(meets_target("ab000cdef1"));
        assert!(meets_target("abcdef1000"));
    }

    #[test]
    fn test_longer_run_counts() {
        assert!(meets_target("a0000bcdef"));
    }

    #[test]
    fn test_run_past_window_does_not_count() {
        // zeros at positions 8, 9, 10: third one is outside the window
        assert!(!meets_target("abcdef1200012345"));
        assert!(!meets_target("abcdef1234000"));
    }

    #[test]
    fn test_broken_runs() {
        assert!(!meets_target("00a00b00c0"));
        assert!(!meets_target(""));
        assert!(!meets_target("00"));
    }

    #[test]
    fn test_hash_attempt_appends_decimal_nonce() {
        assert_eq!(hash_attempt("alice-bob-2", 42), sha256_hex(b"alice-bob-242"));
        assert_eq!(hash_attempt("", 7).len(), 64);
    }

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!token.is_cancelled());
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
