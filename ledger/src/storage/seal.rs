//! # Proof-of-Work Sealing
//!
//! Sealing searches for a nonce that makes a block's digest start with
//! `difficulty` hex zeros. It is a tunable cost attached to every append,
//! not a defence against adversarial miners: there is exactly one writer.
//!
//! ## Cost
//!
//! Expected attempts are `16^difficulty`. The search is CPU-bound, blocking,
//! and cannot be cancelled; async callers must run it on a blocking worker
//! (`tokio::task::spawn_blocking` or equivalent). An abandoned search leaves
//! nothing behind, since the block is only appended once sealed.
//!
//! There is no iteration cap. The only ways the loop ends without a seal are
//! a difficulty no digest can meet (rejected up-front) and nonce overflow,
//! both reported as [`LedgerError::SealingFault`].

use std::time::{Duration, Instant};

use crate::config::MAX_DIFFICULTY;
use crate::crypto::has_zero_prefix;
use crate::error::{LedgerError, LedgerResult};

use super::commitment::Commitment;

/// Result of a successful nonce search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SealOutcome {
    /// The winning nonce.
    pub nonce: u64,
    /// Digest with the winning nonce.
    pub digest: String,
    /// Number of digests evaluated, including the starting one.
    pub attempts: u64,
    /// Wall time spent searching.
    pub elapsed: Duration,
}

/// A proof-of-work sealer at a fixed difficulty.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofOfWork {
    difficulty: usize,
}

impl ProofOfWork {
    /// Create a sealer. Difficulties longer than a digest are rejected.
    pub fn new(difficulty: usize) -> LedgerResult<Self> {
        if difficulty > MAX_DIFFICULTY {
            return Err(LedgerError::InvalidDifficulty {
                requested: difficulty,
                max: MAX_DIFFICULTY,
            });
        }
        Ok(Self { difficulty })
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    /// Whether `digest` satisfies this sealer's target.
    pub fn meets_target(&self, digest: &str) -> bool {
        has_zero_prefix(digest, self.difficulty)
    }

    /// Search upward from `start_nonce` for a nonce whose digest meets the
    /// target. `start_nonce` itself is tried first.
    pub fn search(&self, commitment: &Commitment, start_nonce: u64) -> LedgerResult<SealOutcome> {
        let started = Instant::now();
        let mut nonce = start_nonce;
        let mut attempts = 1u64;
        let mut digest = commitment.digest(nonce);

        while !self.meets_target(&digest) {
            nonce = nonce.checked_add(1).ok_or_else(|| {
                LedgerError::SealingFault(format!(
                    "nonce space exhausted after {attempts} attempts at difficulty {}",
                    self.difficulty
                ))
            })?;
            attempts += 1;
            digest = commitment.digest(nonce);
        }

        let outcome = SealOutcome {
            nonce,
            digest,
            attempts,
            elapsed: started.elapsed(),
        };
        tracing::debug!(
            digest = %outcome.digest,
            nonce = outcome.nonce,
            attempts = outcome.attempts,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            difficulty = self.difficulty,
            "block mined"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::payload::Payload;

    const TS: &str = "2026-01-01T00:00:00.000000Z";

    fn genesis_commitment() -> Commitment {
        Commitment::new(0, TS, &Payload::genesis("Genesis Block - DocuChain System"), "0")
    }

    #[test]
    fn rejects_impossible_difficulty() {
        let err = ProofOfWork::new(MAX_DIFFICULTY + 1).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidDifficulty { requested: 65, .. }));
        assert!(ProofOfWork::new(MAX_DIFFICULTY).is_ok());
    }

    #[test]
    fn difficulty_zero_accepts_first_digest() {
        let pow = ProofOfWork::new(0).unwrap();
        let outcome = pow.search(&genesis_commitment(), 0).unwrap();
        assert_eq!(outcome.nonce, 0);
        assert_eq!(outcome.attempts, 1);
    }

    #[test]
    fn finds_known_nonce() {
        // Nonce 87 is the first to give two leading zeros for this block.
        let pow = ProofOfWork::new(2).unwrap();
        let outcome = pow.search(&genesis_commitment(), 0).unwrap();
        assert_eq!(outcome.nonce, 87);
        assert_eq!(outcome.attempts, 88);
        assert_eq!(
            outcome.digest,
            "005a14266615506593fc0257f64c5aa2c5181c6e2b14f446f714a183441ea736"
        );
    }

    #[test]
    fn nonce_overflow_is_a_sealing_fault() {
        let pow = ProofOfWork::new(MAX_DIFFICULTY).unwrap();
        let commitment = genesis_commitment();
        // Starting at the last nonce: one attempt, then overflow.
        let err = pow.search(&commitment, u64::MAX).unwrap_err();
        assert!(matches!(err, LedgerError::SealingFault(_)));
    }
}
