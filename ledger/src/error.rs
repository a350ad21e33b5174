//! Error types for the ledger core.
//!
//! Only genuine faults are errors. A chain that fails validation is reported
//! through `validate() == false`, a missing document through `None`, and a
//! missing ledger file through `Ok(None)` from `persist::load`.

use thiserror::Error;

/// Errors surfaced by ledger construction, sealing, and persistence.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// The persisted ledger parsed as JSON but does not describe a chain
    /// we can reconstruct (bad digest encoding, index gaps, empty chain).
    #[error("corrupt ledger: {reason}")]
    Corrupt {
        /// What was wrong with the stored records.
        reason: String,
    },

    /// The persisted ledger is not valid JSON or does not match the record
    /// schema.
    #[error("corrupt ledger encoding: {0}")]
    Json(#[from] serde_json::Error),

    /// The proof-of-work search failed to produce a sealed block.
    #[error("sealing fault: {0}")]
    SealingFault(String),

    /// A difficulty that can never be satisfied was configured.
    #[error("invalid difficulty {requested}: must be at most {max}")]
    InvalidDifficulty {
        /// The difficulty that was requested.
        requested: usize,
        /// The largest difficulty that can be sealed.
        max: usize,
    },

    /// Reading or writing the ledger file failed.
    #[error("ledger i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl LedgerError {
    /// Shorthand for a [`LedgerError::Corrupt`] with a formatted reason.
    pub fn corrupt(reason: impl Into<String>) -> Self {
        LedgerError::Corrupt {
            reason: reason.into(),
        }
    }

    /// Whether this error means the stored ledger cannot be trusted, as
    /// opposed to an environmental failure.
    pub fn is_corruption(&self) -> bool {
        matches!(self, LedgerError::Corrupt { .. } | LedgerError::Json(_))
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
