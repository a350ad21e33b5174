//! # Block Structure
//!
//! A block is one ledger entry: a payload bound to its position, its
//! creation time, and the digest of the block before it.
//!
//! ## Block Layout
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Block                                       │
//! │  ├── index: u64           (0 = genesis)      │
//! │  ├── timestamp: String    (ISO-8601)         │
//! │  ├── payload: Payload     ("data" on disk)   │
//! │  ├── previous_digest      ("0" for genesis)  │
//! │  ├── nonce: u64           (sealing counter)  │
//! │  └── digest: String       (SHA-256 hex)      │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Lifecycle
//!
//! ```text
//! Block::create ──► UnsealedBlock ──seal──► Block ──save──► BlockRecord
//!                                              ▲                 │
//!                                              └───from_record───┘
//! ```
//!
//! Only sealed blocks exist as [`Block`]. Loading a record trusts its stored
//! nonce and digest; checking them is the ledger's job, not the loader's.

use serde::{Deserialize, Serialize};

use crate::config::GENESIS_PREVIOUS_DIGEST;
use crate::crypto::{has_zero_prefix, is_digest_hex};
use crate::error::{LedgerError, LedgerResult};

use super::commitment::{commit, Commitment};
use super::payload::Payload;
use super::seal::{ProofOfWork, SealOutcome};

// ---------------------------------------------------------------------------
// BlockRecord
// ---------------------------------------------------------------------------

/// The external representation of a block, one element of the persisted
/// JSON array.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub index: u64,
    pub timestamp: String,
    pub data: Payload,
    pub previous_hash: String,
    pub nonce: u64,
    pub hash: String,
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A sealed ledger entry.
///
/// No public API mutates a block. Fields are crate-visible so the ledger's
/// own tamper tests can reach them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "BlockRecord", try_from = "BlockRecord")]
pub struct Block {
    pub(crate) index: u64,
    pub(crate) timestamp: String,
    pub(crate) payload: Payload,
    pub(crate) previous_digest: String,
    pub(crate) nonce: u64,
    pub(crate) digest: String,
}

impl Block {
    /// Construct a block with `nonce = 0` and its matching digest.
    ///
    /// The result is not sealed; pass it through [`UnsealedBlock::seal`]
    /// before it can join a ledger.
    pub fn create(
        index: u64,
        timestamp: impl Into<String>,
        payload: Payload,
        previous_digest: impl Into<String>,
    ) -> UnsealedBlock {
        let timestamp = timestamp.into();
        let previous_digest = previous_digest.into();
        let commitment = Commitment::new(index, &timestamp, &payload, &previous_digest);
        let digest = commitment.digest(0);

        UnsealedBlock {
            block: Block {
                index,
                timestamp,
                payload,
                previous_digest,
                nonce: 0,
                digest,
            },
            commitment,
        }
    }

    /// Rebuild a block from its record without re-sealing.
    ///
    /// Only the record's shape is checked: the digest must be 64 lowercase
    /// hex characters, and the previous digest must be `"0"` for index 0 and
    /// a well-formed digest otherwise. Whether the digest is *correct* is
    /// left to [`Ledger::validate`](super::Ledger::validate).
    pub fn from_record(record: BlockRecord) -> LedgerResult<Self> {
        if !is_digest_hex(&record.hash) {
            return Err(LedgerError::corrupt(format!(
                "block {} has malformed hash {:?}",
                record.index, record.hash
            )));
        }

        let previous_ok = if record.index == 0 {
            record.previous_hash == GENESIS_PREVIOUS_DIGEST
        } else {
            is_digest_hex(&record.previous_hash)
        };
        if !previous_ok {
            return Err(LedgerError::corrupt(format!(
                "block {} has malformed previous_hash {:?}",
                record.index, record.previous_hash
            )));
        }

        Ok(Block {
            index: record.index,
            timestamp: record.timestamp,
            payload: record.data,
            previous_digest: record.previous_hash,
            nonce: record.nonce,
            digest: record.hash,
        })
    }

    /// The external representation of this block.
    pub fn to_record(&self) -> BlockRecord {
        self.clone().into()
    }

    /// Recompute the digest from the block's content and stored nonce.
    pub fn recompute_digest(&self) -> String {
        commit(
            self.index,
            &self.timestamp,
            &self.payload,
            &self.previous_digest,
            self.nonce,
        )
    }

    /// Whether the stored digest matches the content.
    pub fn has_consistent_digest(&self) -> bool {
        self.digest == self.recompute_digest()
    }

    /// Whether the stored digest starts with `difficulty` hex zeros.
    pub fn meets_difficulty(&self, difficulty: usize) -> bool {
        has_zero_prefix(&self.digest, difficulty)
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn previous_digest(&self) -> &str {
        &self.previous_digest
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

impl From<Block> for BlockRecord {
    fn from(block: Block) -> Self {
        BlockRecord {
            index: block.index,
            timestamp: block.timestamp,
            data: block.payload,
            previous_hash: block.previous_digest,
            nonce: block.nonce,
            hash: block.digest,
        }
    }
}

impl TryFrom<BlockRecord> for Block {
    type Error = LedgerError;

    fn try_from(record: BlockRecord) -> LedgerResult<Self> {
        Block::from_record(record)
    }
}

// ---------------------------------------------------------------------------
// UnsealedBlock
// ---------------------------------------------------------------------------

/// A block whose nonce has not been searched yet.
///
/// Its digest always reflects its current nonce. Sealing consumes it.
#[derive(Debug)]
pub struct UnsealedBlock {
    block: Block,
    commitment: Commitment,
}

impl UnsealedBlock {
    pub fn index(&self) -> u64 {
        self.block.index
    }

    pub fn nonce(&self) -> u64 {
        self.block.nonce
    }

    /// Digest at the current nonce.
    pub fn digest(&self) -> &str {
        &self.block.digest
    }

    /// Run the nonce search and freeze the block.
    ///
    /// On error the block is dropped; nothing partially sealed escapes.
    pub fn seal(self, pow: &ProofOfWork) -> LedgerResult<(Block, SealOutcome)> {
        let UnsealedBlock {
            mut block,
            commitment,
        } = self;
        let outcome = pow.search(&commitment, block.nonce)?;
        block.nonce = outcome.nonce;
        block.digest = outcome.digest.clone();
        Ok((block, outcome))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
