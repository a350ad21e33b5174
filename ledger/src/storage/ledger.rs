//! # The Ledger
//!
//! An ordered, append-only sequence of sealed blocks. Index 0 is always the
//! genesis marker; every later block anchors one payload, usually a
//! document.
//!
//! ## Invariants
//!
//! For every block at position `i`:
//!
//! 1. `digest == commit(index, timestamp, payload, previous_digest, nonce)`
//! 2. `previous_digest == chain[i - 1].digest` (for `i > 0`)
//! 3. `digest` starts with `difficulty` hex zeros
//! 4. `index == i`
//!
//! [`Ledger::validate`] checks 1 and 2 for every non-genesis block. That is
//! what detects tampering; proof-of-work, once paid, is not re-checked
//! because a loaded chain may have been sealed under a different difficulty.
//! [`Ledger::validate_strict`] checks all four when asked.
//!
//! ## Queries
//!
//! All lookups scan the chain linearly, skipping genesis. There is no
//! index: the ledger is meant for thousands of documents, not millions.
//!
//! ## Concurrency
//!
//! A `Ledger` is a plain value with no interior locking. Appends must be
//! serialized by the owner; reads may run in parallel with each other but
//! not with an append.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::clock::{Clock, SystemClock};
use crate::config::{DIFFICULTY_WARN_THRESHOLD, GENESIS_MESSAGE, GENESIS_PREVIOUS_DIGEST};
use crate::error::{LedgerError, LedgerResult};

use super::block::Block;
use super::payload::Payload;
use super::persist;
use super::seal::ProofOfWork;

// ---------------------------------------------------------------------------
// Result Types
// ---------------------------------------------------------------------------

/// Summary of a successful append.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppendReceipt {
    pub block_number: u64,
    pub block_hash: String,
    pub timestamp: String,
}

/// A query hit: the payload plus where and when it was anchored.
///
/// Serializes as one flat object: the payload's keys next to
/// `block_number` and `timestamp`. A payload key of the same name wins, so
/// every key appears exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentRecord {
    pub block_number: u64,
    pub timestamp: String,
    pub payload: Payload,
}

impl Serialize for DocumentRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut object = self.payload.to_map();
        object
            .entry("block_number")
            .or_insert_with(|| Value::from(self.block_number));
        object
            .entry("timestamp")
            .or_insert_with(|| Value::from(self.timestamp.clone()));
        object.serialize(serializer)
    }
}

impl DocumentRecord {
    fn from_block(block: &Block) -> Self {
        DocumentRecord {
            block_number: block.index(),
            timestamp: block.timestamp().to_string(),
            payload: block.payload().clone(),
        }
    }
}

/// One broken invariant found by [`Ledger::audit`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ChainViolation {
    /// Stored digest does not match the block content.
    #[error("block {index}: stored digest {stored} does not match content digest {computed}")]
    DigestMismatch {
        index: u64,
        stored: String,
        computed: String,
    },

    /// `previous_digest` does not point at the preceding block.
    #[error("block {index}: previous digest {found} does not match predecessor digest {expected}")]
    BrokenLink {
        index: u64,
        expected: String,
        found: String,
    },

    /// The block's index does not match its position.
    #[error("block at position {position} claims index {index}")]
    IndexOutOfSequence { position: u64, index: u64 },

    /// The genesis block does not carry the `"0"` previous digest.
    #[error("genesis block has previous digest {found}")]
    MalformedGenesis { found: String },
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// The document ledger.
pub struct Ledger {
    chain: Vec<Block>,
    pow: ProofOfWork,
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// A fresh ledger with a newly sealed genesis block.
    pub fn new(difficulty: usize) -> LedgerResult<Self> {
        Self::with_clock(difficulty, Arc::new(SystemClock))
    }

    /// A fresh ledger whose timestamps come from `clock`.
    pub fn with_clock(difficulty: usize, clock: Arc<dyn Clock>) -> LedgerResult<Self> {
        let mut ledger = Ledger {
            chain: Vec::new(),
            pow: Self::sealer(difficulty)?,
            clock,
        };
        ledger.create_genesis()?;
        Ok(ledger)
    }

    /// Adopt an already-sealed chain, e.g. one read from disk.
    ///
    /// Nothing is re-sealed and digests are not checked here; call
    /// [`validate`](Self::validate) for that. The chain must be non-empty
    /// and indexed in order.
    pub fn from_blocks(blocks: Vec<Block>, difficulty: usize) -> LedgerResult<Self> {
        Self::from_blocks_with_clock(blocks, difficulty, Arc::new(SystemClock))
    }

    pub fn from_blocks_with_clock(
        blocks: Vec<Block>,
        difficulty: usize,
        clock: Arc<dyn Clock>,
    ) -> LedgerResult<Self> {
        persist::check_sequence(&blocks)?;
        Ok(Ledger {
            chain: blocks,
            pow: Self::sealer(difficulty)?,
            clock,
        })
    }

    fn sealer(difficulty: usize) -> LedgerResult<ProofOfWork> {
        let pow = ProofOfWork::new(difficulty)?;
        if difficulty > DIFFICULTY_WARN_THRESHOLD {
            tracing::warn!(
                difficulty,
                "high sealing difficulty; each append may block for a long time"
            );
        }
        Ok(pow)
    }

    /// Seal and append the genesis block. Runs once, from construction.
    fn create_genesis(&mut self) -> LedgerResult<()> {
        let (genesis, outcome) = Block::create(
            0,
            self.clock.now_iso8601(),
            Payload::genesis(GENESIS_MESSAGE),
            GENESIS_PREVIOUS_DIGEST,
        )
        .seal(&self.pow)?;

        tracing::info!(
            hash = %genesis.digest(),
            attempts = outcome.attempts,
            difficulty = self.pow.difficulty(),
            "genesis block created"
        );
        self.chain.push(genesis);
        Ok(())
    }

    // -- Lifecycle -----------------------------------------------------------

    /// Load the ledger at `path`. `Ok(None)` if there is no file.
    pub fn load(path: impl AsRef<Path>, difficulty: usize) -> LedgerResult<Option<Self>> {
        match persist::load(path)? {
            Some(blocks) => Self::from_blocks(blocks, difficulty).map(Some),
            None => Ok(None),
        }
    }

    /// Load the ledger at `path`, or create a fresh one if there is none.
    ///
    /// A corrupt file is an error, never a silent fresh start.
    pub fn open(path: impl AsRef<Path>, difficulty: usize) -> LedgerResult<Self> {
        let path = path.as_ref();
        match Self::load(path, difficulty)? {
            Some(ledger) => {
                tracing::info!(
                    path = %path.display(),
                    blocks = ledger.len(),
                    "ledger loaded"
                );
                Ok(ledger)
            }
            None => {
                tracing::info!(path = %path.display(), "no ledger on disk, creating genesis");
                Self::new(difficulty)
            }
        }
    }

    /// Persist the whole chain to `path`.
    pub fn save(&self, path: impl AsRef<Path>) -> LedgerResult<()> {
        persist::save(&self.chain, path)
    }

    // -- Mutation ------------------------------------------------------------

    /// Seal `payload` into a new block at the tip.
    ///
    /// Blocks for `16^difficulty` hash attempts on average. Fails only if
    /// sealing faults, in which case the chain is untouched.
    pub fn append_document(&mut self, payload: impl Into<Payload>) -> LedgerResult<AppendReceipt> {
        let tip = self
            .chain
            .last()
            .ok_or_else(|| LedgerError::corrupt("ledger has no genesis block"))?;
        let index = tip.index() + 1;

        let (block, outcome) =
            Block::create(index, self.clock.now_iso8601(), payload.into(), tip.digest())
                .seal(&self.pow)?;

        let receipt = AppendReceipt {
            block_number: block.index(),
            block_hash: block.digest().to_string(),
            timestamp: block.timestamp().to_string(),
        };
        tracing::info!(
            block_number = receipt.block_number,
            hash = %receipt.block_hash,
            attempts = outcome.attempts,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "block appended"
        );

        self.chain.push(block);
        Ok(receipt)
    }

    /// Append `payload` and persist the chain to `path` as one step.
    ///
    /// If the save fails the new block is dropped again, so the in-memory
    /// chain never holds a block the file does not.
    pub fn append_document_and_save(
        &mut self,
        payload: impl Into<Payload>,
        path: impl AsRef<Path>,
    ) -> LedgerResult<AppendReceipt> {
        let receipt = self.append_document(payload)?;
        if let Err(e) = self.save(path.as_ref()) {
            self.chain.pop();
            tracing::error!(
                block_number = receipt.block_number,
                path = %path.as_ref().display(),
                error = %e,
                "ledger save failed, appended block rolled back"
            );
            return Err(e);
        }
        Ok(receipt)
    }

    // -- Queries -------------------------------------------------------------

    /// Non-genesis blocks, oldest first.
    fn entries(&self) -> impl Iterator<Item = &Block> {
        self.chain.iter().skip(1)
    }

    /// The first block anchoring `document_hash`.
    pub fn find_by_document_hash(&self, document_hash: &str) -> Option<DocumentRecord> {
        self.entries()
            .find(|b| b.payload().document_hash() == Some(document_hash))
            .map(DocumentRecord::from_block)
    }

    /// Every block addressed to `recipient_id`, oldest first.
    pub fn find_by_recipient(&self, recipient_id: &str) -> Vec<DocumentRecord> {
        self.entries()
            .filter(|b| b.payload().recipient_id() == Some(recipient_id))
            .map(DocumentRecord::from_block)
            .collect()
    }

    /// Every document block, oldest first.
    pub fn list_documents(&self) -> Vec<DocumentRecord> {
        self.entries()
            .filter(|b| b.payload().is_document())
            .map(DocumentRecord::from_block)
            .collect()
    }

    // -- Validation ----------------------------------------------------------

    /// Whether every non-genesis block has a correct digest and links to its
    /// predecessor. Stops at the first violation. Never mutates.
    pub fn validate(&self) -> bool {
        for pair in self.chain.windows(2) {
            let (previous, current) = (&pair[0], &pair[1]);
            if !current.has_consistent_digest() {
                tracing::warn!(index = current.index(), "block digest mismatch");
                return false;
            }
            if current.previous_digest() != previous.digest() {
                tracing::warn!(index = current.index(), "block link broken");
                return false;
            }
        }
        true
    }

    /// Every invariant violation in the chain, genesis included, without
    /// stopping at the first. Proof-of-work is not checked.
    pub fn audit(&self) -> Vec<ChainViolation> {
        let mut violations = Vec::new();

        for (position, block) in self.chain.iter().enumerate() {
            let position = position as u64;
            if block.index() != position {
                violations.push(ChainViolation::IndexOutOfSequence {
                    position,
                    index: block.index(),
                });
            }

            let computed = block.recompute_digest();
            if computed != block.digest() {
                violations.push(ChainViolation::DigestMismatch {
                    index: block.index(),
                    stored: block.digest().to_string(),
                    computed,
                });
            }

            if position == 0 {
                if block.previous_digest() != GENESIS_PREVIOUS_DIGEST {
                    violations.push(ChainViolation::MalformedGenesis {
                        found: block.previous_digest().to_string(),
                    });
                }
            } else {
                let expected = self.chain[position as usize - 1].digest();
                if block.previous_digest() != expected {
                    violations.push(ChainViolation::BrokenLink {
                        index: block.index(),
                        expected: expected.to_string(),
                        found: block.previous_digest().to_string(),
                    });
                }
            }
        }

        violations
    }

    /// [`audit`](Self::audit) finds nothing and every block, genesis
    /// included, carries at least `difficulty` leading hex zeros.
    pub fn validate_strict(&self, difficulty: usize) -> bool {
        self.audit().is_empty() && self.chain.iter().all(|b| b.meets_difficulty(difficulty))
    }

    // -- Accessors -----------------------------------------------------------

    pub fn blocks(&self) -> &[Block] {
        &self.chain
    }

    pub fn latest_block(&self) -> Option<&Block> {
        self.chain.last()
    }

    /// Number of blocks, genesis included.
    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false for a constructed ledger; genesis is never removed.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Difficulty used for blocks sealed by this instance.
    pub fn difficulty(&self) -> usize {
        self.pow.difficulty()
    }
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ledger")
            .field("blocks", &self.chain.len())
            .field("difficulty", &self.pow.difficulty())
            .field("tip", &self.chain.last().map(Block::digest))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
