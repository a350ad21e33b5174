//! # Storage Module
//!
//! The ledger proper: blocks, how they are sealed, how they are chained,
//! and how the chain reaches disk.
//!
//! ## Architecture
//!
//! ```text
//! payload.rs: Typed block content with an opaque extension map
//! commitment.rs: Canonical JSON rendering and the block digest
//! seal.rs: Proof-of-work nonce search
//! block.rs: Sealed blocks and their persisted record form
//! ledger.rs: The chain: append, query, validate
//! persist.rs: Whole-file JSON save/load
//! ```
//!
//! ## Data Flow
//!
//! ```text
//! Payload → Block::create → UnsealedBlock → seal → Block → Ledger
//!                                                              ↓
//!                                                   persist (JSON file)
//! ```
//!
//! ## Design Decisions
//!
//! 1. **SHA-256 over canonical JSON.** The digest must reproduce ledgers
//!    sealed by earlier DocuChain deployments, so the rendering is fixed
//!    byte for byte (see [`commitment`]).
//!
//! 2. **JSON on disk.** One human-readable file, rewritten atomically on
//!    every save. Ledgers of this size do not need a database.
//!
//! 3. **Sealing is a type transition.** An [`UnsealedBlock`] cannot be
//!    appended; only [`UnsealedBlock::seal`] produces a [`Block`].

pub mod block;
pub mod commitment;
pub mod ledger;
pub mod payload;
pub mod persist;
pub mod seal;

pub use block::{Block, BlockRecord, UnsealedBlock};
pub use ledger::{AppendReceipt, ChainViolation, DocumentRecord, Ledger};
pub use payload::{DocumentMetadata, Payload, PayloadKind};
pub use seal::{ProofOfWork, SealOutcome};
