// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # DocuChain Ledger Core
//!
//! An append-only, hash-linked ledger that anchors document authenticity
//! proofs. Each block binds a document's content hash and metadata to a
//! commitment over the previous ledger state, so rewriting history after the
//! fact is detectable by anyone holding the ledger file.
//!
//! ## Architecture
//!
//! - **crypto**: SHA-256 helpers: byte/stream/file hashing, prefix checks.
//! - **storage**: The ledger proper: canonical commitment, proof-of-work
//!   sealing, blocks, payloads, the chain, and JSON persistence.
//! - **clock**: Timestamp source. Injected, so tests can pin time.
//! - **config**: Protocol constants. Every magic number lives here.
//! - **error**: The [`LedgerError`] taxonomy.
//!
//! ## Quick Tour
//!
//! ```
//! use docuchain_ledger::storage::{Ledger, Payload};
//!
//! let mut ledger = Ledger::new(1).unwrap();
//! let receipt = ledger
//!     .append_document(
//!         Payload::document("deadbeef")
//!             .recipient("alice@example.com")
//!             .with_field("issuer", "Acme"),
//!     )
//!     .unwrap();
//!
//! assert_eq!(receipt.block_number, 1);
//! assert!(ledger.validate());
//! assert!(ledger.find_by_document_hash("deadbeef").is_some());
//! ```
//!
//! ## Concurrency
//!
//! Nothing in this crate takes a lock. A [`storage::Ledger`] is a plain value;
//! callers that share one across threads must serialize writers themselves.
//! Sealing is CPU-bound and blocking, so async callers should run
//! `append_document` on a blocking worker.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
