//! # Node Configuration
//!
//! Resolves the on-disk layout from the global CLI options. Everything the
//! node touches lives under one data directory:
//!
//! ```text
//! <data-dir>/
//! ├── blockchain_data.json   the ledger
//! └── documents/             <sha256><ext> copies of issued documents
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use docuchain_ledger::config::{DEFAULT_DOCUMENTS_DIR, DEFAULT_LEDGER_FILE};
use docuchain_ledger::storage::Ledger;

use crate::cli::GlobalArgs;
use crate::documents::DocumentStore;

/// Resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub data_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub documents_dir: PathBuf,
    pub difficulty: usize,
}

impl NodeConfig {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self::new(&args.data_dir, args.difficulty)
    }

    pub fn new(data_dir: &Path, difficulty: usize) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            ledger_path: data_dir.join(DEFAULT_LEDGER_FILE),
            documents_dir: data_dir.join(DEFAULT_DOCUMENTS_DIR),
            difficulty,
        }
    }

    /// Load the ledger, or create a fresh one if none has been saved yet.
    pub fn open_ledger(&self) -> Result<Ledger> {
        Ledger::open(&self.ledger_path, self.difficulty)
            .with_context(|| format!("failed to open ledger at {}", self.ledger_path.display()))
    }

    pub fn document_store(&self) -> DocumentStore {
        DocumentStore::new(&self.documents_dir)
    }
}
