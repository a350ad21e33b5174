//! # Ledger Persistence
//!
//! The whole ledger lives in one JSON file: an array of block records,
//! genesis first.
//!
//! ```text
//! [
//!   { "index": 0, "timestamp": "...", "data": {...}, "previous_hash": "0",
//!     "nonce": 87, "hash": "005a..." },
//!   { "index": 1, ... }
//! ]
//! ```
//!
//! ## Outcomes
//!
//! | On disk                              | `load` returns              |
//! |--------------------------------------|-----------------------------|
//! | no file                              | `Ok(None)` (start fresh)    |
//! | well-formed records, indices 0..n    | `Ok(Some(blocks))`          |
//! | bad JSON, missing fields, bad hex    | `Err(Json / Corrupt)`       |
//! | empty array, index gap or reorder    | `Err(Corrupt)`              |
//!
//! A corrupt file is never partially loaded.
//!
//! ## Atomicity
//!
//! `save` writes a sibling temp file, syncs it, and renames it over the
//! target. A crash mid-save leaves either the old ledger or the new one,
//! never a truncated file. Saves are whole-file and exclusive: callers must
//! not run two at once against the same path.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::{LedgerError, LedgerResult};

use super::block::{Block, BlockRecord};

/// Write `blocks` to `path`, replacing any existing ledger file.
pub fn save(blocks: &[Block], path: impl AsRef<Path>) -> LedgerResult<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let records: Vec<BlockRecord> = blocks.iter().map(Block::to_record).collect();
    let json = serde_json::to_vec_pretty(&records)?;

    let tmp = temp_path(path);
    {
        let mut file = File::create(&tmp)?;
        file.write_all(&json)?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;

    tracing::debug!(path = %path.display(), blocks = blocks.len(), "ledger saved");
    Ok(())
}

/// Read a ledger file. `Ok(None)` means there is no file yet.
pub fn load(path: impl AsRef<Path>) -> LedgerResult<Option<Vec<Block>>> {
    let path = path.as_ref();
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "no ledger file, starting fresh");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let records: Vec<BlockRecord> = serde_json::from_slice(&bytes)?;
    let blocks = records
        .into_iter()
        .map(Block::from_record)
        .collect::<LedgerResult<Vec<_>>>()?;
    check_sequence(&blocks)?;

    tracing::debug!(path = %path.display(), blocks = blocks.len(), "ledger loaded");
    Ok(Some(blocks))
}

/// A chain must be non-empty and indexed `0, 1, 2, ...` in order.
pub(crate) fn check_sequence(blocks: &[Block]) -> LedgerResult<()> {
    if blocks.is_empty() {
        return Err(LedgerError::corrupt("ledger contains no blocks"));
    }
    for (position, block) in blocks.iter().enumerate() {
        if block.index() != position as u64 {
            return Err(LedgerError::corrupt(format!(
                "block at position {position} has index {}",
                block.index()
            )));
        }
    }
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::payload::Payload;
    use crate::storage::seal::ProofOfWork;

    const TS: &str = "2026-01-01T00:00:00.000000Z";

    fn chain_of(n: u64) -> Vec<Block> {
        let pow = ProofOfWork::new(1).unwrap();
        let mut blocks = Vec::new();
        let (genesis, _) = Block::create(0, TS, Payload::genesis("g"), "0")
            .seal(&pow)
            .unwrap();
        blocks.push(genesis);
        for i in 1..=n {
            let prev = blocks.last().unwrap().digest().to_string();
            let (block, _) = Block::create(i, TS, Payload::document(format!("doc-{i}")), prev)
                .seal(&pow)
                .unwrap();
            blocks.push(block);
        }
        blocks
    }

    #[test]
    fn missing_file_is_no_prior_state() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load(dir.path().join("absent.json")).unwrap().is_none());
    }

    #[test]
    fn save_then_load_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let blocks = chain_of(3);

        save(&blocks, &path).unwrap();
        let loaded = load(&path).unwrap().unwrap();
        assert_eq!(loaded, blocks);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("ledger.json");
        save(&chain_of(0), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn garbage_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, b"{ not json").unwrap();
        assert!(load(&path).unwrap_err().is_corruption());
    }

    #[test]
    fn missing_field_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(
            &path,
            br#"[{"index": 0, "timestamp": "t", "data": {}, "previous_hash": "0", "nonce": 0}]"#,
        )
        .unwrap();
        assert!(load(&path).unwrap_err().is_corruption());
    }

    #[test]
    fn empty_array_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        fs::write(&path, b"[]").unwrap();
        assert!(load(&path).unwrap_err().is_corruption());
    }

    #[test]
    fn reordered_blocks_are_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut blocks = chain_of(2);
        blocks.swap(1, 2);
        save(&blocks, &path).unwrap();

        let err = load(&path).unwrap_err();
        assert!(matches!(err, LedgerError::Corrupt { .. }), "got {err}");
    }

    #[test]
    fn dropped_block_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.json");
        let mut blocks = chain_of(3);
        blocks.remove(2);
        save(&blocks, &path).unwrap();
        assert!(load(&path).is_err());
    }
}
