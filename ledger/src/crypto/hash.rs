//! # Hashing Utilities
//!
//! SHA-256 is the only hash function in DocuChain. It hashes documents (the
//! `document_hash` an issuer anchors) and block commitments alike, and it is
//! what the existing ledger files were written with, so there is no room to
//! swap it for something faster without invalidating every issued proof.
//!
//! Digests travel as 64-character lowercase hex strings: that is what goes
//! into payloads, the persisted ledger, and API responses.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::config::{DIGEST_HEX_LENGTH, HASH_CHUNK_SIZE};

/// Compute the SHA-256 hash of the input data as a fixed-size array.
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute the SHA-256 hash of the input data as lowercase hex.
///
/// # Example
///
/// ```
/// use docuchain_ledger::crypto::sha256_hex;
///
/// let digest = sha256_hex(b"hello world");
/// assert_eq!(
///     digest,
///     "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
/// );
/// ```
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Stream a reader through SHA-256 in fixed-size chunks and return the hex
/// digest. At most one chunk is held in memory.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    let mut buf = [0u8; HASH_CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Compute the SHA-256 hex digest of a file's contents.
pub fn hash_file(path: impl AsRef<Path>) -> io::Result<String> {
    let file = File::open(path.as_ref())?;
    hash_reader(file)
}

/// Whether `digest` starts with `difficulty` ASCII `'0'` characters.
///
/// A digest shorter than the difficulty never qualifies.
pub fn has_zero_prefix(digest: &str, difficulty: usize) -> bool {
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|b| b == b'0')
}

/// Whether `s` is a well-formed SHA-256 hex digest: exactly 64 lowercase
/// hex characters.
pub fn is_digest_hex(s: &str) -> bool {
    s.len() == DIGEST_HEX_LENGTH && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
