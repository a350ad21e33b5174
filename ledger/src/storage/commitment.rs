//! # Hash Commitment
//!
//! The digest of a block is SHA-256 over a canonical JSON rendering of
//! `(index, timestamp, payload, previous_hash, nonce)`.
//!
//! ## Canonical Form
//!
//! ```text
//! {"data": {<payload, keys sorted>}, "index": 3, "nonce": 418,
//!  "previous_hash": "00a1...", "timestamp": "2026-10-16T09:41:07.123456Z"}
//! ```
//!
//! - Keys are sorted at every level. `serde_json::Map` is a `BTreeMap`
//!   unless `preserve_order` is enabled, which this workspace never does.
//! - Separators are `", "` and `": "`, with no other whitespace.
//! - Characters outside printable ASCII (DEL and everything above it) are
//!   written as `\uXXXX` escapes, using surrogate pairs above the BMP.
//!
//! This is byte-for-byte what `json.dumps(obj, sort_keys=True)` produces,
//! which is the format existing DocuChain ledgers were sealed under.
//!
//! Numbers read from JSON keep their source text (serde_json's
//! `arbitrary_precision`), so integers beyond 64 bits and floats in a loaded
//! ledger render exactly as they were sealed. Floats constructed in memory
//! are the one gap: shortest-roundtrip rendering differs from Python's for
//! exponents (`1e20` vs `1e+20`), so new payloads should carry numbers as
//! integers or strings.
//!
//! ## Sealing fast path
//!
//! Only the nonce changes while sealing, and it sits in the middle of the
//! rendering. [`Commitment`] renders everything around it once and keeps a
//! SHA-256 state primed with the prefix, so each attempt hashes a few dozen
//! bytes instead of re-serializing the payload.

use std::io::{self, Write};

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};
use sha2::{Digest, Sha256};

use super::payload::Payload;

/// `serde_json` formatter producing the canonical separators and escapes.
struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + Write,
    {
        // serde_json already escaped quotes, backslashes and C0 controls.
        let mut start = 0;
        for (i, ch) in fragment.char_indices() {
            if (ch as u32) < 0x7f {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + ch.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Render any serializable value in canonical form.
pub fn to_canonical_json<T: Serialize + ?Sized>(value: &T) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    let mut ser = Serializer::with_formatter(&mut buf, CanonicalFormatter);
    // Writing JSON values with string keys into a Vec has no failure path.
    value
        .serialize(&mut ser)
        .expect("canonical JSON serialization into memory is infallible");
    buf
}

/// The canonical rendering split around the nonce.
fn render_parts(
    index: u64,
    timestamp: &str,
    payload: &Payload,
    previous_digest: &str,
) -> (Vec<u8>, Vec<u8>) {
    let mut prefix = Vec::with_capacity(256);
    prefix.extend_from_slice(b"{\"data\": ");
    prefix.extend_from_slice(&to_canonical_json(&payload.to_map()));
    prefix.extend_from_slice(b", \"index\": ");
    prefix.extend_from_slice(index.to_string().as_bytes());
    prefix.extend_from_slice(b", \"nonce\": ");

    let mut suffix = Vec::with_capacity(128);
    suffix.extend_from_slice(b", \"previous_hash\": ");
    suffix.extend_from_slice(&to_canonical_json(previous_digest));
    suffix.extend_from_slice(b", \"timestamp\": ");
    suffix.extend_from_slice(&to_canonical_json(timestamp));
    suffix.push(b'}');

    (prefix, suffix)
}

/// The exact bytes that are hashed for a block.
pub fn canonical_bytes(
    index: u64,
    timestamp: &str,
    payload: &Payload,
    previous_digest: &str,
    nonce: u64,
) -> Vec<u8> {
    let (mut bytes, suffix) = render_parts(index, timestamp, payload, previous_digest);
    bytes.extend_from_slice(nonce.to_string().as_bytes());
    bytes.extend_from_slice(&suffix);
    bytes
}

/// Compute a block digest: SHA-256 of the canonical rendering, lowercase hex.
pub fn commit(
    index: u64,
    timestamp: &str,
    payload: &Payload,
    previous_digest: &str,
    nonce: u64,
) -> String {
    Commitment::new(index, timestamp, payload, previous_digest).digest(nonce)
}

/// A commitment over fixed block content, evaluated for varying nonces.
#[derive(Clone)]
pub struct Commitment {
    primed: Sha256,
    suffix: Vec<u8>,
}

impl Commitment {
    pub fn new(index: u64, timestamp: &str, payload: &Payload, previous_digest: &str) -> Self {
        let (prefix, suffix) = render_parts(index, timestamp, payload, previous_digest);
        let mut primed = Sha256::new();
        primed.update(&prefix);
        Self { primed, suffix }
    }

    /// Digest of the block content with `nonce`.
    pub fn digest(&self, nonce: u64) -> String {
        let mut hasher = self.primed.clone();
        hasher.update(nonce.to_string().as_bytes());
        hasher.update(&self.suffix);
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Commitment")
            .field("suffix_len", &self.suffix.len())
            .finish_non_exhaustive()
    }
}
