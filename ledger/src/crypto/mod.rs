//! # Cryptographic Primitives
//!
//! DocuChain needs exactly one primitive: SHA-256. Issuer identity is a
//! free-text label, not a key, so there is no signing here.
//!
//! Everything is a thin wrapper around the `sha2` crate.

pub mod hash;

pub use hash::{has_zero_prefix, hash_file, hash_reader, is_digest_hex, sha256, sha256_hex};
