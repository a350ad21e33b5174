//! # Protocol Configuration & Constants
//!
//! Every magic number in DocuChain lives here. Changing the genesis message
//! or the commitment layout after a ledger has been issued against means
//! every existing ledger file stops validating, so treat this file as
//! append-only too.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The ledger format version, reported by the node.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Sealing
// ---------------------------------------------------------------------------

/// Difficulty used when none is configured. Two leading zero hex digits is
/// ~256 attempts on average: enough to cost something, cheap enough to
/// issue documents interactively.
pub const DEFAULT_DIFFICULTY: usize = 2;

/// Upper bound on the difficulty a ledger accepts.
///
/// A SHA-256 hex digest has 64 characters; anything above that can never
/// be satisfied.
pub const MAX_DIFFICULTY: usize = 64;

/// Difficulties above this get a warning at ledger construction. Expected
/// attempts grow 16x per step, and sealing cannot be interrupted.
pub const DIFFICULTY_WARN_THRESHOLD: usize = 5;

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Payload discriminator of the genesis block.
pub const GENESIS_TYPE: &str = "genesis";

/// Fixed message carried by every genesis block.
pub const GENESIS_MESSAGE: &str = "Genesis Block - DocuChain System";

/// `previous_hash` sentinel of the genesis block.
pub const GENESIS_PREVIOUS_DIGEST: &str = "0";

/// Payload discriminator of document blocks.
pub const DOCUMENT_TYPE: &str = "document";

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// Length of a hex-encoded SHA-256 digest.
pub const DIGEST_HEX_LENGTH: usize = 64;

/// Read buffer size for streaming file hashes.
pub const HASH_CHUNK_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// Default ledger file name inside the data directory.
pub const DEFAULT_LEDGER_FILE: &str = "blockchain_data.json";

/// Default directory (inside the data directory) for stored documents.
pub const DEFAULT_DOCUMENTS_DIR: &str = "documents";

/// File extensions accepted for issuance, lowercase, with the leading dot.
pub const ALLOWED_EXTENSIONS: &[&str] = &[".pdf", ".jpg", ".jpeg", ".png"];

/// Maximum document size accepted for issuance: 10 MiB.
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;
