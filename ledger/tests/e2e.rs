//! End-to-end integration tests for the DocuChain ledger.
//!
//! These tests drive the public API the way the node does: create or open a
//! ledger, anchor documents, query them back, persist, reload, and check that
//! tampering with the file on disk is caught. Each test gets its own
//! temporary directory and a pinned clock.

use std::sync::Arc;

use serde_json::{json, Value};

use docuchain_ledger::clock::FixedClock;
use docuchain_ledger::crypto::{hash_file, sha256_hex};
use docuchain_ledger::storage::{ChainViolation, DocumentMetadata, Ledger, Payload};

// ---------------------------------------------------------------------------
// Test Helpers
// ---------------------------------------------------------------------------

const TS: &str = "2026-01-01T00:00:00.000000Z";

fn fresh(difficulty: usize) -> Ledger {
    Ledger::with_clock(difficulty, Arc::new(FixedClock::new(TS))).expect("fresh ledger")
}

fn diploma(hash: &str, recipient: &str) -> Payload {
    Payload::document(hash)
        .recipient(recipient)
        .with_field("issuer", "Acme")
        .with_field("title", "Diploma")
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

// ---------------------------------------------------------------------------
// 1. Genesis-Only Ledger
// ---------------------------------------------------------------------------

#[test]
fn genesis_only_ledger() {
    let ledger = fresh(2);

    assert!(ledger.validate());
    assert!(ledger.list_documents().is_empty());
    assert!(ledger.find_by_document_hash("abc").is_none());
    assert!(ledger.blocks()[0].digest().starts_with("00"));
}

// ---------------------------------------------------------------------------
// 2. Issue and Look Up One Document
// ---------------------------------------------------------------------------

#[test]
fn single_document_lookup() {
    let mut ledger = fresh(2);
    let hash = "deadbeef".repeat(8);

    let receipt = ledger
        .append_document(diploma(&hash, "alice@example.com"))
        .unwrap();
    assert_eq!(receipt.block_number, 1);

    let record = ledger.find_by_document_hash(&hash).expect("anchored");
    assert_eq!(record.block_number, 1);
    assert_eq!(record.timestamp, TS);
    assert_eq!(
        serde_json::to_value(&record.payload).unwrap(),
        json!({
            "type": "document",
            "document_hash": hash,
            "recipient_id": "alice@example.com",
            "issuer": "Acme",
            "title": "Diploma",
        })
    );

    let for_alice = ledger.find_by_recipient("alice@example.com");
    assert_eq!(for_alice, vec![record]);
}

// ---------------------------------------------------------------------------
// 3. Persist and Reload
// ---------------------------------------------------------------------------

#[test]
fn reload_preserves_document_listing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("blockchain_data.json");

    let mut ledger = fresh(2);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    ledger.append_document(diploma("h2", "bob")).unwrap();
    let before = ledger.list_documents();
    ledger.save(&path).unwrap();

    let reloaded = Ledger::open(&path, 2).unwrap();
    assert_eq!(reloaded.list_documents(), before);
}

#[test]
fn round_trip_is_field_for_field() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = fresh(1);
    for i in 0..5 {
        ledger
            .append_document(diploma(&format!("doc-{i}"), "carol"))
            .unwrap();
    }
    ledger.save(&path).unwrap();

    // Loading under a different difficulty must not re-seal anything.
    let reloaded = Ledger::load(&path, 3).unwrap().expect("file exists");
    assert_eq!(reloaded.blocks(), ledger.blocks());
    assert!(reloaded.validate());
    assert_eq!(reloaded.difficulty(), 3);
}

#[test]
fn open_without_file_creates_genesis() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("none-yet.json");

    let ledger = Ledger::open(&path, 1).unwrap();
    assert_eq!(ledger.len(), 1);
    assert!(!path.exists(), "open does not save by itself");
}

#[test]
fn appends_after_reload_extend_the_chain() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = fresh(1);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    ledger.save(&path).unwrap();

    let mut reloaded = Ledger::open(&path, 1).unwrap();
    let receipt = reloaded.append_document(diploma("h2", "bob")).unwrap();
    assert_eq!(receipt.block_number, 2);
    assert_eq!(
        reloaded.blocks()[2].previous_digest(),
        ledger.blocks()[1].digest()
    );
    assert!(reloaded.validate());
}

// ---------------------------------------------------------------------------
// 4. Tampering on Disk
// ---------------------------------------------------------------------------

#[test]
fn edited_payload_on_disk_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = fresh(1);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    ledger.append_document(diploma("h2", "bob")).unwrap();
    ledger.save(&path).unwrap();

    let mut raw = read_json(&path);
    raw[1]["data"]["recipient_id"] = json!("mallory");
    std::fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let reloaded = Ledger::open(&path, 1).unwrap();
    assert!(!reloaded.validate());
    let violations = reloaded.audit();
    assert_eq!(violations.len(), 1);
    assert!(matches!(
        violations[0],
        ChainViolation::DigestMismatch { index: 1, .. }
    ));
}

#[test]
fn edited_link_on_disk_is_detected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = fresh(1);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    ledger.save(&path).unwrap();

    let mut raw = read_json(&path);
    raw[1]["previous_hash"] = json!("f".repeat(64));
    std::fs::write(&path, serde_json::to_vec(&raw).unwrap()).unwrap();

    let reloaded = Ledger::open(&path, 1).unwrap();
    assert!(!reloaded.validate());
    assert!(reloaded
        .audit()
        .iter()
        .any(|v| matches!(v, ChainViolation::BrokenLink { index: 1, .. })));
}

#[test]
fn externally_written_big_integer_validates() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let genesis_hash = "005a14266615506593fc0257f64c5aa2c5181c6e2b14f446f714a183441ea736";
    let sealed = format!(
        r#"{{"data": {{"big": 123456789012345678901234, "document_hash": "h", "type": "document"}}, "index": 1, "nonce": 0, "previous_hash": "{genesis_hash}", "timestamp": "{TS}"}}"#
    );
    let block_hash = sha256_hex(sealed.as_bytes());
    let file = format!(
        r#"[
  {{"index": 0, "timestamp": "{TS}", "data": {{"type": "genesis", "message": "Genesis Block - DocuChain System"}}, "previous_hash": "0", "nonce": 87, "hash": "{genesis_hash}"}},
  {{"index": 1, "timestamp": "{TS}", "data": {{"type": "document", "document_hash": "h", "big": 123456789012345678901234}}, "previous_hash": "{genesis_hash}", "nonce": 0, "hash": "{block_hash}"}}
]"#
    );
    std::fs::write(&path, file).unwrap();

    let ledger = Ledger::load(&path, 0).unwrap().unwrap();
    assert!(ledger.validate());
    assert!(ledger.audit().is_empty());

    ledger.save(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("123456789012345678901234"));
    assert!(Ledger::load(&path, 0).unwrap().unwrap().validate());
}

#[test]
fn truncated_file_is_an_error_not_a_fresh_start() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let mut ledger = fresh(1);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    ledger.save(&path).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let err = Ledger::open(&path, 1).unwrap_err();
    assert!(err.is_corruption(), "got {err}");
}

// ---------------------------------------------------------------------------
// 5. Validation Semantics
// ---------------------------------------------------------------------------

#[test]
fn validate_is_idempotent_and_pure() {
    let mut ledger = fresh(1);
    ledger.append_document(diploma("h1", "alice")).unwrap();
    let snapshot = ledger.blocks().to_vec();

    let results: Vec<bool> = (0..4).map(|_| ledger.validate()).collect();
    assert_eq!(results, vec![true; 4]);
    assert!(ledger.audit().is_empty());
    assert_eq!(ledger.blocks(), snapshot.as_slice());
}

#[test]
fn strict_validation_checks_work_on_every_block() {
    let mut ledger = fresh(2);
    ledger.append_document(diploma("h1", "alice")).unwrap();

    assert!(ledger.validate_strict(2));
    assert!(ledger.validate_strict(0));
    // Nobody sealed these to 16 zeros.
    assert!(!ledger.validate_strict(16));
}

// ---------------------------------------------------------------------------
// 6. Issuance Flow
// ---------------------------------------------------------------------------

#[test]
fn file_hash_anchors_and_verifies() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("diploma.pdf");
    std::fs::write(&file, b"%PDF-1.7 pretend diploma").unwrap();

    let document_hash = hash_file(&file).unwrap();
    assert_eq!(document_hash, sha256_hex(b"%PDF-1.7 pretend diploma"));

    let mut ledger = fresh(1);
    ledger
        .append_document(DocumentMetadata {
            document_hash: document_hash.clone(),
            issuer: "Acme University".into(),
            doc_type: "diploma".into(),
            title: "BSc".into(),
            recipient_name: "Alice".into(),
            recipient_id: "alice@example.com".into(),
            filename: "diploma.pdf".into(),
        })
        .unwrap();

    // Same bytes verify, one flipped byte does not.
    assert!(ledger.find_by_document_hash(&document_hash).is_some());
    let forged = sha256_hex(b"%PDF-1.7 pretend diplomA");
    assert!(ledger.find_by_document_hash(&forged).is_none());
}
