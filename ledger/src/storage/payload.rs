//! # Block Payloads
//!
//! A payload is the structured content a block carries. The ledger itself
//! only ever inspects three keys:
//!
//! - `type`: the discriminator (`"genesis"`, `"document"`, or anything else)
//! - `document_hash`: looked up by [`Ledger::find_by_document_hash`]
//! - `recipient_id`: looked up by [`Ledger::find_by_recipient`]
//!
//! Those are typed fields on [`Payload`]. Everything else (issuer, title,
//! file name, whatever an issuer wants to record) lives in an opaque
//! extension map.
//!
//! ## Lossless conversion
//!
//! Payload digests are computed over the JSON object, so conversion to and
//! from JSON must be exact. A reserved key is lifted into its typed slot only
//! when its value is a JSON string; a `"recipient_id": 42` stays in the
//! extension map verbatim. Converting back always reproduces the original
//! object, key for key.
//!
//! [`Ledger::find_by_document_hash`]: super::Ledger::find_by_document_hash
//! [`Ledger::find_by_recipient`]: super::Ledger::find_by_recipient

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{DOCUMENT_TYPE, GENESIS_TYPE};

/// Payload key holding the discriminator.
pub const TYPE_KEY: &str = "type";
/// Payload key holding the anchored document's content hash.
pub const DOCUMENT_HASH_KEY: &str = "document_hash";
/// Payload key holding the recipient identifier.
pub const RECIPIENT_ID_KEY: &str = "recipient_id";

// ---------------------------------------------------------------------------
// PayloadKind
// ---------------------------------------------------------------------------

/// The `type` discriminator of a payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// The index-0 marker block.
    Genesis,
    /// An issued document.
    Document,
    /// Any other discriminator. Carried, never interpreted.
    Other(String),
}

impl PayloadKind {
    pub fn as_str(&self) -> &str {
        match self {
            PayloadKind::Genesis => GENESIS_TYPE,
            PayloadKind::Document => DOCUMENT_TYPE,
            PayloadKind::Other(s) => s,
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            GENESIS_TYPE => PayloadKind::Genesis,
            DOCUMENT_TYPE => PayloadKind::Document,
            other => PayloadKind::Other(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Payload
// ---------------------------------------------------------------------------

/// Structured block content with typed reserved fields.
///
/// Serializes as a flat JSON object (the `data` field of a persisted block).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Payload {
    kind: Option<PayloadKind>,
    document_hash: Option<String>,
    recipient_id: Option<String>,
    /// Extension metadata. Never contains a reserved key whose value was
    /// lifted into a typed slot.
    fields: Map<String, Value>,
}

impl Payload {
    /// The genesis marker payload: `{type: "genesis", message}`.
    pub fn genesis(message: impl Into<String>) -> Self {
        Payload {
            kind: Some(PayloadKind::Genesis),
            ..Default::default()
        }
        .with_field("message", message.into())
    }

    /// A document payload anchoring `document_hash`.
    pub fn document(document_hash: impl Into<String>) -> Self {
        Payload {
            kind: Some(PayloadKind::Document),
            document_hash: Some(document_hash.into()),
            ..Default::default()
        }
    }

    /// Set the recipient identifier.
    pub fn recipient(mut self, recipient_id: impl Into<String>) -> Self {
        self.recipient_id = Some(recipient_id.into());
        self
    }

    /// Set an arbitrary key. Reserved keys land in their typed slot when
    /// the value is a string.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key.into(), value.into());
        self
    }

    fn set(&mut self, key: String, value: Value) {
        let slot = match key.as_str() {
            TYPE_KEY => {
                if let Value::String(s) = &value {
                    self.kind = Some(PayloadKind::parse(s));
                    self.fields.remove(TYPE_KEY);
                    return;
                }
                self.kind = None;
                None
            }
            DOCUMENT_HASH_KEY => Some(&mut self.document_hash),
            RECIPIENT_ID_KEY => Some(&mut self.recipient_id),
            _ => None,
        };

        match (slot, value) {
            (Some(slot), Value::String(s)) => {
                *slot = Some(s);
                self.fields.remove(&key);
            }
            (Some(slot), value) => {
                *slot = None;
                self.fields.insert(key, value);
            }
            (None, value) => {
                self.fields.insert(key, value);
            }
        }
    }

    pub fn kind(&self) -> Option<&PayloadKind> {
        self.kind.as_ref()
    }

    pub fn is_document(&self) -> bool {
        self.kind == Some(PayloadKind::Document)
    }

    pub fn is_genesis(&self) -> bool {
        self.kind == Some(PayloadKind::Genesis)
    }

    pub fn document_hash(&self) -> Option<&str> {
        self.document_hash.as_deref()
    }

    pub fn recipient_id(&self) -> Option<&str> {
        self.recipient_id.as_deref()
    }

    /// Look up an extension field. Reserved keys with string values are
    /// reached through their typed accessors instead.
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// The payload as a JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        self.clone().into()
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        let mut payload = Payload::default();
        for (key, value) in map {
            payload.set(key, value);
        }
        payload
    }
}

impl From<Payload> for Map<String, Value> {
    fn from(payload: Payload) -> Self {
        let mut map = payload.fields;
        if let Some(kind) = payload.kind {
            map.insert(TYPE_KEY.to_string(), Value::String(kind.as_str().to_string()));
        }
        if let Some(hash) = payload.document_hash {
            map.insert(DOCUMENT_HASH_KEY.to_string(), Value::String(hash));
        }
        if let Some(recipient) = payload.recipient_id {
            map.insert(RECIPIENT_ID_KEY.to_string(), Value::String(recipient));
        }
        map
    }
}

// ---------------------------------------------------------------------------
// DocumentMetadata
// ---------------------------------------------------------------------------

/// The metadata the issuance flow records for every document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// SHA-256 hex of the document's bytes.
    pub document_hash: String,
    /// Issuing organisation. Free text, not a verified identity.
    pub issuer: String,
    /// Kind of document, e.g. "diploma" or "certificate".
    pub doc_type: String,
    pub title: String,
    pub recipient_name: String,
    /// Recipient identifier, typically an email address.
    pub recipient_id: String,
    /// Original file name as uploaded.
    pub filename: String,
}

impl DocumentMetadata {
    pub fn into_payload(self) -> Payload {
        Payload::document(self.document_hash)
            .recipient(self.recipient_id)
            .with_field("issuer", self.issuer)
            .with_field("doc_type", self.doc_type)
            .with_field("title", self.title)
            .with_field("recipient_name", self.recipient_name)
            .with_field("filename", self.filename)
    }
}

impl From<DocumentMetadata> for Payload {
    fn from(meta: DocumentMetadata) -> Self {
        meta.into_payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn genesis_payload_shape() {
        let payload = Payload::genesis("hello");
        assert!(payload.is_genesis());
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({"type": "genesis", "message": "hello"})
        );
    }

    #[test]
    fn document_builder_fills_reserved_fields() {
        let payload = Payload::document("abc")
            .recipient("alice@example.com")
            .with_field("issuer", "Acme");

        assert!(payload.is_document());
        assert_eq!(payload.document_hash(), Some("abc"));
        assert_eq!(payload.recipient_id(), Some("alice@example.com"));
        assert_eq!(payload.field("issuer"), Some(&json!("Acme")));
        assert_eq!(payload.field(DOCUMENT_HASH_KEY), None);
    }

    #[test]
    fn reserved_keys_are_lifted_from_json() {
        let payload: Payload = serde_json::from_value(json!({
            "type": "document",
            "document_hash": "abc",
            "recipient_id": "bob",
            "title": "Diploma"
        }))
        .unwrap();

        assert_eq!(payload.kind(), Some(&PayloadKind::Document));
        assert_eq!(payload.document_hash(), Some("abc"));
        assert_eq!(payload.recipient_id(), Some("bob"));
        assert_eq!(payload.field("title"), Some(&json!("Diploma")));
    }

    #[test]
    fn non_string_reserved_values_stay_opaque() {
        let original = json!({
            "type": 7,
            "document_hash": null,
            "recipient_id": ["a", "b"],
        });
        let payload: Payload = serde_json::from_value(original.clone()).unwrap();

        assert_eq!(payload.kind(), None);
        assert_eq!(payload.document_hash(), None);
        assert_eq!(payload.recipient_id(), None);
        assert_eq!(serde_json::to_value(&payload).unwrap(), original);
    }

    #[test]
    fn unknown_kind_is_preserved() {
        let payload: Payload = serde_json::from_value(json!({"type": "revocation"})).unwrap();
        assert_eq!(
            payload.kind(),
            Some(&PayloadKind::Other("revocation".to_string()))
        );
        assert!(!payload.is_document());
        assert_eq!(payload.to_map(), object(json!({"type": "revocation"})));
    }

    #[test]
    fn overwriting_reserved_key_with_non_string_clears_slot() {
        let payload = Payload::document("abc").with_field(DOCUMENT_HASH_KEY, 5);
        assert_eq!(payload.document_hash(), None);
        assert_eq!(payload.to_map(), object(json!({"type": "document", "document_hash": 5})));
    }

    #[test]
    fn metadata_into_payload() {
        let meta = DocumentMetadata {
            document_hash: "ff".repeat(32),
            issuer: "Acme University".into(),
            doc_type: "diploma".into(),
            title: "BSc Computer Science".into(),
            recipient_name: "Alice".into(),
            recipient_id: "alice@example.com".into(),
            filename: "diploma.pdf".into(),
        };
        let payload = Payload::from(meta);

        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({
                "type": "document",
                "document_hash": "ff".repeat(32),
                "issuer": "Acme University",
                "doc_type": "diploma",
                "title": "BSc Computer Science",
                "recipient_name": "Alice",
                "recipient_id": "alice@example.com",
                "filename": "diploma.pdf",
            })
        );
    }
}
