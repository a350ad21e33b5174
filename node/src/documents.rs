//! # Document Processor
//!
//! Screens incoming files, hashes them, and keeps a content-addressed copy
//! of every issued document under the documents directory as
//! `<sha256><ext>`. Only the hash goes into the ledger; the stored copy is
//! a convenience for operators and is never consulted by verification.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use docuchain_ledger::config::{ALLOWED_EXTENSIONS, MAX_FILE_SIZE};
use docuchain_ledger::crypto::{hash_file, sha256_hex};

/// Why a file was refused.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("File does not exist: {0}")]
    Missing(PathBuf),

    #[error("Invalid file type. Allowed: {}", ALLOWED_EXTENSIONS.join(", "))]
    UnsupportedType,

    #[error("File too large. Maximum size: {} MB", MAX_FILE_SIZE / (1024 * 1024))]
    TooLarge { size: u64 },

    #[error("document I/O error: {0}")]
    Io(#[from] io::Error),
}

impl DocumentError {
    /// Whether the caller sent something unacceptable, as opposed to the
    /// node failing to handle it.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, DocumentError::Io(_))
    }
}

/// The lowercased extension of `filename`, dot included, if it is one we
/// accept.
pub fn allowed_extension(filename: &str) -> Result<String, DocumentError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .ok_or(DocumentError::UnsupportedType)?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(DocumentError::UnsupportedType)
    }
}

/// Check an in-memory upload's name and size.
pub fn validate_upload(filename: &str, size: u64) -> Result<String, DocumentError> {
    let ext = allowed_extension(filename)?;
    if size > MAX_FILE_SIZE {
        return Err(DocumentError::TooLarge { size });
    }
    Ok(ext)
}

/// Check a file on disk: it exists, has an accepted extension, and is not
/// too large. Returns the normalised extension.
pub fn validate_file(path: &Path) -> Result<String, DocumentError> {
    let meta = match fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(DocumentError::Missing(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
    validate_upload(name, meta.len())
}

/// Strip directories and anything outside `[A-Za-z0-9._-]` from a
/// client-supplied file name.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    cleaned.trim_start_matches('.').to_string()
}

/// A document copy held by the [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    pub document_hash: String,
    pub path: PathBuf,
    /// Whether this call wrote the copy, as opposed to finding it present.
    pub created: bool,
}

impl StoredDocument {
    /// Undo the store after the document failed to anchor. A copy that was
    /// already present is left alone.
    pub fn discard(&self) {
        if !self.created {
            return;
        }
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to remove document copy");
        }
    }
}

/// Content-addressed store for issued documents.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, document_hash: &str, ext: &str) -> PathBuf {
        self.dir.join(format!("{document_hash}{ext}"))
    }

    /// Store an upload's bytes. An existing copy is left untouched.
    pub fn store_bytes(&self, bytes: &[u8], ext: &str) -> Result<StoredDocument, DocumentError> {
        let document_hash = sha256_hex(bytes);
        let path = self.path_for(&document_hash, ext);
        let created = !path.exists();
        if created {
            fs::create_dir_all(&self.dir)?;
            fs::write(&path, bytes)?;
            tracing::debug!(path = %path.display(), "document stored");
        }
        Ok(StoredDocument {
            document_hash,
            path,
            created,
        })
    }

    /// Copy a file from disk into the store, validating it first.
    pub fn store_file(&self, source: &Path) -> Result<StoredDocument, DocumentError> {
        let ext = validate_file(source)?;
        let document_hash = hash_file(source)?;
        let path = self.path_for(&document_hash, &ext);
        let created = !path.exists();
        if created {
            fs::create_dir_all(&self.dir)?;
            fs::copy(source, &path)?;
            tracing::debug!(path = %path.display(), "document stored");
        }
        Ok(StoredDocument {
            document_hash,
            path,
            created,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extensions_are_case_insensitive() {
        assert_eq!(allowed_extension("scan.JPG").unwrap(), ".jpg");
        assert_eq!(allowed_extension("diploma.pdf").unwrap(), ".pdf");
        assert!(allowed_extension("notes.txt").is_err());
        assert!(allowed_extension("no_extension").is_err());
    }

    #[test]
    fn oversized_uploads_are_rejected() {
        assert!(validate_upload("a.png", MAX_FILE_SIZE).is_ok());
        let err = validate_upload("a.png", MAX_FILE_SIZE + 1).unwrap_err();
        assert!(matches!(err, DocumentError::TooLarge { .. }));
        assert!(err.is_rejection());
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let err = validate_file(&dir.path().join("gone.pdf")).unwrap_err();
        assert!(matches!(err, DocumentError::Missing(_)));
    }

    #[test]
    fn sanitize_strips_paths_and_odd_characters() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\docs\\my diploma.pdf"), "my_diploma.pdf");
        assert_eq!(sanitize_filename(".hidden.png"), "hidden.png");
    }

    #[test]
    fn store_is_content_addressed_and_keeps_first_copy() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("documents"));

        let stored = store.store_bytes(b"first", ".pdf").unwrap();
        let (hash, path) = (&stored.document_hash, &stored.path);
        assert_eq!(*hash, sha256_hex(b"first"));
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), format!("{hash}.pdf"));
        assert!(stored.created);

        // Same name again with the file already present: untouched.
        fs::write(path, b"operator edit").unwrap();
        let again = store.store_bytes(b"first", ".pdf").unwrap();
        assert!(!again.created);
        assert_eq!(fs::read(path).unwrap(), b"operator edit");
    }

    #[test]
    fn discard_removes_only_fresh_copies() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("documents"));

        let fresh = store.store_bytes(b"fresh", ".pdf").unwrap();
        fresh.discard();
        assert!(!fresh.path.exists());

        let kept = store.store_bytes(b"kept", ".pdf").unwrap();
        let existing = store.store_bytes(b"kept", ".pdf").unwrap();
        existing.discard();
        assert!(kept.path.exists());
    }

    #[test]
    fn store_file_validates_and_hashes() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("Scan.PNG");
        fs::write(&source, b"png bytes").unwrap();
        let store = DocumentStore::new(dir.path().join("documents"));

        let stored = store.store_file(&source).unwrap();
        assert_eq!(stored.document_hash, sha256_hex(b"png bytes"));
        assert!(stored.path.to_str().unwrap().ends_with(".png"));
        assert_eq!(fs::read(&stored.path).unwrap(), b"png bytes");

        let bad = dir.path().join("notes.txt");
        fs::write(&bad, b"text").unwrap();
        assert!(store.store_file(&bad).unwrap_err().is_rejection());
    }
}
