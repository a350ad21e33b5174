//! # REST API
//!
//! Builds the axum router that exposes the node's HTTP interface. All
//! endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                           | Description                        |
//! |--------|--------------------------------|------------------------------------|
//! | GET    | `/api/health`                  | Liveness plus ledger integrity     |
//! | POST   | `/api/issue`                   | Anchor an uploaded document        |
//! | POST   | `/api/verify`                  | Check an uploaded file             |
//! | GET    | `/api/documents`               | Every issued document              |
//! | GET    | `/api/documents/:recipient_id` | Documents for one recipient        |
//! | GET    | `/api/blockchain`              | The whole ledger                   |
//! | GET    | `/metrics`                     | Prometheus exposition              |
//!
//! Uploads are `multipart/form-data` with the document in a `file` field.
//! Issuance seals a block, which is CPU-bound, so it runs on the blocking
//! pool with the ledger's write lock held through the save. The lock is
//! `tokio::sync::RwLock`: a reader waiting on it must not park a runtime
//! worker.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::json;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use docuchain_ledger::config::MAX_FILE_SIZE;
use docuchain_ledger::crypto::sha256_hex;
use docuchain_ledger::storage::{AppendReceipt, BlockRecord, DocumentMetadata, Ledger};
use docuchain_ledger::LedgerError;

use crate::documents::{self, DocumentError, DocumentStore};
use crate::metrics::{self, SharedMetrics};

/// Headroom above the file size limit for the other multipart fields.
const FORM_OVERHEAD: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// The ledger as shared between handlers.
pub type SharedLedger = Arc<RwLock<Ledger>>;

/// Shared application state available to all request handlers.
///
/// Cheap to clone: everything is behind `Arc` or is a small path.
#[derive(Clone)]
pub struct AppState {
    pub ledger: SharedLedger,
    /// Where the ledger is saved after every issuance.
    pub ledger_path: PathBuf,
    /// Content-addressed copies of issued documents.
    pub documents: DocumentStore,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(Arc::clone(&state.metrics));

    Router::new()
        .route("/api/health", get(health_handler))
        .route("/api/issue", post(issue_handler))
        .route("/api/verify", post(verify_handler))
        .route("/api/documents", get(all_documents_handler))
        .route("/api/documents/:recipient_id", get(recipient_documents_handler))
        .route("/api/blockchain", get(blockchain_handler))
        .with_state(state)
        .merge(metrics_routes)
        .layer(DefaultBodyLimit::max(MAX_FILE_SIZE as usize + FORM_OVERHEAD))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Standard error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler failure, rendered as `{"error": ...}` with a matching status.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Multipart(e) => e.status(),
            ApiError::Document(e) if e.is_rejection() => StatusCode::BAD_REQUEST,
            ApiError::Document(_) | ApiError::Ledger(_) | ApiError::Task(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let error = match &self {
            ApiError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        };
        if status.is_server_error() {
            tracing::error!(%error, "request failed");
        }
        (status, Json(ErrorResponse { error })).into_response()
    }
}

// ---------------------------------------------------------------------------
// Upload Parsing
// ---------------------------------------------------------------------------

/// A multipart upload: the file plus any text fields.
#[derive(Debug, Default)]
struct Upload {
    file: Option<(String, Vec<u8>)>,
    fields: std::collections::HashMap<String, String>,
}

impl Upload {
    async fn read(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut upload = Upload::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == "file" {
                let filename = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                upload.file = Some((filename, bytes.to_vec()));
            } else {
                let value = field.text().await?;
                upload.fields.insert(name, value);
            }
        }
        Ok(upload)
    }

    /// The uploaded file, or the reason there is none.
    fn take_file(&mut self) -> Result<(String, Vec<u8>), ApiError> {
        match self.file.take() {
            None => Err(ApiError::BadRequest("No file provided".into())),
            Some((name, _)) if name.is_empty() => {
                Err(ApiError::BadRequest("No file selected".into()))
            }
            Some(file) => Ok(file),
        }
    }

    /// A required, non-empty text field.
    fn required(&self, name: &str) -> Option<String> {
        self.fields
            .get(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    blockchain_length: usize,
    is_valid: bool,
}

/// `GET /api/health`: liveness plus a full integrity check.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    Json(HealthResponse {
        status: "healthy",
        blockchain_length: ledger.len(),
        is_valid: ledger.validate(),
    })
}

#[derive(Debug, Serialize)]
struct IssueResponse {
    success: bool,
    message: &'static str,
    document_hash: String,
    #[serde(flatten)]
    receipt: AppendReceipt,
}

/// `POST /api/issue`: validate, store, and anchor an uploaded document.
async fn issue_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = Upload::read(multipart).await?;
    let (raw_name, bytes) = upload.take_file()?;

    let (Some(issuer), Some(doc_type), Some(title), Some(recipient_name), Some(recipient_id)) = (
        upload.required("issuer_org"),
        upload.required("doc_type"),
        upload.required("doc_title"),
        upload.required("recipient_name"),
        upload.required("recipient_id"),
    ) else {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    };

    let filename = documents::sanitize_filename(&raw_name);
    let ext = documents::validate_upload(&filename, bytes.len() as u64)?;

    let (document_hash, receipt) = tokio::task::spawn_blocking(move || {
        let stored = state.documents.store_bytes(&bytes, &ext)?;
        let metadata = DocumentMetadata {
            document_hash: stored.document_hash.clone(),
            issuer,
            doc_type,
            title,
            recipient_name,
            recipient_id,
            filename,
        };

        let mut ledger = state.ledger.blocking_write();
        let started = Instant::now();
        let receipt = match ledger.append_document_and_save(metadata, &state.ledger_path) {
            Ok(receipt) => receipt,
            Err(e) => {
                stored.discard();
                return Err(ApiError::from(e));
            }
        };
        state
            .metrics
            .seal_duration_seconds
            .observe(started.elapsed().as_secs_f64());
        state.metrics.documents_issued_total.inc();
        state.metrics.chain_length.set(ledger.len() as i64);
        Ok::<_, ApiError>((stored.document_hash, receipt))
    })
    .await??;

    tracing::info!(
        document_hash = %document_hash,
        block_number = receipt.block_number,
        "document issued"
    );

    Ok((
        StatusCode::CREATED,
        Json(IssueResponse {
            success: true,
            message: "Document issued successfully",
            document_hash,
            receipt,
        }),
    ))
}

/// `POST /api/verify`: look up an uploaded file's hash in the ledger.
///
/// Always `200` once a file arrives; `valid` carries the answer.
async fn verify_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut upload = Upload::read(multipart).await?;
    let (_, bytes) = upload.take_file()?;
    let document_hash = sha256_hex(&bytes);

    let found = state.ledger.read().await.find_by_document_hash(&document_hash);
    state.metrics.record_verification(found.is_some());

    let body = match found {
        Some(record) => json!({
            "valid": true,
            "message": "Document is authentic and verified",
            "document_hash": document_hash,
            "block_number": record.block_number,
            "timestamp": record.timestamp,
            "data": record.payload,
        }),
        None => json!({
            "valid": false,
            "message": "Document not found in blockchain or has been tampered",
            "document_hash": document_hash,
        }),
    };
    Ok(Json(body))
}

/// `GET /api/documents`: every issued document, oldest first.
async fn all_documents_handler(State(state): State<AppState>) -> impl IntoResponse {
    let documents = state.ledger.read().await.list_documents();
    Json(json!({
        "success": true,
        "count": documents.len(),
        "documents": documents,
    }))
}

/// `GET /api/documents/:recipient_id`: documents for one recipient.
async fn recipient_documents_handler(
    Path(recipient_id): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let documents = state.ledger.read().await.find_by_recipient(&recipient_id);
    Json(json!({
        "success": true,
        "count": documents.len(),
        "documents": documents,
    }))
}

/// `GET /api/blockchain`: the whole ledger, its validity, and any
/// violations found.
async fn blockchain_handler(State(state): State<AppState>) -> impl IntoResponse {
    let ledger = state.ledger.read().await;
    let chain: Vec<BlockRecord> = ledger.blocks().iter().map(|b| b.to_record()).collect();
    Json(json!({
        "success": true,
        "length": chain.len(),
        "chain": chain,
        "is_valid": ledger.validate(),
        "violations": ledger.audit(),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
