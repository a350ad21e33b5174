// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # DocuChain Node
//!
//! Entry point for the `docuchain` binary. Parses CLI arguments, initializes
//! logging, opens the ledger, and either serves the HTTP API or runs a
//! one-shot command against the ledger file.
//!
//! - `serve`: HTTP API and `/metrics`
//! - `issue`: anchor a document from disk
//! - `verify`: check a file against the ledger (exit 1 if unknown)
//! - `documents`: list issued documents
//! - `validate`: integrity check (exit 1 if broken)
//! - `chain`: dump the ledger as JSON
//! - `version`: print build version information

mod api;
mod cli;
mod config;
mod documents;
mod logging;
mod metrics;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::RwLock;

use docuchain_ledger::crypto::hash_file;
use docuchain_ledger::storage::{BlockRecord, DocumentMetadata};

use cli::{Commands, DocuChainCli};
use config::NodeConfig;
use logging::LogFormat;
use metrics::NodeMetrics;

/// Default filter for one-shot commands; their output goes to stdout.
const QUIET_FILTER: &str = "docuchain_node=warn,docuchain_ledger=warn";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = DocuChainCli::parse();
    let config = NodeConfig::from_args(&cli.global);
    let format: LogFormat = cli.global.log_format.into();

    match cli.command {
        Commands::Serve(args) => {
            logging::init_logging(
                "docuchain_node=info,docuchain_ledger=info,tower_http=debug",
                format,
            );
            serve(config, args).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Issue(args) => {
            logging::init_logging(QUIET_FILTER, format);
            issue(&config, args)
        }
        Commands::Verify(args) => {
            logging::init_logging(QUIET_FILTER, format);
            verify(&config, &args.file)
        }
        Commands::Documents(args) => {
            logging::init_logging(QUIET_FILTER, format);
            list_documents(&config, args)
        }
        Commands::Validate(args) => {
            logging::init_logging(QUIET_FILTER, format);
            validate(&config, args)
        }
        Commands::Chain => {
            logging::init_logging(QUIET_FILTER, format);
            print_chain(&config)
        }
        Commands::Version => {
            print_version();
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Serves the HTTP API until SIGINT or SIGTERM.
async fn serve(config: NodeConfig, args: cli::ServeArgs) -> Result<()> {
    tracing::info!(
        listen = %args.listen,
        data_dir = %config.data_dir.display(),
        difficulty = config.difficulty,
        "starting docuchain node"
    );

    // --- Ledger ---
    let ledger = config.open_ledger()?;
    if !config.ledger_path.exists() {
        ledger
            .save(&config.ledger_path)
            .with_context(|| format!("failed to save ledger to {}", config.ledger_path.display()))?;
    }
    if !ledger.validate() {
        tracing::warn!(
            violations = ledger.audit().len(),
            "ledger failed validation at startup"
        );
    }

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to create metrics registry")?);
    node_metrics.chain_length.set(ledger.len() as i64);

    // --- Application state ---
    let ledger = Arc::new(RwLock::new(ledger));
    let app_state = api::AppState {
        ledger: Arc::clone(&ledger),
        ledger_path: config.ledger_path.clone(),
        documents: config.document_store(),
        metrics: node_metrics,
    };

    // --- API server ---
    let router = api::create_router(app_state);
    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("failed to bind API listener on {}", args.listen))?;
    tracing::info!("API server listening on {}", args.listen);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("API server error")?;

    ledger
        .read()
        .await
        .save(&config.ledger_path)
        .context("failed to save ledger on shutdown")?;
    tracing::info!("docuchain node stopped");
    Ok(())
}

fn list_documents(config: &NodeConfig, args: cli::DocumentsArgs) -> Result<ExitCode> {
    let ledger = config.open_ledger()?;
    let documents = match args.recipient.as_deref() {
        Some(recipient) => ledger.find_by_recipient(recipient),
        None => ledger.list_documents(),
    };
    print_json(&documents)?;
    Ok(ExitCode::SUCCESS)
}

/// Integrity check. Violations go to stderr, the verdict to stdout.
fn validate(config: &NodeConfig, args: cli::ValidateArgs) -> Result<ExitCode> {
    let ledger = config.open_ledger()?;
    let valid = if args.strict {
        ledger.validate_strict(config.difficulty)
    } else {
        ledger.validate()
    };
    for violation in ledger.audit() {
        eprintln!("violation: {violation}");
    }
    println!(
        "{} blocks, {}",
        ledger.len(),
        if valid { "valid" } else { "INVALID" }
    );
    Ok(if valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_chain(config: &NodeConfig) -> Result<ExitCode> {
    let ledger = config.open_ledger()?;
    let chain: Vec<BlockRecord> = ledger.blocks().iter().map(|b| b.to_record()).collect();
    print_json(&chain)?;
    Ok(ExitCode::SUCCESS)
}

/// Hash, store, anchor, and save one document from disk.
fn issue(config: &NodeConfig, args: cli::IssueArgs) -> Result<ExitCode> {
    let mut ledger = config.open_ledger()?;
    let stored = config
        .document_store()
        .store_file(&args.file)
        .with_context(|| format!("cannot issue {}", args.file.display()))?;
    let document_hash = stored.document_hash.clone();

    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let metadata = DocumentMetadata {
        document_hash: document_hash.clone(),
        issuer: args.issuer,
        doc_type: args.doc_type,
        title: args.title,
        recipient_name: args.recipient_name,
        recipient_id: args.recipient_id,
        filename,
    };
    let receipt = match ledger.append_document_and_save(metadata, &config.ledger_path) {
        Ok(receipt) => receipt,
        Err(e) => {
            stored.discard();
            return Err(e).with_context(|| {
                format!("failed to anchor {}", args.file.display())
            });
        }
    };

    tracing::info!(stored = %stored.path.display(), "document copy stored");
    print_json(&serde_json::json!({
        "success": true,
        "message": "Document issued successfully",
        "document_hash": document_hash,
        "block_number": receipt.block_number,
        "block_hash": receipt.block_hash,
        "timestamp": receipt.timestamp,
    }))?;
    Ok(ExitCode::SUCCESS)
}

/// Look a file's hash up in the ledger.
fn verify(config: &NodeConfig, file: &Path) -> Result<ExitCode> {
    let ledger = config.open_ledger()?;
    let document_hash =
        hash_file(file).with_context(|| format!("failed to read {}", file.display()))?;

    match ledger.find_by_document_hash(&document_hash) {
        Some(record) => {
            print_json(&serde_json::json!({
                "valid": true,
                "message": "Document is authentic and verified",
                "document_hash": document_hash,
                "block_number": record.block_number,
                "timestamp": record.timestamp,
                "data": record.payload,
            }))?;
            Ok(ExitCode::SUCCESS)
        }
        None => {
            print_json(&serde_json::json!({
                "valid": false,
                "message": "Document not found in blockchain or has been tampered",
                "document_hash": document_hash,
            }))?;
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("docuchain {}", env!("CARGO_PKG_VERSION"));
    println!("protocol  {}", docuchain_ledger::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal is simply never delivered.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received, draining connections");
}
