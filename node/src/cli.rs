//! # CLI Interface
//!
//! Defines the command-line argument structure for `docuchain` using
//! `clap` derive. The HTTP server is one subcommand; the rest operate on
//! the ledger file directly and exit.

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;

use docuchain_ledger::config::DEFAULT_DIFFICULTY;

/// DocuChain document authenticity ledger.
///
/// Anchors document hashes in a proof-of-work sealed, hash-linked ledger
/// and answers whether a given file was issued, by whom, and to whom.
#[derive(Parser, Debug)]
#[command(
    name = "docuchain",
    about = "DocuChain document authenticity ledger",
    version,
    propagate_version = true
)]
pub struct DocuChainCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory holding the ledger file and stored documents.
    ///
    /// Created on first use if it does not exist.
    #[arg(
        long,
        short = 'd',
        global = true,
        env = "DOCUCHAIN_DATA_DIR",
        default_value = "./docuchain-data"
    )]
    pub data_dir: PathBuf,

    /// Leading hex zeros required of every newly sealed block.
    #[arg(long, global = true, env = "DOCUCHAIN_DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY)]
    pub difficulty: usize,

    /// Log output format.
    #[arg(long, global = true, env = "DOCUCHAIN_LOG_FORMAT", value_enum, default_value_t = LogFormatArg::Pretty)]
    pub log_format: LogFormatArg,
}

/// Log output format as accepted on the command line.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Json,
}

/// Top-level subcommands for the `docuchain` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the HTTP API.
    Serve(ServeArgs),
    /// Issue a document: hash it, store a copy, and anchor it in the ledger.
    Issue(IssueArgs),
    /// Check whether a file has been issued.
    Verify(VerifyArgs),
    /// List issued documents.
    Documents(DocumentsArgs),
    /// Check the integrity of the ledger.
    Validate(ValidateArgs),
    /// Print the full ledger as JSON.
    Chain,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `serve` subcommand.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address for the HTTP API.
    #[arg(long, env = "DOCUCHAIN_LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,
}

/// Arguments for the `issue` subcommand.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Document to issue (.pdf, .jpg, .jpeg or .png).
    pub file: PathBuf,

    /// Issuing organisation.
    #[arg(long)]
    pub issuer: String,

    /// Kind of document, e.g. "diploma".
    #[arg(long)]
    pub doc_type: String,

    /// Document title.
    #[arg(long)]
    pub title: String,

    /// Recipient's full name.
    #[arg(long)]
    pub recipient_name: String,

    /// Recipient identifier, typically an email address.
    #[arg(long)]
    pub recipient_id: String,
}

/// Arguments for the `verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// File to check against the ledger.
    pub file: PathBuf,
}

/// Arguments for the `documents` subcommand.
#[derive(Args, Debug)]
pub struct DocumentsArgs {
    /// Only list documents issued to this recipient.
    #[arg(long)]
    pub recipient: Option<String>,
}

/// Arguments for the `validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Also check every block, genesis included, against the configured
    /// difficulty.
    #[arg(long)]
    pub strict: bool,
}
