//! # CLI Interface
//!
//! Defines the command-line argument structure for `scholarship-node` using
//! `clap` derive. Supports four subcommands: `run`, `keygen`, `prove`, and
//! `version`.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use scholarship_zkp::config::{DEFAULT_METRICS_PORT, DEFAULT_RPC_PORT, DEFAULT_SESSION_TTL};

use crate::logging::LogFormat;

/// Scholarship eligibility node.
///
/// Runs the issuer and verifier HTTP API, and doubles as the student-side
/// tool for generating keys and answering challenges.
#[derive(Parser, Debug)]
#[command(
    name = "scholarship-node",
    about = "Zero-knowledge scholarship eligibility node",
    version,
    propagate_version = true
)]
pub struct ScholarNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the issuer/verifier API server.
    Run(RunArgs),
    /// Generate a student key pair and write it to a key file.
    Keygen(KeygenArgs),
    /// Answer a challenge (or sign a message) with a key file.
    Prove(ProveArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Directory holding the sled database. Created on first run.
    #[arg(long, short = 'd', env = "SCHOLAR_DATA_DIR", default_value = "./scholar-data")]
    pub data_dir: PathBuf,

    /// Port for the HTTP API.
    #[arg(long, env = "SCHOLAR_RPC_PORT", default_value_t = DEFAULT_RPC_PORT)]
    pub rpc_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "SCHOLAR_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Shared HMAC secret used to sign and validate credentials.
    #[arg(long, env = "SCHOLAR_ISSUER_SECRET", hide_env_values = true)]
    pub issuer_secret: String,

    /// Lifetime of an issued challenge, in seconds.
    #[arg(long, env = "SCHOLAR_SESSION_TTL_SECS", default_value_t = DEFAULT_SESSION_TTL.as_secs())]
    pub session_ttl_secs: u64,

    /// Burn a challenge on the first attempt, even a failed one.
    #[arg(long, env = "SCHOLAR_SINGLE_SHOT_SESSIONS")]
    pub single_shot_sessions: bool,

    /// Log output format.
    #[arg(long, env = "SCHOLAR_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `keygen` subcommand.
#[derive(Args, Debug)]
pub struct KeygenArgs {
    /// Where to write the key file. Refuses to overwrite.
    #[arg(long, short = 'o', default_value = "student.key.json")]
    pub out: PathBuf,
}

/// Arguments for the `prove` subcommand.
#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Key file produced by `keygen`.
    #[arg(long, short = 'k')]
    pub key_file: PathBuf,

    /// Decimal challenge from `/request-challenge`.
    #[arg(long, conflicts_with = "message", required_unless_present = "message")]
    pub challenge: Option<String>,

    /// Produce a non-interactive proof bound to this message instead.
    #[arg(long)]
    pub message: Option<String>,
}
