// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Scholarship Node
//!
//! Entry point for the `scholarship-node` binary. Parses CLI arguments,
//! initializes logging and metrics, and serves the issuer/verifier API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     - start the API and metrics servers
//! - `keygen`  - generate a student key file
//! - `prove`   - answer a challenge or sign a message with a key file
//! - `version` - print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

use scholarship_zkp::config::{ConsumePolicy, SessionConfig, PROTOCOL_VERSION};
use scholarship_zkp::credential::CredentialIssuer;
use scholarship_zkp::crypto::parse_decimal;
use scholarship_zkp::identity::KeyFile;
use scholarship_zkp::storage::ScholarDB;
use scholarship_zkp::{DomainParameters, KeyManager, SchnorrEngine};

use cli::{Commands, ScholarNodeCli};
use logging::LogFormat;
use metrics::NodeMetrics;

/// How often expired challenge sessions are swept from the database.
const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let cli = ScholarNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Keygen(args) => keygen(args),
        Commands::Prove(args) => prove(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the API server, the metrics endpoint and the session sweeper.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "scholarship_node=info,scholarship_zkp=info,tower_http=info",
        args.log_format,
    );

    let consume_policy = if args.single_shot_sessions {
        ConsumePolicy::Always
    } else {
        ConsumePolicy::OnSuccess
    };
    tracing::info!(
        rpc_port = args.rpc_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        session_ttl_secs = args.session_ttl_secs,
        ?consume_policy,
        "starting scholarship-node"
    );

    if args.session_ttl_secs == 0 {
        bail!("--session-ttl-secs must be positive");
    }
    let issuer = CredentialIssuer::new(args.issuer_secret.into_bytes())
        .context("invalid issuer secret")?;

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let db = ScholarDB::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(
        path = %db_path.display(),
        sessions = db.session_count(),
        registered = db.registry_count(),
        "database opened"
    );

    // --- Metrics ---
    let node_metrics = Arc::new(NodeMetrics::new().context("failed to register metrics")?);

    // --- Application state ---
    let app_state = api::AppState::new(
        format!("{} (protocol {})", env!("CARGO_PKG_VERSION"), PROTOCOL_VERSION),
        db.clone(),
        issuer,
        SessionConfig {
            ttl: Duration::from_secs(args.session_ttl_secs),
            consume_policy,
        },
        Arc::clone(&node_metrics),
    );

    // --- API server ---
    let api_router = api::create_router(app_state.clone());
    let api_addr = format!("0.0.0.0:{}", args.rpc_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&node_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Session sweeper ---
    let sessions = Arc::clone(&app_state.sessions);
    let sweeper = tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            sessions.purge_expired(chrono::Utc::now());
        }
    });

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    sweeper.abort();
    db.flush().context("failed to flush database")?;
    tracing::info!("scholarship-node stopped");
    Ok(())
}

/// Generates a student key pair and writes it as a JSON key file.
fn keygen(args: cli::KeygenArgs) -> Result<()> {
    let manager = KeyManager::new(DomainParameters::standard());
    let pair = manager.generate_key_pair();
    let key_file = KeyFile::from_key_pair(&pair);
    let contents = serde_json::to_vec_pretty(&key_file).context("failed to encode key file")?;

    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    // Restrict permissions on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(&args.out)
        .with_context(|| format!("failed to create key file {}", args.out.display()))?;
    file.write_all(&contents)
        .with_context(|| format!("failed to write key file {}", args.out.display()))?;

    let summary = serde_json::json!({
        "key_file": args.out.display().to_string(),
        "public_key": pair.public_key().to_decimal(),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Reads a key file and prints a proof as JSON on stdout.
///
/// With `--challenge` the output is `{commitment, response, challenge}` for
/// `/verify-proof`; with `--message` it is a Fiat-Shamir proof for
/// `/verify-non-interactive`.
fn prove(args: cli::ProveArgs) -> Result<()> {
    let raw = std::fs::read(&args.key_file)
        .with_context(|| format!("failed to read key file {}", args.key_file.display()))?;
    let key_file: KeyFile = serde_json::from_slice(&raw).context("key file is not valid JSON")?;

    let params = DomainParameters::standard();
    let manager = KeyManager::new(params.clone());
    let pair = key_file
        .into_key_pair(&manager)
        .context("key file is invalid")?;
    let engine = SchnorrEngine::new(params);

    let proof = match (&args.challenge, &args.message) {
        (Some(challenge), None) => {
            let c = parse_decimal(challenge).context("challenge must be a decimal integer")?;
            engine.create_proof(pair.private_key(), &c)
        }
        (None, Some(message)) => {
            engine.create_non_interactive_proof(pair.private_key(), pair.public_key(), message)
        }
        _ => bail!("exactly one of --challenge or --message is required"),
    };

    println!("{}", serde_json::to_string_pretty(&proof)?);
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("scholarship-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol         {}", PROTOCOL_VERSION);
    println!("rustc            {}", rustc_version());
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
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
}
