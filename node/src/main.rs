// Copyright (c) 2026 Mintdesk Contributors. MIT License.
// See LICENSE for details.

//! # Mintdesk Node
//!
//! Entry point for the `mintdesk-node` binary. Parses CLI arguments,
//! initializes logging and metrics, loads or creates the desk state, and
//! serves the HTTP API.
//!
//! The binary supports four subcommands:
//!
//! - `run`     — start the desk node
//! - `init`    — initialize the data directory and persist genesis state
//! - `status`  — query a running node's status endpoint
//! - `version` — print build version information

mod api;
mod cli;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;

use mintdesk_core::account::AccountId;
use mintdesk_core::config::DeskConfig;
use mintdesk_core::rails::memory::{MemoryNativeRail, MemoryWrappedLedger};
use mintdesk_core::store::DeskStore;

use cli::{Commands, MintdeskCli};
use logging::LogFormat;
use metrics::DeskMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = MintdeskCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Init(args) => init_node(args),
        Commands::Status(args) => query_status(args).await,
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Starts the full desk node: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(
        "mintdesk_node=info,mintdesk_core=info,tower_http=debug",
        LogFormat::from_str_lossy(&args.log_format),
    );

    tracing::info!(
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting mintdesk-node"
    );

    // --- Persistent storage ---
    let db_path = args.data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let store = Arc::new(
        DeskStore::open(&db_path)
            .with_context(|| format!("failed to open desk store at {}", db_path.display()))?,
    );
    tracing::info!(path = %db_path.display(), "desk store opened");

    // --- Desk service ---
    // A persisted snapshot takes precedence over the CLI configuration:
    // the desk's cap, rate, and owner are fixed at creation.
    let service = match store.load().context("failed to read persisted desk state")? {
        Some(snapshot) => {
            tracing::info!(
                owner = %snapshot.config.owner,
                supply = snapshot.ledger.total_supply(),
                "desk state recovered from disk"
            );
            api::NodeService::restore(snapshot, MemoryNativeRail::new(), MemoryWrappedLedger::new())
                .context("persisted desk state is inconsistent")?
        }
        None => {
            let config = desk_config(&args.owner, args.cap, args.rate, args.initial_supply);
            let service = api::NodeService::new(
                config,
                MemoryNativeRail::new(),
                MemoryWrappedLedger::new(),
            )
            .context("invalid desk configuration")?;
            store
                .save(&service.snapshot())
                .context("failed to persist genesis desk state")?;
            tracing::info!(owner = %args.owner, "fresh desk created and persisted");
            service
        }
    };
    let service = Arc::new(service);

    // --- Metrics ---
    let desk_metrics = Arc::new(DeskMetrics::new());
    desk_metrics.token_supply.set(service.total_supply() as i64);

    // --- Application state ---
    let app_state = api::AppState {
        version: env!("CARGO_PKG_VERSION").to_string(),
        network: "devnet".to_string(),
        service: Arc::clone(&service),
        store: Some(Arc::clone(&store)),
        metrics: Arc::clone(&desk_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&desk_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

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

    // Final flush so a clean shutdown never loses settled operations.
    store
        .save(&service.snapshot())
        .context("failed to persist desk state on shutdown")?;
    tracing::info!("mintdesk-node stopped");
    Ok(())
}

/// Initializes a new desk data directory and persists the genesis state.
fn init_node(args: cli::InitArgs) -> Result<()> {
    logging::init_logging("mintdesk_node=info", LogFormat::Pretty);

    let data_dir = &args.data_dir;
    tracing::info!(data_dir = %data_dir.display(), owner = %args.owner, "initializing desk");

    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;

    let store = DeskStore::open(&db_path)
        .with_context(|| format!("failed to open desk store at {}", db_path.display()))?;
    if store.load()?.is_some() {
        anyhow::bail!(
            "data directory {} already holds desk state; refusing to overwrite",
            data_dir.display()
        );
    }

    let config = desk_config(&args.owner, args.cap, args.rate, args.initial_supply);
    let desk = mintdesk_core::desk::SaleDesk::new(config).context("invalid desk configuration")?;
    store
        .save(&desk.snapshot())
        .context("failed to persist genesis desk state")?;

    println!("Desk initialized successfully.");
    println!("  Data directory : {}", data_dir.display());
    println!("  Owner          : {}", args.owner);
    println!("  Supply cap     : {}", args.cap);
    println!("  Exchange rate  : {} tokens per payment unit", args.rate);
    println!("  Initial supply : {}", args.initial_supply);

    Ok(())
}

/// Builds a [`DeskConfig`] from CLI parameters.
fn desk_config(owner: &str, cap: u64, rate: u64, initial_supply: u64) -> DeskConfig {
    DeskConfig {
        cap,
        exchange_rate: rate,
        initial_supply,
        ..DeskConfig::with_owner(AccountId::new(owner))
    }
}

/// Queries a running node's status endpoint and prints the result.
async fn query_status(args: cli::StatusArgs) -> Result<()> {
    let url = format!("{}/status", args.api_url.trim_end_matches('/'));
    let body = http_get(&url).await?;
    println!("{}", body);
    Ok(())
}

/// Minimal HTTP GET over a raw TCP stream. The status subcommand is the
/// only client-side HTTP in this binary, so it is not worth an HTTP
/// client dependency.
async fn http_get(url: &str) -> Result<String> {
    let rest = url
        .strip_prefix("http://")
        .ok_or_else(|| anyhow::anyhow!("only http:// URLs are supported: {}", url))?;

    let (authority, path) = match rest.find('/') {
        Some(i) => (&rest[..i], &rest[i..]),
        None => (rest, "/"),
    };
    let addr = if authority.contains(':') {
        authority.to_string()
    } else {
        format!("{}:80", authority)
    };
    let host = authority.split(':').next().unwrap_or(authority);

    let mut stream = tokio::net::TcpStream::connect(&addr)
        .await
        .with_context(|| format!("failed to connect to {}", addr))?;

    let request = format!(
        "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        path, host,
    );

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    stream.write_all(request.as_bytes()).await?;
    stream.shutdown().await?;

    let mut buf = Vec::new();
    stream.read_to_end(&mut buf).await?;
    let response = String::from_utf8_lossy(&buf);

    // Strip HTTP headers — everything after the first blank line is the body.
    let body = response
        .split_once("\r\n\r\n")
        .map(|(_, b)| b.to_string())
        .unwrap_or_else(|| response.to_string());

    Ok(body)
}

/// Prints version information to stdout.
fn print_version() {
    println!("mintdesk-node {}", env!("CARGO_PKG_VERSION"));
    println!("rustc         {}", rustc_version());
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
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
