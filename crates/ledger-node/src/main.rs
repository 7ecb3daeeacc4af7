//! ledger-node — the banking-core node binary.
//!
//! Startup sequence:
//!   1. Load configuration (env + CLI overrides)
//!   2. Open (or initialise) the embedded store
//!   3. Apply genesis if the treasury account is not yet provisioned
//!   4. Build the transaction engine over its collaborators
//!   5. Spawn the integrity monitor background task
//!   6. Start the JSON-RPC 2.0 server and serve until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use ledger_core::{AllowAllFraudEngine, Config, Metrics, StaticOtpVerifier, TracingAlertRouter};
use ledger_genesis::{apply_genesis, GenesisParams};
use ledger_rpc::server::RpcServerState;
use ledger_rpc::RpcServer;
use ledger_store::{LedgerStore, TransactionEngine};

mod integrity_monitor;

#[derive(Parser, Debug)]
#[command(
    name = "ledger-node",
    version,
    about = "Double-entry, hash-chained banking ledger — core node"
)]
struct Args {
    /// Directory for the persistent embedded store (overrides `LEDGER_DATA_DIR`).
    #[arg(long)]
    data_dir: Option<std::path::PathBuf>,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8686")]
    rpc_addr: SocketAddr,

    /// Fixed code the in-memory `StaticOtpVerifier` accepts — local running
    /// and tests only; a production deployment wires TOTP + backup codes
    /// against `User.mfa_secret` behind the same `OtpVerifier` trait.
    #[arg(long, default_value = "000000")]
    otp_code: String,

    /// Integrity monitor scan interval, seconds (overrides
    /// `LEDGER_INTEGRITY_CHECK_INTERVAL_SECS`).
    #[arg(long)]
    integrity_check_interval_secs: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(secs) = args.integrity_check_interval_secs {
        config.integrity_check_interval_secs = secs;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.parse().unwrap()),
        )
        .init();

    info!("ledger-node starting");

    // ── Store ──────────────────────────────────────────────────────────────────
    std::fs::create_dir_all(&config.data_dir)
        .with_context(|| format!("creating data dir {}", config.data_dir.display()))?;
    let store = Arc::new(LedgerStore::open(&config.data_dir).context("opening embedded store")?);

    // ── Genesis (idempotent — safe on every restart) ───────────────────────────
    let treasury = apply_genesis(&store, &GenesisParams::default()).context("applying genesis")?;
    info!(account_id = treasury.id.0, "treasury account ready");

    // ── Collaborators ────────────────────────────────────────────────────────────
    // Minimal in-memory defaults (§6.2): production deployments wire a real
    // fraud-scoring service, TOTP/backup-code verifier, and alert gateway
    // behind these same trait objects.
    let alert_router = Arc::new(TracingAlertRouter);
    let metrics = Arc::new(Metrics::new());

    let engine = Arc::new(TransactionEngine::new(
        Arc::clone(&store),
        config.clone(),
        Arc::new(AllowAllFraudEngine),
        Arc::new(StaticOtpVerifier::new(args.otp_code)),
        alert_router.clone(),
        Arc::clone(&metrics),
    ));

    // ── Integrity monitor ──────────────────────────────────────────────────────
    integrity_monitor::spawn(
        Arc::clone(&engine),
        config.integrity_check_interval_secs,
        alert_router,
    );

    // ── RPC server ────────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { engine });
    let handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    info!(addr = %args.rpc_addr, "node ready");
    tokio::signal::ctrl_c().await.context("waiting for ctrl-c")?;
    info!("shutdown signal received");
    let _ = handle.stop();
    handle.stopped().await;
    Ok(())
}
