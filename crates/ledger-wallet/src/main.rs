//! ledger-wallet — a thin CLI client exercising the seven core banking
//! operations, plus the status/metrics surface, against a running
//! `ledger-node` over JSON-RPC 2.0.
//!
//! Idempotency keys (§4.1 "idempotency precheck") are required by the
//! underlying API for every money-moving call; the CLI accepts one
//! explicitly or generates a random one per invocation so a user who
//! doesn't care about replay-safety across retries isn't forced to
//! invent one by hand.

use anyhow::Context;
use clap::{Parser, Subcommand};
use rand::Rng;

use ledger_rpc::RpcStatementFilters;

mod rpc_client;

use rpc_client::WalletRpcClient;

#[derive(Parser, Debug)]
#[command(name = "ledger-wallet", version, about = "CLI client for the banking ledger node")]
struct Args {
    /// Base URL of the `ledger-node` JSON-RPC server.
    #[arg(long, default_value = "http://127.0.0.1:8686")]
    rpc_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Credit an account (§4.2).
    Deposit {
        account_id: u64,
        /// Decimal amount, e.g. "10.00".
        amount: String,
        /// Replay-safety key; a random one is generated if omitted.
        #[arg(long)]
        idempotency_key: Option<String>,
    },
    /// Debit an account, subject to MFA step-up above the configured
    /// threshold (§4.3).
    Withdraw {
        account_id: u64,
        amount: String,
        #[arg(long)]
        idempotency_key: Option<String>,
        /// One-time code, required once the amount crosses the MFA threshold
        /// (unless `--backup-code` is given instead).
        #[arg(long)]
        otp: Option<String>,
        /// Single-use backup code, consumed atomically, accepted in place of `--otp`.
        #[arg(long)]
        backup_code: Option<String>,
    },
    /// Move funds between two accounts in the same ledger (§4.4).
    Transfer {
        from_account_id: u64,
        to_account_id: u64,
        amount: String,
        #[arg(long)]
        idempotency_key: Option<String>,
        #[arg(long)]
        otp: Option<String>,
        #[arg(long)]
        backup_code: Option<String>,
    },
    /// Move funds to a Pix key, resolved to its owning account (§4.5).
    Pix {
        from_account_id: u64,
        pix_key: String,
        amount: String,
        #[arg(long)]
        idempotency_key: Option<String>,
        #[arg(long)]
        otp: Option<String>,
        #[arg(long)]
        backup_code: Option<String>,
    },
    /// Register a Pix key against an account (§4.6).
    CreatePixKey {
        account_id: u64,
        /// One of CPF, EMAIL, PHONE, EVP.
        key_type: String,
        key_value: String,
    },
    /// Print an account's current derived balance (§4.7).
    Balance { account_id: u64 },
    /// Print an account's transaction history, optionally filtered (§4.8).
    Statement {
        account_id: u64,
        #[arg(long)]
        from_timestamp: Option<i64>,
        #[arg(long)]
        to_timestamp: Option<i64>,
        #[arg(long)]
        operation_type: Option<String>,
        #[arg(long)]
        min_amount: Option<String>,
        #[arg(long)]
        max_amount: Option<String>,
        #[arg(long)]
        text_search: Option<String>,
    },
    /// Walk the hash chain end to end and report the first break, if any (§4.9).
    VerifyIntegrity,
    /// Print the `{store_ok, cache_ok, integrity_ok}` status surface (§6.3).
    Health,
    /// Print the plain counters/gauges surface (§6.3).
    Metrics,
}

fn random_idempotency_key() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse();
    let client = WalletRpcClient::new(&args.rpc_url).context("connecting to ledger-node")?;

    match args.command {
        Command::Deposit {
            account_id,
            amount,
            idempotency_key,
        } => {
            let key = idempotency_key.unwrap_or_else(random_idempotency_key);
            let tx = client.create_deposit(account_id, &amount, &key).await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Command::Withdraw {
            account_id,
            amount,
            idempotency_key,
            otp,
            backup_code,
        } => {
            let key = idempotency_key.unwrap_or_else(random_idempotency_key);
            let tx = client
                .create_withdraw(account_id, &amount, &key, otp, backup_code)
                .await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Command::Transfer {
            from_account_id,
            to_account_id,
            amount,
            idempotency_key,
            otp,
            backup_code,
        } => {
            let key = idempotency_key.unwrap_or_else(random_idempotency_key);
            let tx = client
                .internal_transfer(from_account_id, to_account_id, &amount, &key, otp, backup_code)
                .await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Command::Pix {
            from_account_id,
            pix_key,
            amount,
            idempotency_key,
            otp,
            backup_code,
        } => {
            let key = idempotency_key.unwrap_or_else(random_idempotency_key);
            let tx = client
                .pix_transfer(from_account_id, &pix_key, &amount, &key, otp, backup_code)
                .await?;
            println!("{}", serde_json::to_string_pretty(&tx)?);
        }
        Command::CreatePixKey {
            account_id,
            key_type,
            key_value,
        } => {
            client.create_pix_key(account_id, &key_type, &key_value).await?;
            println!("pix key registered");
        }
        Command::Balance { account_id } => {
            let balance = client.get_balance(account_id).await?;
            println!("{balance}");
        }
        Command::Statement {
            account_id,
            from_timestamp,
            to_timestamp,
            operation_type,
            min_amount,
            max_amount,
            text_search,
        } => {
            let filters = RpcStatementFilters {
                from_timestamp,
                to_timestamp,
                operation_type,
                min_amount,
                max_amount,
                text_search,
            };
            let statement = client.get_statement(account_id, filters).await?;
            println!("{}", serde_json::to_string_pretty(&statement)?);
        }
        Command::VerifyIntegrity => {
            let report = client.verify_integrity().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Health => {
            let health = client.get_health().await?;
            println!("{}", serde_json::to_string_pretty(&health)?);
        }
        Command::Metrics => {
            let metrics = client.get_metrics().await?;
            println!("{}", serde_json::to_string_pretty(&metrics)?);
        }
    }

    Ok(())
}
