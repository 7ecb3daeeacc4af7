use std::net::SocketAddr;
use std::sync::Arc;

use jsonrpsee::core::{async_trait, RpcResult};
use jsonrpsee::server::{Server, ServerHandle};
use jsonrpsee::types::ErrorObject;
use tracing::info;

use ledger_core::{AccountId, ErrorKind, LedgerError, Money, OperationType, PixKeyType};
use ledger_store::{RequestContext, StatementFilters, StepUp, TransactionEngine};

use crate::api::LedgerApiServer;
use crate::types::{RpcHealth, RpcIntegrityReport, RpcMetrics, RpcStatementFilters, RpcTransaction};

/// Maps a `LedgerError`'s taxonomy class (§7) to a JSON-RPC error code.
/// Distinct ranges per class so a client can branch on the code without
/// string-matching the message, mirroring the original's HTTP status
/// classes (400/401/403/404/409/422/5xx) in the one-dimensional JSON-RPC
/// error-code space.
fn code_for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation => -32000,
        ErrorKind::Unauthenticated => -32001,
        ErrorKind::MfaRequired => -32002,
        ErrorKind::MfaSetupRequired => -32003,
        ErrorKind::FraudVerificationRequired => -32004,
        ErrorKind::Policy => -32005,
        ErrorKind::NotFound => -32006,
        ErrorKind::Conflict => -32007,
        ErrorKind::InsufficientFunds => -32008,
        ErrorKind::LimitExceeded => -32009,
        ErrorKind::Infrastructure => -32010,
    }
}

fn ledger_err(e: LedgerError) -> ErrorObject<'static> {
    ErrorObject::owned(code_for_kind(e.kind()), e.to_string(), None::<()>)
}

fn bad_request(msg: impl Into<String>) -> ErrorObject<'static> {
    ErrorObject::owned(-32602, msg.into(), None::<()>)
}

fn parse_operation_type(s: &str) -> Result<OperationType, ErrorObject<'static>> {
    match s {
        "DEPOSIT" => Ok(OperationType::Deposit),
        "WITHDRAW" => Ok(OperationType::Withdraw),
        "TRANSFER" => Ok(OperationType::Transfer),
        "PIX" => Ok(OperationType::Pix),
        other => Err(bad_request(format!("unknown operation_type: {other}"))),
    }
}

fn parse_pix_key_type(s: &str) -> Result<PixKeyType, ErrorObject<'static>> {
    match s {
        "CPF" => Ok(PixKeyType::Cpf),
        "EMAIL" => Ok(PixKeyType::Email),
        "PHONE" => Ok(PixKeyType::Phone),
        "EVP" => Ok(PixKeyType::Evp),
        other => Err(bad_request(format!("unknown pix key_type: {other}"))),
    }
}

fn parse_money(s: &str) -> Result<Money, ErrorObject<'static>> {
    Money::from_decimal_str(s).map_err(|e| bad_request(e.to_string()))
}

fn statement_filters(raw: RpcStatementFilters) -> Result<StatementFilters, ErrorObject<'static>> {
    Ok(StatementFilters {
        from_timestamp: raw.from_timestamp,
        to_timestamp: raw.to_timestamp,
        operation_type: raw.operation_type.as_deref().map(parse_operation_type).transpose()?,
        min_amount: raw.min_amount.as_deref().map(parse_money).transpose()?,
        max_amount: raw.max_amount.as_deref().map(parse_money).transpose()?,
        text_search: raw.text_search,
    })
}

fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Shared state passed to the RPC server.
pub struct RpcServerState {
    pub engine: Arc<TransactionEngine>,
}

/// The RPC server implementation.
pub struct RpcServer {
    state: Arc<RpcServerState>,
}

impl RpcServer {
    pub fn new(state: Arc<RpcServerState>) -> Self {
        Self { state }
    }

    /// Start the JSON-RPC server on `addr`. Returns a handle to stop it.
    pub async fn start(self, addr: SocketAddr) -> anyhow::Result<ServerHandle> {
        let server = Server::builder().build(addr).await?;
        let module = self.into_rpc();
        let handle = server.start(module);
        info!(%addr, "RPC server started");
        Ok(handle)
    }
}

#[async_trait]
impl LedgerApiServer for RpcServer {
    async fn create_deposit(
        &self,
        account_id: u64,
        amount: String,
        idempotency_key: String,
    ) -> RpcResult<RpcTransaction> {
        let amount = parse_money(&amount)?;
        let tx = self
            .state
            .engine
            .deposit(
                AccountId(account_id),
                amount,
                &idempotency_key,
                RequestContext::default(),
                now_unix(),
            )
            .await
            .map_err(ledger_err)?;
        Ok(tx.into())
    }

    async fn create_withdraw(
        &self,
        account_id: u64,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction> {
        let amount = parse_money(&amount)?;
        let ctx = RequestContext {
            fraud_ctx: None,
            step_up: StepUp { otp, backup_code },
        };
        let tx = self
            .state
            .engine
            .withdraw(AccountId(account_id), amount, &idempotency_key, ctx, now_unix())
            .await
            .map_err(ledger_err)?;
        Ok(tx.into())
    }

    async fn internal_transfer(
        &self,
        from_account_id: u64,
        to_account_id: u64,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction> {
        let amount = parse_money(&amount)?;
        let ctx = RequestContext {
            fraud_ctx: None,
            step_up: StepUp { otp, backup_code },
        };
        let tx = self
            .state
            .engine
            .internal_transfer(
                AccountId(from_account_id),
                AccountId(to_account_id),
                amount,
                &idempotency_key,
                ctx,
                now_unix(),
            )
            .await
            .map_err(ledger_err)?;
        Ok(tx.into())
    }

    async fn pix_transfer(
        &self,
        from_account_id: u64,
        pix_key: String,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction> {
        let amount = parse_money(&amount)?;
        let ctx = RequestContext {
            fraud_ctx: None,
            step_up: StepUp { otp, backup_code },
        };
        let tx = self
            .state
            .engine
            .pix_transfer(
                AccountId(from_account_id),
                &pix_key,
                amount,
                &idempotency_key,
                ctx,
                now_unix(),
            )
            .await
            .map_err(ledger_err)?;
        Ok(tx.into())
    }

    async fn create_pix_key(
        &self,
        account_id: u64,
        key_type: String,
        key_value: String,
    ) -> RpcResult<()> {
        let key_type = parse_pix_key_type(&key_type)?;
        self.state
            .engine
            .create_pix_key(AccountId(account_id), key_type, key_value)
            .map_err(ledger_err)?;
        Ok(())
    }

    async fn get_balance(&self, account_id: u64) -> RpcResult<String> {
        let balance = self
            .state
            .engine
            .get_balance(AccountId(account_id))
            .map_err(ledger_err)?;
        Ok(balance.to_canonical_string())
    }

    async fn get_statement(
        &self,
        account_id: u64,
        filters: RpcStatementFilters,
    ) -> RpcResult<Vec<RpcTransaction>> {
        let filters = statement_filters(filters)?;
        let statement = self
            .state
            .engine
            .get_statement(AccountId(account_id), &filters)
            .map_err(ledger_err)?;
        Ok(statement.into_iter().map(Into::into).collect())
    }

    async fn verify_integrity(&self) -> RpcResult<RpcIntegrityReport> {
        let report = self.state.engine.verify_integrity().map_err(ledger_err)?;
        Ok(report.into())
    }

    async fn get_health(&self) -> RpcResult<RpcHealth> {
        // A store read doubles as the store-reachability probe; the
        // in-process caches (idempotency/rate-limit/revocation) can't go
        // down independently of the process itself, so `cache_ok` is
        // always true here — a production deployment backing these with
        // an external cache would probe it the same way.
        let store_ok = self.state.engine.total_balance().is_ok();
        Ok(RpcHealth {
            store_ok,
            cache_ok: true,
            integrity_ok: self.state.engine.metrics().integrity_ok(),
        })
    }

    async fn get_metrics(&self) -> RpcResult<RpcMetrics> {
        let total_balance = self.state.engine.total_balance().map_err(ledger_err)?;
        Ok(self.state.engine.metrics().snapshot(total_balance))
    }
}
