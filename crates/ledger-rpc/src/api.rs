use jsonrpsee::core::RpcResult;
use jsonrpsee::proc_macros::rpc;

use crate::types::{RpcHealth, RpcIntegrityReport, RpcMetrics, RpcStatementFilters, RpcTransaction};

/// Ledger JSON-RPC 2.0 API definition (§6.4) — the local exercising
/// harness for the seven operations the core exposes, not a replacement
/// for the excluded outer REST/auth layer.
///
/// All method names are prefixed with `"ledger_"` via `namespace = "ledger"`.
/// `client` is derived alongside `server` so `ledger-wallet` can call these
/// methods through the generated `LedgerApiClient` trait instead of hand
/// rolling JSON-RPC envelopes.
#[rpc(client, server, namespace = "ledger")]
pub trait LedgerApi {
    /// `create_deposit(account_id, amount, idem_key, fraud_ctx?)`.
    #[method(name = "createDeposit")]
    async fn create_deposit(
        &self,
        account_id: u64,
        amount: String,
        idempotency_key: String,
    ) -> RpcResult<RpcTransaction>;

    /// `create_withdraw(account_id, amount, idem_key, otp?, fraud_ctx?)`.
    /// `backup_code`, if supplied, satisfies the step-up gate in place of
    /// `otp` — either one is consumed/checked, never both (§4.9 step 6).
    #[method(name = "createWithdraw")]
    async fn create_withdraw(
        &self,
        account_id: u64,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction>;

    /// `internal_transfer(from_id, to_id, amount, idem_key, otp?, fraud_ctx?)`.
    #[method(name = "internalTransfer")]
    async fn internal_transfer(
        &self,
        from_account_id: u64,
        to_account_id: u64,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction>;

    /// `pix_transfer(pix_key, amount, from_account_id, idem_key, otp?, fraud_ctx?)`.
    #[method(name = "pixTransfer")]
    async fn pix_transfer(
        &self,
        from_account_id: u64,
        pix_key: String,
        amount: String,
        idempotency_key: String,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> RpcResult<RpcTransaction>;

    /// Register a Pix key for an account (§4.9 "Pix key registration").
    #[method(name = "createPixKey")]
    async fn create_pix_key(
        &self,
        account_id: u64,
        key_type: String,
        key_value: String,
    ) -> RpcResult<()>;

    /// `get_balance(account_id) -> money`.
    #[method(name = "getBalance")]
    async fn get_balance(&self, account_id: u64) -> RpcResult<String>;

    /// `get_statement(account_id, filters) -> list of entries`.
    #[method(name = "getStatement")]
    async fn get_statement(
        &self,
        account_id: u64,
        filters: RpcStatementFilters,
    ) -> RpcResult<Vec<RpcTransaction>>;

    /// `verify_integrity() -> {ok, count} | {ok=false, tx_id, reason}`.
    #[method(name = "verifyIntegrity")]
    async fn verify_integrity(&self) -> RpcResult<RpcIntegrityReport>;

    /// `/health`-equivalent status surface (§6.3): `{store_ok, cache_ok, integrity_ok}`.
    #[method(name = "getHealth")]
    async fn get_health(&self) -> RpcResult<RpcHealth>;

    /// Plain counters/gauges (§6.3) — transaction counts by type, fraud
    /// outcome counts, total balance, integrity-failure counter and
    /// last-run timestamp.
    #[method(name = "getMetrics")]
    async fn get_metrics(&self) -> RpcResult<RpcMetrics>;
}
