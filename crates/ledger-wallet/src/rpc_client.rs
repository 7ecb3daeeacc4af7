//! Thin wrapper over `ledger-rpc`'s generated `LedgerApiClient`, the
//! harness client for the seven core operations (§6.4). Kept as its own
//! type rather than calling the generated trait directly from `main.rs`
//! so the CLI layer stays free of JSON-RPC plumbing details.

use anyhow::Context;

use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use ledger_rpc::{LedgerApiClient, RpcHealth, RpcIntegrityReport, RpcMetrics, RpcStatementFilters, RpcTransaction};

pub struct WalletRpcClient {
    inner: HttpClient,
}

impl WalletRpcClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let inner = HttpClientBuilder::default()
            .build(url)
            .with_context(|| format!("building RPC client for {url}"))?;
        Ok(Self { inner })
    }

    pub async fn create_deposit(
        &self,
        account_id: u64,
        amount: &str,
        idempotency_key: &str,
    ) -> anyhow::Result<RpcTransaction> {
        self.inner
            .create_deposit(account_id, amount.to_string(), idempotency_key.to_string())
            .await
            .context("createDeposit")
    }

    pub async fn create_withdraw(
        &self,
        account_id: u64,
        amount: &str,
        idempotency_key: &str,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> anyhow::Result<RpcTransaction> {
        self.inner
            .create_withdraw(
                account_id,
                amount.to_string(),
                idempotency_key.to_string(),
                otp,
                backup_code,
            )
            .await
            .context("createWithdraw")
    }

    pub async fn internal_transfer(
        &self,
        from_account_id: u64,
        to_account_id: u64,
        amount: &str,
        idempotency_key: &str,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> anyhow::Result<RpcTransaction> {
        self.inner
            .internal_transfer(
                from_account_id,
                to_account_id,
                amount.to_string(),
                idempotency_key.to_string(),
                otp,
                backup_code,
            )
            .await
            .context("internalTransfer")
    }

    pub async fn pix_transfer(
        &self,
        from_account_id: u64,
        pix_key: &str,
        amount: &str,
        idempotency_key: &str,
        otp: Option<String>,
        backup_code: Option<String>,
    ) -> anyhow::Result<RpcTransaction> {
        self.inner
            .pix_transfer(
                from_account_id,
                pix_key.to_string(),
                amount.to_string(),
                idempotency_key.to_string(),
                otp,
                backup_code,
            )
            .await
            .context("pixTransfer")
    }

    pub async fn create_pix_key(
        &self,
        account_id: u64,
        key_type: &str,
        key_value: &str,
    ) -> anyhow::Result<()> {
        self.inner
            .create_pix_key(account_id, key_type.to_string(), key_value.to_string())
            .await
            .context("createPixKey")
    }

    pub async fn get_balance(&self, account_id: u64) -> anyhow::Result<String> {
        self.inner.get_balance(account_id).await.context("getBalance")
    }

    pub async fn get_statement(
        &self,
        account_id: u64,
        filters: RpcStatementFilters,
    ) -> anyhow::Result<Vec<RpcTransaction>> {
        self.inner
            .get_statement(account_id, filters)
            .await
            .context("getStatement")
    }

    pub async fn verify_integrity(&self) -> anyhow::Result<RpcIntegrityReport> {
        self.inner.verify_integrity().await.context("verifyIntegrity")
    }

    pub async fn get_health(&self) -> anyhow::Result<RpcHealth> {
        self.inner.get_health().await.context("getHealth")
    }

    pub async fn get_metrics(&self) -> anyhow::Result<RpcMetrics> {
        self.inner.get_metrics().await.context("getMetrics")
    }
}
