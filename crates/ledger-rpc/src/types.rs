//! JSON-serializable mirrors of the core domain types, for the wire
//! boundary (§6.4). Kept deliberately separate from `ledger_core`'s own
//! types rather than serializing them directly, so the wire format can
//! evolve independently of the internal representation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcTransaction {
    pub id: u64,
    pub account_id: u64,
    pub idempotency_key: String,
    /// Canonical 2-decimal amount string, e.g. `"10.00"`.
    pub amount: String,
    pub operation_type: String,
    pub timestamp: i64,
    pub sequence: u64,
    pub prev_hash: String,
    pub record_hash: String,
    pub description: Option<String>,
}

impl From<ledger_core::Transaction> for RpcTransaction {
    fn from(tx: ledger_core::Transaction) -> Self {
        Self {
            id: tx.id.0,
            account_id: tx.account_id.0,
            idempotency_key: tx.idempotency_key,
            amount: tx.amount.to_canonical_string(),
            operation_type: tx.operation_type.as_str().to_string(),
            timestamp: tx.timestamp,
            sequence: tx.sequence,
            prev_hash: tx.prev_hash,
            record_hash: tx.record_hash,
            description: tx.description,
        }
    }
}

/// `get_statement` filter parameters (§6.1: "filters (date range, type,
/// amount range, text search)").
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RpcStatementFilters {
    pub from_timestamp: Option<i64>,
    pub to_timestamp: Option<i64>,
    /// One of `"DEPOSIT"`, `"WITHDRAW"`, `"TRANSFER"`, `"PIX"`.
    pub operation_type: Option<String>,
    pub min_amount: Option<String>,
    pub max_amount: Option<String>,
    pub text_search: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcIntegrityFailure {
    pub tx_id: u64,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcIntegrityReport {
    pub ok: bool,
    pub checked: u64,
    pub failure: Option<RpcIntegrityFailure>,
}

impl From<ledger_store::IntegrityReport> for RpcIntegrityReport {
    fn from(report: ledger_store::IntegrityReport) -> Self {
        Self {
            ok: report.ok,
            checked: report.checked,
            failure: report.failure.map(|f| RpcIntegrityFailure {
                tx_id: f.tx_id.0,
                reason: format!("{:?}", f.reason),
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcPixKey {
    pub key_value: String,
    pub key_type: String,
    pub account_id: u64,
}

/// `/health`-equivalent status struct (§6.3): `{store_ok, cache_ok, integrity_ok}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcHealth {
    pub store_ok: bool,
    pub cache_ok: bool,
    pub integrity_ok: bool,
}

/// Metrics surface (§6.3) — plain counters/gauges, not a Prometheus exporter.
pub type RpcMetrics = ledger_core::MetricsSnapshot;
