//! Process-wide metrics (§6.3) — plain atomics, not a Prometheus exporter;
//! the exporter itself is an out-of-scope outer surface. Grounded on the
//! original's `infra/metrics.py` gauge/counter names
//! (`transactions_total{operation_type}`, `fraud_detected_total{action}`,
//! `ledger_integrity_ok` / `_last_run_timestamp` / `_failures_total`),
//! reimplemented here as a single shared struct of atomics rather than a
//! registry of global `Gauge`/`Counter` objects (§9's guidance against
//! global mutable singletons — one `Arc<Metrics>` handle is threaded
//! through the engine and the integrity monitor instead).

use std::sync::atomic::{AtomicBool, AtomicI64, AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use crate::types::{FraudOutcome, OperationType};

#[derive(Debug, Default)]
pub struct Metrics {
    deposits_total: AtomicU64,
    withdrawals_total: AtomicU64,
    transfers_total: AtomicU64,
    pix_total: AtomicU64,
    fraud_allow_total: AtomicU64,
    fraud_verify_total: AtomicU64,
    fraud_block_total: AtomicU64,
    /// 1 once set, 0 before the first integrity scan has ever run.
    integrity_ok: AtomicBool,
    integrity_last_run: AtomicI64,
    integrity_failures_total: AtomicU64,
}

/// Point-in-time snapshot, the serializable counterpart exposed over RPC.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub deposits_total: u64,
    pub withdrawals_total: u64,
    pub transfers_total: u64,
    pub pix_total: u64,
    pub fraud_allow_total: u64,
    pub fraud_verify_total: u64,
    pub fraud_block_total: u64,
    pub integrity_ok: bool,
    pub integrity_last_run: Option<i64>,
    pub integrity_failures_total: u64,
    /// Sum of every non-treasury account's derived balance, computed on
    /// read rather than tracked incrementally (the "total balance gauge").
    pub total_balance: String,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_transaction(&self, operation_type: OperationType) {
        let counter = match operation_type {
            OperationType::Deposit => &self.deposits_total,
            OperationType::Withdraw => &self.withdrawals_total,
            OperationType::Transfer => &self.transfers_total,
            OperationType::Pix => &self.pix_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fraud_outcome(&self, outcome: FraudOutcome) {
        let counter = match outcome {
            FraudOutcome::Allow => &self.fraud_allow_total,
            FraudOutcome::Verify => &self.fraud_verify_total,
            FraudOutcome::Block => &self.fraud_block_total,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Records the outcome of one `verify_integrity` scan.
    pub fn record_integrity_run(&self, ok: bool, now: i64) {
        self.integrity_ok.store(ok, Ordering::Relaxed);
        self.integrity_last_run.store(now, Ordering::Relaxed);
        if !ok {
            self.integrity_failures_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn integrity_ok(&self) -> bool {
        self.integrity_ok.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self, total_balance: crate::money::Money) -> MetricsSnapshot {
        let last_run = self.integrity_last_run.load(Ordering::Relaxed);
        MetricsSnapshot {
            deposits_total: self.deposits_total.load(Ordering::Relaxed),
            withdrawals_total: self.withdrawals_total.load(Ordering::Relaxed),
            transfers_total: self.transfers_total.load(Ordering::Relaxed),
            pix_total: self.pix_total.load(Ordering::Relaxed),
            fraud_allow_total: self.fraud_allow_total.load(Ordering::Relaxed),
            fraud_verify_total: self.fraud_verify_total.load(Ordering::Relaxed),
            fraud_block_total: self.fraud_block_total.load(Ordering::Relaxed),
            integrity_ok: self.integrity_ok.load(Ordering::Relaxed),
            integrity_last_run: if last_run == 0 { None } else { Some(last_run) },
            integrity_failures_total: self.integrity_failures_total.load(Ordering::Relaxed),
            total_balance: total_balance.to_canonical_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn fresh_metrics_report_no_integrity_run_yet() {
        let m = Metrics::new();
        let snap = m.snapshot(Money::ZERO);
        assert!(!snap.integrity_ok);
        assert_eq!(snap.integrity_last_run, None);
    }

    #[test]
    fn record_transaction_increments_the_right_counter() {
        let m = Metrics::new();
        m.record_transaction(OperationType::Deposit);
        m.record_transaction(OperationType::Deposit);
        m.record_transaction(OperationType::Pix);
        let snap = m.snapshot(Money::ZERO);
        assert_eq!(snap.deposits_total, 2);
        assert_eq!(snap.pix_total, 1);
        assert_eq!(snap.withdrawals_total, 0);
    }

    #[test]
    fn record_integrity_run_failure_increments_failures_and_flips_ok() {
        let m = Metrics::new();
        m.record_integrity_run(true, 100);
        assert!(m.integrity_ok());
        m.record_integrity_run(false, 200);
        assert!(!m.integrity_ok());
        let snap = m.snapshot(Money::ZERO);
        assert_eq!(snap.integrity_failures_total, 1);
        assert_eq!(snap.integrity_last_run, Some(200));
    }
}
