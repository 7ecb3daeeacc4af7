//! Background task that reruns `verify_integrity` on a fixed interval
//! and degrades the node's reported health on failure.

use std::sync::Arc;

use tracing::error;

use ledger_core::AlertKind;
use ledger_store::TransactionEngine;

/// Spawns the periodic scan. Never mutates data; on failure or exception
/// it logs `tracing::error!`, records the failure on `Metrics`, and fires
/// a best-effort alert — the node otherwise stays up and serving.
pub fn spawn(engine: Arc<TransactionEngine>, interval_secs: u64, alert_router: Arc<dyn ledger_core::AlertRouter>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs.max(1)));
        loop {
            ticker.tick().await;
            let now = chrono::Utc::now().timestamp();
            match engine.verify_integrity() {
                Ok(report) => {
                    engine.metrics().record_integrity_run(report.ok, now);
                    if !report.ok {
                        let failure = report.failure.as_ref();
                        error!(
                            tx_id = failure.map(|f| f.tx_id.0),
                            reason = failure.map(|f| format!("{:?}", f.reason)),
                            "ledger integrity check failed"
                        );
                        alert_router.notify(
                            AlertKind::IntegrityFailure,
                            serde_json::json!({
                                "tx_id": failure.map(|f| f.tx_id.0),
                                "reason": failure.map(|f| format!("{:?}", f.reason)),
                            }),
                        );
                    }
                }
                Err(e) => {
                    engine.metrics().record_integrity_run(false, now);
                    error!(error = %e, "ledger integrity check errored");
                    alert_router.notify(
                        AlertKind::IntegrityFailure,
                        serde_json::json!({ "error": e.to_string() }),
                    );
                }
            }
        }
    });
}
