pub mod account;
pub mod collaborators;
pub mod config;
pub mod constants;
pub mod error;
pub mod metrics;
pub mod money;
pub mod transaction;
pub mod types;

pub use account::*;
pub use collaborators::*;
pub use config::Config;
pub use constants::*;
pub use error::{ErrorKind, LedgerError};
pub use metrics::{Metrics, MetricsSnapshot};
pub use money::Money;
pub use transaction::*;
pub use types::*;

use chrono::{SecondsFormat, TimeZone, Utc};

/// Render a Unix timestamp (seconds) as RFC-3339 UTC with microsecond
/// precision — the exact format fixed by §4.3's canonical format decision.
/// Both the write path and `verify_integrity` go through this one function.
pub fn timestamp_to_rfc3339(ts: Timestamp) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .unwrap_or_else(|| Utc.timestamp_opt(0, 0).single().unwrap())
        .to_rfc3339_opts(SecondsFormat::Micros, true)
}
