//! Environment-driven settings, shared by every component.
//!
//! Grounded on the original's `core/config.py` `Settings` object: named
//! thresholds and TTLs with documented defaults, overridable by environment
//! variable, read once at process startup and passed down as a handle
//! rather than reached for as a global (§9 re-architecture guidance).

use crate::money::Money;

/// Process-wide configuration. Constructed once in `ledger-node`'s `main`
/// and threaded through to the engine and background tasks; never a
/// `static`/global — see §9's guidance against implicit global singletons.
#[derive(Clone, Debug)]
pub struct Config {
    /// Directory for the embedded store (`LEDGER_DATA_DIR`).
    pub data_dir: std::path::PathBuf,
    /// Minimum debit amount requiring a verified KYC profile.
    pub kyc_required_threshold: Money,
    /// Minimum debit amount requiring step-up MFA.
    pub mfa_threshold: Money,
    /// Minimum transaction amount that triggers a best-effort AML alert.
    pub aml_large_tx_threshold: Money,
    /// Idempotency cache entry TTL, seconds.
    pub idempotency_ttl_secs: i64,
    /// Revocation-list entry TTL ceiling, seconds.
    pub revocation_max_ttl_secs: i64,
    /// Login endpoint sliding-window rate limit.
    pub login_rate_limit_count: u32,
    pub login_rate_limit_window_secs: i64,
    /// Default per-route fixed-window rate limit for non-auth public routes.
    pub public_rate_limit_count: u32,
    pub public_rate_limit_window_secs: i64,
    /// Integrity monitor scan interval, seconds.
    pub integrity_check_interval_secs: u64,
    /// `tracing_subscriber::EnvFilter` directive string.
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: std::path::PathBuf::from("./data"),
            kyc_required_threshold: Money::from_major_units(
                crate::constants::KYC_REQUIRED_THRESHOLD_MAJOR,
            ),
            mfa_threshold: Money::from_major_units(crate::constants::MFA_THRESHOLD_MAJOR),
            aml_large_tx_threshold: Money::from_major_units(
                crate::constants::AML_LARGE_TX_THRESHOLD_MAJOR,
            ),
            idempotency_ttl_secs: crate::constants::IDEMPOTENCY_TTL_SECS,
            revocation_max_ttl_secs: crate::constants::REVOCATION_MAX_TTL_SECS,
            login_rate_limit_count: crate::constants::LOGIN_RATE_LIMIT_COUNT,
            login_rate_limit_window_secs: crate::constants::LOGIN_RATE_LIMIT_WINDOW_SECS,
            public_rate_limit_count: crate::constants::PUBLIC_RATE_LIMIT_COUNT,
            public_rate_limit_window_secs: crate::constants::PUBLIC_RATE_LIMIT_WINDOW_SECS,
            integrity_check_interval_secs: crate::constants::INTEGRITY_CHECK_INTERVAL_SECS,
            log_filter: "info,ledger=debug".to_string(),
        }
    }
}

impl Config {
    /// Build a `Config` from environment variables, falling back to
    /// `Default::default()` for anything unset or unparseable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            data_dir: std::env::var("LEDGER_DATA_DIR")
                .map(std::path::PathBuf::from)
                .unwrap_or(defaults.data_dir),
            kyc_required_threshold: env_money(
                "LEDGER_KYC_REQUIRED_THRESHOLD",
                defaults.kyc_required_threshold,
            ),
            mfa_threshold: env_money("LEDGER_MFA_THRESHOLD", defaults.mfa_threshold),
            aml_large_tx_threshold: env_money(
                "LEDGER_AML_LARGE_TX_THRESHOLD",
                defaults.aml_large_tx_threshold,
            ),
            idempotency_ttl_secs: env_i64(
                "LEDGER_IDEMPOTENCY_TTL_SECS",
                defaults.idempotency_ttl_secs,
            ),
            revocation_max_ttl_secs: env_i64(
                "LEDGER_REVOCATION_MAX_TTL_SECS",
                defaults.revocation_max_ttl_secs,
            ),
            login_rate_limit_count: env_u32(
                "LEDGER_LOGIN_RATE_LIMIT_COUNT",
                defaults.login_rate_limit_count,
            ),
            login_rate_limit_window_secs: env_i64(
                "LEDGER_LOGIN_RATE_LIMIT_WINDOW_SECS",
                defaults.login_rate_limit_window_secs,
            ),
            public_rate_limit_count: env_u32(
                "LEDGER_PUBLIC_RATE_LIMIT_COUNT",
                defaults.public_rate_limit_count,
            ),
            public_rate_limit_window_secs: env_i64(
                "LEDGER_PUBLIC_RATE_LIMIT_WINDOW_SECS",
                defaults.public_rate_limit_window_secs,
            ),
            integrity_check_interval_secs: std::env::var("LEDGER_INTEGRITY_CHECK_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.integrity_check_interval_secs),
            log_filter: std::env::var("LEDGER_LOG_FILTER").unwrap_or(defaults.log_filter),
        }
    }
}

fn env_money(key: &str, default: Money) -> Money {
    std::env::var(key)
        .ok()
        .and_then(|v| Money::from_decimal_str(&v).ok())
        .unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_thresholds() {
        let cfg = Config::default();
        assert_eq!(cfg.mfa_threshold.to_canonical_string(), "1000.00");
        assert_eq!(cfg.kyc_required_threshold.to_canonical_string(), "10000.00");
        assert_eq!(cfg.aml_large_tx_threshold.to_canonical_string(), "50000.00");
    }
}
