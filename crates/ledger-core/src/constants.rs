//! Named thresholds, TTLs, and limits shared across the ledger core.
//!
//! Mirrors the original's `core/config.py` module constants; the Rust
//! realization groups them here as plain `const`s rather than a settings
//! object, with the env-driven overlay living in `crate::config::Config`.
//! All monetary thresholds below are whole reais, expressed in major units —
//! callers build a `Money` from them with `Money::from_major_units`.

/// Amount at/above which a debit requires a `VERIFIED` KYC profile (§4.9 step 6).
pub const KYC_REQUIRED_THRESHOLD_MAJOR: i64 = 10_000;

/// Amount at/above which a debit requires step-up MFA (§4.9 step 6).
pub const MFA_THRESHOLD_MAJOR: i64 = 1_000;

/// Amount at/above which a committed transaction triggers a best-effort AML
/// alert (§4.9 step 12).
pub const AML_LARGE_TX_THRESHOLD_MAJOR: i64 = 50_000;

/// Idempotency cache entry TTL in seconds (§4.4). Matches the original's
/// `IdempotencyHandler.TTL_SECONDS`.
pub const IDEMPOTENCY_TTL_SECS: i64 = 86_400;

/// Revocation-list entry TTL ceiling in seconds (§4.6) — entries are created
/// with the token's actual remaining lifetime, capped at this value.
pub const REVOCATION_MAX_TTL_SECS: i64 = 86_400;

/// Default sliding-window rate limit for the login endpoint (§4.5, §8 scenario 6).
pub const LOGIN_RATE_LIMIT_COUNT: u32 = 5;
pub const LOGIN_RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// Default fixed-window rate limit applied to public, non-authentication routes.
pub const PUBLIC_RATE_LIMIT_COUNT: u32 = 120;
pub const PUBLIC_RATE_LIMIT_WINDOW_SECS: i64 = 60;

/// TOTP step size (seconds) and accepted clock-skew window (§3.1).
pub const TOTP_STEP_SECS: u64 = 30;
pub const TOTP_SKEW_STEPS: i64 = 1;

/// Default integrity-monitor scan interval (§4.10).
pub const INTEGRITY_CHECK_INTERVAL_SECS: u64 = 300;

/// Treasury account external identifier (§4.9 "Treasury account").
pub const TREASURY_ACCOUNT_NUMBER: &str = "0000-0";

/// TOTP code length, decimal digits.
pub const TOTP_DIGITS: u32 = 6;
