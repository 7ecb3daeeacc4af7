//! Trait boundaries standing in for the out-of-scope collaborators the
//! engine consumes (§6.2): Fraud Engine, Token Vault, OTP verifier, Alert
//! Router. Only the interfaces live here; production implementations (ML
//! scoring, a real KMS, a push-notification gateway) are out of scope by
//! §1's non-goals and are never built in this crate.

use serde::{Deserialize, Serialize};

use crate::types::{AlertKind, FraudContext, FraudOutcome, UserId};

/// Evaluates a proposed debit for fraud risk. Must be idempotent and
/// side-effect-safe: calling it twice with the same context must not itself
/// mutate state the caller can observe.
pub trait FraudEngine: Send + Sync {
    fn evaluate(&self, ctx: &FraudContext) -> FraudOutcome;
}

/// Tokenizes/detokenizes sensitive values (e.g. CPF). `tokenize` must be
/// deterministic for the same input — repeated calls with identical
/// plaintext return the same token.
pub trait TokenVault: Send + Sync {
    fn tokenize(&self, value: &str) -> String;
    fn detokenize(&self, token: &str) -> Option<String>;
}

/// Validates a step-up second factor (TOTP code or backup code). A matched
/// backup code must be consumed atomically — it cannot satisfy a second
/// step-up.
pub trait OtpVerifier: Send + Sync {
    fn validate_second_factor(&self, user_id: UserId, code: &str) -> bool;
}

/// Fire-and-forget alert sink (AML, fraud-block audit, integrity failure).
pub trait AlertRouter: Send + Sync {
    fn notify(&self, kind: AlertKind, payload: serde_json::Value);
}

// ── Minimal default implementations ──────────────────────────────────────────

/// A fraud engine that always allows. Suitable for local running and for
/// tests that don't exercise the fraud-gate path.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAllFraudEngine;

impl FraudEngine for AllowAllFraudEngine {
    fn evaluate(&self, _ctx: &FraudContext) -> FraudOutcome {
        FraudOutcome::Allow
    }
}

/// An OTP verifier that accepts a single fixed code, for tests and local
/// running. A production implementation validates TOTP against
/// `User.mfa_secret` and consumes `BackupCode` rows atomically.
#[derive(Debug, Clone)]
pub struct StaticOtpVerifier {
    pub accepted_code: String,
}

impl StaticOtpVerifier {
    pub fn new(accepted_code: impl Into<String>) -> Self {
        Self {
            accepted_code: accepted_code.into(),
        }
    }
}

impl OtpVerifier for StaticOtpVerifier {
    fn validate_second_factor(&self, _user_id: UserId, code: &str) -> bool {
        code == self.accepted_code
    }
}

/// Logs every alert via `tracing` instead of dispatching anywhere. The
/// default `AlertRouter` for local running; a production deployment wires a
/// real push/email/SMS gateway behind the same trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAlertRouter;

impl AlertRouter for TracingAlertRouter {
    fn notify(&self, kind: AlertKind, payload: serde_json::Value) {
        tracing::warn!(?kind, %payload, "alert");
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertPayload {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_all_fraud_engine_always_allows() {
        let ctx = FraudContext {
            ip: None,
            user_agent: None,
            device_fingerprint: None,
        };
        assert_eq!(AllowAllFraudEngine.evaluate(&ctx), FraudOutcome::Allow);
    }

    #[test]
    fn static_otp_verifier_matches_only_configured_code() {
        let v = StaticOtpVerifier::new("123456");
        assert!(v.validate_second_factor(UserId(1), "123456"));
        assert!(!v.validate_second_factor(UserId(1), "000000"));
    }
}
