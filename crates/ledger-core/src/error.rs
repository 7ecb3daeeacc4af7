use thiserror::Error;

use crate::money::Money;
use crate::types::{AccountId, LimitKind, TxId};

/// Coarse error taxonomy (§7): the class a `LedgerError` belongs to, for
/// callers that only need the HTTP-style bucket and not the exact variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthenticated,
    MfaRequired,
    MfaSetupRequired,
    FraudVerificationRequired,
    Policy,
    NotFound,
    Conflict,
    InsufficientFunds,
    LimitExceeded,
    Infrastructure,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    // ── Validation ────────────────────────────────────────────────────────────
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("source and destination account must differ")]
    SameAccount,

    #[error("invalid pix key for type: {0}")]
    InvalidPixKeyFormat(String),

    #[error("invalid decimal amount: {0}")]
    InvalidAmount(String),

    // ── Auth / step-up ────────────────────────────────────────────────────────
    #[error("authentication required")]
    Unauthenticated,

    #[error("step-up authentication required for this amount")]
    MfaRequired,

    #[error("multi-factor authentication is not configured for this user")]
    MfaSetupRequired,

    #[error("fraud engine requires step-up verification before proceeding")]
    FraudVerificationRequired,

    // ── Policy ────────────────────────────────────────────────────────────────
    #[error("account {0} is not active")]
    AccountNotActive(AccountId),

    #[error("KYC verification is required for this amount")]
    KycRequired,

    #[error("transaction blocked by fraud engine")]
    FraudBlocked,

    // ── Not found ─────────────────────────────────────────────────────────────
    #[error("account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("pix key not found: {0}")]
    PixKeyNotFound(String),

    #[error("transaction not found: {0}")]
    TransactionNotFound(TxId),

    // ── Conflict ──────────────────────────────────────────────────────────────
    #[error("operation already in flight for this idempotency key")]
    InFlightConflict,

    #[error("sequence allocation conflict, retry")]
    SequenceConflict,

    #[error("lock acquisition timed out")]
    LockTimeout,

    // ── Funds / limits ────────────────────────────────────────────────────────
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { available: Money, requested: Money },

    #[error("limit exceeded for {limit_kind:?}: requested {requested}, limit {limit}")]
    LimitExceeded {
        limit_kind: LimitKind,
        limit: Money,
        requested: Money,
    },

    // ── Infrastructure ────────────────────────────────────────────────────────
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    // ── Programmer errors (should never surface to a client) ─────────────────
    #[error("posting imbalance detected before flush: {0}")]
    PostingImbalance(String),
}

impl LedgerError {
    pub fn kind(&self) -> ErrorKind {
        use LedgerError::*;
        match self {
            NonPositiveAmount | SameAccount | InvalidPixKeyFormat(_) | InvalidAmount(_) => {
                ErrorKind::Validation
            }
            Unauthenticated => ErrorKind::Unauthenticated,
            MfaRequired => ErrorKind::MfaRequired,
            MfaSetupRequired => ErrorKind::MfaSetupRequired,
            FraudVerificationRequired => ErrorKind::FraudVerificationRequired,
            AccountNotActive(_) | KycRequired | FraudBlocked => ErrorKind::Policy,
            AccountNotFound(_) | PixKeyNotFound(_) | TransactionNotFound(_) => ErrorKind::NotFound,
            InFlightConflict | SequenceConflict | LockTimeout => ErrorKind::Conflict,
            InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            LimitExceeded { .. } => ErrorKind::LimitExceeded,
            Storage(_) | Serialization(_) => ErrorKind::Infrastructure,
            // Programmer-error variant; surfaced as infrastructure since it
            // should never reach a caller in a correct build.
            PostingImbalance(_) => ErrorKind::Infrastructure,
        }
    }
}
