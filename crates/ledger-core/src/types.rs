use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp (seconds, UTC). Wire-format timestamps used in the hash
/// chain are RFC-3339 strings (see `ledger_crypto::hash_chain`); this is the
/// in-memory/storage representation.
pub type Timestamp = i64;

/// Global strictly-increasing transaction sequence number.
pub type Sequence = u64;

// ── AccountId ────────────────────────────────────────────────────────────────

/// Surrogate key for an account row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({})", self.0)
    }
}

// ── UserId ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

// ── TxId ─────────────────────────────────────────────────────────────────────

/// Surrogate key for a transaction row. Distinct from `sequence`: `id` is an
/// opaque identifier, `sequence` is the ordering/hash-chain position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TxId(pub u64);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.0)
    }
}

// ── Enumerations ──────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountType {
    Checking,
    Savings,
    Salary,
    Digital,
    Investment,
    /// Reserved system account (`account_number = "0000-0"`), the double-entry
    /// counterparty sink/source for cash in/out. Never owned by a user.
    Treasury,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountStatus {
    Active,
    Blocked,
    Closed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationType {
    Deposit,
    Withdraw,
    Transfer,
    Pix,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Deposit => "DEPOSIT",
            OperationType::Withdraw => "WITHDRAW",
            OperationType::Transfer => "TRANSFER",
            OperationType::Pix => "PIX",
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KycStatus {
    Pending,
    Verified,
    Rejected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PixKeyType {
    Cpf,
    Email,
    Phone,
    Evp,
}

/// Which per-operation cap in `LimitConfig` an operation is checked against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LimitKind {
    Withdrawal,
    InternalTransfer,
    Ted,
    Pix,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    AmlLargeTransaction,
    FraudBlocked,
    IntegrityFailure,
}

/// Reason `verify_integrity` reports for the first offending transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrityFailureReason {
    HashMismatch,
    PostingsImbalance,
}

// ── Fraud hook ────────────────────────────────────────────────────────────────

/// Caller-supplied context for the optional fraud hook (step 3 of the
/// transaction pipeline). Absent entirely when no fraud context is supplied,
/// in which case the hook is skipped.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FraudContext {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub device_fingerprint: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FraudOutcome {
    Allow,
    /// Step-up OTP required before the operation may proceed.
    Verify,
    Block,
}
