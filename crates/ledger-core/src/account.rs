//! Account-holder data model: users, accounts, KYC, limits, Pix keys.
//!
//! These are the records the Ledger Store (`ledger_store`) owns and the
//! Transaction Engine reads/writes within a unit of work. None of them is
//! part of the hash chain; only `Transaction`/`Posting` (see
//! `crate::transaction`) are.

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{AccountId, AccountStatus, AccountType, KycStatus, PixKeyType, Timestamp, UserId};

// ── User ──────────────────────────────────────────────────────────────────────

/// A signed-up natural person. `cpf_hash` is the non-reversible SHA-256 digest
/// used for equality/dedup; `cpf_ciphertext` is a separately-encrypted
/// reversible copy used only for audit/display (see `ledger_crypto::vault`).
/// The two are never compared against each other.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub cpf_hash: String,
    pub cpf_ciphertext: String,
    pub cpf_last4: String,
    pub password_hash: String,
    /// Base32 TOTP seed. `None` means MFA has never been enrolled.
    pub mfa_secret: Option<String>,
    pub mfa_enabled: bool,
    pub is_anonymized: bool,
}

impl User {
    /// Replace identity-bearing fields with sentinels and erase the
    /// reversible ciphertext. Hashes are not recomputed from real data after
    /// this call — the original value is gone.
    pub fn anonymize(&mut self) {
        self.email = format!("anonymized-{}@deleted.invalid", self.id);
        self.cpf_hash = "ANONYMIZED".to_string();
        self.cpf_ciphertext = String::new();
        self.cpf_last4 = "0000".to_string();
        self.password_hash = String::new();
        self.mfa_secret = None;
        self.mfa_enabled = false;
        self.is_anonymized = true;
    }
}

/// A single-use MFA backup code. Consumed atomically: `used_at` is set the
/// first time it satisfies a step-up check, and a used code never matches
/// again.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackupCode {
    pub user_id: UserId,
    pub code_hash: String,
    pub used_at: Option<Timestamp>,
}

// ── Account ───────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique external identifier, e.g. `"1234-5"`. The treasury account is
    /// always `"0000-0"`.
    pub account_number: String,
    /// `None` only for the treasury account.
    pub user_id: Option<UserId>,
    /// Cached derived balance. Source of truth is `Σ postings.amount`; see
    /// `ledger_store::store::derive_balance`, which this field is
    /// cross-checked against rather than blindly trusted (resolves Open
    /// Question 2).
    pub balance: Money,
    pub blocked_balance: Money,
    pub overdraft_limit: Money,
    pub account_type: AccountType,
    pub status: AccountStatus,
}

impl Account {
    pub fn new_user_account(
        id: AccountId,
        account_number: String,
        user_id: UserId,
        account_type: AccountType,
    ) -> Self {
        Self {
            id,
            account_number,
            user_id: Some(user_id),
            balance: Money::ZERO,
            blocked_balance: Money::ZERO,
            overdraft_limit: Money::ZERO,
            account_type,
            status: AccountStatus::Active,
        }
    }

    pub const TREASURY_ACCOUNT_NUMBER: &'static str = "0000-0";

    pub fn new_treasury(id: AccountId) -> Self {
        Self {
            id,
            account_number: Self::TREASURY_ACCOUNT_NUMBER.to_string(),
            user_id: None,
            balance: Money::ZERO,
            blocked_balance: Money::ZERO,
            overdraft_limit: Money::ZERO,
            account_type: AccountType::Treasury,
            status: AccountStatus::Active,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, AccountStatus::Active)
    }

    /// `available = derived_balance − blocked_balance + overdraft_limit`
    /// (§4.9 step 7). `derived_balance` is supplied by the caller (the
    /// store), since deriving it requires scanning postings.
    pub fn available(&self, derived_balance: Money) -> Money {
        derived_balance - self.blocked_balance + self.overdraft_limit
    }
}

// ── KycProfile ────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KycProfile {
    pub user_id: UserId,
    pub status: KycStatus,
    pub risk_level: u8,
}

// ── LimitConfig ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitConfig {
    pub user_id: UserId,
    pub withdrawal_limit: Money,
    pub internal_transfer_limit: Money,
    pub ted_limit: Money,
    pub pix_per_tx_limit: Money,
    pub pix_daily_limit: Money,
}

// ── PixKey ────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PixKey {
    pub key_value: String,
    pub key_type: PixKeyType,
    pub account_id: AccountId,
}

/// Per-account, per-UTC-day counter used to enforce `pix_daily_limit`.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct PixDailyUsage {
    pub utc_date: String,
    pub total: Money,
}

// ── AuditLog ──────────────────────────────────────────────────────────────────

/// Best-effort, non-hash-chained audit trail entry (§3.2) for
/// account-lifecycle and compliance-relevant events (KYC status change, MFA
/// enrollment, Pix key registration, anonymization). Appending one never
/// blocks or fails the commit path it accompanies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub id: u64,
    pub user_id: UserId,
    pub action: String,
    pub metadata_json: String,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_balance_formula() {
        let mut acc = Account::new_user_account(
            AccountId(1),
            "1-1".into(),
            UserId(1),
            AccountType::Checking,
        );
        acc.blocked_balance = Money::from_decimal_str("10.00").unwrap();
        acc.overdraft_limit = Money::from_decimal_str("50.00").unwrap();
        let derived = Money::from_decimal_str("100.00").unwrap();
        assert_eq!(acc.available(derived).to_canonical_string(), "140.00");
    }

    #[test]
    fn anonymize_clears_identity_fields() {
        let mut u = User {
            id: UserId(1),
            email: "a@b.com".into(),
            cpf_hash: "hash".into(),
            cpf_ciphertext: "v1:abc".into(),
            cpf_last4: "1234".into(),
            password_hash: "hash".into(),
            mfa_secret: Some("seed".into()),
            mfa_enabled: true,
            is_anonymized: false,
        };
        u.anonymize();
        assert!(u.is_anonymized);
        assert_eq!(u.cpf_ciphertext, "");
        assert!(u.mfa_secret.is_none());
    }
}
