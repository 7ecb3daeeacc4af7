//! The per-transaction hash chain.
//!
//! A small set of free functions over plain data, no state of their own.

use sha2::{Digest, Sha256};

use ledger_core::{AccountId, Money, OperationType, Sequence};

/// The exact tuple hashed to produce `record_hash`, reproduced here as
/// plain arguments (rather than depending on `ledger_core::transaction` and
/// creating a cycle) so both the write path and `verify_integrity` can call
/// this one function and never drift apart.
#[allow(clippy::too_many_arguments)]
pub fn canonical_tuple(
    sequence: Sequence,
    account_id: AccountId,
    amount: Money,
    operation_type: OperationType,
    description: Option<&str>,
    timestamp_iso8601: &str,
    prev_hash: &str,
) -> String {
    format!(
        "{sequence}|{account_id}|{amount}|{operation_type}|{desc}|{timestamp_iso8601}|{prev_hash}",
        desc = description.unwrap_or(""),
    )
}

/// SHA-256 of `canonical_tuple(...)`, hex-encoded — the `record_hash` for a
/// transaction at `sequence` whose predecessor's `record_hash` is
/// `prev_hash` (empty string for the first transaction in the chain).
#[allow(clippy::too_many_arguments)]
pub fn record_hash(
    sequence: Sequence,
    account_id: AccountId,
    amount: Money,
    operation_type: OperationType,
    description: Option<&str>,
    timestamp_iso8601: &str,
    prev_hash: &str,
) -> String {
    let tuple = canonical_tuple(
        sequence,
        account_id,
        amount,
        operation_type,
        description,
        timestamp_iso8601,
        prev_hash,
    );
    let digest = Sha256::digest(tuple.as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_core::{AccountId, Money, OperationType};

    #[test]
    fn deterministic_for_identical_inputs() {
        let amount = Money::from_decimal_str("10.00").unwrap();
        let a = record_hash(1, AccountId(1), amount, OperationType::Deposit, None, "ts", "");
        let b = record_hash(1, AccountId(1), amount, OperationType::Deposit, None, "ts", "");
        assert_eq!(a, b);
    }

    #[test]
    fn differs_when_prev_hash_differs() {
        let amount = Money::from_decimal_str("10.00").unwrap();
        let a = record_hash(2, AccountId(1), amount, OperationType::Deposit, None, "ts", "aaa");
        let b = record_hash(2, AccountId(1), amount, OperationType::Deposit, None, "ts", "bbb");
        assert_ne!(a, b);
    }

    #[test]
    fn empty_description_renders_as_empty_segment() {
        let amount = Money::from_decimal_str("1.00").unwrap();
        let tuple = canonical_tuple(1, AccountId(1), amount, OperationType::Withdraw, None, "ts", "");
        assert_eq!(tuple, "1|1|1.00|WITHDRAW||ts|");
    }
}
