//! Ledger-visible records: `Transaction` (append-only header) and `Posting`
//! (signed double-entry line). Together these are the only two entities
//! covered by the hash chain (`ledger_crypto::hash_chain`).

use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{AccountId, OperationType, Sequence, Timestamp, TxId};

/// A committed, append-only transaction header.
///
/// `sequence`/`prev_hash`/`record_hash` are assigned once, at append time
/// (§4.2, §4.3), and never mutated afterward — there is no setter for any of
/// the three once a `Transaction` has been constructed by the engine.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TxId,
    /// The account that initiated the operation (debit side for
    /// withdraw/transfer/Pix, credit side for deposit).
    pub account_id: AccountId,
    pub idempotency_key: String,
    /// Always positive; sign lives in the associated postings.
    pub amount: Money,
    pub operation_type: OperationType,
    pub timestamp: Timestamp,
    pub sequence: Sequence,
    pub prev_hash: String,
    pub record_hash: String,
    pub description: Option<String>,
}

/// The canonical tuple hashed to produce `record_hash` (§4.3). Kept as a
/// distinct type so the write path and `verify_integrity` call exactly the
/// same formatter — see `ledger_crypto::hash_chain::canonical_tuple`.
pub struct CanonicalTuple<'a> {
    pub sequence: Sequence,
    pub account_id: AccountId,
    pub amount: Money,
    pub operation_type: OperationType,
    pub description: Option<&'a str>,
    /// RFC-3339 UTC, microsecond precision — see §4.3 canonical format note.
    pub timestamp_iso8601: String,
    pub prev_hash: &'a str,
}

impl Transaction {
    pub fn canonical_tuple(&self) -> CanonicalTuple<'_> {
        CanonicalTuple {
            sequence: self.sequence,
            account_id: self.account_id,
            amount: self.amount,
            operation_type: self.operation_type,
            description: self.description.as_deref(),
            timestamp_iso8601: crate::timestamp_to_rfc3339(self.timestamp),
            prev_hash: &self.prev_hash,
        }
    }
}

/// A single signed line of a double-entry transaction. Every transaction
/// carries exactly two postings (§4.9 step 9) whose amounts sum to zero.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Posting {
    pub id: u64,
    pub transaction_id: TxId,
    pub account_id: AccountId,
    /// Signed: positive is a credit, negative is a debit.
    pub amount: Money,
    pub timestamp: Timestamp,
}

/// Sum of posting amounts for one transaction. The engine checks this
/// against `Money::ZERO` before flush (§4.9 step 9); a nonzero sum here is a
/// programmer error, never a user-facing one.
pub fn postings_sum(postings: &[Posting]) -> Money {
    postings
        .iter()
        .fold(Money::ZERO, |acc, p| acc + p.amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AccountId;

    #[test]
    fn balanced_postings_sum_to_zero() {
        let postings = vec![
            Posting {
                id: 1,
                transaction_id: TxId(1),
                account_id: AccountId(1),
                amount: Money::from_decimal_str("10.00").unwrap(),
                timestamp: 0,
            },
            Posting {
                id: 2,
                transaction_id: TxId(1),
                account_id: AccountId(2),
                amount: Money::from_decimal_str("-10.00").unwrap(),
                timestamp: 0,
            },
        ];
        assert!(postings_sum(&postings).is_zero());
    }
}
