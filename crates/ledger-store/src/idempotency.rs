//! In-process idempotency cache.
//!
//! The authoritative check is the storage-layer CAS in
//! `store::LedgerStore::append_transaction` — this cache exists purely to
//! short-circuit a retried request *before* it reaches validation, locking,
//! or the store at all.

use std::time::{Duration, Instant};

use dashmap::DashMap;

use ledger_core::{AccountId, TxId};

#[derive(Clone, Copy, Debug)]
struct Entry {
    tx_id: TxId,
    expires_at: Instant,
}

/// Keyed on `(account_id, idempotency_key)`, matching the storage layer's
/// uniqueness key so both layers agree on what "the same request" means.
pub struct IdempotencyCache {
    entries: DashMap<(AccountId, String), Entry>,
    ttl: Duration,
}

impl IdempotencyCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    pub fn get(&self, account_id: AccountId, key: &str) -> Option<TxId> {
        let map_key = (account_id, key.to_string());
        let entry = self.entries.get(&map_key)?;
        if entry.expires_at < Instant::now() {
            drop(entry);
            self.entries.remove(&map_key);
            return None;
        }
        Some(entry.tx_id)
    }

    pub fn insert(&self, account_id: AccountId, key: &str, tx_id: TxId) {
        self.entries.insert(
            (account_id, key.to_string()),
            Entry {
                tx_id,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop expired entries. Called periodically by the Integrity Monitor's
    /// background loop — never required for correctness, only to
    /// bound memory.
    pub fn sweep(&self) {
        let now = Instant::now();
        self.entries.retain(|_, entry| entry.expires_at >= now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_then_miss_after_expiry() {
        let cache = IdempotencyCache::new(Duration::from_millis(20));
        cache.insert(AccountId(1), "k1", TxId(7));
        assert_eq!(cache.get(AccountId(1), "k1"), Some(TxId(7)));
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(AccountId(1), "k1"), None);
    }

    #[test]
    fn distinct_accounts_do_not_collide() {
        let cache = IdempotencyCache::new(Duration::from_secs(60));
        cache.insert(AccountId(1), "k1", TxId(7));
        assert_eq!(cache.get(AccountId(2), "k1"), None);
    }
}
