//! Token revocation list.
//!
//! `DashMap<String, i64>` (jti → expiry unix seconds). A lookup for an
//! expired entry is treated as "not revoked" and lazily removed; `is_revoked`
//! never blocks and never fails, so the hot path (every authenticated
//! request) has nothing to fall back on — there is no outage mode to design
//! for.

use dashmap::DashMap;

pub struct RevocationList {
    entries: DashMap<String, i64>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Revoke `jti` until `expires_at` (unix seconds) — normally the
    /// token's own `exp` claim, so the entry never outlives the token it
    /// guards.
    pub fn revoke(&self, jti: &str, expires_at: i64) {
        self.entries.insert(jti.to_string(), expires_at);
    }

    pub fn is_revoked(&self, jti: &str, now: i64) -> bool {
        let expiry = match self.entries.get(jti) {
            Some(guard) => *guard,
            None => return false,
        };
        if expiry > now {
            return true;
        }
        self.entries.remove(jti);
        false
    }

    /// Drop expired entries. Called periodically by the Integrity Monitor's
    /// background loop, purely to bound memory.
    pub fn sweep(&self, now: i64) {
        self.entries.retain(|_, expiry| *expiry > now);
    }
}

impl Default for RevocationList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revoked_token_is_reported_until_expiry() {
        let list = RevocationList::new();
        list.revoke("jti-1", 100);
        assert!(list.is_revoked("jti-1", 50));
        assert!(!list.is_revoked("jti-1", 150));
    }

    #[test]
    fn unknown_jti_is_not_revoked() {
        let list = RevocationList::new();
        assert!(!list.is_revoked("unknown", 0));
    }
}
