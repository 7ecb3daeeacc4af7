//! ledger-genesis
//!
//! Bootstraps a fresh store on first run: provisions the reserved
//! treasury account (`account_number = "0000-0"`), the counterparty for
//! every deposit and withdrawal's paired posting. Idempotent — safe to
//! call on every node startup; a second call is simply a no-op rather
//! than a panic.
//!
//! This ledger has no fixed token supply to mint or verify — the
//! treasury absorbs whatever flows in or out of the bank through
//! deposits and withdrawals — so genesis has no supply invariant to
//! check, just the one account to provision.

pub mod params;

pub use params::GenesisParams;

use ledger_core::{Account, LedgerError};
use ledger_store::LedgerStore;
use tracing::info;

/// Ensure the treasury account exists. Returns the existing account if
/// genesis already ran, or the newly created one otherwise.
pub fn apply_genesis(store: &LedgerStore, _params: &GenesisParams) -> Result<Account, LedgerError> {
    if let Some(existing) = store.find_treasury_account()? {
        info!(account_id = existing.id.0, "genesis: treasury account already present");
        return Ok(existing);
    }

    let id = store.next_account_id()?;
    let created = store.create_account(Account::new_treasury(id))?;
    info!(account_id = created.id.0, "genesis: treasury account created");
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_is_idempotent() {
        let store = LedgerStore::open_temporary().unwrap();
        let params = GenesisParams::default();

        let first = apply_genesis(&store, &params).unwrap();
        let second = apply_genesis(&store, &params).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(second.account_number, Account::TREASURY_ACCOUNT_NUMBER);
    }
}
