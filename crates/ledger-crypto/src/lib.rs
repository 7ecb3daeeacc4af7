pub mod hash_chain;
pub mod vault;

pub use hash_chain::{canonical_tuple, record_hash};
pub use vault::{sha256_hex, InMemoryTokenVault, Vault, VaultError};
