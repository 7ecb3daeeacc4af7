//! Tokenization / envelope encryption (§4.11), grounded on the original's
//! `CryptoService` (`"v1:"`-prefixed versioned ciphertext) and
//! `domain/security/tokenization.py` (dedup-by-hash token issuance).
//!
//! Two distinct primitives live here, kept strictly separate per §9's
//! re-architecture guidance ("reversible ciphertext stored alongside a
//! hash — keep them separate; only the hash is indexed"):
//!
//! - `sha256_hex` — the non-reversible digest used for `User.cpf_hash`,
//!   indexed and compared for equality, never decrypted.
//! - `Vault` (`XChaCha20Poly1305`) — reversible encryption for
//!   `User.cpf_ciphertext`, decrypted only for audit/display.
//! - `InMemoryTokenVault` — the `TokenVault` trait's default implementation.

use std::sync::Mutex;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{XChaCha20Poly1305, XNonce};
use dashmap::DashMap;
use rand::RngCore;
use sha2::{Digest, Sha256};
use thiserror::Error;

use ledger_core::TokenVault;

const VERSION_PREFIX: &str = "v1:";
const NONCE_LEN: usize = 24;

#[derive(Debug, Error)]
pub enum VaultError {
    #[error("ciphertext missing version prefix")]
    MissingVersionPrefix,
    #[error("unsupported ciphertext version")]
    UnsupportedVersion,
    #[error("invalid base64 ciphertext: {0}")]
    InvalidBase64(String),
    #[error("ciphertext too short to contain a nonce")]
    Truncated,
    #[error("decryption failed (wrong key or tampered ciphertext)")]
    DecryptionFailed,
}

/// Non-reversible SHA-256 digest, hex-encoded. Used for `User.cpf_hash` and
/// as the dedup key for `InMemoryTokenVault`. Never compared against
/// anything decrypted from `Vault`.
pub fn sha256_hex(value: &str) -> String {
    hex::encode(Sha256::digest(value.as_bytes()))
}

/// Envelope-encrypts/decrypts reversible values (e.g. `User.cpf_ciphertext`)
/// under a single symmetric key. Output format: `"v1:" || base64(nonce ||
/// ciphertext)`, mirroring the original `CryptoService`'s versioned token.
pub struct Vault {
    cipher: XChaCha20Poly1305,
}

impl Vault {
    /// Build a vault from a 32-byte key (e.g. loaded from an envelope KMS in
    /// production; a fixed dev key for local running).
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: XChaCha20Poly1305::new(key.into()),
        }
    }

    /// Derive a deterministic dev-only key from a passphrase. Never used for
    /// anything but local running/tests — production keys come from a real
    /// envelope KMS, which is out of scope (§1 non-goals).
    pub fn from_dev_passphrase(passphrase: &str) -> Self {
        let digest = Sha256::digest(passphrase.as_bytes());
        let mut key = [0u8; 32];
        key.copy_from_slice(&digest);
        Self::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = XNonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| VaultError::DecryptionFailed)?;
        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);
        Ok(format!("{VERSION_PREFIX}{}", BASE64.encode(combined)))
    }

    pub fn decrypt(&self, token: &str) -> Result<String, VaultError> {
        let body = token
            .strip_prefix(VERSION_PREFIX)
            .ok_or(VaultError::MissingVersionPrefix)?;
        let combined = BASE64
            .decode(body)
            .map_err(|e| VaultError::InvalidBase64(e.to_string()))?;
        if combined.len() < NONCE_LEN {
            return Err(VaultError::Truncated);
        }
        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let nonce = XNonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| VaultError::DecryptionFailed)?;
        String::from_utf8(plaintext).map_err(|_| VaultError::DecryptionFailed)
    }
}

/// In-memory `TokenVault`: deduplicates by SHA-256 of the plaintext so
/// repeated tokenization of the same value returns the same opaque
/// `tok_<hex>` token, matching the original's dedup-by-hash tokenization
/// service.
pub struct InMemoryTokenVault {
    vault: Vault,
    /// plaintext hash -> token
    by_hash: DashMap<String, String>,
    /// token -> ciphertext
    by_token: DashMap<String, String>,
    counter: Mutex<u64>,
}

impl InMemoryTokenVault {
    pub fn new(vault: Vault) -> Self {
        Self {
            vault,
            by_hash: DashMap::new(),
            by_token: DashMap::new(),
            counter: Mutex::new(0),
        }
    }
}

impl TokenVault for InMemoryTokenVault {
    fn tokenize(&self, value: &str) -> String {
        let digest = sha256_hex(value);
        if let Some(existing) = self.by_hash.get(&digest) {
            return existing.clone();
        }
        let token = {
            let mut counter = self.counter.lock().expect("token vault mutex poisoned");
            *counter += 1;
            format!("tok_{digest_prefix}{counter:016x}", digest_prefix = &digest[..8])
        };
        let ciphertext = self
            .vault
            .encrypt(value)
            .expect("encrypting a UTF-8 string under a valid key is infallible");
        self.by_hash.insert(digest, token.clone());
        self.by_token.insert(token.clone(), ciphertext);
        token
    }

    fn detokenize(&self, token: &str) -> Option<String> {
        let ciphertext = self.by_token.get(token)?;
        self.vault.decrypt(&ciphertext).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encrypt_decrypt_round_trip() {
        let vault = Vault::from_dev_passphrase("test-passphrase");
        let token = vault.encrypt("12345678901").unwrap();
        assert!(token.starts_with(VERSION_PREFIX));
        assert_eq!(vault.decrypt(&token).unwrap(), "12345678901");
    }

    #[test]
    fn tampered_ciphertext_fails_to_decrypt() {
        let vault = Vault::from_dev_passphrase("test-passphrase");
        let mut token = vault.encrypt("12345678901").unwrap();
        token.push('x');
        assert!(vault.decrypt(&token).is_err());
    }

    #[test]
    fn tokenize_is_deterministic_for_same_plaintext() {
        let tv = InMemoryTokenVault::new(Vault::from_dev_passphrase("k"));
        let t1 = tv.tokenize("12345678901");
        let t2 = tv.tokenize("12345678901");
        assert_eq!(t1, t2);
    }

    #[test]
    fn detokenize_round_trip() {
        let tv = InMemoryTokenVault::new(Vault::from_dev_passphrase("k"));
        let token = tv.tokenize("98765432100");
        assert_eq!(tv.detokenize(&token).unwrap(), "98765432100");
    }

    #[test]
    fn hash_is_non_reversible_and_stable() {
        let h1 = sha256_hex("12345678901");
        let h2 = sha256_hex("12345678901");
        assert_eq!(h1, h2);
        assert_ne!(h1, "12345678901");
    }
}
