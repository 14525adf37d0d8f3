//! Shared fixtures for unit tests.

use rsa::RsaPrivateKey;
use std::sync::OnceLock;

use crate::ledger::jwk::Jwk;
use crate::ledger::wallet::Wallet;

static TEST_KEY: OnceLock<RsaPrivateKey> = OnceLock::new();

/// A 1024-bit key, generated once per test binary.
pub fn test_private_key() -> &'static RsaPrivateKey {
    TEST_KEY.get_or_init(|| {
        RsaPrivateKey::new(&mut rand::thread_rng(), 1024).expect("test key generation")
    })
}

pub fn test_wallet() -> Wallet {
    Wallet::from_private_key(test_private_key().clone())
}

pub fn test_jwk_document() -> Vec<u8> {
    let jwk = Jwk::from_private_key(test_private_key()).expect("test key export");
    serde_json::to_vec(&jwk).expect("test key serialization")
}
