//! Wallet key material and RSA-PSS signing.
//!
//! # Security
//! - Private key material is never logged or printed through `Debug`
//! - The wallet is immutable after load and safe to share between uploads

use rsa::pss::Pss;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use std::path::Path;

use crate::ledger::encoding::{b64_encode, biguint_bytes};
use crate::ledger::jwk::Jwk;
use crate::ledger::types::{LedgerError, LedgerResult};

/// Key size used for newly generated wallets.
pub const DEFAULT_KEY_BITS: usize = 4096;

const SHA256_LEN: usize = 32;

/// RSA-PSS parameters: MGF1 with SHA-256 and a fixed salt length.
///
/// Signer and verifier must agree on the salt length, so it is derived once
/// from the modulus and carried alongside the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PssOptions {
    salt_len: usize,
}

impl PssOptions {
    /// The largest salt the encoding allows for this modulus.
    pub fn max_salt_for(modulus: &BigUint) -> Self {
        let em_bits = modulus.bits().saturating_sub(1);
        let em_len = em_bits.div_ceil(8);
        Self {
            salt_len: em_len.saturating_sub(SHA256_LEN + 2),
        }
    }

    pub fn salt_len(&self) -> usize {
        self.salt_len
    }

    fn scheme(&self) -> Pss {
        Pss::new_with_salt::<Sha256>(self.salt_len)
    }
}

/// Sign a SHA-256 digest.
pub fn sign_pss(key: &RsaPrivateKey, options: PssOptions, digest: &[u8]) -> LedgerResult<Vec<u8>> {
    key.sign_with_rng(&mut rand::thread_rng(), options.scheme(), digest)
        .map_err(|e| LedgerError::Signing(e.to_string()))
}

/// Verify a signature over a SHA-256 digest.
pub fn verify_pss(
    key: &RsaPublicKey,
    options: PssOptions,
    digest: &[u8],
    signature: &[u8],
) -> LedgerResult<()> {
    key.verify(options.scheme(), digest, signature)
        .map_err(|e| LedgerError::InvalidSignature(e.to_string()))
}

/// Address of an account: SHA-256 of the modulus bytes, URL-safe base64.
pub fn address_of(modulus: &BigUint) -> String {
    b64_encode(&Sha256::digest(biguint_bytes(modulus)))
}

/// An account key loaded from a JWK document.
#[derive(Clone)]
pub struct Wallet {
    public_key: RsaPublicKey,
    private_key: Option<RsaPrivateKey>,
    address: String,
    pss: PssOptions,
}

impl Wallet {
    /// Load a wallet from the bytes of a JWK document.
    pub fn from_jwk(document: &[u8]) -> LedgerResult<Self> {
        let components = Jwk::parse(document)?.components()?;
        let public_key = components.public_key()?;
        let private_key = components.private_key()?;
        Ok(Self::assemble(public_key, private_key))
    }

    /// Load a wallet from a JWK file on disk.
    pub fn from_file(path: &Path) -> LedgerResult<Self> {
        let document = std::fs::read(path).map_err(|source| LedgerError::WalletFile {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_jwk(&document)
    }

    /// Wrap an existing private key.
    pub fn from_private_key(key: RsaPrivateKey) -> Self {
        let public_key = key.to_public_key();
        Self::assemble(public_key, Some(key))
    }

    /// Generate a fresh key pair.
    pub fn generate(bits: usize) -> LedgerResult<Self> {
        let key = RsaPrivateKey::new(&mut rand::thread_rng(), bits)
            .map_err(|e| LedgerError::KeyFormat(format!("Key generation failed: {}", e)))?;
        Ok(Self::from_private_key(key))
    }

    fn assemble(public_key: RsaPublicKey, private_key: Option<RsaPrivateKey>) -> Self {
        let address = address_of(public_key.n());
        let pss = PssOptions::max_salt_for(public_key.n());

        tracing::debug!(
            address = %address,
            key_bits = public_key.n().bits(),
            private = private_key.is_some(),
            "Wallet loaded"
        );

        Self {
            public_key,
            private_key,
            address,
            pss,
        }
    }

    /// The wallet's address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The public modulus, used as a transaction's owner.
    pub fn owner(&self) -> &BigUint {
        self.public_key.n()
    }

    /// The public modulus as it appears in the `owner` wire field.
    pub fn public_key_b64(&self) -> String {
        b64_encode(&biguint_bytes(self.owner()))
    }

    pub fn public_key(&self) -> &RsaPublicKey {
        &self.public_key
    }

    pub fn has_private_key(&self) -> bool {
        self.private_key.is_some()
    }

    pub fn pss_options(&self) -> PssOptions {
        self.pss
    }

    /// Sign a SHA-256 digest.
    pub fn sign(&self, digest: &[u8]) -> LedgerResult<Vec<u8>> {
        let key = self
            .private_key
            .as_ref()
            .ok_or(LedgerError::MissingPrivateKey)?;
        sign_pss(key, self.pss, digest)
    }

    /// Verify a signature over a SHA-256 digest.
    pub fn verify(&self, digest: &[u8], signature: &[u8]) -> LedgerResult<()> {
        verify_pss(&self.public_key, self.pss, digest, signature)
    }

    /// Export as a JWK, including private members when present.
    pub fn to_jwk(&self) -> LedgerResult<Jwk> {
        match &self.private_key {
            Some(key) => Jwk::from_private_key(key),
            None => Ok(Jwk::from_public_key(&self.public_key)),
        }
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("address", &self.address)
            .field("key_bits", &self.public_key.n().bits())
            .field("private", &self.private_key.is_some())
            .finish()
    }
}
