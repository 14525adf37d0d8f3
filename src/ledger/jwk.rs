//! Minimal RSA JSON Web Key codec.
//!
//! Only the RSA members are understood: `n`, `e` and, for private keys,
//! `d` plus the optional CRT parameters `p`, `q`, `dp`, `dq`, `qi`.
//! Anything else in the document is ignored.

use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::{BigUint, RsaPrivateKey, RsaPublicKey};
use serde::{Deserialize, Serialize};

use crate::ledger::encoding::{b64_decode, b64_encode, biguint_bytes};
use crate::ledger::types::{LedgerError, LedgerResult};

/// RSA key in JWK form, values URL-safe base64 encoded.
#[derive(Clone, Deserialize, Serialize)]
pub struct Jwk {
    pub kty: String,
    pub n: String,
    pub e: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub d: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub p: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dq: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi: Option<String>,
}

/// Decoded integers of an RSA JWK.
#[derive(Clone)]
pub struct RsaComponents {
    pub n: BigUint,
    pub e: BigUint,
    pub private: Option<PrivateComponents>,
}

/// Private exponent and CRT parameters.
#[derive(Clone)]
pub struct PrivateComponents {
    pub d: BigUint,
    pub p: Option<BigUint>,
    pub q: Option<BigUint>,
    pub dp: Option<BigUint>,
    pub dq: Option<BigUint>,
    pub qi: Option<BigUint>,
}

impl Jwk {
    /// Parse a JWK document.
    pub fn parse(document: &[u8]) -> LedgerResult<Self> {
        let jwk: Jwk = serde_json::from_slice(document)
            .map_err(|e| LedgerError::KeyFormat(format!("Invalid JWK document: {}", e)))?;
        if jwk.kty != "RSA" {
            return Err(LedgerError::KeyFormat(format!(
                "Unsupported key type '{}', expected RSA",
                jwk.kty
            )));
        }
        Ok(jwk)
    }

    /// Public half of a key.
    pub fn from_public_key(key: &RsaPublicKey) -> Self {
        Self {
            kty: "RSA".to_string(),
            n: b64_encode(&biguint_bytes(key.n())),
            e: b64_encode(&biguint_bytes(key.e())),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
        }
    }

    /// Full private key including CRT parameters.
    pub fn from_private_key(key: &RsaPrivateKey) -> LedgerResult<Self> {
        let primes = key.primes();
        if primes.len() != 2 {
            return Err(LedgerError::KeyFormat(format!(
                "Expected a two-prime key, got {} primes",
                primes.len()
            )));
        }
        let (p, q) = (&primes[0], &primes[1]);
        let one = BigUint::from(1u8);
        let dp = key.d() % (p - &one);
        let dq = key.d() % (q - &one);
        let qi = key
            .crt_coefficient()
            .ok_or_else(|| LedgerError::KeyFormat("Key has no CRT coefficient".to_string()))?;

        let encode = |n: &BigUint| Some(b64_encode(&biguint_bytes(n)));
        Ok(Self {
            d: encode(key.d()),
            p: encode(p),
            q: encode(q),
            dp: encode(&dp),
            dq: encode(&dq),
            qi: encode(&qi),
            ..Self::from_public_key(&key.to_public_key())
        })
    }

    /// Decode every present member into integers.
    pub fn components(&self) -> LedgerResult<RsaComponents> {
        let n = decode_uint("n", &self.n)?;
        let e = decode_uint("e", &self.e)?;
        let private = match &self.d {
            None => None,
            Some(d) => Some(PrivateComponents {
                d: decode_uint("d", d)?,
                p: decode_optional("p", &self.p)?,
                q: decode_optional("q", &self.q)?,
                dp: decode_optional("dp", &self.dp)?,
                dq: decode_optional("dq", &self.dq)?,
                qi: decode_optional("qi", &self.qi)?,
            }),
        };
        Ok(RsaComponents { n, e, private })
    }
}

impl std::fmt::Debug for Jwk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Jwk")
            .field("kty", &self.kty)
            .field("n", &self.n)
            .field("e", &self.e)
            .field("private", &self.d.is_some())
            .finish()
    }
}

impl RsaComponents {
    pub fn public_key(&self) -> LedgerResult<RsaPublicKey> {
        RsaPublicKey::new(self.n.clone(), self.e.clone())
            .map_err(|e| LedgerError::KeyFormat(format!("Invalid RSA public key: {}", e)))
    }

    /// Rebuild the private key, or `None` for a public-only JWK.
    pub fn private_key(&self) -> LedgerResult<Option<RsaPrivateKey>> {
        let Some(private) = &self.private else {
            return Ok(None);
        };

        let primes = match (&private.p, &private.q) {
            (Some(p), Some(q)) => vec![p.clone(), q.clone()],
            (None, None) => Vec::new(),
            _ => {
                return Err(LedgerError::KeyFormat(
                    "JWK must carry both 'p' and 'q' or neither".to_string(),
                ))
            }
        };

        let key = RsaPrivateKey::from_components(
            self.n.clone(),
            self.e.clone(),
            private.d.clone(),
            primes,
        )
        .map_err(|e| LedgerError::KeyFormat(format!("Invalid RSA private key: {}", e)))?;
        key.validate()
            .map_err(|e| LedgerError::KeyFormat(format!("Inconsistent RSA private key: {}", e)))?;

        check_crt(&key, private)?;
        Ok(Some(key))
    }
}

/// Supplied CRT parameters must match the ones implied by `d`, `p`, `q`.
fn check_crt(key: &RsaPrivateKey, private: &PrivateComponents) -> LedgerResult<()> {
    let primes = key.primes();
    if primes.len() != 2 {
        return Ok(());
    }
    let one = BigUint::from(1u8);
    let expected = [
        ("dp", &private.dp, Some(key.d() % (&primes[0] - &one))),
        ("dq", &private.dq, Some(key.d() % (&primes[1] - &one))),
        ("qi", &private.qi, key.crt_coefficient()),
    ];
    for (name, supplied, derived) in expected {
        if let (Some(supplied), Some(derived)) = (supplied, derived) {
            if *supplied != derived {
                return Err(LedgerError::KeyFormat(format!(
                    "CRT parameter '{}' does not match the private key",
                    name
                )));
            }
        }
    }
    Ok(())
}

fn decode_uint(name: &str, value: &str) -> LedgerResult<BigUint> {
    let bytes = b64_decode(value)
        .map_err(|e| LedgerError::KeyFormat(format!("JWK member '{}': {}", name, e)))?;
    if bytes.is_empty() {
        return Err(LedgerError::KeyFormat(format!(
            "JWK member '{}' is empty",
            name
        )));
    }
    Ok(BigUint::from_bytes_be(&bytes))
}

fn decode_optional(name: &str, value: &Option<String>) -> LedgerResult<Option<BigUint>> {
    value.as_deref().map(|v| decode_uint(name, v)).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::testutil::test_private_key;

    #[test]
    fn test_private_key_round_trip() {
        let key = test_private_key();
        let jwk = Jwk::from_private_key(key).unwrap();
        let document = serde_json::to_vec(&jwk).unwrap();

        let parsed = Jwk::parse(&document).unwrap();
        let components = parsed.components().unwrap();
        let restored = components.private_key().unwrap().unwrap();
        assert_eq!(restored.n(), key.n());
        assert_eq!(restored.d(), key.d());
    }

    #[test]
    fn test_public_only_document() {
        let jwk = Jwk::from_public_key(&test_private_key().to_public_key());
        let document = serde_json::to_vec(&jwk).unwrap();
        assert!(!String::from_utf8_lossy(&document).contains("\"d\""));

        let components = Jwk::parse(&document).unwrap().components().unwrap();
        assert!(components.private.is_none());
        assert!(components.private_key().unwrap().is_none());
        assert!(components.public_key().is_ok());
    }

    #[test]
    fn test_rejects_non_json() {
        let err = Jwk::parse(b"not json").unwrap_err();
        assert!(matches!(err, LedgerError::KeyFormat(_)));
    }

    #[test]
    fn test_rejects_missing_modulus() {
        let err = Jwk::parse(br#"{"kty":"RSA","e":"AQAB"}"#).unwrap_err();
        assert!(matches!(err, LedgerError::KeyFormat(_)));
    }

    #[test]
    fn test_rejects_non_rsa() {
        let err = Jwk::parse(br#"{"kty":"OKP","n":"AQAB","e":"AQAB"}"#).unwrap_err();
        assert!(err.to_string().contains("OKP"));
    }

    #[test]
    fn test_rejects_mismatched_crt() {
        let mut jwk = Jwk::from_private_key(test_private_key()).unwrap();
        jwk.dp = jwk.dq.clone();
        let err = jwk.components().unwrap().private_key().unwrap_err();
        assert!(err.to_string().contains("dp"));
    }

    #[test]
    fn test_rejects_single_prime() {
        let mut jwk = Jwk::from_private_key(test_private_key()).unwrap();
        jwk.q = None;
        assert!(jwk.components().unwrap().private_key().is_err());
    }

    #[test]
    fn test_debug_hides_private_exponent() {
        let jwk = Jwk::from_private_key(test_private_key()).unwrap();
        let rendered = format!("{:?}", jwk);
        assert!(!rendered.contains(jwk.d.as_deref().unwrap()));
    }
}
