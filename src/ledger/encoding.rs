//! URL-safe base64 without padding, used for every binary wire field.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rsa::BigUint;

pub fn b64_encode(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn b64_decode(text: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(text)
}

/// Big-endian bytes of `n` with no leading zeros; zero encodes as no bytes.
pub fn biguint_bytes(n: &BigUint) -> Vec<u8> {
    if n.bits() == 0 {
        return Vec::new();
    }
    n.to_bytes_be()
}
