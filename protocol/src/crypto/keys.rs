//! # Key Management
//!
//! secp256k1 private keys, address derivation, and recoverable ECDSA.
//!
//! Everything here is a thin, typed wrapper around `k256`. Signing is
//! deterministic (RFC 6979), so the same key and digest always yield the
//! same `(recovery_id, r, s)`, and `s` is normalized to the lower half of
//! the curve order.
//!
//! ## Security considerations
//!
//! - Key bytes are never logged. `Debug` prints the derived address only.
//! - `PrivateKey` does not implement `Serialize`. Exporting key material
//!   should be a deliberate call to [`PrivateKey::to_hex`].

use std::fmt;
use std::str::FromStr;

use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use thiserror::Error;

use super::address::Address;
use crate::config::{HASH_OUTPUT_LENGTH, PRIVATE_KEY_LENGTH};

/// Errors that can occur during key operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("private key must be 32 bytes in length, got {0}")]
    InvalidLength(usize),

    #[error("private key is not valid hex")]
    InvalidHex,

    #[error("private key is not a valid secp256k1 scalar")]
    InvalidScalar,

    #[error("ecdsa signing failed")]
    SigningFailed,

    #[error("signature recovery failed: {0}")]
    RecoveryFailed(String),
}

/// Output of a recoverable ECDSA signature over a 32-byte digest.
///
/// `recovery_id` is the raw parity bit (0 or 1). Folding it together with
/// the chain id into the on-wire `v` happens in the transaction layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub recovery_id: u8,
    pub r: [u8; 32],
    pub s: [u8; 32],
}

/// A secp256k1 private key.
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Generate a fresh key from the OS cryptographic RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::random(&mut OsRng),
        }
    }

    /// Builds a key from raw bytes. The slice must be exactly 32 bytes and
    /// encode a non-zero scalar below the curve order.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != PRIVATE_KEY_LENGTH {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let signing_key = SigningKey::from_slice(bytes).map_err(|_| KeyError::InvalidScalar)?;
        Ok(Self { signing_key })
    }

    /// Parses a hex-encoded key, with or without the `0x` prefix.
    pub fn from_hex(hex_str: &str) -> Result<Self, KeyError> {
        let stripped = hex_str.strip_prefix("0x").unwrap_or(hex_str);
        let bytes = hex::decode(stripped).map_err(|_| KeyError::InvalidHex)?;
        Self::from_slice(&bytes)
    }

    /// Exports the raw 32-byte scalar.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_LENGTH] {
        self.signing_key.to_bytes().into()
    }

    /// Exports the key as `0x`-prefixed hex.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.to_bytes()))
    }

    /// Address of the matching public key.
    pub fn address(&self) -> Address {
        address_of(self.signing_key.verifying_key())
    }

    /// Signs a 32-byte digest, returning the recoverable signature parts.
    pub fn sign_prehash(
        &self,
        digest: &[u8; HASH_OUTPUT_LENGTH],
    ) -> Result<RecoverableSignature, KeyError> {
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(digest)
            .map_err(|_| KeyError::SigningFailed)?;

        let bytes = signature.to_bytes();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&bytes[..32]);
        s.copy_from_slice(&bytes[32..]);

        Ok(RecoverableSignature {
            recovery_id: recovery_id.to_byte(),
            r,
            s,
        })
    }
}

impl FromStr for PrivateKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Clone for PrivateKey {
    fn clone(&self) -> Self {
        Self {
            signing_key: self.signing_key.clone(),
        }
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrivateKey(address={})", self.address())
    }
}

/// Recovers the signer address from a digest and signature parts.
pub fn recover_address(
    digest: &[u8; HASH_OUTPUT_LENGTH],
    signature: &RecoverableSignature,
) -> Result<Address, KeyError> {
    let mut compact = [0u8; 64];
    compact[..32].copy_from_slice(&signature.r);
    compact[32..].copy_from_slice(&signature.s);

    let parsed =
        Signature::from_slice(&compact).map_err(|e| KeyError::RecoveryFailed(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(signature.recovery_id).ok_or_else(|| {
        KeyError::RecoveryFailed(format!("invalid recovery id {}", signature.recovery_id))
    })?;
    let verifying_key = VerifyingKey::recover_from_prehash(digest, &parsed, recovery_id)
        .map_err(|e| KeyError::RecoveryFailed(e.to_string()))?;

    Ok(address_of(&verifying_key))
}

fn address_of(verifying_key: &VerifyingKey) -> Address {
    let point = verifying_key.to_encoded_point(false);
    // Skip the 0x04 uncompressed tag.
    Address::from_public_key_payload(&point.as_bytes()[1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::hash::keccak256;

    fn key_one() -> PrivateKey {
        PrivateKey::from_hex("0x0000000000000000000000000000000000000000000000000000000000000001")
            .unwrap()
    }

    #[test]
    fn address_of_key_one() {
        assert_eq!(
            key_one().address().to_hex(),
            "0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"
        );
    }

    #[test]
    fn address_of_known_key() {
        let key = PrivateKey::from_hex(
            "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318",
        )
        .unwrap();
        assert_eq!(
            key.address().to_checksum(),
            "0x2c7536E3605D9C16a7a3D7b1898e529396a65c23"
        );
    }

    #[test]
    fn rejects_short_key() {
        assert_eq!(
            PrivateKey::from_slice(&[1u8; 31]).unwrap_err(),
            KeyError::InvalidLength(31)
        );
    }

    #[test]
    fn rejects_zero_scalar() {
        assert_eq!(
            PrivateKey::from_slice(&[0u8; 32]).unwrap_err(),
            KeyError::InvalidScalar
        );
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!(PrivateKey::from_hex("0xnothex").unwrap_err(), KeyError::InvalidHex);
    }

    #[test]
    fn hex_round_trip() {
        let key = PrivateKey::generate();
        let restored = PrivateKey::from_hex(&key.to_hex()).unwrap();
        assert_eq!(key.to_bytes(), restored.to_bytes());
        assert_eq!(key.address(), restored.address());
    }

    #[test]
    fn signing_is_deterministic() {
        let key = key_one();
        let digest = keccak256(b"deterministic");
        assert_eq!(
            key.sign_prehash(&digest).unwrap(),
            key.sign_prehash(&digest).unwrap()
        );
    }

    #[test]
    fn recovery_returns_signer() {
        let key = PrivateKey::generate();
        let digest = keccak256(b"recover me");
        let sig = key.sign_prehash(&digest).unwrap();
        assert!(sig.recovery_id <= 1);
        assert_eq!(recover_address(&digest, &sig).unwrap(), key.address());
    }

    #[test]
    fn flipped_recovery_id_recovers_someone_else() {
        let key = PrivateKey::generate();
        let digest = keccak256(b"forged parity");
        let mut sig = key.sign_prehash(&digest).unwrap();
        sig.recovery_id ^= 1;
        let recovered = recover_address(&digest, &sig);
        assert!(recovered.map(|a| a != key.address()).unwrap_or(true));
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let key = key_one();
        let debug = format!("{:?}", key);
        assert!(debug.contains("0x7e5f4552091a69125d5dfcb7b8c2659029395bdf"));
        assert!(!debug.contains(&key.to_hex()[2..]));
    }
}
