//! # Hashing Utilities
//!
//! Edge Matrix uses exactly one hash function: Keccak-256, the pre-standard
//! SHA-3 variant that Ethereum made famous. It hashes the canonical signing
//! payload of every transaction and derives addresses from public keys.
//!
//! Note that this is *not* NIST SHA3-256. The padding differs, so the
//! digests differ. If a test vector disagrees, check that first.

use sha3::{Digest, Keccak256};

use crate::config::HASH_OUTPUT_LENGTH;

/// Compute the Keccak-256 digest of the input.
///
/// # Example
///
/// ```
/// use edgematrix_protocol::crypto::keccak256;
///
/// let digest = keccak256(b"");
/// assert_eq!(
///     hex::encode(digest),
///     "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
/// );
/// ```
pub fn keccak256(data: &[u8]) -> [u8; HASH_OUTPUT_LENGTH] {
    Keccak256::digest(data).into()
}

/// Keccak-256 rendered as a `0x`-prefixed lowercase hex string.
pub fn keccak256_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(keccak256(data)))
}
