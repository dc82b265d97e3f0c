//! 20-byte account addresses.
//!
//! An address is the trailing 20 bytes of the Keccak-256 digest of an
//! uncompressed secp256k1 public key (without the `0x04` tag). Equality is
//! byte-wise; the textual form is always `0x` followed by lowercase hex,
//! which is what the network compares against. The EIP-55 mixed-case form
//! is available through [`Address::to_checksum`] for display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

use super::hash::keccak256;
use crate::config::ADDRESS_LENGTH;

/// Errors produced while parsing an address from text or bytes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("address must be {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("address is not valid hex: {0}")]
    InvalidHex(String),
}

/// A 20-byte Edge Matrix account address.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Message transactions default their recipient
    /// to this value.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    /// Wraps raw address bytes.
    pub const fn new(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Builds an address from a byte slice of exactly 20 bytes.
    pub fn from_slice(slice: &[u8]) -> Result<Self, AddressError> {
        let bytes: [u8; ADDRESS_LENGTH] =
            slice.try_into().map_err(|_| AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                actual: slice.len(),
            })?;
        Ok(Self(bytes))
    }

    /// Derives the address of an uncompressed SEC1 public key payload
    /// (64 bytes, `x || y`, without the leading `0x04`).
    pub fn from_public_key_payload(payload: &[u8]) -> Self {
        let digest = keccak256(payload);
        let mut bytes = [0u8; ADDRESS_LENGTH];
        bytes.copy_from_slice(&digest[digest.len() - ADDRESS_LENGTH..]);
        Self(bytes)
    }

    /// Raw address bytes.
    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    /// Returns `true` for the all-zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; ADDRESS_LENGTH]
    }

    /// Lowercase `0x`-prefixed hex form.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case checksum form.
    ///
    /// Each hex letter is uppercased when the matching nibble of
    /// `keccak256(lowercase_hex)` is 8 or greater.
    pub fn to_checksum(&self) -> String {
        let lower = hex::encode(self.0);
        let digest = keccak256(lower.as_bytes());

        let mut out = String::with_capacity(2 + lower.len());
        out.push_str("0x");
        for (i, c) in lower.chars().enumerate() {
            let byte = digest[i / 2];
            let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0f };
            if c.is_ascii_alphabetic() && nibble >= 8 {
                out.push(c.to_ascii_uppercase());
            } else {
                out.push(c);
            }
        }
        out
    }

    /// Case-insensitive comparison against a textual address, as used when
    /// matching the `From` field of stream frames.
    pub fn matches_str(&self, candidate: &str) -> bool {
        candidate.eq_ignore_ascii_case(&self.to_hex())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    /// Accepts 40 hex digits with or without a `0x` prefix, in any case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        let bytes = hex::decode(stripped).map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        Self::from_slice(&bytes)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self)
    }
}

impl From<[u8; ADDRESS_LENGTH]> for Address {
    fn from(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
