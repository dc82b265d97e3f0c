//! Arbitrary-precision unsigned integers with a canonical byte form.
//!
//! Every numeric transaction field (nonce, gas price, value, chain id, and
//! the signature components) is a [`Quantity`]. However a caller supplies
//! the value, as a `u64`, a big integer, big-endian bytes with leading
//! zeros, or a hex string, the result normalizes to the same integer and
//! therefore to the same encoded bytes.
//!
//! The canonical byte form is minimal big-endian: no leading zero bytes,
//! and zero itself is the empty byte string.

use std::fmt;

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Serialize, Serializer};

use super::CodecError;

/// An unsigned integer of arbitrary width.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Quantity(BigUint);

impl Quantity {
    /// The zero quantity. Encodes as an empty byte string.
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    /// Interprets big-endian bytes. Leading zeros are ignored and an empty
    /// slice is zero.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    /// Parses a `0x`-prefixed hex string.
    ///
    /// `""`, `"0x"` and `"0x0"` all parse to zero. Odd-length digit strings
    /// are accepted. A string without the prefix is rejected, because a bare
    /// `"10"` is ambiguous between decimal and hex. Only ASCII hex digits may
    /// follow the prefix.
    pub fn from_hex(text: &str) -> Result<Self, CodecError> {
        if text.is_empty() {
            return Ok(Self::zero());
        }
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .ok_or_else(|| CodecError::InvalidQuantity(text.to_string()))?;
        if digits.is_empty() {
            return Ok(Self::zero());
        }
        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CodecError::InvalidQuantity(text.to_string()));
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(Self)
            .ok_or_else(|| CodecError::InvalidQuantity(text.to_string()))
    }

    /// Parses a decimal digit string.
    pub fn from_decimal(text: &str) -> Result<Self, CodecError> {
        if !text.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CodecError::InvalidQuantity(text.to_string()));
        }
        BigUint::parse_bytes(text.as_bytes(), 10)
            .map(Self)
            .ok_or_else(|| CodecError::InvalidQuantity(text.to_string()))
    }

    /// Minimal big-endian bytes. Zero yields an empty vector.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        if self.0.is_zero() {
            Vec::new()
        } else {
            self.0.to_bytes_be()
        }
    }

    /// Big-endian bytes left-padded to `width`. Returns `None` if the value
    /// does not fit.
    pub fn to_be_bytes_padded(&self, width: usize) -> Option<Vec<u8>> {
        let minimal = self.to_be_bytes();
        if minimal.len() > width {
            return None;
        }
        let mut padded = vec![0u8; width - minimal.len()];
        padded.extend_from_slice(&minimal);
        Some(padded)
    }

    /// `0x`-prefixed lowercase hex without leading zeros (`"0x0"` for zero).
    pub fn to_hex(&self) -> String {
        format!("0x{}", self.0.to_str_radix(16))
    }

    /// Decimal string.
    pub fn to_decimal(&self) -> String {
        self.0.to_str_radix(10)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Borrow the underlying big integer.
    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Converts to `u64` when the value fits.
    pub fn to_u64(&self) -> Option<u64> {
        let digits = self.0.to_u64_digits();
        match digits.as_slice() {
            [] => Some(0),
            [single] => Some(*single),
            _ => None,
        }
    }
}

impl From<u64> for Quantity {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u32> for Quantity {
    fn from(value: u32) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for Quantity {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl From<Quantity> for BigUint {
    fn from(value: Quantity) -> Self {
        value.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Quantity({})", self.to_hex())
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
