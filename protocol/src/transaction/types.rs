//! Value types shared by both transaction shapes.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;

use crate::codec::Quantity;
use crate::config::V_OFFSET;
use crate::crypto::RecoverableSignature;

use super::error::TransactionError;

// ---------------------------------------------------------------------------
// TxSignature
// ---------------------------------------------------------------------------

/// The `{v, r, s}` triple carried by a signed transaction.
///
/// The three components only ever exist together: a transaction holds an
/// `Option<TxSignature>`, so a partially signed state is unrepresentable.
///
/// `v` binds the signature to one network:
///
/// ```text
/// v = recovery_id + chain_id * 2 + 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TxSignature {
    pub v: Quantity,
    pub r: Quantity,
    pub s: Quantity,
}

impl TxSignature {
    /// Folds a raw recoverable signature and a chain id into `{v, r, s}`.
    pub fn from_recoverable(raw: &RecoverableSignature, chain_id: &Quantity) -> Self {
        let v = BigUint::from(raw.recovery_id)
            + chain_id.as_biguint() * 2u32
            + BigUint::from(V_OFFSET);
        Self {
            v: Quantity::from(v),
            r: Quantity::from_be_bytes(&raw.r),
            s: Quantity::from_be_bytes(&raw.s),
        }
    }

    /// Unfolds `v` into `(recovery_id, chain_id)`.
    ///
    /// Returns `None` when `v` is below the fold offset and therefore cannot
    /// have been produced by this protocol.
    pub fn recovery_parts(&self) -> Option<(u8, Quantity)> {
        let v = self.v.as_biguint();
        let offset = BigUint::from(V_OFFSET);
        if v < &offset {
            return None;
        }
        let folded = v - &offset;
        let recovery_id = if (&folded % 2u32).is_zero() { 0 } else { 1 };
        let chain_id = folded >> 1usize;
        Some((recovery_id, Quantity::from(chain_id)))
    }

    /// Rebuilds the raw signature parts for public key recovery.
    pub fn to_recoverable(&self) -> Option<RecoverableSignature> {
        let (recovery_id, _) = self.recovery_parts()?;
        let r: [u8; 32] = self.r.to_be_bytes_padded(32)?.try_into().ok()?;
        let s: [u8; 32] = self.s.to_be_bytes_padded(32)?.try_into().ok()?;
        Some(RecoverableSignature { recovery_id, r, s })
    }

    /// Parses the trailing `v, r, s` wire fields.
    ///
    /// All three empty means the transaction is unsigned. Otherwise all three
    /// must be present and `r`, `s` must be non-zero.
    pub(crate) fn from_wire(
        v: &[u8],
        r: &[u8],
        s: &[u8],
    ) -> Result<Option<Self>, TransactionError> {
        if v.is_empty() && r.is_empty() && s.is_empty() {
            return Ok(None);
        }
        if v.is_empty() || r.is_empty() || s.is_empty() {
            return Err(TransactionError::MalformedSignature("v, r and s must all be present"));
        }
        let sig = Self {
            v: Quantity::from_be_bytes(v),
            r: Quantity::from_be_bytes(r),
            s: Quantity::from_be_bytes(s),
        };
        if sig.r.is_zero() || sig.s.is_zero() {
            return Err(TransactionError::MalformedSignature("r and s must be non-zero"));
        }
        Ok(Some(sig))
    }
}

// ---------------------------------------------------------------------------
// SignatureDisplay
// ---------------------------------------------------------------------------

/// Signature components rendered as decimal strings for logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignatureDisplay {
    pub v: String,
    pub r: String,
    pub s: String,
}

impl From<&TxSignature> for SignatureDisplay {
    fn from(sig: &TxSignature) -> Self {
        Self {
            v: sig.v.to_decimal(),
            r: sig.r.to_decimal(),
            s: sig.s.to_decimal(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
