//! # Canonical Codec
//!
//! Deterministic byte layout shared by both transaction shapes.
//!
//! A transaction is a flat, ordered list of byte strings encoded as one RLP
//! list. Two lists are derived from every transaction:
//!
//! ```text
//! unsigned: [ ..business fields.., chain_id, "", "" ]   -> Keccak-256 -> signed digest
//! signed:   [ ..business fields.., v, r, s ]            -> wire bytes
//! ```
//!
//! The two empty slots keep the unsigned list the same length as the signed
//! one. Integers are always minimal big-endian (zero is the empty string),
//! so the only difference between the lists is the trailing triple.

pub mod quantity;
pub mod rlp;

use thiserror::Error;

pub use quantity::Quantity;
pub use rlp::{decode_list, encode_list};

use crate::transaction::types::TxSignature;

/// Errors raised while parsing quantities or RLP payloads.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid quantity: {0:?}")]
    InvalidQuantity(String),

    #[error("malformed rlp: {0}")]
    Rlp(String),

    #[error("expected an rlp list at the top level")]
    ExpectedList,

    #[error("nested rlp lists are not part of the transaction format")]
    UnexpectedList,

    #[error("rlp length mismatch: declared {declared}, available {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("expected {expected} fields, got {actual}")]
    FieldCount { expected: usize, actual: usize },
}

/// Ordered field lists of a transaction shape.
///
/// Implementors provide their business fields, chain id and optional
/// signature; the unsigned and signed layouts are derived here so that both
/// shapes follow exactly the same rules.
pub trait CanonicalFields {
    /// Business fields in wire order, integers already minimal big-endian.
    fn business_fields(&self) -> Vec<Vec<u8>>;

    /// Network the transaction is bound to.
    fn chain_id(&self) -> &Quantity;

    /// Signature triple, present only on signed instances.
    fn signature(&self) -> Option<&TxSignature>;

    /// Business fields, then the chain id, then two empty placeholders.
    fn unsigned_fields(&self) -> Vec<Vec<u8>> {
        let mut fields = self.business_fields();
        fields.push(self.chain_id().to_be_bytes());
        fields.push(Vec::new());
        fields.push(Vec::new());
        fields
    }

    /// Business fields, then `v, r, s` (empty strings when unsigned).
    fn signed_fields(&self) -> Vec<Vec<u8>> {
        let mut fields = self.business_fields();
        match self.signature() {
            Some(sig) => {
                fields.push(sig.v.to_be_bytes());
                fields.push(sig.r.to_be_bytes());
                fields.push(sig.s.to_be_bytes());
            }
            None => fields.extend([Vec::new(), Vec::new(), Vec::new()]),
        }
        fields
    }

    /// RLP of [`unsigned_fields`](Self::unsigned_fields).
    fn encode_unsigned(&self) -> Vec<u8> {
        encode_list(&self.unsigned_fields())
    }

    /// RLP of [`signed_fields`](Self::signed_fields). These are the bytes
    /// transmitted on the wire.
    fn encode_signed(&self) -> Vec<u8> {
        encode_list(&self.signed_fields())
    }
}
