//! Error types for transaction construction, signing and decoding.

use thiserror::Error;

use crate::codec::CodecError;
use crate::crypto::KeyError;

/// Errors raised by the transaction model.
///
/// All of these are synchronous: they surface before anything touches the
/// network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
    /// A required field is missing or a supplied value is malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The private key is not 32 bytes or not a valid scalar.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// The wire payload could not be parsed.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// An operation needed a signature and the transaction has none.
    #[error("transaction is unsigned")]
    MissingSignature,

    /// The wire `v, r, s` fields hold only part of a signature.
    #[error("malformed signature: {0}")]
    MalformedSignature(&'static str),

    /// `v` does not unfold to the chain id the transaction claims.
    #[error("signature is bound to chain {actual}, expected {expected}")]
    ChainMismatch { expected: String, actual: String },

    /// The signer's public key could not be recovered.
    #[error("signer recovery failed: {0}")]
    Recovery(String),
}
