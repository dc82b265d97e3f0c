//! Transaction signing and signer recovery.
//!
//! Signing is a separate step from building: the builders produce unsigned
//! instances, and [`sign_fields`] computes the `{v, r, s}` triple for any
//! shape that implements [`CanonicalFields`].
//!
//! The signed digest is `keccak256(rlp(unsigned_fields))`. Because the
//! unsigned layout embeds the chain id, the same fields signed for two
//! different networks produce two different digests.

use crate::codec::CanonicalFields;
use crate::crypto::{keccak256, recover_address, Address, PrivateKey};

use super::error::TransactionError;
use super::types::TxSignature;

/// Keccak-256 of the unsigned RLP encoding. This is the digest the key signs.
pub fn message_hash<T: CanonicalFields + ?Sized>(tx: &T) -> [u8; 32] {
    keccak256(&tx.encode_unsigned())
}

/// Computes the signature triple of `tx` under `key`.
///
/// Signing is deterministic (RFC 6979 nonces, low-s normalized), so the
/// same fields and key always produce the same triple.
pub fn sign_fields<T: CanonicalFields + ?Sized>(
    tx: &T,
    key: &PrivateKey,
) -> Result<TxSignature, TransactionError> {
    let digest = message_hash(tx);
    let raw = key.sign_prehash(&digest)?;
    Ok(TxSignature::from_recoverable(&raw, tx.chain_id()))
}

/// Recovers the address that signed `tx`.
///
/// Fails if the transaction is unsigned, if `v` does not unfold to the
/// transaction's own chain id, or if the signature is not recoverable.
pub fn recover_signer<T: CanonicalFields + ?Sized>(tx: &T) -> Result<Address, TransactionError> {
    let signature = tx.signature().ok_or(TransactionError::MissingSignature)?;
    let (_, chain_id) = signature.recovery_parts().ok_or_else(|| {
        TransactionError::Recovery(format!("v={} is below the fold offset", signature.v))
    })?;
    if &chain_id != tx.chain_id() {
        return Err(TransactionError::ChainMismatch {
            expected: tx.chain_id().to_decimal(),
            actual: chain_id.to_decimal(),
        });
    }
    let raw = signature
        .to_recoverable()
        .ok_or_else(|| TransactionError::Recovery("r or s exceeds 32 bytes".to_string()))?;

    recover_address(&message_hash(tx), &raw)
        .map_err(|e| TransactionError::Recovery(e.to_string()))
}
