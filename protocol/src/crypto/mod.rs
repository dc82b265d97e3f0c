//! # Cryptographic Primitives
//!
//! The three primitives every Edge Matrix transaction depends on:
//!
//! - **Keccak-256** for signing digests and address derivation.
//! - **secp256k1 ECDSA** (recoverable, RFC 6979) for signatures.
//! - **20-byte addresses** derived from public keys.
//!
//! Everything here wraps audited implementations (`k256`, `sha3`). Nothing
//! in this module knows about transactions or the wire format.

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError};
pub use hash::{keccak256, keccak256_hex};
pub use keys::{recover_address, KeyError, PrivateKey, RecoverableSignature};
