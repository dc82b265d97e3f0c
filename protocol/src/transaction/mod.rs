//! # Transaction Module
//!
//! Construction, signing, serialization and decoding of the two Edge Matrix
//! transaction shapes.
//!
//! ## Architecture
//!
//! ```text
//! types.rs    - TxSignature ({v, r, s}) and its display form
//! legacy.rs   - LegacyTransaction (telegrams, subject registration)
//! message.rs  - Transaction (subject/application/content messages)
//! signing.rs  - message hash, signing and signer recovery over CanonicalFields
//! error.rs    - TransactionError
//! ```
//!
//! ## Lifecycle
//!
//! 1. **Build** with [`LegacyTransaction::builder`] or [`Transaction::builder`].
//! 2. **Sign** with `sign` / `sign_with`, which return a new signed value.
//! 3. **Serialize** with `serialize` / `to_hex` and submit the hex payload.
//!
//! Both shapes are immutable once built. Nothing in this module performs
//! I/O; all failures are reported synchronously as [`TransactionError`].

pub mod error;
pub mod legacy;
pub mod message;
pub mod signing;
pub mod types;

pub use error::TransactionError;
pub use legacy::{LegacyTransaction, LegacyTransactionBuilder, LegacyTransactionDisplay};
pub use message::{normalize_subject, Transaction, TransactionBuilder, TransactionDisplay};
pub use signing::{message_hash, recover_signer, sign_fields};
pub use types::{SignatureDisplay, TxSignature};
