//! Message transactions.
//!
//! A message [`Transaction`] publishes `content` for an `application` under
//! a `subject`. Wire layout:
//!
//! ```text
//! [subject, application, content, to, v, r, s]
//! ```
//!
//! Unlike the legacy shape, `to` is always present: an omitted recipient is
//! the all-zero address.

use serde::Serialize;

use crate::codec::{decode_list, CanonicalFields, CodecError, Quantity};
use crate::config::ADDRESS_LENGTH;
use crate::crypto::{Address, PrivateKey};

use super::error::TransactionError;
use super::signing;
use super::types::{SignatureDisplay, TxSignature};

const FIELD_COUNT: usize = 7;

/// Normalizes a textual subject to an even-length `0x`-prefixed string.
///
/// `"abc"` and `"0xabc"` both become `"0x0abc"`. The digits are not
/// validated; the normalized text is what gets encoded.
pub fn normalize_subject(subject: &str) -> String {
    let digits = subject.strip_prefix("0x").unwrap_or(subject);
    if digits.len() % 2 == 1 {
        format!("0x0{digits}")
    } else {
        format!("0x{digits}")
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// An immutable message transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    subject: Vec<u8>,
    application: Vec<u8>,
    content: Vec<u8>,
    to: Address,
    chain_id: Quantity,
    signature: Option<TxSignature>,
}

impl Transaction {
    pub fn builder() -> TransactionBuilder {
        TransactionBuilder::default()
    }

    pub fn subject(&self) -> &[u8] {
        &self.subject
    }

    pub fn application(&self) -> &[u8] {
        &self.application
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn to(&self) -> &Address {
        &self.to
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signs with a raw 32-byte private key.
    pub fn sign(&self, private_key: &[u8]) -> Result<Self, TransactionError> {
        let key = PrivateKey::from_slice(private_key)?;
        self.sign_with(&key)
    }

    pub fn sign_with(&self, key: &PrivateKey) -> Result<Self, TransactionError> {
        let signature = signing::sign_fields(self, key)?;
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    pub fn message_hash(&self) -> [u8; 32] {
        signing::message_hash(self)
    }

    pub fn serialize(&self) -> Vec<u8> {
        self.encode_signed()
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }

    pub fn recover_signer(&self) -> Result<Address, TransactionError> {
        signing::recover_signer(self)
    }

    /// Loggable rendering with text fields decoded lossily as UTF-8.
    pub fn to_display(&self) -> TransactionDisplay {
        TransactionDisplay {
            subject: String::from_utf8_lossy(&self.subject).into_owned(),
            application: String::from_utf8_lossy(&self.application).into_owned(),
            content: String::from_utf8_lossy(&self.content).into_owned(),
            to: self.to.to_hex(),
            signature: self.signature.as_ref().map(SignatureDisplay::from),
        }
    }

    /// Parses signed wire bytes. The chain id is recovered from `v`.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let fields = decode_list(bytes)?;
        let [subject, application, content, to, v, r, s]: [Vec<u8>; FIELD_COUNT] =
            fields.try_into().map_err(|f: Vec<Vec<u8>>| CodecError::FieldCount {
                expected: FIELD_COUNT,
                actual: f.len(),
            })?;

        if to.len() != ADDRESS_LENGTH {
            return Err(TransactionError::InvalidInput(format!(
                "recipient must be {ADDRESS_LENGTH} bytes, got {}",
                to.len()
            )));
        }
        let to =
            Address::from_slice(&to).map_err(|e| TransactionError::InvalidInput(e.to_string()))?;

        let signature =
            TxSignature::from_wire(&v, &r, &s)?.ok_or(TransactionError::MissingSignature)?;
        let (_, chain_id) = signature.recovery_parts().ok_or_else(|| {
            TransactionError::Recovery(format!("v={} is below the fold offset", signature.v))
        })?;

        Ok(Self {
            subject,
            application,
            content,
            to,
            chain_id,
            signature: Some(signature),
        })
    }

    pub fn decode_hex(text: &str) -> Result<Self, TransactionError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(stripped)
            .map_err(|e| TransactionError::InvalidInput(format!("payload is not hex: {e}")))?;
        Self::decode(&bytes)
    }
}

impl CanonicalFields for Transaction {
    fn business_fields(&self) -> Vec<Vec<u8>> {
        vec![
            self.subject.clone(),
            self.application.clone(),
            self.content.clone(),
            self.to.as_bytes().to_vec(),
        ]
    }

    fn chain_id(&self) -> &Quantity {
        &self.chain_id
    }

    fn signature(&self) -> Option<&TxSignature> {
        self.signature.as_ref()
    }
}

/// JSON-friendly view of a message [`Transaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionDisplay {
    pub subject: String,
    pub application: String,
    pub content: String,
    pub to: String,
    #[serde(flatten)]
    pub signature: Option<SignatureDisplay>,
}

// ---------------------------------------------------------------------------
// TransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for message [`Transaction`]s.
///
/// `subject` and `chain_id` are required; `application` and `content`
/// default to empty and `to` to the zero address.
#[derive(Debug, Clone, Default)]
pub struct TransactionBuilder {
    subject: Option<Vec<u8>>,
    application: Vec<u8>,
    content: Vec<u8>,
    to: Option<Address>,
    chain_id: Option<Quantity>,
}

impl TransactionBuilder {
    /// Textual subject, hex-normalized before encoding. See
    /// [`normalize_subject`].
    pub fn subject(mut self, subject: &str) -> Self {
        self.subject = if subject.is_empty() {
            None
        } else {
            Some(normalize_subject(subject).into_bytes())
        };
        self
    }

    /// Raw subject bytes, taken verbatim.
    pub fn subject_bytes(mut self, subject: impl Into<Vec<u8>>) -> Self {
        let subject = subject.into();
        self.subject = (!subject.is_empty()).then_some(subject);
        self
    }

    pub fn application(mut self, application: impl Into<Vec<u8>>) -> Self {
        self.application = application.into();
        self
    }

    pub fn content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn chain_id(mut self, chain_id: impl Into<Quantity>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    pub fn build(self) -> Result<Transaction, TransactionError> {
        let subject = self
            .subject
            .ok_or_else(|| TransactionError::InvalidInput("subject is required".to_string()))?;
        let chain_id = self
            .chain_id
            .ok_or_else(|| TransactionError::InvalidInput("chain id is required".to_string()))?;
        Ok(Transaction {
            subject,
            application: self.application,
            content: self.content,
            to: self.to.unwrap_or(Address::ZERO),
            chain_id,
            signature: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
