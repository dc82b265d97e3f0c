//! Legacy (telegram) transactions.
//!
//! A [`LegacyTransaction`] carries value-transfer style fields and is used
//! to register subjects on the ledger. Its wire layout is
//!
//! ```text
//! [nonce, gas_price, gas_limit, to, value, data, v, r, s]
//! ```
//!
//! where `to` is the empty string when no recipient is set. An absent
//! recipient is distinct from the zero address.

use serde::Serialize;

use crate::codec::{decode_list, CanonicalFields, CodecError, Quantity};
use crate::config::ADDRESS_LENGTH;
use crate::crypto::{Address, PrivateKey};

use super::error::TransactionError;
use super::signing;
use super::types::{SignatureDisplay, TxSignature};

const FIELD_COUNT: usize = 9;

// ---------------------------------------------------------------------------
// LegacyTransaction
// ---------------------------------------------------------------------------

/// An immutable legacy transaction.
///
/// Construct with [`LegacyTransaction::builder`]. Signing returns a new
/// instance; the unsigned value is left untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    nonce: Quantity,
    gas_price: Quantity,
    gas_limit: Quantity,
    to: Option<Address>,
    value: Quantity,
    data: Vec<u8>,
    chain_id: Quantity,
    signature: Option<TxSignature>,
}

impl LegacyTransaction {
    pub fn builder() -> LegacyTransactionBuilder {
        LegacyTransactionBuilder::default()
    }

    pub fn nonce(&self) -> &Quantity {
        &self.nonce
    }

    pub fn gas_price(&self) -> &Quantity {
        &self.gas_price
    }

    pub fn gas_limit(&self) -> &Quantity {
        &self.gas_limit
    }

    pub fn to(&self) -> Option<&Address> {
        self.to.as_ref()
    }

    pub fn value(&self) -> &Quantity {
        &self.value
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    /// Signs with a raw 32-byte private key.
    pub fn sign(&self, private_key: &[u8]) -> Result<Self, TransactionError> {
        let key = PrivateKey::from_slice(private_key)?;
        self.sign_with(&key)
    }

    /// Signs with an already parsed key, returning the signed copy.
    pub fn sign_with(&self, key: &PrivateKey) -> Result<Self, TransactionError> {
        let signature = signing::sign_fields(self, key)?;
        Ok(Self {
            signature: Some(signature),
            ..self.clone()
        })
    }

    /// The digest that is (or would be) signed.
    pub fn message_hash(&self) -> [u8; 32] {
        signing::message_hash(self)
    }

    /// Canonical wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        self.encode_signed()
    }

    /// Wire bytes as `0x`-prefixed hex, the form sent in JSON-RPC params.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.serialize()))
    }

    /// Address of the signer.
    pub fn recover_signer(&self) -> Result<Address, TransactionError> {
        signing::recover_signer(self)
    }

    /// Loggable rendering. Never used for hashing.
    pub fn to_display(&self) -> LegacyTransactionDisplay {
        LegacyTransactionDisplay {
            nonce: self.nonce.to_hex(),
            gas_price: self.gas_price.to_hex(),
            gas_limit: self.gas_limit.to_hex(),
            to: self.to.map(|a| a.to_hex()),
            value: self.value.to_hex(),
            data: format!("0x{}", hex::encode(&self.data)),
            signature: self.signature.as_ref().map(SignatureDisplay::from),
        }
    }

    /// Parses signed wire bytes. The chain id is recovered from `v`.
    pub fn decode(bytes: &[u8]) -> Result<Self, TransactionError> {
        let fields = decode_list(bytes)?;
        let [nonce, gas_price, gas_limit, to, value, data, v, r, s]: [Vec<u8>; FIELD_COUNT] =
            fields.try_into().map_err(|f: Vec<Vec<u8>>| CodecError::FieldCount {
                expected: FIELD_COUNT,
                actual: f.len(),
            })?;

        let to = match to.len() {
            0 => None,
            ADDRESS_LENGTH => Some(
                Address::from_slice(&to)
                    .map_err(|e| TransactionError::InvalidInput(e.to_string()))?,
            ),
            n => {
                return Err(TransactionError::InvalidInput(format!(
                    "recipient must be empty or {ADDRESS_LENGTH} bytes, got {n}"
                )))
            }
        };

        let signature =
            TxSignature::from_wire(&v, &r, &s)?.ok_or(TransactionError::MissingSignature)?;
        let (_, chain_id) = signature.recovery_parts().ok_or_else(|| {
            TransactionError::Recovery(format!("v={} is below the fold offset", signature.v))
        })?;

        Ok(Self {
            nonce: Quantity::from_be_bytes(&nonce),
            gas_price: Quantity::from_be_bytes(&gas_price),
            gas_limit: Quantity::from_be_bytes(&gas_limit),
            to,
            value: Quantity::from_be_bytes(&value),
            data,
            chain_id,
            signature: Some(signature),
        })
    }

    /// [`decode`](Self::decode) for `0x`-prefixed (or bare) hex.
    pub fn decode_hex(text: &str) -> Result<Self, TransactionError> {
        let stripped = text.strip_prefix("0x").unwrap_or(text);
        let bytes = hex::decode(stripped)
            .map_err(|e| TransactionError::InvalidInput(format!("payload is not hex: {e}")))?;
        Self::decode(&bytes)
    }
}

impl CanonicalFields for LegacyTransaction {
    fn business_fields(&self) -> Vec<Vec<u8>> {
        vec![
            self.nonce.to_be_bytes(),
            self.gas_price.to_be_bytes(),
            self.gas_limit.to_be_bytes(),
            self.to.map(|a| a.as_bytes().to_vec()).unwrap_or_default(),
            self.value.to_be_bytes(),
            self.data.clone(),
        ]
    }

    fn chain_id(&self) -> &Quantity {
        &self.chain_id
    }

    fn signature(&self) -> Option<&TxSignature> {
        self.signature.as_ref()
    }
}

/// JSON-friendly view of a [`LegacyTransaction`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTransactionDisplay {
    pub nonce: String,
    pub gas_price: String,
    pub gas_limit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    pub value: String,
    pub data: String,
    #[serde(flatten)]
    pub signature: Option<SignatureDisplay>,
}

// ---------------------------------------------------------------------------
// LegacyTransactionBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`LegacyTransaction`].
///
/// Every numeric field defaults to zero and the recipient to none. The
/// chain id has no default and must be set.
///
/// ```rust
/// use edgematrix_protocol::codec::Quantity;
/// use edgematrix_protocol::transaction::LegacyTransaction;
///
/// let tx = LegacyTransaction::builder()
///     .nonce(Quantity::from_hex("0x1f").unwrap())
///     .data(vec![0x33, 0x34, 0x35])
///     .chain_id(2u64)
///     .build()
///     .unwrap();
/// assert!(!tx.is_signed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct LegacyTransactionBuilder {
    nonce: Quantity,
    gas_price: Quantity,
    gas_limit: Quantity,
    to: Option<Address>,
    value: Quantity,
    data: Vec<u8>,
    chain_id: Option<Quantity>,
}

impl LegacyTransactionBuilder {
    pub fn nonce(mut self, nonce: impl Into<Quantity>) -> Self {
        self.nonce = nonce.into();
        self
    }

    pub fn gas_price(mut self, gas_price: impl Into<Quantity>) -> Self {
        self.gas_price = gas_price.into();
        self
    }

    pub fn gas_limit(mut self, gas_limit: impl Into<Quantity>) -> Self {
        self.gas_limit = gas_limit.into();
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn value(mut self, value: impl Into<Quantity>) -> Self {
        self.value = value.into();
        self
    }

    /// Opaque payload bytes, taken verbatim.
    pub fn data(mut self, data: impl Into<Vec<u8>>) -> Self {
        self.data = data.into();
        self
    }

    pub fn chain_id(mut self, chain_id: impl Into<Quantity>) -> Self {
        self.chain_id = Some(chain_id.into());
        self
    }

    /// Produces an unsigned transaction.
    pub fn build(self) -> Result<LegacyTransaction, TransactionError> {
        let chain_id = self
            .chain_id
            .ok_or_else(|| TransactionError::InvalidInput("chain id is required".to_string()))?;
        Ok(LegacyTransaction {
            nonce: self.nonce,
            gas_price: self.gas_price,
            gas_limit: self.gas_limit,
            to: self.to,
            value: self.value,
            data: self.data,
            chain_id,
            signature: None,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::encode_list;

    /// The EIP-155 reference transaction, reused with this protocol's `v`.
    fn reference_tx() -> LegacyTransaction {
        LegacyTransaction::builder()
            .nonce(9u64)
            .gas_price(Quantity::from_hex("0x04a817c800").unwrap())
            .gas_limit(21_000u64)
            .to("0x3535353535353535353535353535353535353535".parse().unwrap())
            .value(Quantity::from_hex("0x0de0b6b3a7640000").unwrap())
            .chain_id(1u64)
            .build()
            .unwrap()
    }

    fn reference_key() -> Vec<u8> {
        vec![0x46; 32]
    }

    #[test]
    fn unsigned_encoding_matches_reference() {
        let tx = reference_tx();
        assert_eq!(
            hex::encode(tx.encode_unsigned()),
            "ec098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a764000080018080"
        );
        assert_eq!(
            hex::encode(tx.message_hash()),
            "daf5a779ae972f972197303d7b574746c7ef83eadac0f2791ad23db92e4c8e53"
        );
    }

    #[test]
    fn signed_encoding_matches_reference() {
        let signed = reference_tx().sign(&reference_key()).unwrap();
        let sig = signed.signature().unwrap();
        // recovery id 0, chain 1: 0 + 2 + 8.
        assert_eq!(sig.v, Quantity::from(10u64));
        assert_eq!(
            sig.r.to_hex(),
            "0x28ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276"
        );
        assert_eq!(
            sig.s.to_hex(),
            "0x67cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
        assert_eq!(
            signed.to_hex(),
            "0xf86c098504a817c800825208943535353535353535353535353535353535353535880de0b6b3a7640000800aa028ef61340bd939bc2195fe537567866003e1a15d3c71ff63e1590620aa636276a067cbe9d8997f761aecb703304b3800ccf555c9f3dc64214b297fb1966a3b6d83"
        );
    }

    #[test]
    fn signing_returns_new_instance() {
        let unsigned = reference_tx();
        let signed = unsigned.sign(&reference_key()).unwrap();
        assert!(!unsigned.is_signed());
        assert!(signed.is_signed());
        assert_eq!(unsigned.business_fields(), signed.business_fields());
    }

    #[test]
    fn encodings_differ_only_in_trailing_triple() {
        let signed = reference_tx().sign(&reference_key()).unwrap();
        let unsigned = signed.unsigned_fields();
        let wire = signed.signed_fields();
        assert_eq!(unsigned.len(), wire.len());
        assert_eq!(unsigned[..6], wire[..6]);
        assert_ne!(unsigned[6..], wire[6..]);
    }

    #[test]
    fn serialization_is_deterministic() {
        let a = reference_tx().sign(&reference_key()).unwrap();
        let b = reference_tx().sign(&reference_key()).unwrap();
        assert_eq!(a.serialize(), b.serialize());
        assert_eq!(a.signature(), b.signature());
    }

    #[test]
    fn decode_round_trips() {
        let signed = reference_tx().sign(&reference_key()).unwrap();
        let decoded = LegacyTransaction::decode(&signed.serialize()).unwrap();
        assert_eq!(decoded, signed);
        assert_eq!(decoded.chain_id(), &Quantity::from(1u64));
        assert_eq!(decode_list(&signed.serialize()).unwrap(), signed.signed_fields());
    }

    #[test]
    fn recovers_signer() {
        let key = PrivateKey::from_slice(&reference_key()).unwrap();
        let signed = reference_tx().sign_with(&key).unwrap();
        assert_eq!(signed.recover_signer().unwrap(), key.address());
        assert_eq!(
            LegacyTransaction::decode_hex(&signed.to_hex())
                .unwrap()
                .recover_signer()
                .unwrap(),
            key.address()
        );
    }

    #[test]
    fn absent_recipient_differs_from_zero_address() {
        let none = LegacyTransaction::builder().chain_id(2u64).build().unwrap();
        let zero = LegacyTransaction::builder()
            .to(Address::ZERO)
            .chain_id(2u64)
            .build()
            .unwrap();
        assert!(none.business_fields()[3].is_empty());
        assert_eq!(zero.business_fields()[3], vec![0u8; 20]);
        assert_ne!(none.encode_unsigned(), zero.encode_unsigned());
    }

    #[test]
    fn zero_forms_encode_identically() {
        let omitted = LegacyTransaction::builder().chain_id(2u64).build().unwrap();
        let explicit = LegacyTransaction::builder()
            .nonce(Quantity::from_hex("0x0").unwrap())
            .gas_price(0u64)
            .gas_limit(Quantity::from_hex("0x").unwrap())
            .value(Quantity::from_be_bytes(&[0, 0]))
            .chain_id(2u64)
            .build()
            .unwrap();
        assert_eq!(omitted.encode_unsigned(), explicit.encode_unsigned());
        assert_eq!(
            omitted.encode_unsigned(),
            encode_list(&[
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![],
                vec![0x02],
                vec![],
                vec![]
            ])
        );
    }

    #[test]
    fn missing_chain_id_is_invalid_input() {
        assert!(matches!(
            LegacyTransaction::builder().nonce(1u64).build(),
            Err(TransactionError::InvalidInput(_))
        ));
    }

    #[test]
    fn short_key_is_invalid() {
        assert!(matches!(
            reference_tx().sign(&[1u8; 31]),
            Err(TransactionError::InvalidKey(_))
        ));
    }

    #[test]
    fn decode_rejects_unsigned_and_wrong_arity() {
        let unsigned = reference_tx();
        assert_eq!(
            LegacyTransaction::decode(&unsigned.serialize()),
            Err(TransactionError::MissingSignature)
        );
        let short = encode_list(&[vec![1u8], vec![2u8]]);
        assert!(matches!(
            LegacyTransaction::decode(&short),
            Err(TransactionError::Codec(_))
        ));
    }

    #[test]
    fn decode_rejects_partial_signatures() {
        let business = reference_tx().business_fields();
        let triples: [[&[u8]; 3]; 4] = [
            [&[0x25], &[], &[]],
            [&[0x25], &[0x01], &[]],
            [&[], &[0x01], &[0x02]],
            [&[0x25], &[0x01], &[0x00]],
        ];
        for triple in triples {
            let mut fields = business.clone();
            fields.extend(triple.iter().map(|f| f.to_vec()));
            assert!(matches!(
                LegacyTransaction::decode(&encode_list(&fields)),
                Err(TransactionError::MalformedSignature(_))
            ));
        }
    }

    #[test]
    fn display_renders_hex_and_decimal() {
        let signed = reference_tx().sign(&reference_key()).unwrap();
        let json = serde_json::to_value(signed.to_display()).unwrap();
        assert_eq!(json["nonce"], "0x9");
        assert_eq!(json["gasPrice"], "0x4a817c800");
        assert_eq!(json["gasLimit"], "0x5208");
        assert_eq!(json["to"], "0x3535353535353535353535353535353535353535");
        assert_eq!(json["data"], "0x");
        assert_eq!(json["v"], "10");

        let unsigned = LegacyTransaction::builder().chain_id(2u64).build().unwrap();
        let json = serde_json::to_value(unsigned.to_display()).unwrap();
        assert!(json.get("to").is_none());
        assert!(json.get("v").is_none());
    }
}
