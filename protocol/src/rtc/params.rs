//! Validated request parameters.
//!
//! Constructors reject missing subjects up front, so the async operations
//! that consume these values never fail on caller input.

use crate::codec::Quantity;
use crate::crypto::Address;
use crate::transaction::Transaction;

use super::error::RtcError;

fn require_subject(subject: String) -> Result<String, RtcError> {
    if subject.is_empty() {
        return Err(RtcError::InvalidInput("subject not be none".to_string()));
    }
    Ok(subject)
}

/// Parameters of `send_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageParams {
    subject: String,
    application: String,
    content: String,
    to: Option<Address>,
    chain_id: Quantity,
}

impl MessageParams {
    pub fn new(
        subject: impl Into<String>,
        application: impl Into<String>,
        content: impl Into<String>,
        chain_id: impl Into<Quantity>,
    ) -> Result<Self, RtcError> {
        Ok(Self {
            subject: require_subject(subject.into())?,
            application: application.into(),
            content: content.into(),
            to: None,
            chain_id: chain_id.into(),
        })
    }

    /// Addresses the message to `to` instead of the zero address.
    pub fn with_to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn chain_id(&self) -> &Quantity {
        &self.chain_id
    }

    pub(crate) fn transaction(&self) -> Result<Transaction, RtcError> {
        let mut builder = Transaction::builder()
            .subject(&self.subject)
            .application(self.application.as_str())
            .content(self.content.as_str())
            .chain_id(self.chain_id.clone());
        if let Some(to) = self.to {
            builder = builder.to(to);
        }
        Ok(builder.build()?)
    }
}

/// Parameters of `subscribe` and `send_socket_message`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribeParams {
    subject: String,
    application: String,
    content: String,
    chain_id: Quantity,
}

impl SubscribeParams {
    pub fn new(
        subject: impl Into<String>,
        application: impl Into<String>,
        content: impl Into<String>,
        chain_id: impl Into<Quantity>,
    ) -> Result<Self, RtcError> {
        Ok(Self {
            subject: require_subject(subject.into())?,
            application: application.into(),
            content: content.into(),
            chain_id: chain_id.into(),
        })
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub(crate) fn transaction(&self) -> Result<Transaction, RtcError> {
        Ok(Transaction::builder()
            .subject(&self.subject)
            .application(self.application.as_str())
            .content(self.content.as_str())
            .chain_id(self.chain_id.clone())
            .build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_subject_is_invalid_input() {
        let err = MessageParams::new("", "app", "hi", 2u64).unwrap_err();
        assert_eq!(err.reason_code(), "invalid_input");
        let err = SubscribeParams::new("", "app", "", 2u64).unwrap_err();
        assert_eq!(err.reason_code(), "invalid_input");
    }

    #[test]
    fn message_defaults_to_zero_recipient() {
        let params = MessageParams::new("0x01", "app", "hi", 2u64).unwrap();
        assert_eq!(params.transaction().unwrap().to(), &Address::ZERO);

        let to: Address = "0x0af137aa3ecc7d10d926013ee34049afa77382e6".parse().unwrap();
        let params = params.with_to(to);
        assert_eq!(params.transaction().unwrap().to(), &to);
    }

    #[test]
    fn subscribe_params_build_a_message() {
        let params = SubscribeParams::new("abc", "edge_chat", "", 2u64).unwrap();
        let tx = params.transaction().unwrap();
        assert_eq!(tx.subject(), b"0x0abc");
        assert_eq!(tx.application(), b"edge_chat");
        assert!(tx.content().is_empty());
    }
}
