//! Error types for the RTC protocol engine.
//!
//! Every RTC operation that can fail reports an [`RtcError`], wrapped in a
//! [`super::SubmissionOutcome::Failure`]. Nothing here is ever raised as a
//! panic across an await point.

use thiserror::Error;

use crate::crypto::KeyError;
use crate::rpc::{RpcError, TransportError};
use crate::transaction::TransactionError;

/// Failure modes of the submit/confirm/subscribe flows.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RtcError {
    /// A required parameter is missing or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The private key is unusable.
    #[error("invalid key: {0}")]
    InvalidKey(#[from] KeyError),

    /// `edge_getTelegramCount` returned no usable nonce.
    #[error("edge_getTelegramCount: nonce is none ({0})")]
    NonceUnavailable(String),

    /// The transport failed, or the node answered without a payload.
    #[error("network error: {0}")]
    Network(String),

    /// The node answered with a JSON-RPC error object.
    #[error("{method} failed with rpc error {code}: {message}")]
    Rpc {
        method: String,
        code: i64,
        message: String,
    },

    /// The node accepted the call but rejected the transaction.
    #[error("{method} rejected the transaction")]
    Rejected { method: String },

    /// `edge_sendRawTelegram` did not return a telegram hash.
    #[error("create subject: telegram_hash is none")]
    MissingTelegramHash,

    /// A single receipt lookup found the telegram not yet included.
    #[error("telegram {hash} is not confirmed")]
    NotConfirmed { hash: String },
}

impl RtcError {
    /// Stable machine-readable code for this failure.
    pub fn reason_code(&self) -> &'static str {
        match self {
            RtcError::InvalidInput(_) => "invalid_input",
            RtcError::InvalidKey(_) => "invalid_key",
            RtcError::NonceUnavailable(_) => "nonce_unavailable",
            RtcError::Network(_) => "network_error",
            RtcError::Rpc { .. } => "rpc_error",
            RtcError::Rejected { .. } => "rejected",
            RtcError::MissingTelegramHash => "missing_telegram_hash",
            RtcError::NotConfirmed { .. } => "not_confirmed",
        }
    }

    pub(crate) fn rpc(method: impl Into<String>, error: &RpcError) -> Self {
        RtcError::Rpc {
            method: method.into(),
            code: error.code,
            message: error.message.clone(),
        }
    }
}

impl From<TransportError> for RtcError {
    fn from(e: TransportError) -> Self {
        RtcError::Network(e.to_string())
    }
}

impl From<TransactionError> for RtcError {
    fn from(e: TransactionError) -> Self {
        match e {
            TransactionError::InvalidKey(key) => RtcError::InvalidKey(key),
            other => RtcError::InvalidInput(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        let cases = [
            (RtcError::InvalidInput("x".into()), "invalid_input"),
            (RtcError::InvalidKey(KeyError::InvalidLength(3)), "invalid_key"),
            (RtcError::NonceUnavailable("null".into()), "nonce_unavailable"),
            (RtcError::Network("down".into()), "network_error"),
            (
                RtcError::Rpc {
                    method: "edge_sendRawMsg".into(),
                    code: -32000,
                    message: "bad".into(),
                },
                "rpc_error",
            ),
            (
                RtcError::Rejected {
                    method: "edge_sendRawMsg".into(),
                },
                "rejected",
            ),
            (RtcError::MissingTelegramHash, "missing_telegram_hash"),
        ];
        for (error, code) in cases {
            assert_eq!(error.reason_code(), code);
        }
    }

    #[test]
    fn transaction_key_errors_stay_key_errors() {
        let err: RtcError = TransactionError::InvalidKey(KeyError::InvalidScalar).into();
        assert_eq!(err.reason_code(), "invalid_key");

        let err: RtcError = TransactionError::InvalidInput("subject is required".into()).into();
        assert_eq!(err.reason_code(), "invalid_input");
    }

    #[test]
    fn transport_errors_are_network_errors() {
        let err: RtcError = TransportError::Disconnected.into();
        assert_eq!(err.reason_code(), "network_error");
        assert!(err.to_string().contains("not connected"));
    }
}
