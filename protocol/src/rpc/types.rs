//! # JSON-RPC Envelope Types
//!
//! Request/response shapes for the Edge Matrix JSON-RPC API. The transport
//! that moves them lives in [`super::http`]; the protocol logic that
//! interprets them lives in [`crate::rtc`].
//!
//! ## Method Index
//!
//! | Method                    | Params          | Result                          |
//! |---------------------------|-----------------|---------------------------------|
//! | `edge_getTelegramCount`   | `[address]`     | nonce as hex string             |
//! | `edge_sendRawTelegram`    | `[hexPayload]`  | JSON string `{telegram_hash}`   |
//! | `edge_getTelegramReceipt` | `[hash]`        | object with `status`            |
//! | `edge_sendRawMsg`         | `[hexPayload]`  | hex string, `"0x0"` = rejected  |
//! | `edge_subscribe`          | `["rtc", hex]`  | stream frames (not over HTTP)   |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::{
    DEFAULT_REQUEST_ID, JSONRPC_VERSION, METHOD_GET_TELEGRAM_COUNT, METHOD_GET_TELEGRAM_RECEIPT,
    METHOD_SEND_RAW_MSG, METHOD_SEND_RAW_TELEGRAM, METHOD_SUBSCRIBE, RECEIPT_STATUS_SUCCESS,
};

// ---------------------------------------------------------------------------
// RPC Method Enumeration
// ---------------------------------------------------------------------------

/// Methods this client speaks. The wire name is [`RpcMethod::as_str`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RpcMethod {
    #[serde(rename = "edge_getTelegramCount")]
    GetTelegramCount,
    #[serde(rename = "edge_sendRawTelegram")]
    SendRawTelegram,
    #[serde(rename = "edge_getTelegramReceipt")]
    GetTelegramReceipt,
    #[serde(rename = "edge_sendRawMsg")]
    SendRawMsg,
    #[serde(rename = "edge_subscribe")]
    Subscribe,
}

impl RpcMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::GetTelegramCount => METHOD_GET_TELEGRAM_COUNT,
            RpcMethod::SendRawTelegram => METHOD_SEND_RAW_TELEGRAM,
            RpcMethod::GetTelegramReceipt => METHOD_GET_TELEGRAM_RECEIPT,
            RpcMethod::SendRawMsg => METHOD_SEND_RAW_MSG,
            RpcMethod::Subscribe => METHOD_SUBSCRIBE,
        }
    }
}

impl fmt::Display for RpcMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// RPC Request / Response
// ---------------------------------------------------------------------------

/// A JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Always `"2.0"`.
    pub jsonrpc: String,
    pub method: RpcMethod,
    #[serde(default)]
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    /// Builds an envelope with the default request id.
    pub fn new(method: RpcMethod, params: Value) -> Self {
        Self::with_id(method, params, DEFAULT_REQUEST_ID)
    }

    pub fn with_id(method: RpcMethod, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method,
            params,
            id,
        }
    }

    /// Compact JSON text, the form written to a stream.
    pub fn to_json_string(&self) -> String {
        // Serializing plain strings and numbers into a JSON value cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// A JSON-RPC 2.0 response.
///
/// Servers in the wild omit `jsonrpc`/`id` or send `result: null`, so every
/// field is optional on the way in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RpcResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jsonrpc: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// A successful response carrying `result`.
    pub fn success(result: Value) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Value::from(DEFAULT_REQUEST_ID),
            result: Some(result),
            error: None,
        }
    }

    /// An error response.
    pub fn failure(error: RpcError) -> Self {
        Self {
            jsonrpc: Some(JSONRPC_VERSION.to_string()),
            id: Value::from(DEFAULT_REQUEST_ID),
            result: None,
            error: Some(error),
        }
    }

    /// `result` as a non-empty string, if it is one.
    pub fn result_str(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

// ---------------------------------------------------------------------------
// RPC Errors
// ---------------------------------------------------------------------------

/// JSON-RPC 2.0 error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rpc error {}: {}", self.code, self.message)
    }
}

// ---------------------------------------------------------------------------
// Typed Response Payloads
// ---------------------------------------------------------------------------

/// Result of `edge_getTelegramReceipt`.
///
/// Only `status` is interpreted; everything else the node returns is kept
/// verbatim so callers can inspect it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TelegramReceipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl TelegramReceipt {
    /// Reads a receipt out of a response `result`. Anything that is not an
    /// object becomes an empty receipt.
    pub fn from_result(result: Option<&Value>) -> Self {
        result
            .filter(|v| v.is_object())
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    /// `true` once the telegram is included.
    pub fn is_success(&self) -> bool {
        self.status.as_deref() == Some(RECEIPT_STATUS_SUCCESS)
    }
}

/// The JSON document embedded (as a string) in the `edge_sendRawTelegram`
/// result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendTelegramResult {
    #[serde(default)]
    pub telegram_hash: Option<String>,
}

impl SendTelegramResult {
    /// Parses the inner JSON string. A missing result parses as `{}`.
    pub fn parse(result: Option<&Value>) -> Result<Self, serde_json::Error> {
        match result.and_then(Value::as_str) {
            Some(text) if !text.is_empty() => serde_json::from_str(text),
            _ => Ok(Self::default()),
        }
    }

    /// The telegram hash, when present and non-empty.
    pub fn hash(&self) -> Option<&str> {
        self.telegram_hash.as_deref().filter(|h| !h.is_empty())
    }
}
