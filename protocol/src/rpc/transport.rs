//! The request/response transport seam.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use super::types::{RpcRequest, RpcResponse};

/// Failures of the underlying I/O, as opposed to errors reported by the
/// node inside a JSON-RPC response.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("response body is not valid json-rpc: {0}")]
    InvalidBody(String),

    #[error("transport is not connected")]
    Disconnected,

    #[error("websocket error: {0}")]
    WebSocket(String),
}

/// Posts JSON-RPC envelopes and returns the decoded response.
///
/// Implementations must be safe to call concurrently from several tasks.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn post_json(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError>;
}

#[async_trait]
impl<T: RpcTransport + ?Sized> RpcTransport for Arc<T> {
    async fn post_json(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        (**self).post_json(request).await
    }
}
