//! # JSON-RPC Layer
//!
//! Envelope types, the [`RpcTransport`] seam the protocol engine calls
//! through, and the reqwest-backed [`HttpTransport`].

pub mod http;
pub mod transport;
pub mod types;

pub use http::HttpTransport;
pub use transport::{RpcTransport, TransportError};
pub use types::{RpcError, RpcMethod, RpcRequest, RpcResponse, SendTelegramResult, TelegramReceipt};
