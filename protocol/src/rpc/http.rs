//! HTTP transport for JSON-RPC calls.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::{debug, trace};

use super::transport::{RpcTransport, TransportError};
use super::types::{RpcRequest, RpcResponse};
use crate::config::DEFAULT_HTTP_TIMEOUT;

/// Posts JSON-RPC envelopes to a single node endpoint over HTTP.
///
/// A non-2xx status whose body is still a JSON-RPC response is returned as
/// a response (the node's `error` object is what matters). Connection
/// failures and non-JSON bodies are [`TransportError`]s.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    url: Url,
}

impl HttpTransport {
    /// Transport with the default request timeout.
    pub fn new(url: &str) -> Result<Self, TransportError> {
        Self::with_timeout(url, DEFAULT_HTTP_TIMEOUT)
    }

    pub fn with_timeout(url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let url = Url::parse(url)
            .map_err(|e| TransportError::Request(format!("invalid url {url:?}: {e}")))?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("failed to build http client: {e}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn post_json(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        debug!(method = %request.method, url = %self.url, "posting json-rpc request");

        let response = self
            .client
            .post(self.url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| TransportError::Request(format!("{}: {e}", request.method)))?;

        let status = response.status();
        let body: RpcResponse = response
            .json()
            .await
            .map_err(|e| {
                TransportError::InvalidBody(format!("{} (http {status}): {e}", request.method))
            })?;

        trace!(method = %request.method, %status, "json-rpc response received");
        Ok(body)
    }
}
