//! # Subscription Protocol
//!
//! A one-shot wait on the event stream:
//!
//! ```text
//! register filter -> send edge_subscribe -> Listening -> Matched
//!                                               |
//!                                               +------> TimedOut
//! ```
//!
//! The filter is registered before the control frame is sent, so an
//! acknowledgment that arrives immediately is not missed. Exactly one
//! resolution wins, and the filter is unregistered on every exit path,
//! including when the caller drops the future.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::sync::oneshot;
use tracing::{debug, info, trace, warn};

use crate::config::{SUBSCRIBE_CHANNEL_RTC, SUBSCRIPTION_ACK_TYPE};
use crate::crypto::{Address, PrivateKey};
use crate::rpc::RpcMethod;
use crate::stream::{Listener, ListenerId, StreamTransport};

use super::clock::Clock;
use super::error::RtcError;
use super::outcome::SubmissionOutcome;
use super::params::SubscribeParams;
use super::submission::Rtc;

/// Unregisters a listener when dropped.
struct ListenerGuard<'a, S: StreamTransport + ?Sized> {
    stream: &'a S,
    id: ListenerId,
}

impl<S: StreamTransport + ?Sized> Drop for ListenerGuard<'_, S> {
    fn drop(&mut self) {
        self.stream.remove_listener(self.id);
    }
}

/// Returns the parsed frame if it acknowledges a subscription by `signer`.
///
/// Unparseable or unrelated frames yield `None`.
pub fn match_subscription_ack(text: &str, signer: &Address) -> Option<Value> {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            trace!(error = %e, "ignoring unparseable stream frame");
            return None;
        }
    };
    let result = frame.get("params")?.get("result")?;
    let is_ack = result.get("Type").and_then(Value::as_u64) == Some(SUBSCRIPTION_ACK_TYPE);
    let from_signer = result
        .get("From")
        .and_then(Value::as_str)
        .map_or(false, |from| signer.matches_str(from));
    (is_ack && from_signer).then_some(frame)
}

impl<C: Clock> Rtc<C> {
    /// Subscribes the signer to `params.subject` and waits for the node's
    /// acknowledgment frame, up to `config.subscribe_timeout`.
    ///
    /// The payload is the matching frame.
    pub async fn subscribe<S>(
        &self,
        params: &SubscribeParams,
        key: &PrivateKey,
        stream: &S,
    ) -> SubmissionOutcome<Value>
    where
        S: StreamTransport + ?Sized,
    {
        let signed = params
            .transaction()
            .and_then(|tx| tx.sign_with(key).map_err(RtcError::from));
        let signed = match signed {
            Ok(signed) => signed,
            Err(e) => return self.finish("subscribe", Err(e)),
        };
        if self.config.debug {
            info!(
                tx = %serde_json::to_string(&signed.to_display()).unwrap_or_default(),
                "subscribe signed"
            );
        }

        let signer = key.address();
        let (resolve, resolved) = oneshot::channel::<Value>();
        let slot = Arc::new(Mutex::new(Some(resolve)));
        let listener: Listener = Arc::new(move |text: &str| {
            if let Some(frame) = match_subscription_ack(text, &signer) {
                if let Some(resolve) = slot.lock().take() {
                    let _ = resolve.send(frame);
                }
            }
        });
        let _guard = ListenerGuard {
            stream,
            id: stream.add_listener(listener),
        };

        let request = self.format_raw_params(
            RpcMethod::Subscribe,
            json!([SUBSCRIBE_CHANNEL_RTC, signed.to_hex()]),
            None,
        );
        debug!(state = "listening", subject = params.subject(), %signer);
        if let Err(e) = stream.send(request.to_json_string()).await {
            return self.finish("subscribe", Err(RtcError::from(e)));
        }

        let timeout = self.config.subscribe_timeout;
        match tokio::time::timeout(timeout, resolved).await {
            Ok(Ok(frame)) => {
                info!(subject = params.subject(), "subscription acknowledged");
                SubmissionOutcome::Success(frame)
            }
            Ok(Err(_)) => self.finish(
                "subscribe",
                Err(RtcError::Network("subscription listener dropped".to_string())),
            ),
            Err(_) => {
                warn!(
                    subject = params.subject(),
                    timeout_ms = timeout.as_millis() as u64,
                    "subscription timed out"
                );
                SubmissionOutcome::TimedOut {
                    elapsed: timeout,
                    last: None,
                }
            }
        }
    }

    /// Publishes a message over the stream with `edge_sendRawMsg` without
    /// waiting for any answer.
    #[deprecated(note = "use send_message over http")]
    pub async fn send_socket_message<S>(
        &self,
        params: &SubscribeParams,
        key: &PrivateKey,
        stream: &S,
    ) -> SubmissionOutcome<()>
    where
        S: StreamTransport + ?Sized,
    {
        let result = async {
            let signed = params.transaction()?.sign_with(key)?;
            let request =
                self.format_raw_params(RpcMethod::SendRawMsg, json!([signed.to_hex()]), None);
            stream.send(request.to_json_string()).await?;
            Ok::<(), RtcError>(())
        }
        .await;
        self.finish("send_socket_message", result)
    }
}
