//! # Submission Protocol
//!
//! Telegram and message submission over JSON-RPC.
//!
//! ```text
//! FetchingNonce -> Building -> Signing -> Submitting -> PollingReceipt -> Confirmed
//!       |                                     |               |
//!       +-------------> Failed <--------------+               +-> TimedOut
//! ```
//!
//! `create_subject` walks the whole machine. `send_message` starts at
//! Building (messages carry no nonce) and ends at Submitting. Each step is
//! strictly ordered; nothing is retried except receipt lookups.

use serde_json::{json, Value};
use tracing::{debug, info, warn};

use crate::codec::Quantity;
use crate::config::{
    RtcConfig, REJECTION_SENTINEL, SUBJECT_CREATION_PAYLOAD, SUBJECT_REGISTRY_ADDRESS,
};
use crate::crypto::{Address, PrivateKey};
use crate::rpc::{
    RpcMethod, RpcRequest, RpcResponse, RpcTransport, SendTelegramResult, TelegramReceipt,
};
use crate::transaction::LegacyTransaction;

use super::clock::{Clock, SystemClock};
use super::error::RtcError;
use super::outcome::{SubmissionOutcome, TelegramStatus};
use super::params::MessageParams;

/// The RTC protocol engine.
///
/// Holds configuration and a clock only; transports are passed per call so
/// one engine can drive any number of connections.
#[derive(Debug, Clone, Default)]
pub struct Rtc<C: Clock = SystemClock> {
    pub(crate) config: RtcConfig,
    clock: C,
}

impl Rtc<SystemClock> {
    pub fn new(config: RtcConfig) -> Self {
        Self {
            config,
            clock: SystemClock,
        }
    }
}

impl<C: Clock> Rtc<C> {
    /// Engine with a custom clock for deterministic deadline tests.
    pub fn with_clock(config: RtcConfig, clock: C) -> Self {
        Self { config, clock }
    }

    pub fn config(&self) -> &RtcConfig {
        &self.config
    }

    /// Wraps `params` in a JSON-RPC envelope. `id` defaults to 1.
    pub fn format_raw_params(
        &self,
        method: RpcMethod,
        params: Value,
        id: Option<u64>,
    ) -> RpcRequest {
        match id {
            Some(id) => RpcRequest::with_id(method, params, id),
            None => RpcRequest::new(method, params),
        }
    }

    /// Reads the signer's telegram count, which is the next nonce.
    pub async fn get_telegram_count<T>(
        &self,
        key: &PrivateKey,
        http: &T,
    ) -> SubmissionOutcome<Quantity>
    where
        T: RpcTransport + ?Sized,
    {
        self.finish("get_telegram_count", self.fetch_nonce(&key.address(), http).await)
    }

    /// Looks up a receipt once. Anything but status `0x1` is a failure.
    pub async fn get_telegram_receipt<T>(
        &self,
        hash: &str,
        http: &T,
    ) -> SubmissionOutcome<TelegramReceipt>
    where
        T: RpcTransport + ?Sized,
    {
        let result = match self.fetch_receipt(hash, http).await {
            Ok(receipt) if receipt.is_success() => Ok(receipt),
            Ok(_) => Err(RtcError::NotConfirmed {
                hash: hash.to_string(),
            }),
            Err(e) => Err(e),
        };
        self.finish("get_telegram_receipt", result)
    }

    /// Registers a subject: submits a subject-creation telegram and polls
    /// its receipt until it is included or the poll deadline passes.
    pub async fn create_subject<T>(
        &self,
        chain_id: impl Into<Quantity>,
        key: &PrivateKey,
        http: &T,
    ) -> SubmissionOutcome<TelegramStatus>
    where
        T: RpcTransport + ?Sized,
    {
        match self.submit_subject(chain_id.into(), key, http).await {
            Ok(hash) => self.poll_receipt(hash, http).await,
            Err(e) => self.finish("create_subject", Err(e)),
        }
    }

    /// Former name of [`create_subject`](Self::create_subject).
    #[deprecated(note = "use create_subject")]
    pub async fn create_channel<T>(
        &self,
        chain_id: impl Into<Quantity>,
        key: &PrivateKey,
        http: &T,
    ) -> SubmissionOutcome<TelegramStatus>
    where
        T: RpcTransport + ?Sized,
    {
        self.create_subject(chain_id, key, http).await
    }

    /// Signs and publishes a message with `edge_sendRawMsg`.
    ///
    /// The payload is the node's result. A result of `"0x0"` is a
    /// rejection and reported as a failure.
    pub async fn send_message<T>(
        &self,
        params: &MessageParams,
        key: &PrivateKey,
        http: &T,
    ) -> SubmissionOutcome<Value>
    where
        T: RpcTransport + ?Sized,
    {
        self.finish("send_message", self.submit_message(params, key, http).await)
    }

    // -----------------------------------------------------------------------
    // Steps
    // -----------------------------------------------------------------------

    async fn fetch_nonce<T>(&self, address: &Address, http: &T) -> Result<Quantity, RtcError>
    where
        T: RpcTransport + ?Sized,
    {
        debug!(state = "fetching_nonce", %address);
        let response = self
            .call(RpcMethod::GetTelegramCount, json!([address.to_hex()]), http)
            .await?;
        let raw = response
            .result_str()
            .ok_or_else(|| RtcError::NonceUnavailable(format!("result {:?}", response.result)))?;
        Quantity::from_hex(raw).map_err(|e| RtcError::NonceUnavailable(e.to_string()))
    }

    async fn submit_subject<T>(
        &self,
        chain_id: Quantity,
        key: &PrivateKey,
        http: &T,
    ) -> Result<String, RtcError>
    where
        T: RpcTransport + ?Sized,
    {
        let nonce = self.fetch_nonce(&key.address(), http).await?;

        debug!(state = "building", nonce = %nonce, chain_id = %chain_id);
        let registry: Address = SUBJECT_REGISTRY_ADDRESS
            .parse()
            .map_err(|e| RtcError::InvalidInput(format!("subject registry address: {e}")))?;
        let unsigned = LegacyTransaction::builder()
            .nonce(nonce)
            .to(registry)
            .data(SUBJECT_CREATION_PAYLOAD.to_vec())
            .chain_id(chain_id)
            .build()?;

        debug!(state = "signing");
        let signed = unsigned.sign_with(key)?;
        if self.config.debug {
            info!(
                tx = %serde_json::to_string(&signed.to_display()).unwrap_or_default(),
                "create subject signed"
            );
        }

        debug!(state = "submitting");
        let response = self
            .call(RpcMethod::SendRawTelegram, json!([signed.to_hex()]), http)
            .await?;
        let parsed = SendTelegramResult::parse(response.result.as_ref()).map_err(|e| {
            debug!(error = %e, "telegram result is not json");
            RtcError::MissingTelegramHash
        })?;
        parsed
            .hash()
            .map(str::to_string)
            .ok_or(RtcError::MissingTelegramHash)
    }

    async fn submit_message<T>(
        &self,
        params: &MessageParams,
        key: &PrivateKey,
        http: &T,
    ) -> Result<Value, RtcError>
    where
        T: RpcTransport + ?Sized,
    {
        debug!(state = "building", subject = params.subject());
        let unsigned = params.transaction()?;

        debug!(state = "signing");
        let signed = unsigned.sign_with(key)?;
        if self.config.debug {
            info!(
                tx = %serde_json::to_string(&signed.to_display()).unwrap_or_default(),
                "send message signed"
            );
        }

        debug!(state = "submitting");
        let response = self
            .call(RpcMethod::SendRawMsg, json!([signed.to_hex()]), http)
            .await?;
        match response.result {
            None | Some(Value::Null) => Err(RtcError::Network(format!(
                "{} returned no result",
                RpcMethod::SendRawMsg
            ))),
            Some(Value::String(ref s)) if s == REJECTION_SENTINEL => Err(RtcError::Rejected {
                method: RpcMethod::SendRawMsg.to_string(),
            }),
            Some(result) => Ok(result),
        }
    }

    async fn fetch_receipt<T>(&self, hash: &str, http: &T) -> Result<TelegramReceipt, RtcError>
    where
        T: RpcTransport + ?Sized,
    {
        let response = self
            .call(RpcMethod::GetTelegramReceipt, json!([hash]), http)
            .await?;
        Ok(TelegramReceipt::from_result(response.result.as_ref()))
    }

    /// Polls until the receipt reports success or `config.poll.duration`
    /// has elapsed since the first attempt. Transport failures count as
    /// "not yet confirmed".
    async fn poll_receipt<T>(&self, hash: String, http: &T) -> SubmissionOutcome<TelegramStatus>
    where
        T: RpcTransport + ?Sized,
    {
        let policy = self.config.poll;
        let started = self.clock.now();
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let receipt = match self.fetch_receipt(&hash, http).await {
                Ok(receipt) => receipt,
                Err(e) => {
                    debug!(
                        %hash,
                        attempt = attempts,
                        error = %e,
                        "receipt lookup failed, retrying"
                    );
                    TelegramReceipt::default()
                }
            };

            if receipt.is_success() {
                info!(%hash, attempts, "telegram confirmed");
                return SubmissionOutcome::Success(TelegramStatus {
                    hash,
                    receipt,
                    attempts,
                });
            }

            let elapsed = self.clock.now().saturating_duration_since(started);
            if elapsed >= policy.duration {
                warn!(
                    %hash,
                    attempts,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "telegram receipt timed out"
                );
                return SubmissionOutcome::TimedOut {
                    elapsed,
                    last: Some(TelegramStatus {
                        hash,
                        receipt,
                        attempts,
                    }),
                };
            }

            debug!(
                state = "polling_receipt",
                %hash,
                attempt = attempts,
                elapsed_ms = elapsed.as_millis() as u64
            );
            // Never sleep past the deadline.
            let pause = policy.interval.min(policy.duration - elapsed);
            if pause.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(pause).await;
            }
        }
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    /// Posts one envelope and surfaces a JSON-RPC error object as an error.
    pub(crate) async fn call<T>(
        &self,
        method: RpcMethod,
        params: Value,
        http: &T,
    ) -> Result<RpcResponse, RtcError>
    where
        T: RpcTransport + ?Sized,
    {
        let request = self.format_raw_params(method, params, None);
        let response = http.post_json(&request).await?;
        if let Some(error) = &response.error {
            return Err(RtcError::rpc(method.as_str(), error));
        }
        Ok(response)
    }

    /// Logs a terminal state and converts it to an outcome.
    pub(crate) fn finish<P>(
        &self,
        operation: &str,
        result: Result<P, RtcError>,
    ) -> SubmissionOutcome<P> {
        match &result {
            Ok(_) => debug!(operation, "completed"),
            Err(e) => warn!(operation, reason = e.reason_code(), error = %e, "failed"),
        }
        result.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::{RpcError, TransportError};
    use crate::rtc::clock::ManualClock;
    use crate::config::PollPolicy;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::time::Duration;

    /// Answers each method from its own script; the last entry repeats.
    #[derive(Default)]
    struct ScriptedRpc {
        scripts: Mutex<Vec<(RpcMethod, VecDeque<Result<RpcResponse, TransportError>>)>>,
        calls: Mutex<Vec<RpcRequest>>,
    }

    impl ScriptedRpc {
        fn on(self, method: RpcMethod, response: Result<RpcResponse, TransportError>) -> Self {
            {
                let mut scripts = self.scripts.lock();
                match scripts.iter_mut().find(|(m, _)| *m == method) {
                    Some((_, queue)) => queue.push_back(response),
                    None => scripts.push((method, VecDeque::from([response]))),
                }
            }
            self
        }

        fn count(&self, method: RpcMethod) -> usize {
            self.calls.lock().iter().filter(|r| r.method == method).count()
        }
    }

    #[async_trait]
    impl RpcTransport for ScriptedRpc {
        async fn post_json(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
            self.calls.lock().push(request.clone());
            let mut scripts = self.scripts.lock();
            let (_, queue) = scripts
                .iter_mut()
                .find(|(m, _)| *m == request.method)
                .expect("unscripted method");
            if queue.len() > 1 {
                queue.pop_front().unwrap()
            } else {
                queue.front().cloned().unwrap()
            }
        }
    }

    fn key() -> PrivateKey {
        PrivateKey::from_slice(&[0x46; 32]).unwrap()
    }

    fn telegram_ok() -> Result<RpcResponse, TransportError> {
        Ok(RpcResponse::success(json!(r#"{"telegram_hash":"0xfeed"}"#)))
    }

    fn rtc_with_step(step: Duration) -> Rtc<ManualClock> {
        Rtc::with_clock(RtcConfig::default(), ManualClock::new(step))
    }

    #[tokio::test]
    async fn create_subject_confirms() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x3"))))
            .on(RpcMethod::SendRawTelegram, telegram_ok())
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({"status": "0x0"}))))
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({"status": "0x1"}))));

        let outcome = rtc_with_step(Duration::from_millis(10))
            .create_subject(2u64, &key(), &rpc)
            .await;
        let status = outcome.payload().expect("confirmed");
        assert_eq!(status.hash, "0xfeed");
        assert_eq!(status.attempts, 2);
        assert_eq!(outcome.result_code(), 0);

        // The submitted telegram carries the fetched nonce and the subject payload.
        let calls = rpc.calls.lock();
        let sent = calls.iter().find(|r| r.method == RpcMethod::SendRawTelegram).unwrap();
        let tx = LegacyTransaction::decode_hex(sent.params[0].as_str().unwrap()).unwrap();
        assert_eq!(tx.nonce(), &Quantity::from(3u64));
        assert_eq!(tx.data(), &SUBJECT_CREATION_PAYLOAD);
        assert_eq!(tx.to().unwrap().to_hex(), SUBJECT_REGISTRY_ADDRESS);
        assert_eq!(tx.recover_signer().unwrap(), key().address());
    }

    #[tokio::test]
    async fn missing_nonce_stops_before_submission() {
        for result in [json!(null), json!(""), json!("garbage"), json!("0x1_0"), json!("0x+5")] {
            let rpc = ScriptedRpc::default()
                .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(result)));
            let outcome = Rtc::new(RtcConfig::default())
                .create_subject(2u64, &key(), &rpc)
                .await;
            assert_eq!(outcome.reason_code(), Some("nonce_unavailable"));
            assert_eq!(rpc.count(RpcMethod::SendRawTelegram), 0);
        }
    }

    #[tokio::test]
    async fn missing_telegram_hash() {
        for result in [json!(null), json!("{}"), json!("not json")] {
            let rpc = ScriptedRpc::default()
                .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x0"))))
                .on(RpcMethod::SendRawTelegram, Ok(RpcResponse::success(result)));
            let outcome = Rtc::new(RtcConfig::default())
                .create_subject(2u64, &key(), &rpc)
                .await;
            assert_eq!(outcome.reason_code(), Some("missing_telegram_hash"));
            assert_eq!(rpc.count(RpcMethod::GetTelegramReceipt), 0);
        }
    }

    #[tokio::test]
    async fn rpc_error_is_reported() {
        let rpc = ScriptedRpc::default().on(
            RpcMethod::GetTelegramCount,
            Ok(RpcResponse::failure(RpcError::new(-32000, "boom"))),
        );
        let outcome = Rtc::new(RtcConfig::default())
            .create_subject(2u64, &key(), &rpc)
            .await;
        assert_eq!(
            outcome.error(),
            Some(&RtcError::Rpc {
                method: "edge_getTelegramCount".into(),
                code: -32000,
                message: "boom".into(),
            })
        );
    }

    #[tokio::test]
    async fn poll_times_out_after_duration() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x1"))))
            .on(RpcMethod::SendRawTelegram, telegram_ok())
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({}))));

        let step = Duration::from_millis(300);
        let outcome = rtc_with_step(step).create_subject(2u64, &key(), &rpc).await;
        match outcome {
            SubmissionOutcome::TimedOut { elapsed, last } => {
                assert!(elapsed >= Duration::from_secs(10));
                assert!(elapsed <= Duration::from_secs(10) + step);
                let last = last.unwrap();
                assert_eq!(last.hash, "0xfeed");
                assert!(!last.receipt.is_success());
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_failures_are_retried_while_polling() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x1"))))
            .on(RpcMethod::SendRawTelegram, telegram_ok())
            .on(RpcMethod::GetTelegramReceipt, Err(TransportError::Request("reset".into())))
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({"status": "0x1"}))));

        let outcome = rtc_with_step(Duration::from_millis(1))
            .create_subject(2u64, &key(), &rpc)
            .await;
        assert!(outcome.is_success());
        assert_eq!(rpc.count(RpcMethod::GetTelegramReceipt), 2);
    }

    #[tokio::test]
    async fn poll_interval_is_honoured() {
        tokio::time::pause();
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x1"))))
            .on(RpcMethod::SendRawTelegram, telegram_ok())
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({}))));
        let config = RtcConfig {
            poll: PollPolicy {
                duration: Duration::from_secs(1),
                interval: Duration::from_millis(250),
            },
            ..RtcConfig::default()
        };

        let outcome = Rtc::new(config).create_subject(2u64, &key(), &rpc).await;
        assert_eq!(outcome.reason_code(), Some("timed_out"));
        // Attempts at 0, 250, 500, 750 and 1000ms.
        assert_eq!(rpc.count(RpcMethod::GetTelegramReceipt), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn last_pause_stops_at_the_deadline() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramCount, Ok(RpcResponse::success(json!("0x1"))))
            .on(RpcMethod::SendRawTelegram, telegram_ok())
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({}))));
        let config = RtcConfig {
            poll: PollPolicy {
                duration: Duration::from_secs(1),
                interval: Duration::from_millis(700),
            },
            ..RtcConfig::default()
        };

        let started = tokio::time::Instant::now();
        let outcome = Rtc::new(config).create_subject(2u64, &key(), &rpc).await;
        match outcome {
            SubmissionOutcome::TimedOut { elapsed, last } => {
                assert_eq!(elapsed, Duration::from_secs(1));
                assert_eq!(last.map(|status| status.attempts), Some(3));
            }
            other => panic!("expected a timeout, got {other:?}"),
        }
        // Attempts at 0, 700 and 1000ms; the second pause is cut to 300ms.
        assert_eq!(started.elapsed(), Duration::from_secs(1));
        assert_eq!(rpc.count(RpcMethod::GetTelegramReceipt), 3);
    }

    #[tokio::test]
    async fn send_message_rejection_sentinel() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::SendRawMsg, Ok(RpcResponse::success(json!("0x0"))));
        let params = MessageParams::new("0x01", "edge_chat", "hi", 2u64).unwrap();
        let outcome = Rtc::new(RtcConfig::default())
            .send_message(&params, &key(), &rpc)
            .await;
        assert_eq!(outcome.reason_code(), Some("rejected"));
        assert_eq!(outcome.result_code(), 1);
    }

    #[tokio::test]
    async fn send_message_success_and_empty_result() {
        let params = MessageParams::new("0x01", "edge_chat", "hi", 2u64).unwrap();

        let rpc = ScriptedRpc::default()
            .on(RpcMethod::SendRawMsg, Ok(RpcResponse::success(json!("0x1"))));
        let outcome = Rtc::new(RtcConfig::default())
            .send_message(&params, &key(), &rpc)
            .await;
        assert_eq!(outcome.payload(), Some(&json!("0x1")));

        let rpc = ScriptedRpc::default().on(RpcMethod::SendRawMsg, Ok(RpcResponse::default()));
        let outcome = Rtc::new(RtcConfig::default())
            .send_message(&params, &key(), &rpc)
            .await;
        assert_eq!(outcome.reason_code(), Some("network_error"));
    }

    #[tokio::test]
    async fn single_receipt_lookup() {
        let rpc = ScriptedRpc::default()
            .on(RpcMethod::GetTelegramReceipt, Ok(RpcResponse::success(json!({"status": "0x0"}))));
        let outcome = Rtc::new(RtcConfig::default())
            .get_telegram_receipt("0xfeed", &rpc)
            .await;
        assert_eq!(outcome.reason_code(), Some("not_confirmed"));
        assert_eq!(rpc.count(RpcMethod::GetTelegramReceipt), 1);
    }

    #[test]
    fn format_raw_params_defaults_id() {
        let rtc = Rtc::new(RtcConfig::default());
        assert_eq!(rtc.format_raw_params(RpcMethod::SendRawMsg, json!([]), None).id, 1);
        assert_eq!(rtc.format_raw_params(RpcMethod::SendRawMsg, json!([]), Some(7)).id, 7);
    }
}
