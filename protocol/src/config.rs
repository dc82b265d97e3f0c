//! # Protocol Configuration & Constants
//!
//! Every magic number the Edge Matrix client depends on lives here: method
//! names, sentinel values, fixed addresses, and the default timing policy
//! of the RTC engine. Callers tune behaviour through [`RtcConfig`]; the
//! constants themselves are wire facts and are not meant to change.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Network Identifiers
// ---------------------------------------------------------------------------

/// Chain id of the public Edge Matrix network.
pub const DEFAULT_CHAIN_ID: u64 = 2;

// ---------------------------------------------------------------------------
// JSON-RPC
// ---------------------------------------------------------------------------

/// JSON-RPC protocol version carried by every envelope.
pub const JSONRPC_VERSION: &str = "2.0";

/// Request id used when the caller does not supply one.
pub const DEFAULT_REQUEST_ID: u64 = 1;

/// Returns the per-address telegram count (the nonce).
pub const METHOD_GET_TELEGRAM_COUNT: &str = "edge_getTelegramCount";

/// Submits a serialized legacy transaction (a "telegram").
pub const METHOD_SEND_RAW_TELEGRAM: &str = "edge_sendRawTelegram";

/// Returns the receipt of a submitted telegram.
pub const METHOD_GET_TELEGRAM_RECEIPT: &str = "edge_getTelegramReceipt";

/// Publishes a serialized message transaction against a subject.
pub const METHOD_SEND_RAW_MSG: &str = "edge_sendRawMsg";

/// Stream control frame that subscribes the signer to a subject.
pub const METHOD_SUBSCRIBE: &str = "edge_subscribe";

/// First parameter of an `edge_subscribe` frame.
pub const SUBSCRIBE_CHANNEL_RTC: &str = "rtc";

// ---------------------------------------------------------------------------
// Wire Sentinels
// ---------------------------------------------------------------------------

/// Receipt status meaning "included".
pub const RECEIPT_STATUS_SUCCESS: &str = "0x1";

/// `edge_sendRawMsg` result signalling an application-level rejection.
pub const REJECTION_SENTINEL: &str = "0x0";

/// `Type` value of a stream frame acknowledging a subscription.
pub const SUBSCRIPTION_ACK_TYPE: u64 = 2;

/// `Type` value of an ordinary message frame.
pub const MESSAGE_ORDINARY_TYPE: u64 = 0;

// ---------------------------------------------------------------------------
// Subject Creation
// ---------------------------------------------------------------------------

/// Registry contract that receives subject-creation telegrams.
pub const SUBJECT_REGISTRY_ADDRESS: &str = "0x0000000000000000000000000000000000003101";

/// Payload carried by a subject-creation telegram.
pub const SUBJECT_CREATION_PAYLOAD: [u8; 3] = [0x33, 0x34, 0x35];

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// How long receipt polling keeps retrying before reporting a timeout.
pub const DEFAULT_POLL_DURATION: Duration = Duration::from_secs(10);

/// Delay between receipt attempts. Zero retries immediately after each
/// unconfirmed response.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::ZERO;

/// How long a subscription waits for its acknowledgment frame.
pub const DEFAULT_SUBSCRIBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Request timeout of the HTTP transport.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(600);

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// secp256k1 private keys are exactly 32 bytes.
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Addresses are the trailing 20 bytes of the Keccak-256 of the public key.
pub const ADDRESS_LENGTH: usize = 20;

/// Keccak-256 digest length.
pub const HASH_OUTPUT_LENGTH: usize = 32;

/// Constant added to `recovery_id + 2 * chain_id` when folding `v`.
pub const V_OFFSET: u64 = 8;

// ---------------------------------------------------------------------------
// Runtime Configuration
// ---------------------------------------------------------------------------

/// Retry policy for receipt polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Elapsed time after which polling stops and reports `TimedOut`.
    pub duration: Duration,
    /// Pause between two unconfirmed attempts.
    pub interval: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            duration: DEFAULT_POLL_DURATION,
            interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

/// Tunable parameters of the [`crate::rtc::Rtc`] engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RtcConfig {
    /// Logs the display form of every signed transaction at `info`.
    pub debug: bool,
    /// Receipt polling policy used by `create_subject`.
    pub poll: PollPolicy,
    /// Deadline for a subscription acknowledgment.
    pub subscribe_timeout: Duration,
}

impl Default for RtcConfig {
    fn default() -> Self {
        Self {
            debug: false,
            poll: PollPolicy::default(),
            subscribe_timeout: DEFAULT_SUBSCRIBE_TIMEOUT,
        }
    }
}

/// Returns a friendly name for a chain id, mainly for logging.
pub fn network_name(chain_id: u64) -> String {
    match chain_id {
        DEFAULT_CHAIN_ID => "edge-matrix".to_string(),
        other => format!("chain-{}", other),
    }
}
