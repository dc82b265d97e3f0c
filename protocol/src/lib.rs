// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Edge Matrix Protocol Client Library
//!
//! Builds, signs and submits Edge Matrix transactions, then confirms them
//! over JSON-RPC or waits for their acknowledgment on the event stream.
//!
//! ## Architecture
//!
//! Modules, leaves first:
//!
//! - **config**: Wire constants and the tunable [`config::RtcConfig`].
//! - **crypto**: Keccak-256, secp256k1 keys, addresses.
//! - **codec**: Canonical RLP field layout and arbitrary-width quantities.
//! - **transaction**: `LegacyTransaction` and `Transaction`: build, sign,
//!   serialize, decode.
//! - **rpc**: JSON-RPC envelopes and the HTTP transport.
//! - **stream**: Listener registry and the WebSocket transport.
//! - **rtc**: The submission and subscription state machines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgematrix_protocol::config::RtcConfig;
//! use edgematrix_protocol::crypto::PrivateKey;
//! use edgematrix_protocol::rpc::HttpTransport;
//! use edgematrix_protocol::rtc::{MessageParams, Rtc};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let key = PrivateKey::from_hex("0x4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318")?;
//! let http = HttpTransport::new("http://127.0.0.1:40012")?;
//! let rtc = Rtc::new(RtcConfig::default());
//!
//! let params = MessageParams::new("0x8eeb", "edge_chat", "hello", 2u64)?;
//! let outcome = rtc.send_message(&params, &key, &http).await;
//! println!("result code {}", outcome.result_code());
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod config;
pub mod crypto;
pub mod rpc;
pub mod rtc;
pub mod stream;
pub mod transaction;
