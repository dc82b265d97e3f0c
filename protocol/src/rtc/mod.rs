//! # RTC Protocol Engine
//!
//! The submit/confirm/subscribe flows built on the transaction model and
//! the two transport seams.
//!
//! ## Operations
//!
//! | Operation              | Transport | Outcome payload    |
//! |------------------------|-----------|--------------------|
//! | `get_telegram_count`   | RPC       | nonce              |
//! | `get_telegram_receipt` | RPC       | receipt            |
//! | `create_subject`       | RPC       | telegram status    |
//! | `send_message`         | RPC       | node result        |
//! | `subscribe`            | stream    | acknowledgment     |
//! | `send_socket_message`  | stream    | none (deprecated)  |
//!
//! Every operation returns a [`SubmissionOutcome`]; caller-input errors are
//! caught earlier by the [`MessageParams`] / [`SubscribeParams`]
//! constructors and by [`crate::crypto::PrivateKey::from_hex`].

pub mod clock;
pub mod error;
pub mod outcome;
pub mod params;
pub mod submission;
pub mod subscription;

pub use clock::{Clock, SystemClock};
#[cfg(any(test, feature = "test-util"))]
pub use clock::ManualClock;
pub use error::RtcError;
pub use outcome::{SubmissionOutcome, TelegramStatus, RESULT_FAILED, RESULT_SUCCESS};
pub use params::{MessageParams, SubscribeParams};
pub use submission::Rtc;
pub use subscription::match_subscription_ack;
