//! Terminal results of RTC operations.

use std::time::Duration;

use serde::{Serialize, Serializer};

use super::error::RtcError;
use crate::rpc::TelegramReceipt;

/// Legacy numeric result code for success.
pub const RESULT_SUCCESS: u8 = 0;
/// Legacy numeric result code for anything else.
pub const RESULT_FAILED: u8 = 1;

/// How an RTC operation ended.
///
/// `TimedOut` is a normal terminal state, not an error: it carries the last
/// unconfirmed observation (if any) and how long the operation waited.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome<T> {
    Success(T),
    TimedOut { elapsed: Duration, last: Option<T> },
    Failure(RtcError),
}

impl<T> SubmissionOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Success(_))
    }

    /// `0` for success, `1` for a timeout or failure.
    pub fn result_code(&self) -> u8 {
        match self {
            SubmissionOutcome::Success(_) => RESULT_SUCCESS,
            _ => RESULT_FAILED,
        }
    }

    /// Stable reason code, `None` on success.
    pub fn reason_code(&self) -> Option<&'static str> {
        match self {
            SubmissionOutcome::Success(_) => None,
            SubmissionOutcome::TimedOut { .. } => Some("timed_out"),
            SubmissionOutcome::Failure(e) => Some(e.reason_code()),
        }
    }

    /// Human-readable description, `None` on success.
    pub fn description(&self) -> Option<String> {
        match self {
            SubmissionOutcome::Success(_) => None,
            SubmissionOutcome::TimedOut { elapsed, .. } => {
                Some(format!("timed out after {}ms", elapsed.as_millis()))
            }
            SubmissionOutcome::Failure(e) => Some(e.to_string()),
        }
    }

    pub fn payload(&self) -> Option<&T> {
        match self {
            SubmissionOutcome::Success(payload) => Some(payload),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&RtcError> {
        match self {
            SubmissionOutcome::Failure(e) => Some(e),
            _ => None,
        }
    }

    pub fn map<U, F: Fn(T) -> U>(self, f: F) -> SubmissionOutcome<U> {
        match self {
            SubmissionOutcome::Success(payload) => SubmissionOutcome::Success(f(payload)),
            SubmissionOutcome::TimedOut { elapsed, last } => SubmissionOutcome::TimedOut {
                elapsed,
                last: last.map(f),
            },
            SubmissionOutcome::Failure(e) => SubmissionOutcome::Failure(e),
        }
    }
}

impl<T> From<Result<T, RtcError>> for SubmissionOutcome<T> {
    fn from(result: Result<T, RtcError>) -> Self {
        match result {
            Ok(payload) => SubmissionOutcome::Success(payload),
            Err(e) => SubmissionOutcome::Failure(e),
        }
    }
}

#[derive(Serialize)]
struct OutcomeRecord<'a, T> {
    #[serde(rename = "_result")]
    result: u8,
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
    #[serde(rename = "_desc", skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    elapsed_ms: Option<u64>,
}

impl<T: Serialize> Serialize for SubmissionOutcome<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (payload, elapsed_ms) = match self {
            SubmissionOutcome::Success(payload) => (Some(payload), None),
            SubmissionOutcome::TimedOut { elapsed, last } => {
                (last.as_ref(), Some(elapsed.as_millis() as u64))
            }
            SubmissionOutcome::Failure(_) => (None, None),
        };
        OutcomeRecord {
            result: self.result_code(),
            ok: self.is_success(),
            reason: self.reason_code(),
            description: self.description(),
            payload,
            elapsed_ms,
        }
        .serialize(serializer)
    }
}

/// A submitted telegram and the latest receipt observed for it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelegramStatus {
    pub hash: String,
    pub receipt: TelegramReceipt,
    /// Receipt lookups performed, including the last one.
    pub attempts: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn result_codes() {
        let ok: SubmissionOutcome<u8> = SubmissionOutcome::Success(1);
        let timed_out: SubmissionOutcome<u8> = SubmissionOutcome::TimedOut {
            elapsed: Duration::from_secs(2),
            last: None,
        };
        let failed: SubmissionOutcome<u8> =
            SubmissionOutcome::Failure(RtcError::MissingTelegramHash);

        assert_eq!(ok.result_code(), 0);
        assert_eq!(timed_out.result_code(), 1);
        assert_eq!(failed.result_code(), 1);
        assert_eq!(ok.reason_code(), None);
        assert_eq!(timed_out.reason_code(), Some("timed_out"));
        assert_eq!(failed.reason_code(), Some("missing_telegram_hash"));
    }

    #[test]
    fn serializes_failure_record() {
        let failed: SubmissionOutcome<String> =
            SubmissionOutcome::Failure(RtcError::NonceUnavailable("null".into()));
        let json = serde_json::to_value(&failed).unwrap();
        assert_eq!(json["_result"], 1);
        assert_eq!(json["ok"], false);
        assert_eq!(json["reason"], "nonce_unavailable");
        assert!(json["_desc"].as_str().unwrap().contains("nonce is none"));
        assert!(json.get("payload").is_none());
    }

    #[test]
    fn serializes_success_record() {
        let ok = SubmissionOutcome::Success(json!({"status": "0x1"}));
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json, json!({"_result": 0, "ok": true, "payload": {"status": "0x1"}}));
    }

    #[test]
    fn from_result_and_map() {
        let outcome: SubmissionOutcome<u32> = Ok(2).into();
        assert_eq!(outcome.map(|v| v * 2).payload(), Some(&4));

        let outcome: SubmissionOutcome<u32> = Err(RtcError::MissingTelegramHash).into();
        assert_eq!(outcome.error(), Some(&RtcError::MissingTelegramHash));
    }
}
