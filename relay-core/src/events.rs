use crate::ErrorKind;
use serde::Deserialize;
use serde::Serialize;

/// Relay event kinds used by the gateway, one parameterized-replaceable
/// ladder. Wallets publish `INTENT` and `RESPONSE`; the gateway publishes
/// the rest, addressed to the user with a `p` tag.
pub const KIND_INTENT: u16 = 31510;
pub const KIND_CHALLENGE: u16 = 31511;
pub const KIND_RESPONSE: u16 = 31512;
pub const KIND_STATUS: u16 = 31513;
pub const KIND_SUCCESS: u16 = 31514;
pub const KIND_FAILURE: u16 = 31515;

/// Content of a `KIND_CHALLENGE` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChallengeContent {
    pub challenge_id: String,
    pub payload_to_sign: String,
    pub payload_ref: String,
    pub context: String,
    pub expires_at: i64,
}

/// Content of a `KIND_RESPONSE` event, NIP-04 encrypted on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseContent {
    pub challenge_id: String,
    pub signature: String,
}

/// Content of a `KIND_STATUS` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusContent {
    pub session_id: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// BOLT-11 invoice handed to the user mid-ceremony (lift flow).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessResults {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_hash: Option<String>,
    pub amount: u64,
    pub fee: u64,
}

/// Content of a `KIND_SUCCESS` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessContent {
    /// Always `"success"`.
    pub status: String,
    pub ref_action_id: String,
    pub results: SuccessResults,
    pub timestamp: i64,
}

impl SuccessContent {
    pub fn new(ref_action_id: impl Into<String>, results: SuccessResults, timestamp: i64) -> Self {
        Self {
            status: "success".to_string(),
            ref_action_id: ref_action_id.into(),
            results,
            timestamp,
        }
    }
}

/// Content of a `KIND_FAILURE` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureContent {
    /// Always `"failure"`.
    pub status: String,
    pub ref_action_id: String,
    pub code: ErrorKind,
    pub message: String,
    pub timestamp: i64,
}

impl FailureContent {
    pub fn new(
        ref_action_id: impl Into<String>,
        code: ErrorKind,
        message: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            status: "failure".to_string(),
            ref_action_id: ref_action_id.into(),
            code,
            message: message.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_content_serializes_code_as_wire_string() {
        let content = FailureContent::new("A1", ErrorKind::InsufficientBalance, "too poor", 7);
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["code"], "insufficient_balance");
        assert_eq!(json["status"], "failure");
        assert_eq!(json["ref_action_id"], "A1");
    }

    #[test]
    fn success_results_omit_absent_fields() {
        let content = SuccessContent::new(
            "A1",
            SuccessResults {
                txid: Some("deadbeef".into()),
                payment_hash: None,
                amount: 10_000,
                fee: 10,
            },
            7,
        );
        let json = serde_json::to_string(&content).unwrap();
        assert!(json.contains("txid"));
        assert!(!json.contains("payment_hash"));
    }
}
