use crate::intent::Intent;
use crate::intent::SessionType;
use crate::ErrorKind;
use serde::Deserialize;
use serde::Serialize;

/// States of the signing ceremony.
///
/// ```text
/// initiated -> challenge_sent -> awaiting_signature -> signing -> committing
///                  |                                                |     |
///                  v (timeout)                                  ok  v     v  error
///               expired                                     completed   failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Initiated,
    ChallengeSent,
    AwaitingSignature,
    Signing,
    Committing,
    Completed,
    Failed,
    Expired,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Initiated => "initiated",
            SessionState::ChallengeSent => "challenge_sent",
            SessionState::AwaitingSignature => "awaiting_signature",
            SessionState::Signing => "signing",
            SessionState::Committing => "committing",
            SessionState::Completed => "completed",
            SessionState::Failed => "failed",
            SessionState::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "initiated" => Some(SessionState::Initiated),
            "challenge_sent" => Some(SessionState::ChallengeSent),
            "awaiting_signature" => Some(SessionState::AwaitingSignature),
            "signing" => Some(SessionState::Signing),
            "committing" => Some(SessionState::Committing),
            "completed" => Some(SessionState::Completed),
            "failed" => Some(SessionState::Failed),
            "expired" => Some(SessionState::Expired),
            _ => None,
        }
    }

    /// Terminal sessions never transition further.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Completed | SessionState::Failed | SessionState::Expired
        )
    }

    /// Whether the state machine allows `self -> to`.
    pub fn can_transition_to(&self, to: SessionState) -> bool {
        use SessionState::*;
        if self.is_terminal() {
            return false;
        }
        match (self, to) {
            (Initiated, ChallengeSent) => true,
            (ChallengeSent, AwaitingSignature) => true,
            (AwaitingSignature, Signing) => true,
            (Signing, Committing) => true,
            (Committing, Completed) => true,
            // Any non-terminal state may fail or expire.
            (_, Failed) | (_, Expired) => true,
            (_, _) => false,
        }
    }
}

/// Outcome recorded on a terminal session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SessionResult {
    Success {
        #[serde(skip_serializing_if = "Option::is_none")]
        txid: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        payment_hash: Option<String>,
        amount: u64,
        fee: u64,
    },
    Failure {
        code: ErrorKind,
        message: String,
    },
}

/// The gateway's stateful record coordinating one intent to its terminal
/// outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningSession {
    pub session_id: String,
    /// 32-byte x-only identity of the requesting wallet, hex.
    pub user_pubkey: String,
    pub session_type: SessionType,
    pub state: SessionState,
    pub intent: Intent,
    /// Human-readable rationale shown to the user.
    pub context: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub expires_at: i64,
    pub challenge_id: Option<String>,
    pub result: Option<SessionResult>,
}

impl SigningSession {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
