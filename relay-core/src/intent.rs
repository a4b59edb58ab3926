use crate::canonical;
use crate::Error;
use crate::ErrorKind;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

/// The three ceremony flavors a wallet can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionType {
    P2pTransfer,
    LightningLift,
    LightningLand,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::P2pTransfer => "p2p_transfer",
            SessionType::LightningLift => "lightning_lift",
            SessionType::LightningLand => "lightning_land",
        }
    }

    pub fn parse(s: &str) -> Result<Self, Error> {
        match s {
            "p2p_transfer" => Ok(SessionType::P2pTransfer),
            "lightning_lift" => Ok(SessionType::LightningLift),
            "lightning_land" => Ok(SessionType::LightningLand),
            other => Err(Error::new(
                ErrorKind::UnknownSessionType,
                format!("unknown session type: {other}"),
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferParams {
    pub asset_id: String,
    pub amount: u64,
    pub recipient_pubkey: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiftParams {
    pub asset_id: String,
    pub amount: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LandParams {
    pub asset_id: String,
    pub amount: u64,
    pub lightning_invoice: String,
}

/// Intent parameters, one variant per recognized [`SessionType`].
///
/// The wire form is an open JSON mapping; parsing into the variant for the
/// declared type is the validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IntentParams {
    P2pTransfer(TransferParams),
    LightningLand(LandParams),
    LightningLift(LiftParams),
}

impl IntentParams {
    pub fn asset_id(&self) -> &str {
        match self {
            IntentParams::P2pTransfer(p) => &p.asset_id,
            IntentParams::LightningLift(p) => &p.asset_id,
            IntentParams::LightningLand(p) => &p.asset_id,
        }
    }

    pub fn amount(&self) -> u64 {
        match self {
            IntentParams::P2pTransfer(p) => p.amount,
            IntentParams::LightningLift(p) => p.amount,
            IntentParams::LightningLand(p) => p.amount,
        }
    }
}

/// A user-signed request describing what they want done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    pub action_id: String,
    pub session_type: SessionType,
    pub params: IntentParams,
    pub expires_at: i64,
}

/// Wire-level intent content as published by wallets (kind 31510).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentContent {
    pub action_id: String,
    #[serde(rename = "type")]
    pub session_type: String,
    pub params: Value,
    pub expires_at: i64,
}

impl Intent {
    /// Parse and validate an intent from its wire JSON.
    ///
    /// Field presence is checked per session type by deserializing into the
    /// matching typed parameter record.
    pub fn from_content(content: &str) -> Result<Self, Error> {
        let wire: IntentContent = serde_json::from_str(content)
            .map_err(|e| Error::invalid_intent(format!("malformed intent content: {e}")))?;

        let session_type = SessionType::parse(&wire.session_type)?;

        let params = match session_type {
            SessionType::P2pTransfer => IntentParams::P2pTransfer(
                serde_json::from_value::<TransferParams>(wire.params.clone())
                    .map_err(|e| Error::invalid_intent(format!("transfer params: {e}")))?,
            ),
            SessionType::LightningLift => IntentParams::LightningLift(
                serde_json::from_value::<LiftParams>(wire.params.clone())
                    .map_err(|e| Error::invalid_intent(format!("lift params: {e}")))?,
            ),
            SessionType::LightningLand => IntentParams::LightningLand(
                serde_json::from_value::<LandParams>(wire.params.clone())
                    .map_err(|e| Error::invalid_intent(format!("land params: {e}")))?,
            ),
        };

        if wire.action_id.is_empty() {
            return Err(Error::invalid_intent("empty action_id"));
        }

        let intent = Intent {
            action_id: wire.action_id,
            session_type,
            params,
            expires_at: wire.expires_at,
        };
        intent.validate_shape()?;

        Ok(intent)
    }

    fn validate_shape(&self) -> Result<(), Error> {
        if self.params.amount() == 0 {
            return Err(Error::invalid_intent("amount must be positive"));
        }
        if self.params.asset_id().is_empty() {
            return Err(Error::invalid_intent("empty asset_id"));
        }
        match &self.params {
            IntentParams::P2pTransfer(p) => {
                let bytes = hex::decode(&p.recipient_pubkey)
                    .map_err(|e| Error::invalid_intent(format!("recipient pubkey: {e}")))?;
                if bytes.len() != 32 {
                    return Err(Error::invalid_intent(
                        "recipient pubkey must be a 32-byte x-only key",
                    ));
                }
            }
            IntentParams::LightningLand(p) => {
                if p.lightning_invoice.is_empty() {
                    return Err(Error::invalid_intent("empty lightning invoice"));
                }
            }
            IntentParams::LightningLift(_) => {}
        }
        Ok(())
    }

    /// Reject intents whose own deadline has passed. No session may be
    /// created for an expired intent.
    pub fn check_not_expired(&self, now: i64) -> Result<(), Error> {
        if self.expires_at <= now {
            return Err(Error::new(
                ErrorKind::ExpiredIntent,
                format!("intent {} expired at {}", self.action_id, self.expires_at),
            ));
        }
        Ok(())
    }

    /// The JSON value that is canonicalized and hashed into the challenge
    /// payload. Excludes `expires_at`: the wallet commits to the action, not
    /// to the deadline.
    pub fn canonical_value(&self) -> Value {
        serde_json::json!({
            "action_id": self.action_id,
            "type": self.session_type.as_str(),
            "params": self.params,
        })
    }

    /// Canonical text of [`Self::canonical_value`].
    pub fn canonical_text(&self) -> String {
        canonical::canonicalize_json(&self.canonical_value())
    }

    /// A short human-readable rationale shown to the user alongside the
    /// challenge.
    pub fn human_context(&self) -> String {
        match &self.params {
            IntentParams::P2pTransfer(p) => format!(
                "Transfer {} {} to {}…",
                p.amount,
                p.asset_id,
                &p.recipient_pubkey[..8.min(p.recipient_pubkey.len())]
            ),
            IntentParams::LightningLift(p) => {
                format!("Lift {} {} in from Lightning", p.amount, p.asset_id)
            }
            IntentParams::LightningLand(p) => {
                format!("Land {} {} out to Lightning", p.amount, p.asset_id)
            }
        }
    }
}
