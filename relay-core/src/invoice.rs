use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    PendingPayment,
    Paid,
    Failed,
    Expired,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Pending => "pending",
            InvoiceStatus::PendingPayment => "pending_payment",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Failed => "failed",
            InvoiceStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(InvoiceStatus::Pending),
            "pending_payment" => Some(InvoiceStatus::PendingPayment),
            "paid" => Some(InvoiceStatus::Paid),
            "failed" => Some(InvoiceStatus::Failed),
            "expired" => Some(InvoiceStatus::Expired),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            InvoiceStatus::Paid | InvoiceStatus::Failed | InvoiceStatus::Expired
        )
    }
}

/// Which side of the bridge the invoice serves: `lift` receives Lightning
/// funds into an asset credit, `land` pays an external invoice out of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    Lift,
    Land,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceType::Lift => "lift",
            InvoiceType::Land => "land",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "lift" => Some(InvoiceType::Lift),
            "land" => Some(InvoiceType::Land),
            _ => None,
        }
    }
}

/// A BOLT-11 invoice tracked by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightningInvoice {
    /// 32-byte payment hash, hex. Primary key.
    pub payment_hash: String,
    pub bolt11: String,
    /// Bound when the invoice was created for a session.
    pub session_id: Option<String>,
    pub amount_sats: u64,
    pub asset_id: String,
    pub status: InvoiceStatus,
    pub invoice_type: InvoiceType,
    pub created_at: i64,
    pub expires_at: i64,
    pub paid_at: Option<i64>,
}

impl LightningInvoice {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}
