use serde::Deserialize;
use serde::Serialize;

/// Per-user, per-asset balance with its reserved envelope.
///
/// Invariant enforced by the store's check constraint: `reserved <= balance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetBalance {
    pub user_pubkey: String,
    pub asset_id: String,
    pub balance: u64,
    pub reserved: u64,
}

impl AssetBalance {
    pub fn new(user_pubkey: impl Into<String>, asset_id: impl Into<String>) -> Self {
        Self {
            user_pubkey: user_pubkey.into(),
            asset_id: asset_id.into(),
            balance: 0,
            reserved: 0,
        }
    }

    /// Funds not locked by any in-flight session.
    pub fn available(&self) -> u64 {
        self.balance.saturating_sub(self.reserved)
    }

    pub fn can_spend(&self, amount: u64) -> bool {
        self.available() >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn available_subtracts_reserved() {
        let balance = AssetBalance {
            user_pubkey: "pk".into(),
            asset_id: "gBTC".into(),
            balance: 50_000,
            reserved: 10_000,
        };
        assert_eq!(balance.available(), 40_000);
        assert!(balance.can_spend(40_000));
        assert!(!balance.can_spend(40_001));
    }
}
