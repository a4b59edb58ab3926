use serde::Deserialize;
use serde::Serialize;

/// Lifecycle of a virtual unspent output.
///
/// `available -> reserved -> {assigned, available}`; `assigned` and `spent`
/// are reached only through a successful session commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VtxoStatus {
    Available,
    Reserved,
    Assigned,
    Spent,
    Expired,
}

impl VtxoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VtxoStatus::Available => "available",
            VtxoStatus::Reserved => "reserved",
            VtxoStatus::Assigned => "assigned",
            VtxoStatus::Spent => "spent",
            VtxoStatus::Expired => "expired",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "available" => Some(VtxoStatus::Available),
            "reserved" => Some(VtxoStatus::Reserved),
            "assigned" => Some(VtxoStatus::Assigned),
            "spent" => Some(VtxoStatus::Spent),
            "expired" => Some(VtxoStatus::Expired),
            _ => None,
        }
    }
}

/// A virtual unspent output tracked by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vtxo {
    /// Opaque identifier, usually `txid:index`.
    pub vtxo_id: String,
    pub asset_id: String,
    /// Amount in the asset's smallest unit.
    pub amount: u64,
    /// `None` for gateway-owned pool VTXOs.
    pub owner_pubkey: Option<String>,
    pub status: VtxoStatus,
    /// Set exactly while `status == Reserved`.
    pub reserved_by_session: Option<String>,
    pub created_at: i64,
    pub expires_at: i64,
}

impl Vtxo {
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }
}

/// Pick available VTXOs covering `amount`.
///
/// Preference order: a single exact-amount match, then the fewest outputs
/// (greedy, largest first), with older outputs winning ties so aging
/// inventory drains before it expires. Returns `None` when the candidates
/// cannot cover the amount.
pub fn select_vtxos(candidates: &[Vtxo], amount: u64) -> Option<Vec<Vtxo>> {
    if amount == 0 {
        return Some(Vec::new());
    }

    let total: u64 = candidates.iter().map(|v| v.amount).sum();
    if total < amount {
        return None;
    }

    // A single output of exactly the right size avoids creating change.
    if let Some(exact) = candidates
        .iter()
        .filter(|v| v.amount == amount)
        .min_by_key(|v| v.created_at)
    {
        return Some(vec![exact.clone()]);
    }

    let mut sorted: Vec<&Vtxo> = candidates.iter().collect();
    sorted.sort_by(|a, b| {
        b.amount
            .cmp(&a.amount)
            .then_with(|| a.created_at.cmp(&b.created_at))
    });

    let mut picked = Vec::new();
    let mut covered = 0u64;
    for vtxo in sorted {
        picked.push(vtxo.clone());
        covered = covered.saturating_add(vtxo.amount);
        if covered >= amount {
            return Some(picked);
        }
    }

    // Unreachable: the total was checked above.
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vtxo(id: &str, amount: u64, created_at: i64) -> Vtxo {
        Vtxo {
            vtxo_id: id.to_string(),
            asset_id: "gBTC".to_string(),
            amount,
            owner_pubkey: None,
            status: VtxoStatus::Available,
            reserved_by_session: None,
            created_at,
            expires_at: created_at + 86_400,
        }
    }

    #[test]
    fn prefers_exact_match() {
        let candidates = vec![vtxo("a", 5_000, 10), vtxo("b", 10_000, 20), vtxo("c", 7_000, 5)];
        let picked = select_vtxos(&candidates, 10_000).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].vtxo_id, "b");
    }

    #[test]
    fn exact_match_ties_break_oldest() {
        let candidates = vec![vtxo("young", 10_000, 50), vtxo("old", 10_000, 1)];
        let picked = select_vtxos(&candidates, 10_000).unwrap();
        assert_eq!(picked[0].vtxo_id, "old");
    }

    #[test]
    fn fewest_outputs_wins_otherwise() {
        let candidates = vec![
            vtxo("a", 2_000, 1),
            vtxo("b", 2_000, 2),
            vtxo("c", 9_000, 3),
        ];
        let picked = select_vtxos(&candidates, 10_000).unwrap();
        // 9000 + 2000 beats 2000+2000+... on output count.
        assert_eq!(picked.len(), 2);
        assert_eq!(picked[0].vtxo_id, "c");
        assert_eq!(picked[1].vtxo_id, "a");
    }

    #[test]
    fn insufficient_inventory_yields_none() {
        let candidates = vec![vtxo("a", 1_000, 1)];
        assert!(select_vtxos(&candidates, 10_000).is_none());
    }

    #[test]
    fn covers_full_inventory_spend() {
        let candidates = vec![vtxo("a", 4_000, 1), vtxo("b", 6_000, 2)];
        let picked = select_vtxos(&candidates, 10_000).unwrap();
        assert_eq!(picked.len(), 2);
    }
}
