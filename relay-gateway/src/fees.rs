//! Fee estimation for Lightning off-ramps.

/// Fee amount as a floating point value in satoshis.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeeAmount(pub f64);

impl FeeAmount {
    /// Converts the fee amount to satoshis, rounding up.
    pub fn to_satoshis(&self) -> u64 {
        self.0.max(0.0).ceil() as u64
    }
}

impl std::ops::Add for FeeAmount {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        FeeAmount(self.0 + other.0)
    }
}

impl From<f64> for FeeAmount {
    fn from(value: f64) -> Self {
        FeeAmount(value)
    }
}

/// Estimated routing fee for paying out `amount_sats`, as a percentage of
/// the amount with a 1-sat floor.
pub fn estimate_lightning_fee(amount_sats: u64, fee_percentage: f64) -> FeeAmount {
    FeeAmount((amount_sats as f64 * fee_percentage).max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentage_fee_rounds_up() {
        assert_eq!(estimate_lightning_fee(10_000, 0.001).to_satoshis(), 10);
        assert_eq!(estimate_lightning_fee(10_500, 0.001).to_satoshis(), 11);
    }

    #[test]
    fn small_amounts_hit_the_floor() {
        assert_eq!(estimate_lightning_fee(100, 0.001).to_satoshis(), 1);
        assert_eq!(estimate_lightning_fee(0, 0.001).to_satoshis(), 1);
    }
}
