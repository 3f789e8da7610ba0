use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{HrError, HrResult};

/// Currency rounding: two places, half away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn truncate2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::ToZero)
}

pub fn require_positive(amount: Decimal, field: &str) -> HrResult<()> {
    if amount <= Decimal::ZERO {
        return Err(HrError::validation(format!("{field} must be greater than zero")));
    }
    if amount.round_dp(2) != amount {
        return Err(HrError::validation(format!("{field} cannot have more than 2 decimal places")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn round2_is_half_up() {
        assert_eq!(round2(dec!(66.665)), dec!(66.67));
        assert_eq!(round2(dec!(66.664)), dec!(66.66));
        assert_eq!(round2(dec!(-1.005)), dec!(-1.01));
    }

    #[test]
    fn truncate2_drops_extra_places() {
        assert_eq!(truncate2(dec!(66.669)), dec!(66.66));
    }

    #[test]
    fn positive_amounts_only() {
        assert!(require_positive(dec!(0.01), "amount").is_ok());
        assert!(require_positive(Decimal::ZERO, "amount").is_err());
        assert!(require_positive(dec!(-5), "amount").is_err());
        assert!(require_positive(dec!(1.005), "amount").is_err());
    }
}
