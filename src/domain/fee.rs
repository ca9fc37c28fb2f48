use crate::error::{CalculationError, Result};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use std::collections::HashMap;
use std::sync::Arc;

/// Number of fractional digits carried by every monetary output.
pub const MONEY_SCALE: u32 = 2;

/// Resolves the fee rate that applies to a plan.
///
/// Implementations must be pure: the same plan always maps to the same rate and
/// lookups never fail. Unknown plans resolve to a default rate.
pub trait FeeStrategy: Send + Sync {
    fn rate(&self, plan: &str) -> Decimal;
}

pub type SharedFeeStrategy = Arc<dyn FeeStrategy>;

/// Static mapping from uppercased plan name to fee rate.
#[derive(Debug, Clone, PartialEq)]
pub struct FeeTable {
    rates: HashMap<String, Decimal>,
    default_rate: Decimal,
}

impl FeeTable {
    /// Creates an empty table where every plan resolves to `default_rate`.
    pub fn new(default_rate: Decimal) -> Result<Self> {
        validate_rate("default", default_rate)?;
        Ok(Self {
            rates: HashMap::new(),
            default_rate,
        })
    }

    /// The production tiers: STARTER pays 6%, PRO pays 15%, anything else is untaxed.
    pub fn standard() -> Self {
        let mut rates = HashMap::new();
        rates.insert("STARTER".to_string(), dec!(0.06));
        rates.insert("PRO".to_string(), dec!(0.15));
        Self {
            rates,
            default_rate: Decimal::ZERO,
        }
    }

    /// Adds or replaces the rate for `plan`. Rates must lie in `[0, 1)`.
    pub fn with_rate(mut self, plan: &str, rate: Decimal) -> Result<Self> {
        validate_rate(plan, rate)?;
        self.rates.insert(normalize_plan(plan), rate);
        Ok(self)
    }

    pub fn with_default_rate(mut self, rate: Decimal) -> Result<Self> {
        validate_rate("default", rate)?;
        self.default_rate = rate;
        Ok(self)
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }
}

impl Default for FeeTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl FeeStrategy for FeeTable {
    fn rate(&self, plan: &str) -> Decimal {
        self.rates
            .get(&normalize_plan(plan))
            .copied()
            .unwrap_or(self.default_rate)
    }
}

fn validate_rate(plan: &str, rate: Decimal) -> Result<()> {
    if rate < Decimal::ZERO || rate >= Decimal::ONE {
        return Err(CalculationError::InvalidFeeRate(format!(
            "rate {} for plan {} must be within [0, 1)",
            rate, plan
        )));
    }
    Ok(())
}

pub fn normalize_plan(plan: &str) -> String {
    plan.trim().to_uppercase()
}

/// Rounds a monetary value to two places, half-up.
pub fn round_money(value: Decimal) -> Decimal {
    pad_money(value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero))
}

/// Pads a value to at least two fractional digits without changing it.
pub fn pad_money(mut value: Decimal) -> Decimal {
    if value.scale() < MONEY_SCALE {
        value.rescale(MONEY_SCALE);
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_rates() {
        let table = FeeTable::standard();
        assert_eq!(table.rate("STARTER"), dec!(0.06));
        assert_eq!(table.rate("PRO"), dec!(0.15));
    }

    #[test]
    fn test_plan_lookup_is_case_insensitive() {
        let table = FeeTable::standard();
        assert_eq!(table.rate("starter"), dec!(0.06));
        assert_eq!(table.rate(" Pro "), dec!(0.15));
    }

    #[test]
    fn test_unknown_plan_uses_default_rate() {
        let table = FeeTable::standard();
        assert_eq!(table.rate("BASIC"), Decimal::ZERO);
        assert_eq!(table.rate("VIP"), Decimal::ZERO);

        let table = FeeTable::standard()
            .with_default_rate(dec!(0.01))
            .unwrap();
        assert_eq!(table.rate("BASIC"), dec!(0.01));
    }

    #[test]
    fn test_with_rate_overrides_and_extends() {
        let table = FeeTable::new(Decimal::ZERO)
            .unwrap()
            .with_rate("vip", dec!(0.02))
            .unwrap();
        assert_eq!(table.rate("VIP"), dec!(0.02));
        assert_eq!(table.rate("PRO"), Decimal::ZERO);
    }

    #[test]
    fn test_rate_out_of_range_rejected() {
        assert!(matches!(
            FeeTable::standard().with_rate("PRO", dec!(1.0)),
            Err(CalculationError::InvalidFeeRate(_))
        ));
        assert!(matches!(
            FeeTable::new(dec!(-0.01)),
            Err(CalculationError::InvalidFeeRate(_))
        ));
    }

    #[test]
    fn test_round_money_half_up() {
        assert_eq!(round_money(dec!(0.015)).to_string(), "0.02");
        assert_eq!(round_money(dec!(0.014)).to_string(), "0.01");
        assert_eq!(round_money(dec!(60)).to_string(), "60.00");
    }
}
