use crate::domain::fee::{SharedFeeStrategy, pad_money, round_money};
use crate::domain::request::CalculationRequest;
use crate::domain::result::{CalculationResult, CalculationStatus};
use crate::error::{CalculationError, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Applies the plan's fee rate to a validated request.
///
/// `ComputeEngine` holds no mutable state, so a single instance can be shared by
/// every dispatcher worker.
#[derive(Clone)]
pub struct ComputeEngine {
    fees: SharedFeeStrategy,
}

impl ComputeEngine {
    pub fn new(fees: SharedFeeStrategy) -> Self {
        Self { fees }
    }

    /// Computes the fee and net amount for `request`.
    ///
    /// The fee is rounded half-up to two places; the net amount is whatever
    /// remains of the gross amount, so the two always add back up exactly.
    pub fn compute(&self, request: &CalculationRequest) -> Result<CalculationResult> {
        let gross = request.gross_amount();
        if gross < Decimal::ZERO {
            return Err(CalculationError::InvalidAmount(gross));
        }

        let rate = self.fees.rate(request.plan());
        let fee_amount = round_money(gross.checked_mul(rate).ok_or_else(overflow)?);
        let net_amount = pad_money(gross.checked_sub(fee_amount).ok_or_else(overflow)?);

        Ok(CalculationResult {
            proposal_id: Uuid::new_v4(),
            net_amount,
            fee_amount,
            status: CalculationStatus::ProcessedAsync,
        })
    }
}

fn overflow() -> CalculationError {
    CalculationError::ComputeFailure("decimal overflow while applying fee".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fee::FeeTable;
    use rand::Rng;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn engine() -> ComputeEngine {
        ComputeEngine::new(Arc::new(FeeTable::standard()))
    }

    fn request(gross: Decimal, plan: &str) -> CalculationRequest {
        CalculationRequest::new(Uuid::new_v4(), gross, plan.to_string())
    }

    #[test]
    fn test_starter_plan() {
        let result = engine().compute(&request(dec!(1000.00), "STARTER")).unwrap();
        assert_eq!(result.fee_amount, dec!(60.00));
        assert_eq!(result.net_amount, dec!(940.00));
        assert_eq!(result.status, CalculationStatus::ProcessedAsync);
    }

    #[test]
    fn test_pro_plan() {
        let result = engine().compute(&request(dec!(1000.00), "pro")).unwrap();
        assert_eq!(result.fee_amount, dec!(150.00));
        assert_eq!(result.net_amount, dec!(850.00));
    }

    #[test]
    fn test_unknown_plan_is_untaxed() {
        let result = engine().compute(&request(dec!(500.00), "BASIC")).unwrap();
        assert_eq!(result.fee_amount.to_string(), "0.00");
        assert_eq!(result.net_amount.to_string(), "500.00");
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = engine()
            .compute(&request(dec!(-0.01), "PRO"))
            .unwrap_err();
        assert!(matches!(err, CalculationError::InvalidAmount(a) if a == dec!(-0.01)));
    }

    #[test]
    fn test_zero_amount() {
        let result = engine().compute(&request(dec!(0), "PRO")).unwrap();
        assert_eq!(result.fee_amount.to_string(), "0.00");
        assert_eq!(result.net_amount.to_string(), "0.00");
    }

    #[test]
    fn test_fee_rounds_half_up() {
        // 0.25 * 0.06 = 0.015
        let result = engine().compute(&request(dec!(0.25), "STARTER")).unwrap();
        assert_eq!(result.fee_amount, dec!(0.02));
        assert_eq!(result.net_amount, dec!(0.23));
    }

    #[test]
    fn test_each_computation_gets_fresh_proposal_id() {
        let engine = engine();
        let req = request(dec!(10.00), "PRO");
        let first = engine.compute(&req).unwrap();
        let second = engine.compute(&req).unwrap();
        assert_ne!(first.proposal_id, second.proposal_id);
        assert_eq!(first.net_amount, second.net_amount);
    }

    #[test]
    fn test_fee_plus_net_equals_gross() {
        let engine = engine();
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let cents: i64 = rng.gen_range(0..100_000_000);
            let gross = Decimal::new(cents, 2);
            for plan in ["STARTER", "PRO", "BASIC"] {
                let result = engine.compute(&request(gross, plan)).unwrap();
                assert_eq!(result.fee_amount + result.net_amount, gross);
                assert!(result.fee_amount.scale() == 2 && result.net_amount.scale() == 2);
            }
        }
    }
}
