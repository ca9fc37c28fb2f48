use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationStatus {
    ProcessedAsync,
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationStatus::ProcessedAsync => f.write_str("PROCESSED_ASYNC"),
        }
    }
}

/// Outcome of one successful computation.
///
/// `fee_amount + net_amount` always equals the gross amount of the request it
/// was computed from.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub proposal_id: Uuid,
    pub net_amount: Decimal,
    pub fee_amount: Decimal,
    pub status: CalculationStatus,
}
