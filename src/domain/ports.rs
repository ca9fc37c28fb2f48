use super::result::CalculationResult;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// One archived calculation.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub proposal_id: Uuid,
    pub net_amount: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(proposal_id: Uuid, net_amount: Decimal) -> Self {
        Self {
            proposal_id,
            net_amount,
            recorded_at: Utc::now(),
        }
    }

    /// Human readable line stored for the entry.
    pub fn summary(&self) -> String {
        format!("ID: {} | Net: {}", self.proposal_id, self.net_amount)
    }
}

impl From<&CalculationResult> for LedgerEntry {
    fn from(result: &CalculationResult) -> Self {
        Self::new(result.proposal_id, result.net_amount)
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Append-only sink for completed calculations.
///
/// Implementations serialize concurrent appends so each entry lands whole, and
/// never remove entries. `entries` returns them in insertion order.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn record(&self, entry: LedgerEntry) -> Result<()>;
    async fn entries(&self) -> Result<Vec<LedgerEntry>>;
}

pub type SharedLedger = Arc<dyn Ledger>;
