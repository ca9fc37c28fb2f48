use rust_decimal::Decimal;
use uuid::Uuid;

/// A validated calculation request.
///
/// Only the request parser builds these from untrusted input; once built the
/// request is immutable and moves through the pipeline by value.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRequest {
    client_id: Uuid,
    gross_amount: Decimal,
    plan: String,
}

impl CalculationRequest {
    pub(crate) fn new(client_id: Uuid, gross_amount: Decimal, plan: String) -> Self {
        Self {
            client_id,
            gross_amount,
            plan,
        }
    }

    pub fn client_id(&self) -> Uuid {
        self.client_id
    }

    pub fn gross_amount(&self) -> Decimal {
        self.gross_amount
    }

    /// The plan exactly as supplied by the caller.
    pub fn plan(&self) -> &str {
        &self.plan
    }
}
