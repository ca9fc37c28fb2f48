use crate::domain::request::CalculationRequest;
use crate::domain::result::{CalculationResult, CalculationStatus};
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;
use uuid::Uuid;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResultRow<'a> {
    client_id: Uuid,
    plan: &'a str,
    gross_amount: Decimal,
    fee_amount: Decimal,
    net_amount: Decimal,
    status: CalculationStatus,
    proposal_id: Uuid,
}

/// Writes computed proposals as CSV, one row per request.
pub struct ResultWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ResultWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, request: &CalculationRequest, result: &CalculationResult) -> Result<()> {
        self.writer.serialize(ResultRow {
            client_id: request.client_id(),
            plan: request.plan(),
            gross_amount: request.gross_amount(),
            fee_amount: result.fee_amount,
            net_amount: result.net_amount,
            status: result.status,
            proposal_id: result.proposal_id,
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
