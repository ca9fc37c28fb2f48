use crate::domain::request::CalculationRequest;
use crate::error::{CalculationError, Result};
use crate::interfaces::http::parser::RequestParser;
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ProposalRecord {
    #[serde(rename = "clientId")]
    client_id: String,
    #[serde(rename = "grossAmount")]
    gross_amount: String,
    plan: String,
}

/// Reads calculation proposals from a CSV source.
///
/// Expects a `clientId,grossAmount,plan` header. Each row is validated with the
/// same rules as the HTTP payload.
pub struct ProposalReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> ProposalReader<R> {
    /// Creates a new `ProposalReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and validates proposals.
    pub fn proposals(self) -> impl Iterator<Item = Result<CalculationRequest>> {
        self.reader.into_deserialize().map(|result| {
            let record: ProposalRecord = result.map_err(CalculationError::from)?;
            RequestParser::from_fields(&record.client_id, &record.gross_amount, &record.plan)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_reader_valid_stream() {
        let data = "clientId, grossAmount, plan\n\
                    3f2504e0-4f89-11d3-9a0c-0305e82c3301, 1500.0, starter\n\
                    3f2504e0-4f89-11d3-9a0c-0305e82c3302, 4500.0, PRO";
        let reader = ProposalReader::new(data.as_bytes());
        let results: Vec<Result<CalculationRequest>> = reader.proposals().collect();

        assert_eq!(results.len(), 2);
        let first = results[0].as_ref().unwrap();
        assert_eq!(first.gross_amount(), dec!(1500.0));
        assert_eq!(first.plan(), "starter");
    }

    #[test]
    fn test_reader_malformed_line() {
        let data = "clientId, grossAmount, plan\nnot-a-uuid, 1.0, PRO\n3f2504e0-4f89-11d3-9a0c-0305e82c3301";
        let reader = ProposalReader::new(data.as_bytes());
        let results: Vec<Result<CalculationRequest>> = reader.proposals().collect();

        assert!(matches!(results[0], Err(CalculationError::MalformedRequest(_))));
        assert!(matches!(results[1], Err(CalculationError::CsvError(_))));
    }
}
