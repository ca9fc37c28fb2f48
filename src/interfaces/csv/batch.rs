use super::proposal_reader::ProposalReader;
use super::result_writer::ResultWriter;
use crate::application::dispatcher::Dispatcher;
use crate::domain::ports::{Ledger, LedgerEntry, SharedLedger};
use crate::error::Result;
use rust_decimal::Decimal;
use std::io::{Read, Write};
use tracing::{info, warn};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct BatchSummary {
    pub computed: usize,
    pub filtered: usize,
    pub failed: usize,
}

/// Runs every proposal of a CSV file through the dispatcher.
///
/// All rows are submitted before any is awaited, so they compute concurrently;
/// submission waits for queue room rather than dropping rows. Output rows are
/// still written in input order.
pub struct BatchProcessor<'a> {
    dispatcher: &'a Dispatcher,
    ledger: SharedLedger,
    min_gross: Option<Decimal>,
}

impl<'a> BatchProcessor<'a> {
    pub fn new(dispatcher: &'a Dispatcher, ledger: SharedLedger) -> Self {
        Self {
            dispatcher,
            ledger,
            min_gross: None,
        }
    }

    /// Only keep proposals whose gross amount is strictly above `min_gross`.
    pub fn with_min_gross(mut self, min_gross: Option<Decimal>) -> Self {
        self.min_gross = min_gross;
        self
    }

    pub async fn run<R: Read, W: Write>(&self, input: R, output: W) -> Result<BatchSummary> {
        let mut summary = BatchSummary::default();
        let mut pending = Vec::new();

        for (index, proposal) in ProposalReader::new(input).proposals().enumerate() {
            let line = index + 2;
            match proposal {
                Ok(request) => {
                    if let Some(min) = self.min_gross
                        && request.gross_amount() <= min
                    {
                        summary.filtered += 1;
                        continue;
                    }
                    let handle = self.dispatcher.submit_wait(request.clone()).await;
                    pending.push((line, request, handle));
                }
                Err(e) => {
                    warn!(line, error = %e, "Error reading proposal");
                    summary.failed += 1;
                }
            }
        }

        let mut writer = ResultWriter::new(output);
        for (line, request, handle) in pending {
            match handle.outcome().await {
                Ok(result) => {
                    if let Err(e) = self.ledger.record(LedgerEntry::from(&result)).await {
                        warn!(line, error = %e, "ledger write failed");
                    }
                    writer.write(&request, &result)?;
                    summary.computed += 1;
                }
                Err(e) => {
                    warn!(line, error = %e, "Error computing proposal");
                    summary.failed += 1;
                }
            }
        }
        writer.flush()?;

        info!(
            computed = summary.computed,
            filtered = summary.filtered,
            failed = summary.failed,
            "batch finished"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dispatcher::DispatcherConfig;
    use crate::application::engine::ComputeEngine;
    use crate::domain::fee::FeeTable;
    use crate::infrastructure::in_memory::InMemoryLedger;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const INPUT: &str = "clientId,grossAmount,plan\n\
        3f2504e0-4f89-11d3-9a0c-0305e82c3301,1500.00,STARTER\n\
        3f2504e0-4f89-11d3-9a0c-0305e82c3302,4500.00,PRO\n\
        bogus,1.00,PRO\n\
        3f2504e0-4f89-11d3-9a0c-0305e82c3303,-3.00,PRO\n\
        3f2504e0-4f89-11d3-9a0c-0305e82c3304,12000.00,BASIC\n";

    fn dispatcher() -> Dispatcher {
        Dispatcher::start(
            ComputeEngine::new(Arc::new(FeeTable::standard())),
            DispatcherConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_batch_computes_records_and_reports() {
        let dispatcher = dispatcher();
        let ledger = Arc::new(InMemoryLedger::new());
        let mut output = Vec::new();

        let summary = BatchProcessor::new(&dispatcher, ledger.clone())
            .run(INPUT.as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                computed: 3,
                filtered: 0,
                failed: 2
            }
        );
        assert_eq!(ledger.entries().await.unwrap().len(), 3);

        let output = String::from_utf8(output).unwrap();
        let rows: Vec<&str> = output.lines().skip(1).collect();
        assert!(rows[0].contains(",STARTER,1500.00,90.00,1410.00,PROCESSED_ASYNC,"));
        assert!(rows[1].contains(",PRO,4500.00,675.00,3825.00,PROCESSED_ASYNC,"));
        assert!(rows[2].contains(",BASIC,12000.00,0.00,12000.00,PROCESSED_ASYNC,"));
    }

    #[tokio::test]
    async fn test_batch_larger_than_queue_keeps_every_row() {
        let dispatcher = Dispatcher::start(
            ComputeEngine::new(Arc::new(FeeTable::standard())),
            DispatcherConfig {
                workers: 2,
                queue_capacity: 8,
                ..DispatcherConfig::default()
            },
        );
        let ledger = Arc::new(InMemoryLedger::new());
        let mut input = String::from("clientId,grossAmount,plan\n");
        for _ in 0..200 {
            input.push_str(&format!("{},10.00,PRO\n", uuid::Uuid::new_v4()));
        }
        let mut output = Vec::new();

        let summary = BatchProcessor::new(&dispatcher, ledger.clone())
            .run(input.as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(
            summary,
            BatchSummary {
                computed: 200,
                filtered: 0,
                failed: 0
            }
        );
        assert_eq!(ledger.entries().await.unwrap().len(), 200);
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 201);
    }

    #[tokio::test]
    async fn test_batch_min_gross_filter() {
        let dispatcher = dispatcher();
        let ledger = Arc::new(InMemoryLedger::new());
        let mut output = Vec::new();

        let summary = BatchProcessor::new(&dispatcher, ledger.clone())
            .with_min_gross(Some(dec!(2000)))
            .run(INPUT.as_bytes(), &mut output)
            .await
            .unwrap();

        assert_eq!(summary.computed, 2);
        assert_eq!(summary.filtered, 2);
        assert_eq!(ledger.entries().await.unwrap().len(), 2);
    }
}
