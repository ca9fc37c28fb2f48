use crate::domain::ports::{Ledger, LedgerEntry};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

/// A thread-safe in-memory ledger.
///
/// Uses `Arc<RwLock<Vec<LedgerEntry>>>`; appends take the write lock so every
/// entry lands whole. Contents live as long as the process.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    entries: Arc<RwLock<Vec<LedgerEntry>>>,
}

impl InMemoryLedger {
    /// Creates a new, empty in-memory ledger.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Ledger for InMemoryLedger {
    async fn record(&self, entry: LedgerEntry) -> Result<()> {
        info!(entry = %entry, "ledger entry archived");
        let mut entries = self.entries.write().await;
        entries.push(entry);
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let entries = self.entries.read().await;
        Ok(entries.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_in_memory_ledger_preserves_order() {
        let ledger = InMemoryLedger::new();
        let first = LedgerEntry::new(Uuid::new_v4(), dec!(940.00));
        let second = LedgerEntry::new(Uuid::new_v4(), dec!(850.00));

        ledger.record(first.clone()).await.unwrap();
        ledger.record(second.clone()).await.unwrap();

        assert_eq!(ledger.entries().await.unwrap(), vec![first, second]);
    }

    #[tokio::test]
    async fn test_in_memory_ledger_concurrent_appends() {
        let ledger = InMemoryLedger::new();
        let handles: Vec<_> = (0..64)
            .map(|i| {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger
                        .record(LedgerEntry::new(Uuid::new_v4(), rust_decimal::Decimal::from(i)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let entries = ledger.entries().await.unwrap();
        assert_eq!(entries.len(), 64);
    }

    #[test]
    fn test_entry_summary() {
        let entry = LedgerEntry::new(Uuid::nil(), dec!(940.00));
        assert_eq!(
            entry.summary(),
            "ID: 00000000-0000-0000-0000-000000000000 | Net: 940.00"
        );
    }
}
