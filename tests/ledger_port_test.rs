use feecalc::domain::ports::{Ledger, LedgerEntry, SharedLedger};
use feecalc::infrastructure::in_memory::InMemoryLedger;
use rust_decimal_macros::dec;
use std::sync::Arc;
use uuid::Uuid;

#[tokio::test]
async fn test_ledger_as_trait_object() {
    let ledger: SharedLedger = Arc::new(InMemoryLedger::new());
    let entry = LedgerEntry::new(Uuid::new_v4(), dec!(940.00));

    // Verify Send + Sync by spawning tasks
    let writer = ledger.clone();
    let expected = entry.clone();
    tokio::spawn(async move { writer.record(expected).await.unwrap() })
        .await
        .unwrap();

    let reader = ledger.clone();
    let entries = tokio::spawn(async move { reader.entries().await.unwrap() })
        .await
        .unwrap();

    assert_eq!(entries, vec![entry]);
}

#[tokio::test]
async fn test_clones_share_one_ledger() {
    let ledger = InMemoryLedger::new();
    let shared: SharedLedger = Arc::new(ledger.clone());

    shared
        .record(LedgerEntry::new(Uuid::new_v4(), dec!(1.00)))
        .await
        .unwrap();

    assert_eq!(ledger.entries().await.unwrap().len(), 1);
}
