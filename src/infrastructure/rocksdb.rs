use crate::domain::ports::{Ledger, LedgerEntry};
use crate::error::{CalculationError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Column Family holding ledger entries keyed by sequence number.
pub const CF_LEDGER: &str = "ledger";

/// A persistent ledger backed by RocksDB.
///
/// Keys are big-endian sequence numbers, so iteration order is insertion order
/// and survives restarts. This struct is thread-safe (`Clone` shares the
/// underlying `Arc<DB>` and sequence counter).
#[derive(Clone)]
pub struct RocksDBLedger {
    db: Arc<DB>,
    next_seq: Arc<AtomicU64>,
}

impl RocksDBLedger {
    /// Opens or creates a RocksDB ledger at `path`, resuming after the last entry.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_ledger = ColumnFamilyDescriptor::new(CF_LEDGER, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_ledger])?;

        let next_seq = {
            let cf = ledger_cf(&db)?;
            match db.iterator_cf(cf, IteratorMode::End).next() {
                Some(item) => {
                    let (key, _) = item?;
                    decode_seq(&key)? + 1
                }
                None => 0,
            }
        };

        Ok(Self {
            db: Arc::new(db),
            next_seq: Arc::new(AtomicU64::new(next_seq)),
        })
    }
}

fn ledger_cf(db: &DB) -> Result<&ColumnFamily> {
    db.cf_handle(CF_LEDGER).ok_or_else(|| {
        CalculationError::PersistenceFailure("Ledger column family not found".to_string())
    })
}

fn decode_seq(key: &[u8]) -> Result<u64> {
    let bytes: [u8; 8] = key.try_into().map_err(|_| {
        CalculationError::PersistenceFailure(format!("Corrupt ledger key of {} bytes", key.len()))
    })?;
    Ok(u64::from_be_bytes(bytes))
}

#[async_trait]
impl Ledger for RocksDBLedger {
    async fn record(&self, entry: LedgerEntry) -> Result<()> {
        let cf = ledger_cf(&self.db)?;
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
        let value = serde_json::to_vec(&entry).map_err(|e| {
            CalculationError::PersistenceFailure(format!("Serialization error: {}", e))
        })?;

        self.db.put_cf(cf, seq.to_be_bytes(), value)?;
        info!(seq, entry = %entry, "ledger entry persisted");
        Ok(())
    }

    async fn entries(&self) -> Result<Vec<LedgerEntry>> {
        let cf = ledger_cf(&self.db)?;

        let mut entries = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            let entry: LedgerEntry = serde_json::from_slice(&value).map_err(|e| {
                CalculationError::PersistenceFailure(format!("Failed to deserialize entry: {}", e))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }
}
