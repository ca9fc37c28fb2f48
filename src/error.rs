use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CalculationError {
    #[error("Malformed request: {0}")]
    MalformedRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Access denied: credential does not grant plan {0}")]
    Forbidden(String),
    #[error("Gross amount cannot be negative: {0}")]
    InvalidAmount(Decimal),
    #[error("Computation failed: {0}")]
    ComputeFailure(String),
    #[error("Computation timed out after {0:?}")]
    Timeout(Duration),
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
    #[error("Invalid fee rate: {0}")]
    InvalidFeeRate(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl CalculationError {
    /// HTTP status code reported to the caller for this failure.
    pub fn status_code(&self) -> u16 {
        match self {
            CalculationError::Unauthorized(_) => 401,
            CalculationError::Forbidden(_) => 403,
            _ => 500,
        }
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for CalculationError {
    fn from(err: rocksdb::Error) -> Self {
        CalculationError::PersistenceFailure(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CalculationError>;
