//! Domain types: requests, results, fee tiers and the ledger port.

pub mod fee;
pub mod ports;
pub mod request;
pub mod result;
