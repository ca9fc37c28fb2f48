//! Inbound adapters: the HTTP API and CSV batch files.

pub mod csv;
pub mod http;
