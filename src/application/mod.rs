//! Application layer: authorization, fee computation and the dispatcher that
//! moves computations off the request-handling tasks.

pub mod auth;
pub mod dispatcher;
pub mod engine;
