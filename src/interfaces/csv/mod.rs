pub mod batch;
pub mod proposal_reader;
pub mod result_writer;
