pub mod report;
pub mod writer;
