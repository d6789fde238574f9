//! Detects which test runner produced a results file and normalizes it into
//! one [`model::Suite`].

pub mod classifier;
pub mod diagnostics;
pub mod dispatcher;
pub mod document;
pub mod model;
pub mod parsers;
pub mod string_safety;
pub mod time_parser;

pub use classifier::{classify, classify_file, RunnerFormat};
pub use diagnostics::{DiagnosticSink, LogSink, MemorySink};
pub use dispatcher::{DispatchError, Dispatcher, ParsedSuite};
pub use model::{Status, Suite, Test};
