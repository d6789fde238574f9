pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILURE: i32 = 1;

/// Env var holding an `env_logger` filter string, e.g. `debug` or `results=trace`.
pub const REPORT_UNIT_LOG_ENV: &str = "REPORT_UNIT_LOG";
pub const REPORT_UNIT_OUTPUT_ENV: &str = "REPORT_UNIT_OUTPUT";

/// Upper bound, in bytes, for any free-text field copied out of a results file.
pub const MAX_TEXT_FIELD_SIZE: usize = 8_000;

pub const REPORT_EXTENSION: &str = "json";
pub const FOLDER_INDEX_FILE_NAME: &str = "index.json";
