use std::sync::{Arc, Mutex};

/// Receives advisory notifications from classification and parsing.
///
/// Nothing emitted here changes control flow; callers decide where messages go.
pub trait DiagnosticSink {
    fn emit(&self, level: log::Level, message: &str);

    fn info(&self, message: &str) {
        self.emit(log::Level::Info, message);
    }

    fn warn(&self, message: &str) {
        self.emit(log::Level::Warn, message);
    }

    fn error(&self, message: &str) {
        self.emit(log::Level::Error, message);
    }
}

/// Forwards to whatever `log` backend the binary installed.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, level: log::Level, message: &str) {
        log::log!(target: "results", level, "{}", message);
    }
}

/// Keeps every message in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    messages: Arc<Mutex<Vec<(log::Level, String)>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn messages(&self) -> Vec<(log::Level, String)> {
        self.messages
            .lock()
            .map(|messages| messages.clone())
            .unwrap_or_default()
    }

    pub fn at_level(&self, level: log::Level) -> Vec<String> {
        self.messages()
            .into_iter()
            .filter(|(l, _)| *l == level)
            .map(|(_, message)| message)
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, level: log::Level, message: &str) {
        if let Ok(mut messages) = self.messages.lock() {
            messages.push((level, String::from(message)));
        }
    }
}
