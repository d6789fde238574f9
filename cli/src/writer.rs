use std::{
    fs,
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::Context;
use results::{ParsedSuite, RunnerFormat, Status};
use serde::Serialize;

/// One line of a folder's `index.json`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IndexEntry {
    pub file: PathBuf,
    pub report: PathBuf,
    pub format: RunnerFormat,
    pub suite: String,
    pub status: Status,
    pub total: usize,
    pub failed: usize,
    /// Milliseconds
    pub duration: f64,
}

impl IndexEntry {
    pub fn new<T: Into<PathBuf>>(parsed: &ParsedSuite, report: T) -> Self {
        let suite = &parsed.suite;
        Self {
            file: parsed.path.clone(),
            report: report.into(),
            format: parsed.format,
            suite: String::from(suite.name()),
            status: suite.status(),
            total: suite.total(),
            failed: suite.failed_count(),
            duration: suite.duration(),
        }
    }
}

pub fn write_report<T: AsRef<Path>>(path: T, parsed: &ParsedSuite) -> anyhow::Result<()> {
    write_json(path.as_ref(), parsed)
}

pub fn write_index<T: AsRef<Path>>(path: T, entries: &[IndexEntry]) -> anyhow::Result<()> {
    write_json(path.as_ref(), &entries)
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
