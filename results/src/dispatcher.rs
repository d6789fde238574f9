use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::{
    classifier::{classify, RunnerFormat},
    diagnostics::DiagnosticSink,
    document::Document,
    model::Suite,
    parsers::ParseError,
};

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Input file does not exist: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Input file does not have a file extension: {}", .0.display())]
    NoExtension(PathBuf),
    #[error("Skipping {}. It is not of a known test runner type.", .0.display())]
    Unrecognized(PathBuf),
    #[error("Could not parse {} as {format} test results: {source}", .path.display())]
    Parse {
        path: PathBuf,
        format: RunnerFormat,
        #[source]
        source: ParseError,
    },
}

/// A suite together with the file and format it came from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedSuite {
    pub path: PathBuf,
    pub format: RunnerFormat,
    pub suite: Suite,
}

/// Classifies one results file at a time and hands it to the matching parser.
pub struct Dispatcher<'a> {
    sink: &'a dyn DiagnosticSink,
}

impl<'a> Dispatcher<'a> {
    pub fn new(sink: &'a dyn DiagnosticSink) -> Self {
        Self { sink }
    }

    /// Parses `path` if it is a recognised results file.
    ///
    /// Every failure is reported to the sink and turned into `None`, so a batch
    /// driver can move on to its next file.
    pub fn load_parser<T: AsRef<Path>>(&self, path: T) -> Option<ParsedSuite> {
        match self.dispatch(path) {
            Ok(parsed) => Some(parsed),
            Err(e @ DispatchError::Unrecognized(..)) => {
                self.sink.info(&e.to_string());
                None
            }
            Err(e) => {
                self.sink.error(&e.to_string());
                None
            }
        }
    }

    pub fn dispatch<T: AsRef<Path>>(&self, path: T) -> Result<ParsedSuite, DispatchError> {
        let path = path.as_ref();

        if !path.is_file() {
            return Err(DispatchError::NotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        if extension.trim().is_empty() {
            return Err(DispatchError::NoExtension(path.to_path_buf()));
        }

        // A file that does not even load is simply not a results file
        let format = match Document::from_path(path) {
            Ok(document) => classify(&document, &extension),
            Err(e) => {
                self.sink.emit(
                    log::Level::Debug,
                    &format!("Could not load {}: {}", path.display(), e),
                );
                RunnerFormat::Unknown
            }
        };

        let Some(parser) = format.parser() else {
            return Err(DispatchError::Unrecognized(path.to_path_buf()));
        };
        self.sink.info(&format!(
            "The file {} contains {} test results",
            path.display(),
            format
        ));

        parser
            .load_file(path, self.sink)
            .map(|suite| ParsedSuite {
                path: path.to_path_buf(),
                format,
                suite,
            })
            .map_err(|source| DispatchError::Parse {
                path: path.to_path_buf(),
                format,
                source,
            })
    }
}
