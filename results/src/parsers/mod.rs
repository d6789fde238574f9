use std::path::Path;

use thiserror::Error;

use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::{Document, DocumentError, Element},
    model::{Status, Suite},
};

pub mod gallio;
pub mod mstest;
pub mod nunit;
pub mod testng;
pub mod xunit;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("expected root element `{expected}`, found `{found}`")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },
    #[error("required element `{0}` not found")]
    MissingElement(&'static str),
}

/// Contract shared by every runner-specific parser.
///
/// Parsers load the file themselves rather than sharing the classifier's
/// document, and either return a complete [`Suite`] or fail for this file only.
pub trait FormatParser: Sync {
    fn format(&self) -> RunnerFormat;

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError>;
}

static NUNIT: nunit::NUnitParser = nunit::NUnitParser;
static GALLIO: gallio::GallioParser = gallio::GallioParser;
static MSTEST_2010: mstest::MsTest2010Parser = mstest::MsTest2010Parser;
static XUNIT_V1: xunit::XUnitParser = xunit::XUnitParser::V1;
static XUNIT_V2: xunit::XUnitParser = xunit::XUnitParser::V2;
static TESTNG: testng::TestNgParser = testng::TestNgParser;

impl RunnerFormat {
    /// The parser registered for this format; `Unknown` has none.
    pub fn parser(self) -> Option<&'static dyn FormatParser> {
        match self {
            RunnerFormat::NUnit => Some(&NUNIT),
            RunnerFormat::Gallio => Some(&GALLIO),
            RunnerFormat::MsTest2010 => Some(&MSTEST_2010),
            RunnerFormat::XUnitV1 => Some(&XUNIT_V1),
            RunnerFormat::XUnitV2 => Some(&XUNIT_V2),
            RunnerFormat::TestNg => Some(&TESTNG),
            RunnerFormat::Unknown => None,
        }
    }
}

fn load_document(path: &Path) -> Result<Document, ParseError> {
    Ok(Document::from_path(path)?)
}

fn expect_root(document: &Document, expected: &'static str) -> Result<(), ParseError> {
    let found = document.root().local_name();
    if found == expected {
        Ok(())
    } else {
        Err(ParseError::UnexpectedRoot {
            expected,
            found: String::from(found),
        })
    }
}

/// Fallback suite name when the file does not carry one.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Maps a native status through `map`, reporting values it does not recognise.
fn map_status<F>(
    value: Option<&str>,
    test_name: &str,
    sink: &dyn DiagnosticSink,
    map: F,
) -> Status
where
    F: FnOnce(&str) -> Option<Status>,
{
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Status::Unknown;
    };
    map(&value.to_lowercase()).unwrap_or_else(|| {
        sink.warn(&format!(
            "Unrecognized status `{}` for test `{}`",
            value, test_name
        ));
        Status::Unknown
    })
}

/// Values of `<trait>`-like children whose key is `Category`.
fn categories_from<'a>(
    elements: impl Iterator<Item = &'a Element>,
    key_attr: &str,
    value_attr: &str,
) -> Vec<String> {
    elements
        .filter(|e| {
            e.attr(key_attr)
                .map(|k| k.trim().eq_ignore_ascii_case("category"))
                .unwrap_or(false)
        })
        .filter_map(|e| e.attr_trimmed(value_attr))
        .map(String::from)
        .collect()
}
