use std::{fmt, path::Path};

use serde::Serialize;

use crate::document::Document;

pub const MSTEST_2010_NAMESPACE: &str = "http://microsoft.com/schemas/VisualStudio/TeamTest/2010";
pub const GALLIO_NAMESPACE: &str = "http://www.gallio.org/";

const MSTEST_ROOT: &str = "TestRun";
const GALLIO_TEST_MODEL: &str = "testModel";
const XUNIT_ASSEMBLY: &str = "assembly";
const XUNIT_TEST_FRAMEWORK_ATTR: &str = "test-framework";
const NUNIT_ENVIRONMENT: &str = "environment";
const NUNIT_VERSION_ATTR: &str = "nunit-version";
const NUNIT_TEST_SUITE: &str = "test-suite";
const TESTNG_ROOT: &str = "testng-results";

/// The closed set of result schemas this crate understands.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum RunnerFormat {
    NUnit,
    Gallio,
    MsTest2010,
    XUnitV1,
    XUnitV2,
    TestNg,
    Unknown,
}

impl fmt::Display for RunnerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunnerFormat::NUnit => "NUnit",
            RunnerFormat::Gallio => "Gallio",
            RunnerFormat::MsTest2010 => "MSTest 2010",
            RunnerFormat::XUnitV1 => "xUnit v1",
            RunnerFormat::XUnitV2 => "xUnit v2",
            RunnerFormat::TestNg => "TestNG",
            RunnerFormat::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Works out which runner wrote `document`.
///
/// Rules run in a fixed order and the first match wins, since several formats
/// share elements. `extension` is the file extension with or without its dot.
pub fn classify(document: &Document, extension: &str) -> RunnerFormat {
    let extension = extension.to_lowercase();

    if extension.ends_with("trx") && is_mstest_2010(document) {
        return RunnerFormat::MsTest2010;
    }

    if extension.ends_with("xml") {
        if document
            .find_in_namespace(GALLIO_TEST_MODEL, GALLIO_NAMESPACE)
            .is_some()
        {
            return RunnerFormat::Gallio;
        }

        if let Some(format) = xunit_version(document) {
            return format;
        }

        // Other runners emitting NUnit-style output often leave out <environment>
        let has_nunit_environment = document
            .find(NUNIT_ENVIRONMENT)
            .and_then(|env| env.attr(NUNIT_VERSION_ATTR))
            .is_some();
        if has_nunit_environment || document.find(NUNIT_TEST_SUITE).is_some() {
            return RunnerFormat::NUnit;
        }

        if document.root().name() == TESTNG_ROOT {
            return RunnerFormat::TestNg;
        }
    }

    RunnerFormat::Unknown
}

/// Loads and classifies the file at `path`. Unreadable or malformed files are `Unknown`.
pub fn classify_file<T: AsRef<Path>>(path: T) -> RunnerFormat {
    let path = path.as_ref();
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy())
        .unwrap_or_default();

    match Document::from_path(path) {
        Ok(document) => classify(&document, &extension),
        Err(_) => RunnerFormat::Unknown,
    }
}

/// The root must sit in the TeamTest namespace and its `xmlns` declaration must
/// mention 2010. This is a substring check on the declaration, not a URI comparison.
fn is_mstest_2010(document: &Document) -> bool {
    let root = document.root();
    root.local_name() == MSTEST_ROOT
        && root.namespace() == Some(MSTEST_2010_NAMESPACE)
        && root
            .attr("xmlns")
            .map(|xmlns| xmlns.contains("2010"))
            .unwrap_or(false)
}

/// Only the first `<assembly>` is consulted. The version token in `test-framework`
/// (e.g. `xUnit.net 2.0.0.2929`) is what tells v1 and v2 apart.
fn xunit_version(document: &Document) -> Option<RunnerFormat> {
    let test_framework = document
        .find(XUNIT_ASSEMBLY)?
        .attr(XUNIT_TEST_FRAMEWORK_ATTR)?
        .to_lowercase();

    if !test_framework.contains("xunit") {
        return None;
    }
    if test_framework.contains(" 2.") {
        Some(RunnerFormat::XUnitV2)
    } else if test_framework.contains(" 1.") {
        Some(RunnerFormat::XUnitV1)
    } else {
        None
    }
}
