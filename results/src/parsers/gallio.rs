use std::path::Path;

use super::{file_stem, load_document, map_status, FormatParser, ParseError};
use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::Element,
    model::{Status, Suite, SuiteBuilder, Test},
    string_safety::join_message,
    time_parser::{seconds_to_millis, TimestampParser},
};

const TAG_TEST_PACKAGE_RUN: &str = "testPackageRun";
const TAG_TEST_STEP_RUN: &str = "testStepRun";
const TAG_TEST_STEP: &str = "testStep";
const ROOT_STEP_NAME: &str = "Root";

#[derive(Debug, Clone, Copy, Default)]
pub struct GallioParser;

impl FormatParser for GallioParser {
    fn format(&self) -> RunnerFormat {
        RunnerFormat::Gallio
    }

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError> {
        let document = load_document(path)?;
        let package_run = document
            .root()
            .descendants_named(TAG_TEST_PACKAGE_RUN)
            .next()
            .ok_or(ParseError::MissingElement(TAG_TEST_PACKAGE_RUN))?;

        let step_runs = package_run
            .descendants_named(TAG_TEST_STEP_RUN)
            .collect::<Vec<_>>();

        let name = step_runs
            .iter()
            .filter(|run| !is_test_case(run))
            .filter_map(|run| run.child(TAG_TEST_STEP)?.attr_trimmed("name"))
            .find(|name| *name != ROOT_STEP_NAME)
            .map(String::from)
            .unwrap_or_else(|| file_stem(path));
        let mut builder = SuiteBuilder::new(name);

        let start = package_run.attr_trimmed("startTime");
        let end = package_run.attr_trimmed("endTime");
        if let (Some(start), Some(end)) = (start, end) {
            if let Some(elapsed) = TimestampParser::new().elapsed_millis(start, end) {
                builder.set_duration(elapsed);
            }
        }
        if let Some(start) = start {
            builder.set_start_time(start);
        }
        if let Some(end) = end {
            builder.set_end_time(end);
        }

        step_runs
            .iter()
            .filter(|run| is_test_case(run))
            .for_each(|run| {
                builder.add_test(parse_step_run(run, sink));
            });

        Ok(builder.build())
    }
}

fn is_test_case(step_run: &Element) -> bool {
    step_run
        .child(TAG_TEST_STEP)
        .and_then(|step| step.attr("isTestCase"))
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

fn parse_step_run(step_run: &Element, sink: &dyn DiagnosticSink) -> Test {
    let step = step_run.child(TAG_TEST_STEP);
    let name = step
        .and_then(|s| s.attr_trimmed("name"))
        .unwrap_or_default();
    let result = step_run.child("result");
    let outcome = result.and_then(|r| r.child("outcome"));

    let status = map_status(outcome.and_then(|o| o.attr("status")), name, sink, |status| {
        let category = outcome
            .and_then(|o| o.attr("category"))
            .map(|c| c.trim().to_lowercase())
            .unwrap_or_default();
        status_from_outcome(status, &category)
    });

    let mut test = Test::new(name, status);
    test.fixture = step
        .and_then(|s| s.attr_trimmed("fullName"))
        .and_then(|full_name| full_name.rsplit_once('/'))
        .map(|(fixture, _)| String::from(fixture));
    test.duration = result
        .and_then(|r| r.attr("duration"))
        .and_then(seconds_to_millis)
        .unwrap_or_default();
    test.start_time = step_run.attr_trimmed("startTime").map(String::from);
    test.end_time = step_run.attr_trimmed("endTime").map(String::from);
    test.status_message = step_run
        .child("testLog")
        .map(|log| join_message([log.deep_text().as_str()]))
        .unwrap_or_default();
    test
}

fn status_from_outcome(status: &str, category: &str) -> Option<Status> {
    let status = match (status, category) {
        ("failed", "error") => Status::Error,
        ("failed", _) => Status::Failure,
        ("passed", _) => Status::Success,
        ("inconclusive", "ignored") | ("skipped", _) => Status::Skipped,
        ("inconclusive", _) => Status::Inconclusive,
        _ => return None,
    };
    Some(status)
}
