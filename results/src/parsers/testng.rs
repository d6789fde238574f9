use std::{collections::HashMap, path::Path};

use super::{expect_root, file_stem, load_document, map_status, FormatParser, ParseError};
use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::Element,
    model::{Status, Suite, SuiteBuilder, Test},
    string_safety::join_message,
    time_parser::{millis, TimestampParser},
};

const TAG_ROOT: &str = "testng-results";
const TAG_SUITE: &str = "suite";
const TAG_TEST_METHOD: &str = "test-method";

#[derive(Debug, Clone, Copy, Default)]
pub struct TestNgParser;

impl FormatParser for TestNgParser {
    fn format(&self) -> RunnerFormat {
        RunnerFormat::TestNg
    }

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError> {
        let document = load_document(path)?;
        expect_root(&document, TAG_ROOT)?;
        let root = document.root();
        let suites = root.children_named(TAG_SUITE).collect::<Vec<_>>();

        let name = match suites.as_slice() {
            [suite] => suite.attr_trimmed("name").map(String::from),
            _ => None,
        }
        .unwrap_or_else(|| file_stem(path));
        let mut builder = SuiteBuilder::new(name);

        if let Some(start) = suites.first().and_then(|s| s.attr_trimmed("started-at")) {
            builder.set_start_time(start);
        }
        if let Some(end) = suites.last().and_then(|s| s.attr_trimmed("finished-at")) {
            builder.set_end_time(end);
        }
        let suite_durations = suites
            .iter()
            .map(|s| s.attr("duration-ms").and_then(millis))
            .collect::<Option<Vec<_>>>();
        if let Some(durations) = suite_durations.filter(|d| !d.is_empty()) {
            builder.set_duration(durations.iter().sum());
        }

        let reporter_output = root
            .child("reporter-output")
            .into_iter()
            .flat_map(|output| output.children_named("line"))
            .map(Element::text)
            .collect::<Vec<_>>();
        builder.set_status_message(join_message(reporter_output));

        let mut timestamp_parser = TimestampParser::new();
        for suite in &suites {
            let groups = groups_by_signature(suite);
            for class in suite.descendants_named("class") {
                let class_name = class.attr_trimmed("name");
                let methods = class
                    .children_named(TAG_TEST_METHOD)
                    .filter(|method| !is_config(method));
                for method in methods {
                    let mut test = parse_test_method(method, &mut timestamp_parser, sink);
                    test.fixture = class_name.map(String::from);
                    test.categories = method
                        .attr("signature")
                        .and_then(|signature| groups.get(signature.trim()))
                        .map(|groups| groups.iter().map(|g| String::from(*g)).collect::<Vec<_>>())
                        .unwrap_or_default();
                    builder.add_test(test);
                }
            }
        }

        Ok(builder.build())
    }
}

/// Setup and teardown methods (`@BeforeClass` etc.) are reported alongside tests.
fn is_config(method: &Element) -> bool {
    method
        .attr("is-config")
        .map(|v| v.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// `<groups>` lists its members by method signature.
fn groups_by_signature(suite: &Element) -> HashMap<&str, Vec<&str>> {
    let mut groups = HashMap::<&str, Vec<&str>>::new();
    let members = suite
        .child("groups")
        .into_iter()
        .flat_map(|groups| groups.children_named("group"))
        .filter_map(|group| Some((group.attr_trimmed("name")?, group)))
        .flat_map(|(name, group)| {
            group
                .children_named("method")
                .filter_map(move |method| Some((method.attr_trimmed("signature")?, name)))
        });
    for (signature, name) in members {
        groups.entry(signature).or_default().push(name);
    }
    groups
}

fn parse_test_method(
    method: &Element,
    timestamp_parser: &mut TimestampParser,
    sink: &dyn DiagnosticSink,
) -> Test {
    let name = method.attr_trimmed("name").unwrap_or_default();
    let status = map_status(method.attr("status"), name, sink, |status| match status {
        "pass" => Some(Status::Success),
        "fail" => Some(Status::Failure),
        "skip" => Some(Status::Skipped),
        _ => None,
    });

    let mut test = Test::new(name, status);
    test.start_time = method.attr_trimmed("started-at").map(String::from);
    test.end_time = method.attr_trimmed("finished-at").map(String::from);
    test.duration = method
        .attr("duration-ms")
        .and_then(millis)
        .or_else(|| match (&test.start_time, &test.end_time) {
            (Some(start), Some(end)) => timestamp_parser.elapsed_millis(start, end),
            _ => None,
        })
        .unwrap_or_default();

    if let Some(exception) = method.child("exception") {
        let class = exception.attr_trimmed("class").unwrap_or_default();
        let message = exception.child("message").map(Element::text).unwrap_or_default();
        let stack_trace = exception
            .child("full-stacktrace")
            .map(Element::text)
            .unwrap_or_default();
        test.status_message = join_message([class, message, stack_trace]);
    }
    test
}
