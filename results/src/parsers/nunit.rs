use std::path::Path;

use super::{file_stem, load_document, map_status, FormatParser, ParseError};
use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::Element,
    model::{Status, Suite, SuiteBuilder, Test},
    string_safety::join_message,
    time_parser::seconds_to_millis,
};

const TAG_V2_ROOT: &str = "test-results";
const TAG_V3_ROOT: &str = "test-run";
const TAG_TEST_SUITE: &str = "test-suite";
const TAG_TEST_CASE: &str = "test-case";

const PROPERTY_SET: &str = "Set";
const PROPERTY_FEATURE_OWNER: &str = "FeatureOwner";

/// NUnit 2.x (`<test-results>`) and 3.x (`<test-run>`) output, plus NUnit-shaped
/// output from other runners that only share the `<test-suite>` nesting.
#[derive(Debug, Clone, Copy, Default)]
pub struct NUnitParser;

impl FormatParser for NUnitParser {
    fn format(&self) -> RunnerFormat {
        RunnerFormat::NUnit
    }

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError> {
        let document = load_document(path)?;
        let root = document.root();
        let outermost_suite = root.descendants_named(TAG_TEST_SUITE).next();

        let is_v3 = root.local_name() == TAG_V3_ROOT;
        if !is_v3 && root.local_name() != TAG_V2_ROOT && outermost_suite.is_none() {
            return Err(ParseError::MissingElement(TAG_TEST_SUITE));
        }

        let name = root
            .attr_trimmed("name")
            .or_else(|| outermost_suite.and_then(|s| s.attr_trimmed("name")))
            .map(String::from)
            .unwrap_or_else(|| file_stem(path));
        let mut builder = SuiteBuilder::new(name);

        let status_source = if is_v3 { Some(root) } else { outermost_suite };
        if let Some(source) = status_source {
            let source_name = source.attr_trimmed("name").unwrap_or(source.name());
            let status = map_status(source.attr("result"), source_name, sink, |result| {
                status_from_result(result, source.attr("label"))
            });
            builder.set_status(status);
        }

        if is_v3 {
            set_v3_times(root, &mut builder);
        } else {
            set_v2_times(root, outermost_suite, &mut builder);
        }

        if let Some(set) = suite_property(root, PROPERTY_SET) {
            builder.set_set(set);
        }
        if let Some(owner) = suite_property(root, PROPERTY_FEATURE_OWNER) {
            builder.set_feature_owner(owner);
        }
        if let Some(message) = outermost_suite.map(|s| failure_message(s)) {
            builder.set_status_message(message);
        }

        collect_test_cases(root, None, &mut builder, sink);

        Ok(builder.build())
    }
}

fn set_v3_times(root: &Element, builder: &mut SuiteBuilder) {
    if let Some(start) = root.attr_trimmed("start-time") {
        builder.set_start_time(start);
    }
    if let Some(end) = root.attr_trimmed("end-time") {
        builder.set_end_time(end);
    }
    if let Some(duration) = root.attr("duration").and_then(seconds_to_millis) {
        builder.set_duration(duration);
    }
}

/// NUnit 2 splits the run's start into `date` and `time` (wall clock) attributes;
/// the elapsed seconds live on the outermost suite's `time`.
fn set_v2_times(root: &Element, outermost_suite: Option<&Element>, builder: &mut SuiteBuilder) {
    let start = match (root.attr_trimmed("date"), root.attr_trimmed("time")) {
        (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
        (Some(date), None) => Some(String::from(date)),
        (None, Some(time)) => Some(String::from(time)),
        (None, None) => None,
    };
    if let Some(start) = start {
        builder.set_start_time(start);
    }
    if let Some(duration) = outermost_suite
        .and_then(|s| s.attr("time"))
        .and_then(seconds_to_millis)
    {
        builder.set_duration(duration);
    }
}

fn status_from_result(result: &str, label: Option<&str>) -> Option<Status> {
    let label = label.map(|l| l.trim().to_lowercase()).unwrap_or_default();
    let status = match result {
        "success" | "passed" => Status::Success,
        "failure" | "failed" => match label.as_str() {
            "error" | "invalid" | "cancelled" => Status::Error,
            _ => Status::Failure,
        },
        "error" | "cancelled" | "notrunnable" => Status::Error,
        "inconclusive" | "warning" => Status::Inconclusive,
        "ignored" | "skipped" => Status::Skipped,
        _ => return None,
    };
    Some(status)
}

fn suite_property<'a>(root: &'a Element, key: &str) -> Option<&'a str> {
    root.descendants_named(TAG_TEST_SUITE)
        .filter_map(|suite| suite.child("properties"))
        .flat_map(|properties| properties.children_named("property"))
        .find(|property| {
            property
                .attr("name")
                .map(|name| name.trim().eq_ignore_ascii_case(key))
                .unwrap_or(false)
        })
        .and_then(|property| property.attr_trimmed("value"))
}

/// Owning fixture so far, and whether it came from a fixture-typed suite.
type FixtureContext<'a> = Option<(&'a str, bool)>;

fn collect_test_cases<'a>(
    element: &'a Element,
    fixture: FixtureContext<'a>,
    builder: &mut SuiteBuilder,
    sink: &dyn DiagnosticSink,
) {
    for child in element.children() {
        match child.local_name() {
            TAG_TEST_CASE => {
                builder.add_test(parse_test_case(child, fixture.map(|(f, _)| f), sink));
            }
            TAG_TEST_SUITE => {
                let is_fixture = child
                    .attr("type")
                    .map(|t| matches!(t, "TestFixture" | "ParameterizedFixture"))
                    .unwrap_or(false);
                let name = child.attr_trimmed("name");
                let fixture = match (name, fixture) {
                    (Some(name), _) if is_fixture => Some((name, true)),
                    (_, Some((_, true))) => fixture,
                    (Some(name), _) => Some((name, false)),
                    (None, _) => fixture,
                };
                collect_test_cases(child, fixture, builder, sink);
            }
            _ => collect_test_cases(child, fixture, builder, sink),
        }
    }
}

fn parse_test_case(element: &Element, fixture: Option<&str>, sink: &dyn DiagnosticSink) -> Test {
    let name = element.attr_trimmed("name").unwrap_or_default();
    let status = map_status(element.attr("result"), name, sink, |result| {
        status_from_result(result, element.attr("label"))
    });

    let mut test = Test::new(name, status);
    test.fixture = fixture.map(String::from);
    test.status_message = failure_message(element);
    test.start_time = element.attr_trimmed("start-time").map(String::from);
    test.end_time = element.attr_trimmed("end-time").map(String::from);
    test.duration = element
        .attr("duration")
        .or_else(|| element.attr("time"))
        .and_then(seconds_to_millis)
        .unwrap_or_default();
    test.categories = categories(element);
    test
}

/// `<failure>` message and stack trace, or else the `<reason>` for skipped tests.
fn failure_message(element: &Element) -> String {
    if let Some(failure) = element.child("failure") {
        let message = failure.child("message").map(Element::text).unwrap_or_default();
        let stack_trace = failure
            .child("stack-trace")
            .map(Element::text)
            .unwrap_or_default();
        return join_message([message, stack_trace]);
    }
    join_message([element
        .path(&["reason", "message"])
        .map(Element::text)
        .unwrap_or_default()])
}

fn categories(element: &Element) -> Vec<String> {
    let v2 = element
        .child("categories")
        .into_iter()
        .flat_map(|c| c.children_named("category"))
        .filter_map(|c| c.attr_trimmed("name"))
        .map(String::from);
    let v3 = super::categories_from(
        element
            .child("properties")
            .into_iter()
            .flat_map(|p| p.children_named("property")),
        "name",
        "value",
    );
    v2.chain(v3).collect()
}
