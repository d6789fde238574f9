use std::{collections::HashMap, path::Path};

use super::{expect_root, file_stem, load_document, map_status, FormatParser, ParseError};
use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::Element,
    model::{Status, Suite, SuiteBuilder, Test},
    string_safety::join_message,
    time_parser::{timespan_to_millis, TimestampParser},
};

const TAG_ROOT: &str = "TestRun";
const TAG_UNIT_TEST_RESULT: &str = "UnitTestResult";

/// Visual Studio 2010+ `.trx` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct MsTest2010Parser;

/// What `<TestDefinitions>` says about a test, keyed by test id.
#[derive(Debug, Default)]
struct Definition<'a> {
    class_name: Option<&'a str>,
    owners: Vec<&'a str>,
    categories: Vec<&'a str>,
}

impl FormatParser for MsTest2010Parser {
    fn format(&self) -> RunnerFormat {
        RunnerFormat::MsTest2010
    }

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError> {
        let document = load_document(path)?;
        expect_root(&document, TAG_ROOT)?;
        let root = document.root();

        let name = root
            .attr_trimmed("name")
            .map(String::from)
            .unwrap_or_else(|| file_stem(path));
        let mut builder = SuiteBuilder::new(name);
        let mut timestamp_parser = TimestampParser::new();

        if let Some(times) = root.child("Times") {
            let start = times.attr_trimmed("start").or(times.attr_trimmed("creation"));
            let finish = times.attr_trimmed("finish");
            if let (Some(start), Some(finish)) = (start, finish) {
                if let Some(elapsed) = timestamp_parser.elapsed_millis(start, finish) {
                    builder.set_duration(elapsed);
                }
            }
            if let Some(start) = start {
                builder.set_start_time(start);
            }
            if let Some(finish) = finish {
                builder.set_end_time(finish);
            }
        }

        let run_infos = root
            .path(&["ResultSummary", "RunInfos"])
            .into_iter()
            .flat_map(|infos| infos.children_named("RunInfo"))
            .filter_map(|info| info.child("Text"))
            .map(Element::text)
            .collect::<Vec<_>>();
        builder.set_status_message(join_message(run_infos));

        let definitions = definitions(root);
        let results = root
            .child("Results")
            .into_iter()
            .flat_map(|results| results.descendants_named(TAG_UNIT_TEST_RESULT));
        for result in results {
            let definition = result
                .attr("testId")
                .and_then(|id| definitions.get(id.trim()));
            builder.add_test(parse_result(result, definition, &mut timestamp_parser, sink));
        }

        if let Some(owner) = shared_owner(root, &definitions) {
            builder.set_feature_owner(owner);
        }

        Ok(builder.build())
    }
}

fn definitions(root: &Element) -> HashMap<&str, Definition<'_>> {
    root.child("TestDefinitions")
        .into_iter()
        .flat_map(|defs| defs.children_named("UnitTest"))
        .filter_map(|unit_test| {
            let id = unit_test.attr_trimmed("id")?;
            let definition = Definition {
                class_name: unit_test
                    .child("TestMethod")
                    .and_then(|m| m.attr_trimmed("className"))
                    .map(|class_name| {
                        // "Namespace.Class, Assembly, Version=..." keeps only the type name
                        class_name.split(',').next().unwrap_or(class_name).trim()
                    }),
                owners: unit_test
                    .child("Owners")
                    .into_iter()
                    .flat_map(|owners| owners.children_named("Owner"))
                    .filter_map(|owner| owner.attr_trimmed("name"))
                    .collect(),
                categories: unit_test
                    .child("TestCategory")
                    .into_iter()
                    .flat_map(|c| c.children_named("TestCategoryItem"))
                    .filter_map(|item| item.attr_trimmed("TestCategory"))
                    .collect(),
            };
            Some((id, definition))
        })
        .collect()
}

/// The owner every executed test shares, when there is exactly one.
fn shared_owner<'a>(root: &Element, definitions: &HashMap<&str, Definition<'a>>) -> Option<&'a str> {
    let mut owners = root
        .child("Results")
        .into_iter()
        .flat_map(|results| results.descendants_named(TAG_UNIT_TEST_RESULT))
        .map(|result| {
            result
                .attr("testId")
                .and_then(|id| definitions.get(id.trim()))
                .map(|d| d.owners.as_slice())
                .unwrap_or_default()
        });
    let first = owners.next()?;
    match first {
        [owner] if owners.all(|o| o == first) => Some(*owner),
        _ => None,
    }
}

fn parse_result(
    result: &Element,
    definition: Option<&Definition>,
    timestamp_parser: &mut TimestampParser,
    sink: &dyn DiagnosticSink,
) -> Test {
    let name = result.attr_trimmed("testName").unwrap_or_default();
    let status = map_status(result.attr("outcome"), name, sink, status_from_outcome);

    let mut test = Test::new(name, status);
    test.start_time = result.attr_trimmed("startTime").map(String::from);
    test.end_time = result.attr_trimmed("endTime").map(String::from);
    test.duration = result
        .attr("duration")
        .and_then(timespan_to_millis)
        .or_else(|| match (&test.start_time, &test.end_time) {
            (Some(start), Some(end)) => timestamp_parser.elapsed_millis(start, end),
            _ => None,
        })
        .unwrap_or_default();

    if let Some(error_info) = result.path(&["Output", "ErrorInfo"]) {
        let message = error_info.child("Message").map(Element::text).unwrap_or_default();
        let stack_trace = error_info
            .child("StackTrace")
            .map(Element::text)
            .unwrap_or_default();
        test.status_message = join_message([message, stack_trace]);
    }

    if let Some(definition) = definition {
        test.fixture = definition.class_name.map(String::from);
        test.categories = definition.categories.iter().map(|c| String::from(*c)).collect();
    }
    test
}

fn status_from_outcome(outcome: &str) -> Option<Status> {
    let status = match outcome {
        "passed" | "passedbutrunaborted" | "completed" => Status::Success,
        "failed" => Status::Failure,
        "error" | "timeout" | "aborted" => Status::Error,
        "inconclusive" | "warning" => Status::Inconclusive,
        "notexecuted" | "notrunnable" | "pending" | "disconnected" => Status::Skipped,
        _ => return None,
    };
    Some(status)
}
