use std::path::Path;

use super::{categories_from, file_stem, load_document, map_status, FormatParser, ParseError};
use crate::{
    classifier::RunnerFormat,
    diagnostics::DiagnosticSink,
    document::Element,
    model::{Status, Suite, SuiteBuilder, Test},
    string_safety::join_message,
    time_parser::seconds_to_millis,
};

const TAG_ASSEMBLY: &str = "assembly";
const TAG_TEST: &str = "test";

/// xUnit.net output. Both versions nest `<test>` under `<assembly>`; they differ
/// in the grouping element (`class` vs `collection`) and the skip reason shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XUnitParser {
    V1,
    V2,
}

impl FormatParser for XUnitParser {
    fn format(&self) -> RunnerFormat {
        match self {
            XUnitParser::V1 => RunnerFormat::XUnitV1,
            XUnitParser::V2 => RunnerFormat::XUnitV2,
        }
    }

    fn load_file(&self, path: &Path, sink: &dyn DiagnosticSink) -> Result<Suite, ParseError> {
        let document = load_document(path)?;
        let assemblies = document
            .root()
            .descendants_named(TAG_ASSEMBLY)
            .collect::<Vec<_>>();

        let name = match assemblies.as_slice() {
            [] => return Err(ParseError::MissingElement(TAG_ASSEMBLY)),
            [assembly] => assembly.attr_trimmed("name").map(assembly_file_name),
            _ => None,
        }
        .unwrap_or_else(|| file_stem(path));
        let mut builder = SuiteBuilder::new(name);

        if let Some(first) = assemblies.first() {
            let start = match (first.attr_trimmed("run-date"), first.attr_trimmed("run-time")) {
                (Some(date), Some(time)) => Some(format!("{} {}", date, time)),
                (date, time) => date.or(time).map(String::from),
            };
            if let Some(start) = start {
                builder.set_start_time(start);
            }
        }

        let assembly_times = assemblies
            .iter()
            .map(|a| a.attr("time").and_then(seconds_to_millis))
            .collect::<Option<Vec<_>>>();
        if let Some(times) = assembly_times {
            builder.set_duration(times.iter().sum());
        }

        if *self == XUnitParser::V2 {
            let errors = assemblies
                .iter()
                .flat_map(|a| a.children_named("errors"))
                .flat_map(|errors| errors.children_named("error"))
                .filter_map(|error| error.path(&["failure", "message"]))
                .map(Element::text)
                .collect::<Vec<_>>();
            builder.set_status_message(join_message(errors));
        }

        for assembly in &assemblies {
            self.collect_tests(assembly, None, &mut builder, sink);
        }

        Ok(builder.build())
    }
}

impl XUnitParser {
    fn collect_tests<'a>(
        &self,
        element: &'a Element,
        class: Option<&'a str>,
        builder: &mut SuiteBuilder,
        sink: &dyn DiagnosticSink,
    ) {
        for child in element.children() {
            match child.local_name() {
                TAG_TEST => {
                    builder.add_test(self.parse_test(child, class, sink));
                }
                "class" => {
                    let class = child.attr_trimmed("name").or(class);
                    self.collect_tests(child, class, builder, sink);
                }
                "errors" => (),
                _ => self.collect_tests(child, class, builder, sink),
            }
        }
    }

    fn parse_test(&self, element: &Element, class: Option<&str>, sink: &dyn DiagnosticSink) -> Test {
        let name = element.attr_trimmed("name").unwrap_or_default();
        let status = map_status(element.attr("result"), name, sink, |result| match result {
            "pass" => Some(Status::Success),
            "fail" => Some(Status::Failure),
            "skip" => Some(Status::Skipped),
            _ => None,
        });

        let mut test = Test::new(name, status);
        test.fixture = element.attr_trimmed("type").or(class).map(String::from);
        test.duration = element
            .attr("time")
            .and_then(seconds_to_millis)
            .unwrap_or_default();
        test.status_message = self.message(element);
        test.categories = categories_from(
            element
                .child("traits")
                .into_iter()
                .flat_map(|traits| traits.children_named("trait")),
            "name",
            "value",
        );
        test
    }

    fn message(&self, element: &Element) -> String {
        if let Some(failure) = element.child("failure") {
            let message = failure.child("message").map(Element::text).unwrap_or_default();
            let stack_trace = failure
                .child("stack-trace")
                .map(Element::text)
                .unwrap_or_default();
            return join_message([message, stack_trace]);
        }

        let reason = element.child("reason");
        let reason = match self {
            XUnitParser::V1 => reason.and_then(|r| r.child("message")).map(Element::text),
            XUnitParser::V2 => reason.map(Element::text),
        };
        join_message(reason)
    }
}

/// Assemblies are named by their full path; the report only needs the file part.
fn assembly_file_name(name: &str) -> String {
    let file_name = name.rsplit(|c: char| c == '\\' || c == '/').next().unwrap_or(name);
    String::from(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assembly_name_drops_directories() {
        assert_eq!(
            assembly_file_name(r"C:\build\bin\Release\Tests.dll"),
            "Tests.dll"
        );
        assert_eq!(assembly_file_name("/home/ci/out/Tests.dll"), "Tests.dll");
        assert_eq!(assembly_file_name("Tests.dll"), "Tests.dll");
    }
}
