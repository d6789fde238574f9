use std::path::PathBuf;

use pretty_assertions::assert_eq;
use results::{MemorySink, RunnerFormat, Status, Suite, Test};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn parse(name: &str, format: RunnerFormat) -> Suite {
    let sink = MemorySink::new();
    let suite = format
        .parser()
        .unwrap()
        .load_file(&fixture(name), &sink)
        .unwrap();
    assert!(
        sink.at_level(log::Level::Warn).is_empty(),
        "{:?}",
        sink.messages()
    );
    suite
}

fn names(suite: &Suite) -> Vec<&str> {
    suite.tests().iter().map(|t| t.name.as_str()).collect()
}

fn statuses(suite: &Suite) -> Vec<Status> {
    suite.tests().iter().map(|t| t.status).collect()
}

fn test<'a>(suite: &'a Suite, name: &str) -> &'a Test {
    suite.tests().iter().find(|t| t.name == name).unwrap()
}

#[test]
fn nunit2() {
    let suite = parse("nunit2.xml", RunnerFormat::NUnit);

    assert_eq!(suite.name(), r"C:\build\Calculator.Tests.dll");
    assert_eq!(suite.status(), Status::Failure);
    assert_eq!(suite.failed_count(), 1);
    assert_eq!(suite.total(), 4);
    assert_eq!(suite.count(Status::Success), 3);
    assert_eq!(suite.set(), Some("Regression"));
    assert_eq!(suite.feature_owner(), Some("Arithmetic Team"));
    assert_eq!(suite.status_message(), "One or more child tests had errors");
    assert_eq!(suite.start_time(), Some("2015-03-05 14:14:31"));
    assert_eq!(suite.duration(), 500.0);
    assert_eq!(
        names(&suite),
        [
            "Calculator.AdditionTests.AddsPositives",
            "Calculator.AdditionTests.AddsNegatives",
            "Calculator.AdditionTests.AddsZero",
            "Calculator.SubtractionTests.Subtracts",
        ]
    );

    let adds_positives = test(&suite, "Calculator.AdditionTests.AddsPositives");
    assert_eq!(adds_positives.fixture.as_deref(), Some("AdditionTests"));
    assert_eq!(adds_positives.categories, ["Fast"]);
    assert_eq!(adds_positives.duration, 125.0);

    let adds_negatives = test(&suite, "Calculator.AdditionTests.AddsNegatives");
    assert_eq!(adds_negatives.status, Status::Failure);
    assert_eq!(
        adds_negatives.status_message,
        "Expected: -3\n  But was:  3\nat Calculator.AdditionTests.AddsNegatives() in AdditionTests.cs:line 21"
    );

    let subtracts = test(&suite, "Calculator.SubtractionTests.Subtracts");
    assert_eq!(subtracts.fixture.as_deref(), Some("SubtractionTests"));
    assert_eq!(subtracts.duration, 125.0);
}

#[test]
fn nunit3() {
    let suite = parse("nunit3.xml", RunnerFormat::NUnit);

    assert_eq!(suite.name(), "Shop.Tests.dll");
    assert_eq!(suite.status(), Status::Failure);
    assert_eq!(suite.failed_count(), 2);
    assert_eq!(suite.start_time(), Some("2016-05-05 10:15:01Z"));
    assert_eq!(suite.end_time(), Some("2016-05-05 10:15:03Z"));
    assert_eq!(suite.duration(), 1_750.0);
    assert_eq!(suite.set(), None);
    assert_eq!(
        statuses(&suite),
        [Status::Success, Status::Failure, Status::Error, Status::Skipped]
    );

    let adds_item = test(&suite, "AddsItem");
    assert_eq!(adds_item.fixture.as_deref(), Some("CartTests"));
    assert_eq!(adds_item.categories, ["Smoke"]);
    assert_eq!(adds_item.duration, 250.0);
    assert_eq!(adds_item.start_time.as_deref(), Some("2016-05-05 10:15:01Z"));

    assert_eq!(
        test(&suite, "RemovesItem").status_message,
        "Expected 0 items but found 1\nat Shop.CartTests.RemovesItem()"
    );
    assert_eq!(
        test(&suite, "AppliesCoupon").status_message,
        "Coupons are not implemented yet"
    );
}

#[test]
fn nunit_envelope_without_tests() {
    let suite = parse("envelope_only.xml", RunnerFormat::NUnit);

    assert_eq!(suite.name(), "Empty.Tests.dll");
    assert!(suite.tests().is_empty());
    assert_eq!(suite.status(), Status::Unknown);
    assert_eq!(suite.failed_count(), 0);
    assert_eq!(suite.duration(), 0.0);
}

#[test]
fn gallio() {
    let suite = parse("gallio.xml", RunnerFormat::Gallio);

    assert_eq!(suite.name(), "Inventory.Tests");
    assert_eq!(suite.status(), Status::Error);
    assert_eq!(suite.failed_count(), 1);
    assert_eq!(suite.duration(), 2_500.0);
    assert_eq!(
        names(&suite),
        ["StocksItem", "RejectsNegativeStock", "Restocks"]
    );
    assert_eq!(
        statuses(&suite),
        [Status::Success, Status::Error, Status::Skipped]
    );

    let rejects = test(&suite, "RejectsNegativeStock");
    assert_eq!(rejects.fixture.as_deref(), Some("Inventory.Tests/StockTests"));
    assert_eq!(rejects.duration, 1_000.0);
    assert_eq!(rejects.status_message, "Expected an ArgumentException.");
    assert_eq!(test(&suite, "StocksItem").status_message, "");
}

#[test]
fn mstest_2010() {
    let suite = parse("mstest.trx", RunnerFormat::MsTest2010);

    assert_eq!(suite.name(), "ci@BUILD01 2015-06-10 11:02:03");
    assert_eq!(suite.status(), Status::Failure);
    assert_eq!(suite.failed_count(), 2);
    assert_eq!(suite.feature_owner(), Some("Payments"));
    assert_eq!(
        suite.status_message(),
        "Test run deployment issue: a deployment item was not found."
    );
    assert_eq!(suite.duration(), 2_500.0);
    assert_eq!(
        statuses(&suite),
        [Status::Success, Status::Failure, Status::Error, Status::Skipped]
    );

    let deposits = test(&suite, "DepositsMoney");
    assert_eq!(deposits.fixture.as_deref(), Some("Bank.Tests.AccountTests"));
    assert_eq!(deposits.categories, ["Smoke"]);
    assert_eq!(deposits.duration, 250.0);

    assert_eq!(
        test(&suite, "WithdrawsMoney").status_message,
        "Assert.AreEqual failed. Expected:<50>. Actual:<100>.\nat Bank.Tests.AccountTests.WithdrawsMoney() in AccountTests.cs:line 30"
    );
    // No duration attribute, so the start and end times are used
    assert_eq!(test(&suite, "Transfers").duration, 500.0);
    assert_eq!(test(&suite, "ClosesAccount").duration, 0.0);
}

#[test]
fn xunit_v1() {
    let suite = parse("xunit1.xml", RunnerFormat::XUnitV1);

    assert_eq!(suite.name(), "Parser.Tests.dll");
    assert_eq!(suite.status(), Status::Failure);
    assert_eq!(suite.failed_count(), 1);
    assert_eq!(suite.start_time(), Some("2013-11-21 16:45:12"));
    assert_eq!(suite.duration(), 750.0);
    assert_eq!(
        statuses(&suite),
        [Status::Success, Status::Failure, Status::Skipped]
    );

    let splits = test(&suite, "Parser.Tests.TokenizerTests.SplitsWords");
    assert_eq!(splits.fixture.as_deref(), Some("Parser.Tests.TokenizerTests"));
    assert_eq!(splits.categories, ["Unit"]);
    assert_eq!(splits.duration, 250.0);

    assert_eq!(
        test(&suite, "Parser.Tests.TokenizerTests.HandlesQuotes").status_message,
        "Assert.Equal() Failure\nExpected: 3\nActual:   2\nat Parser.Tests.TokenizerTests.HandlesQuotes()"
    );
    assert_eq!(
        test(&suite, "Parser.Tests.TokenizerTests.HandlesUnicode").status_message,
        "Needs ICU"
    );
}

#[test]
fn xunit_v2() {
    let suite = parse("xunit2.xml", RunnerFormat::XUnitV2);

    assert_eq!(suite.name(), "Api.Tests.dll");
    assert_eq!(suite.status(), Status::Success);
    assert_eq!(suite.failed_count(), 0);
    assert_eq!(suite.duration(), 1_500.0);
    assert_eq!(
        suite.status_message(),
        "System.InvalidOperationException : Connection already closed"
    );
    assert_eq!(
        names(&suite),
        [
            "Api.Tests.UserEndpointTests.ReturnsUser",
            "Api.Tests.UserEndpointTests.Returns404",
            "Api.Tests.UserEndpointTests.RateLimits",
        ]
    );
    assert_eq!(
        test(&suite, "Api.Tests.UserEndpointTests.ReturnsUser").categories,
        ["Integration"]
    );
    let rate_limits = test(&suite, "Api.Tests.UserEndpointTests.RateLimits");
    assert_eq!(rate_limits.status, Status::Skipped);
    assert_eq!(rate_limits.status_message, "Flaky on CI");
}

#[test]
fn testng() {
    let suite = parse("testng.xml", RunnerFormat::TestNg);

    assert_eq!(suite.name(), "Checkout Suite");
    assert_eq!(suite.status(), Status::Failure);
    assert_eq!(suite.failed_count(), 1);
    assert_eq!(suite.start_time(), Some("2017-01-20T10:00:00Z"));
    assert_eq!(suite.end_time(), Some("2017-01-20T10:00:02Z"));
    assert_eq!(suite.duration(), 2_500.0);
    assert_eq!(suite.status_message(), "Connecting to staging");
    // Configuration methods are not tests
    assert_eq!(
        names(&suite),
        ["placesOrder", "refundsOrder", "reserves", "restocks"]
    );

    let places_order = test(&suite, "placesOrder");
    assert_eq!(places_order.fixture.as_deref(), Some("com.shop.CheckoutTest"));
    assert_eq!(places_order.categories, ["smoke"]);
    assert_eq!(places_order.duration, 500.0);

    let refunds_order = test(&suite, "refundsOrder");
    assert_eq!(refunds_order.status, Status::Failure);
    assert_eq!(refunds_order.duration, 1_000.0);
    assert!(refunds_order
        .status_message
        .starts_with("java.lang.AssertionError\nexpected [REFUNDED] but found [PAID]\njava.lang.AssertionError:"));

    assert_eq!(
        test(&suite, "restocks").fixture.as_deref(),
        Some("com.shop.InventoryTest")
    );
}

#[test]
fn unknown_status_is_reported_not_fatal() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("odd.xml");
    std::fs::write(
        &path,
        r#"<test-results name="odd"><test-suite type="TestFixture" name="Odd" result="Success">
             <results><test-case name="Odd.Sideways" result="Sideways"/></results>
           </test-suite></test-results>"#,
    )
    .unwrap();

    let sink = MemorySink::new();
    let suite = RunnerFormat::NUnit
        .parser()
        .unwrap()
        .load_file(&path, &sink)
        .unwrap();
    assert_eq!(statuses(&suite), [Status::Unknown]);
    assert_eq!(suite.status(), Status::Success);
    assert_eq!(
        sink.at_level(log::Level::Warn),
        ["Unrecognized status `Sideways` for test `Odd.Sideways`"]
    );
}

#[test]
fn wrong_root_is_a_parse_error() {
    let sink = MemorySink::new();
    let err = RunnerFormat::TestNg
        .parser()
        .unwrap()
        .load_file(&fixture("nunit2.xml"), &sink)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expected root element `testng-results`, found `test-results`"
    );
}

#[test]
fn all_ignored_fixture_is_skipped() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("ignored.xml");
    std::fs::write(
        &path,
        r#"<test-results name="ignored"><test-suite type="TestFixture" name="Later">
             <results>
               <test-case name="Later.One" result="Ignored"/>
               <test-case name="Later.Two" result="Ignored"/>
             </results>
           </test-suite></test-results>"#,
    )
    .unwrap();

    let sink = MemorySink::new();
    let suite = RunnerFormat::NUnit
        .parser()
        .unwrap()
        .load_file(&path, &sink)
        .unwrap();
    assert_eq!(statuses(&suite), [Status::Skipped, Status::Skipped]);
    assert_eq!(suite.status(), Status::Skipped);
    assert_eq!(suite.failed_count(), 0);
}

#[test]
fn oversized_mstest_duration_falls_back_to_timestamps() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let path = temp_dir.path().join("huge.trx");
    std::fs::write(
        &path,
        r#"<TestRun name="huge" xmlns="http://microsoft.com/schemas/VisualStudio/TeamTest/2010">
             <Results>
               <UnitTestResult testId="1" testName="Forever" outcome="Passed"
                 duration="768614336404564651.00:00:00"
                 startTime="2015-06-10T11:02:04Z" endTime="2015-06-10T11:02:05Z"/>
             </Results>
           </TestRun>"#,
    )
    .unwrap();

    let sink = MemorySink::new();
    let suite = RunnerFormat::MsTest2010
        .parser()
        .unwrap()
        .load_file(&path, &sink)
        .unwrap();
    assert_eq!(test(&suite, "Forever").duration, 1_000.0);
}
