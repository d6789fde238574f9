use std::fmt;

use serde::Serialize;

/// Outcome shared by every supported test runner once its native vocabulary is mapped.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize)]
pub enum Status {
    #[default]
    Unknown,
    Success,
    Failure,
    Error,
    Inconclusive,
    Skipped,
}

impl Status {
    pub fn is_failure(self) -> bool {
        matches!(self, Status::Failure | Status::Error)
    }

    pub fn is_definitive(self) -> bool {
        self != Status::Unknown
    }

    /// Rolls test outcomes up into a single suite outcome.
    ///
    /// Failure beats Error, which beats Inconclusive, then Success, then Skipped.
    /// Without any definitive status the result stays `Unknown`.
    pub fn aggregate<I: IntoIterator<Item = Status>>(statuses: I) -> Status {
        statuses
            .into_iter()
            .fold(Status::Unknown, |acc, status| {
                if Self::precedence(status) > Self::precedence(acc) {
                    status
                } else {
                    acc
                }
            })
    }

    fn precedence(status: Status) -> u8 {
        match status {
            Status::Unknown => 0,
            Status::Skipped => 1,
            Status::Success => 2,
            Status::Inconclusive => 3,
            Status::Error => 4,
            Status::Failure => 5,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unknown => "Unknown",
            Status::Success => "Success",
            Status::Failure => "Failure",
            Status::Error => "Error",
            Status::Inconclusive => "Inconclusive",
            Status::Skipped => "Skipped",
        };
        f.write_str(s)
    }
}

/// One test case outcome.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Test {
    pub name: String,
    pub status: Status,
    pub status_message: String,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    /// Milliseconds
    pub duration: f64,
    /// Class or fixture owning the test, when the format names one.
    pub fixture: Option<String>,
    pub categories: Vec<String>,
}

impl Test {
    pub fn new<T: Into<String>>(name: T, status: Status) -> Self {
        Self {
            name: name.into(),
            status,
            ..Default::default()
        }
    }
}

/// One results file (or fixture) worth of tests, ready for rendering.
///
/// Only [`SuiteBuilder`] creates these, which keeps `failed_count` and `status`
/// in line with the contained tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suite {
    name: String,
    status: Status,
    failed_count: usize,
    set: Option<String>,
    feature_owner: Option<String>,
    status_message: String,
    start_time: Option<String>,
    end_time: Option<String>,
    duration: f64,
    tests: Vec<Test>,
}

impl Suite {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn failed_count(&self) -> usize {
        self.failed_count
    }

    pub fn set(&self) -> Option<&str> {
        self.set.as_deref()
    }

    pub fn feature_owner(&self) -> Option<&str> {
        self.feature_owner.as_deref()
    }

    pub fn status_message(&self) -> &str {
        &self.status_message
    }

    pub fn start_time(&self) -> Option<&str> {
        self.start_time.as_deref()
    }

    pub fn end_time(&self) -> Option<&str> {
        self.end_time.as_deref()
    }

    /// Milliseconds
    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn tests(&self) -> &[Test] {
        &self.tests
    }

    pub fn total(&self) -> usize {
        self.tests.len()
    }

    pub fn count(&self, status: Status) -> usize {
        self.tests.iter().filter(|t| t.status == status).count()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SuiteBuilder {
    name: String,
    explicit_status: Option<Status>,
    set: Option<String>,
    feature_owner: Option<String>,
    status_message: String,
    start_time: Option<String>,
    end_time: Option<String>,
    duration: Option<f64>,
    tests: Vec<Test>,
}

impl SuiteBuilder {
    pub fn new<T: Into<String>>(name: T) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Status stated by the results file itself rather than derived from its tests.
    pub fn set_status(&mut self, status: Status) -> &mut Self {
        self.explicit_status = Some(status);
        self
    }

    pub fn set_set<T: Into<String>>(&mut self, set: T) -> &mut Self {
        self.set = Some(set.into());
        self
    }

    pub fn set_feature_owner<T: Into<String>>(&mut self, feature_owner: T) -> &mut Self {
        self.feature_owner = Some(feature_owner.into());
        self
    }

    pub fn set_status_message<T: Into<String>>(&mut self, status_message: T) -> &mut Self {
        self.status_message = status_message.into();
        self
    }

    pub fn set_start_time<T: Into<String>>(&mut self, start_time: T) -> &mut Self {
        self.start_time = Some(start_time.into());
        self
    }

    pub fn set_end_time<T: Into<String>>(&mut self, end_time: T) -> &mut Self {
        self.end_time = Some(end_time.into());
        self
    }

    pub fn set_duration(&mut self, duration_ms: f64) -> &mut Self {
        self.duration = Some(duration_ms);
        self
    }

    pub fn add_test(&mut self, test: Test) -> &mut Self {
        self.tests.push(test);
        self
    }

    pub fn build(self) -> Suite {
        let aggregate = Status::aggregate(self.tests.iter().map(|t| t.status));
        let status = match self.explicit_status {
            _ if aggregate.is_failure() => aggregate,
            Some(explicit) if explicit.is_definitive() => explicit,
            _ => aggregate,
        };
        let failed_count = self.tests.iter().filter(|t| t.status.is_failure()).count();
        let duration = self
            .duration
            .unwrap_or_else(|| self.tests.iter().map(|t| t.duration).sum());

        Suite {
            name: self.name,
            status,
            failed_count,
            set: self.set,
            feature_owner: self.feature_owner,
            status_message: self.status_message,
            start_time: self.start_time,
            end_time: self.end_time,
            duration,
            tests: self.tests,
        }
    }
}
