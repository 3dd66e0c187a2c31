//! Classification result types for GTest log parsing.

use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Status of a single test, as derived from the log so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    /// A `[ RUN ]` line was seen and no terminating line has arrived yet.
    Started,
    /// The test passed.
    Ok,
    /// The test failed.
    Failed,
    /// The test timed out or was abandoned (presumably crashed or hung).
    Timeout,
    /// The test failed when run with others but passed on retry.
    Warning,
    /// The test never appeared in the log.
    NotKnown,
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TestStatus::Started => "started",
            TestStatus::Ok => "OK",
            TestStatus::Failed => "failed",
            TestStatus::Timeout => "timeout",
            TestStatus::Warning => "warning",
            TestStatus::NotKnown => "not known",
        };
        write!(f, "{}", s)
    }
}

/// Count of disabled or flaky tests reported by a runner banner.
///
/// Banners are occasionally garbled. An unparsable or non-positive count
/// degrades to `Indeterminate` so the signal that *something* was disabled
/// or flaky is preserved instead of silently defaulting to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tally {
    /// An exact count parsed from the banner.
    Count(u32),
    /// A banner was seen but the count could not be trusted.
    Indeterminate,
}

impl Tally {
    /// The exact count, if one is known.
    pub fn count(&self) -> Option<u32> {
        match self {
            Tally::Count(n) => Some(*n),
            Tally::Indeterminate => None,
        }
    }

    /// True if the banner was seen but the count is unknown.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, Tally::Indeterminate)
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tally::Count(n) => write!(f, "{}", n),
            Tally::Indeterminate => write!(f, "some"),
        }
    }
}

impl Serialize for Tally {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Tally::Count(n) => serializer.serialize_u32(*n),
            Tally::Indeterminate => serializer.serialize_str("some"),
        }
    }
}

/// One test's classification.
#[derive(Debug, Clone, Serialize)]
pub struct TestEntry {
    /// Final (or current) status of the test.
    pub status: TestStatus,
    /// Failure description lines attributed to the test, if any.
    pub description: Vec<String>,
}

/// Serializable snapshot of the classifier state.
#[derive(Debug, Clone, Serialize)]
pub struct TestReport {
    /// Master name from the `[Running for master: "..."]` banner, if seen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub master_name: Option<String>,

    /// Whether the all-tests-passed banner was seen.
    pub completed: bool,

    /// Per-test status table.
    pub tests: BTreeMap<String, TestEntry>,

    /// Tests considered failed: failed, timed out, retried-to-green, or
    /// still running at end of input.
    pub failed_tests: Vec<String>,

    /// Disabled-test count from the banner.
    pub disabled_tests: Tally,

    /// Flaky-test count from the banner.
    pub flaky_tests: Tally,

    /// Suppressions keyed by error hash.
    pub suppressions: BTreeMap<String, Vec<String>>,

    /// Lines that confused the parser, with line numbers and reasons.
    pub parsing_errors: Vec<String>,
}
