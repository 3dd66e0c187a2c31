//! Streaming GTest log parser.
//!
//! Consumes one line of test-runner output at a time and maintains a
//! per-test status table, suppression blocks, and disabled/flaky tallies.
//! Lines are matched against a fixed priority order of patterns; the first
//! match wins and consumes the line. Unexpected transitions are recorded as
//! parsing errors and never abort classification.

use regex_lite::{Captures, Regex};
use std::collections::{BTreeMap, HashMap};

use crate::result::{Tally, TestEntry, TestReport, TestStatus};

/// Test names look like `SomeTestCase.SomeTest` or
/// `SomeName/SomeTestCase.SomeTest/1`. This also matches
/// `SomeName.SomeTest/1`, which is harmless.
const TEST_NAME: &str = r"((\w+/)?\w+\.\w+(/\d+)?)";

/// Match with Python `re.match` semantics: the capture must start at the
/// beginning of the line.
fn match_at_start<'t>(re: &Regex, line: &'t str) -> Option<Captures<'t>> {
    re.captures(line)
        .filter(|c| c.get(0).map(|m| m.start() == 0).unwrap_or(false))
}

/// Incremental classifier for GTest-style test logs.
pub struct GTestLogParser {
    completed: bool,
    current_test: String,
    failure_description: Vec<String>,
    current_suppression_hash: String,
    current_suppression: Vec<String>,
    parsing_failures: bool,
    retrying_failed: bool,

    line_number: u64,
    internal_error_lines: Vec<String>,

    test_status: HashMap<String, (TestStatus, Vec<String>)>,
    suppressions: HashMap<String, Vec<String>>,

    disabled_tests: Tally,
    flaky_tests: Tally,
    master_name: String,

    re_master_name: Regex,
    re_test_name: Regex,
    re_test_start: Regex,
    re_test_ok: Regex,
    re_test_fail: Regex,
    re_test_passed: Regex,
    re_run_test_cases: Regex,
    re_test_timeout: Regex,
    re_disabled: Regex,
    re_flaky: Regex,
    re_suppression_start: Regex,
    re_suppression_end: Regex,
    re_retry: Regex,
}

impl Default for GTestLogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl GTestLogParser {
    pub fn new() -> Self {
        // The patterns are fixed literals; compilation cannot fail.
        let re = |p: &str| Regex::new(p).expect("invalid gtest pattern");
        Self {
            completed: false,
            current_test: String::new(),
            failure_description: Vec::new(),
            current_suppression_hash: String::new(),
            current_suppression: Vec::new(),
            parsing_failures: false,
            retrying_failed: false,
            line_number: 0,
            internal_error_lines: Vec::new(),
            test_status: HashMap::new(),
            suppressions: HashMap::new(),
            disabled_tests: Tally::Count(0),
            flaky_tests: Tally::Count(0),
            master_name: String::new(),
            re_master_name: re(r#"\[Running for master: "([^"]*)""#),
            re_test_name: re(TEST_NAME),
            re_test_start: re(&format!(r"\[\s+RUN\s+\] {}", TEST_NAME)),
            re_test_ok: re(&format!(r"\[\s+OK\s+\] {}", TEST_NAME)),
            re_test_fail: re(&format!(r"\[\s+FAILED\s+\] {}", TEST_NAME)),
            re_test_passed: re(r"\[\s+PASSED\s+\] \d+ tests?."),
            re_run_test_cases: re(&format!(r"\[\s*\d+/\d+\]\s+[0-9.]+s {} .+", TEST_NAME)),
            re_test_timeout: re(&format!(
                r"Test timeout \([0-9]+ ms\) exceeded for {}",
                TEST_NAME
            )),
            re_disabled: re(r"\s*YOU HAVE (\d+) DISABLED TEST"),
            re_flaky: re(r"\s*YOU HAVE (\d+) FLAKY TEST"),
            re_suppression_start: re(r"Suppression \(error hash=#([0-9A-F]+)#\):"),
            re_suppression_end: re(r"^\}\s*$"),
            re_retry: re(r"RETRYING FAILED TESTS:"),
        }
    }

    /// Name of the test currently being tracked, if any.
    pub fn current_test(&self) -> Option<&str> {
        if self.current_test.is_empty() {
            None
        } else {
            Some(&self.current_test)
        }
    }

    /// Master name from the log banner, first occurrence wins.
    pub fn master_name(&self) -> Option<&str> {
        if self.master_name.is_empty() {
            None
        } else {
            Some(&self.master_name)
        }
    }

    /// Whether the all-tests-passed banner was seen.
    pub fn completed(&self) -> bool {
        self.completed
    }

    fn status_of(&self, test: &str) -> TestStatus {
        self.test_status
            .get(test)
            .map(|(status, _)| *status)
            .unwrap_or(TestStatus::NotKnown)
    }

    /// Tests with the given status. `include_fails`/`include_flaky` control
    /// whether tests carrying the `FAILS_`/`FLAKY_` naming conventions are
    /// listed.
    fn tests_by_status(
        &self,
        status: TestStatus,
        include_fails: bool,
        include_flaky: bool,
    ) -> Vec<String> {
        let mut tests: Vec<String> = self
            .test_status
            .iter()
            .filter(|(_, (s, _))| *s == status)
            .map(|(name, _)| name.clone())
            .collect();
        tests.sort();
        if !include_fails {
            tests.retain(|name| !name.contains("FAILS_"));
        }
        if !include_flaky {
            tests.retain(|name| !name.contains("FLAKY_"));
        }
        tests
    }

    fn record_error(&mut self, line: &str, reason: &str) {
        self.internal_error_lines
            .push(format!("{}: {} [{}]", self.line_number, line.trim(), reason));
    }

    /// Tests that appear to be currently running.
    pub fn running_tests(&self) -> Vec<String> {
        self.tests_by_status(TestStatus::Started, true, true)
    }

    /// Lines that have caused parsing errors.
    pub fn parsing_errors(&self) -> &[String] {
        &self.internal_error_lines
    }

    /// Clears the currently stored parsing errors.
    pub fn clear_parsing_errors(&mut self) {
        self.internal_error_lines = vec!["Cleared.".to_string()];
    }

    /// Tests that failed, timed out, passed only on retry, or never
    /// finished. Incomplete logs list currently-running tests as failed.
    ///
    /// Tests named with the `FAILS_`/`FLAKY_` conventions are excluded from
    /// the failed/warning groups unless the corresponding flag is set;
    /// crashes and timeouts are always listed.
    pub fn failed_tests(&self, include_fails: bool, include_flaky: bool) -> Vec<String> {
        let mut tests = self.tests_by_status(TestStatus::Failed, include_fails, include_flaky);
        tests.extend(self.tests_by_status(TestStatus::Timeout, true, true));
        tests.extend(self.tests_by_status(TestStatus::Warning, include_fails, include_flaky));
        tests.extend(self.running_tests());
        tests
    }

    /// Disabled-test count, or `Tally::Indeterminate` when a banner was
    /// present but unparsable.
    pub fn disabled_tests(&self) -> Tally {
        self.disabled_tests
    }

    /// Flaky-test count, same policy as `disabled_tests`.
    pub fn flaky_tests(&self) -> Tally {
        self.flaky_tests
    }

    /// Status of a single test.
    pub fn test_status(&self, test: &str) -> TestStatus {
        self.status_of(test)
    }

    /// Failure description for the given test, prefixed with its name.
    /// Empty description if the test did not fail or time out.
    pub fn failure_description(&self, test: &str) -> Vec<String> {
        let mut lines = vec![format!("{}: ", test)];
        if let Some((_, description)) = self.test_status.get(test) {
            lines.extend(description.iter().cloned());
        }
        lines
    }

    /// Suppression hashes found in the log.
    pub fn suppression_hashes(&self) -> Vec<String> {
        let mut hashes: Vec<String> = self.suppressions.keys().cloned().collect();
        hashes.sort();
        hashes
    }

    /// The suppression block stored under the given hash, boundary lines
    /// included. Empty if the hash is unknown.
    pub fn suppression(&self, suppression_hash: &str) -> Vec<String> {
        self.suppressions
            .get(suppression_hash)
            .cloned()
            .unwrap_or_default()
    }

    /// True if all tests completed and no test failed unexpectedly.
    pub fn completed_without_failure(&self) -> bool {
        self.completed && self.failed_tests(false, false).is_empty()
    }

    /// Snapshot the classified state.
    pub fn report(&self) -> TestReport {
        TestReport {
            master_name: self.master_name().map(str::to_string),
            completed: self.completed,
            tests: self
                .test_status
                .iter()
                .map(|(name, (status, description))| {
                    (
                        name.clone(),
                        TestEntry {
                            status: *status,
                            description: description.clone(),
                        },
                    )
                })
                .collect::<BTreeMap<_, _>>(),
            failed_tests: self.failed_tests(false, false),
            disabled_tests: self.disabled_tests,
            flaky_tests: self.flaky_tests,
            suppressions: self
                .suppressions
                .iter()
                .map(|(hash, lines)| (hash.clone(), lines.clone()))
                .collect::<BTreeMap<_, _>>(),
            parsing_errors: self.internal_error_lines.clone(),
        }
    }

    /// Feed one line of test output to the classifier.
    ///
    /// Child processes sometimes write to the shared stdout buffer so that
    /// their output lands between a newline and a gtest directive, which
    /// breaks the parser. If a directive is found mid-line, the line is
    /// split at the directive and the halves are processed separately.
    pub fn process_line(&mut self, line: &str) {
        self.line_number += 1;

        let embedded = [
            &self.re_test_start,
            &self.re_test_ok,
            &self.re_test_fail,
            &self.re_test_passed,
        ]
        .iter()
        .find_map(|re| re.find(line).map(|m| m.start()));

        match embedded {
            Some(at) if at > 0 => {
                self.handle_line(&line[..at]);
                self.handle_line(&line[at..]);
            }
            _ => self.handle_line(line),
        }
    }

    /// Convenience wrapper feeding every line of a complete log.
    pub fn process_log(&mut self, log: &str) {
        for line in log.lines() {
            self.process_line(line);
        }
    }

    /// Description used when a started test is force-transitioned to
    /// timeout without any output attributed to it.
    fn abandoned_description(&self) -> Vec<String> {
        if self.failure_description.is_empty() {
            vec!["Did not complete.".to_string()]
        } else {
            self.failure_description.clone()
        }
    }

    /// A test left in `started` when another event arrives is presumed to
    /// have crashed or hung; flush it as a timeout.
    fn flush_abandoned_test(&mut self) {
        if self.current_test.is_empty() {
            return;
        }
        if self.status_of(&self.current_test) == TestStatus::Started {
            let description = self.abandoned_description();
            self.test_status
                .insert(self.current_test.clone(), (TestStatus::Timeout, description));
        }
    }

    fn handle_line(&mut self, line: &str) {
        // Master-name banner, first occurrence wins.
        if self.master_name.is_empty() {
            if let Some(caps) = match_at_start(&self.re_master_name, line) {
                self.master_name = caps[1].to_string();
            }
        }

        // Sharded-runner summary line: the shard moved on, so a test still
        // in `started` did not complete.
        if match_at_start(&self.re_run_test_cases, line).is_some() {
            self.flush_abandoned_test();
            self.current_test.clear();
            self.failure_description.clear();
            return;
        }

        // All tests passed.
        if match_at_start(&self.re_test_passed, line).is_some() {
            self.completed = true;
            self.current_test.clear();
            return;
        }

        // Disabled-test banner. When sharding, the banner is read multiple
        // times; the most recent value wins (they should all agree).
        if let Some(caps) = match_at_start(&self.re_disabled, line) {
            let disabled = caps[1].parse::<u32>().unwrap_or(0);
            self.disabled_tests = match (disabled, self.disabled_tests) {
                (n, Tally::Count(_)) if n > 0 => Tally::Count(n),
                _ => Tally::Indeterminate,
            };
            return;
        }

        // Flaky-test banner, same policy.
        if let Some(caps) = match_at_start(&self.re_flaky, line) {
            let flaky = caps[1].parse::<u32>().unwrap_or(0);
            self.flaky_tests = match (flaky, self.flaky_tests) {
                (n, Tally::Count(_)) if n > 0 => Tally::Count(n),
                _ => Tally::Indeterminate,
            };
            return;
        }

        // Test start.
        if let Some(caps) = match_at_start(&self.re_test_start, line) {
            self.flush_abandoned_test();
            let test_name = caps[1].to_string();
            if self.retrying_failed {
                // Keep the original failure text; retry output is appended
                // to it, not replacing it.
                let mut description = self
                    .test_status
                    .get(&test_name)
                    .map(|(_, d)| d.clone())
                    .unwrap_or_default();
                description.extend(["", "RETRY OUTPUT:", ""].map(String::from));
                self.test_status
                    .insert(test_name.clone(), (TestStatus::Started, description.clone()));
                self.failure_description = description;
            } else {
                self.test_status.insert(
                    test_name.clone(),
                    (TestStatus::Started, vec!["Did not complete.".to_string()]),
                );
                self.failure_description = Vec::new();
            }
            self.current_test = test_name;
            return;
        }

        // Test success.
        if let Some(caps) = match_at_start(&self.re_test_ok, line) {
            let test_name = caps[1].to_string();
            let status = self.status_of(&test_name);
            if status != TestStatus::Started {
                self.record_error(line, &format!("success while in status {}", status));
            }
            if self.retrying_failed {
                // Passed on retry but failed the first time.
                self.test_status.insert(
                    test_name,
                    (TestStatus::Warning, self.failure_description.clone()),
                );
            } else {
                self.test_status.insert(test_name, (TestStatus::Ok, Vec::new()));
            }
            self.failure_description.clear();
            self.current_test.clear();
            return;
        }

        // Test failure.
        if let Some(caps) = match_at_start(&self.re_test_fail, line) {
            let test_name = caps[1].to_string();
            let status = self.status_of(&test_name);
            if !matches!(
                status,
                TestStatus::Started | TestStatus::Failed | TestStatus::Timeout
            ) {
                self.record_error(line, &format!("failure while in status {}", status));
            }
            // Don't overwrite the description when a failing test is listed
            // a second time in the summary, or when it already timed out.
            if !matches!(status, TestStatus::Failed | TestStatus::Timeout) {
                self.test_status.insert(
                    test_name,
                    (TestStatus::Failed, self.failure_description.clone()),
                );
            }
            self.failure_description.clear();
            self.current_test.clear();
            return;
        }

        // Test timeout message from the runner.
        if let Some(caps) = self.re_test_timeout.captures(line) {
            let test_name = caps[1].to_string();
            let status = self.status_of(&test_name);
            if !matches!(status, TestStatus::Started | TestStatus::Failed) {
                self.record_error(line, &format!("timeout while in status {}", status));
            }
            let mut description = self.failure_description.clone();
            description.push("Killed (timed out).".to_string());
            self.test_status
                .insert(test_name, (TestStatus::Timeout, description));
            self.failure_description.clear();
            self.current_test.clear();
            return;
        }

        // Start of a memory-checker suppression block.
        if let Some(caps) = match_at_start(&self.re_suppression_start, line) {
            let suppression_hash = caps[1].to_string();
            if self.suppressions.contains_key(&suppression_hash) {
                self.record_error(line, "suppression reported more than once");
            }
            self.suppressions.insert(suppression_hash.clone(), Vec::new());
            self.current_suppression_hash = suppression_hash;
            self.current_suppression = vec![line.to_string()];
            return;
        }

        // End of a suppression block.
        if self.re_suppression_end.is_match(line) && !self.current_suppression_hash.is_empty() {
            self.current_suppression.push(line.to_string());
            self.suppressions.insert(
                std::mem::take(&mut self.current_suppression_hash),
                std::mem::take(&mut self.current_suppression),
            );
            return;
        }

        // Start of the retry section: affects how RUN/OK lines are handled
        // from here on.
        if match_at_start(&self.re_retry, line).is_some() {
            self.retrying_failed = true;
            return;
        }

        // Random line inside a suppression: suppressions are emitted after
        // all tests finish, so the line belongs to the current block.
        if !self.current_suppression_hash.is_empty() {
            self.current_suppression.push(line.to_string());
            return;
        }

        // Random line while a test is active: collect it for the failure
        // description. Tests may run simultaneously, so attribution is
        // approximate. This also cannot catch a test that times out before
        // it begins running.
        if !self.current_test.is_empty() {
            self.failure_description.push(line.to_string());
            if let Some((_, description)) = self.test_status.get_mut(&self.current_test) {
                if self.retrying_failed {
                    description.push(line.to_string());
                }
            }
        }

        // Trailing "Failing tests:" list: tests named there that look clean
        // crashed after their OK line was printed.
        if self.parsing_failures {
            if let Some(caps) = match_at_start(&self.re_test_name, line) {
                let test_name = caps[1].to_string();
                let status = self.status_of(&test_name);
                if matches!(status, TestStatus::NotKnown | TestStatus::Ok) {
                    self.test_status.insert(
                        test_name,
                        (
                            TestStatus::Failed,
                            vec!["Unknown error, see stdio log.".to_string()],
                        ),
                    );
                }
            } else {
                self.parsing_failures = false;
            }
        } else if line.starts_with("Failing tests:") {
            self.parsing_failures = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(lines: &[&str]) -> GTestLogParser {
        let mut parser = GTestLogParser::new();
        for line in lines {
            parser.process_line(line);
        }
        parser
    }

    #[test]
    fn test_pass_sequence() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "[       OK ] Foo.Bar (10 ms)",
            "[  PASSED  ] 1 test.",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Ok);
        assert!(parser.failed_tests(false, false).is_empty());
        assert!(parser.completed_without_failure());
    }

    #[test]
    fn test_unterminated_test_is_running_and_failed() {
        let parser = parse(&["[ RUN      ] Foo.Bar"]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Started);
        assert_eq!(parser.running_tests(), vec!["Foo.Bar"]);
        assert_eq!(parser.failed_tests(false, false), vec!["Foo.Bar"]);
        assert!(!parser.completed_without_failure());
    }

    #[test]
    fn test_double_run_forces_timeout() {
        let parser = parse(&["[ RUN      ] Foo.Bar", "[ RUN      ] Foo.Baz"]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Timeout);
        assert_eq!(
            parser.failure_description("Foo.Bar"),
            vec!["Foo.Bar: ", "Did not complete."]
        );
        assert_eq!(parser.test_status("Foo.Baz"), TestStatus::Started);
    }

    #[test]
    fn test_failure_description_collected() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "some stack line",
            "another line",
            "[  FAILED  ] Foo.Bar (12 ms)",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Failed);
        assert_eq!(
            parser.failure_description("Foo.Bar"),
            vec!["Foo.Bar: ", "some stack line", "another line"]
        );
    }

    #[test]
    fn test_duplicate_failed_keeps_first_description() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "first failure text",
            "[  FAILED  ] Foo.Bar (12 ms)",
            "[  FAILED  ] Foo.Bar (12 ms)",
        ]);
        assert_eq!(
            parser.failure_description("Foo.Bar"),
            vec!["Foo.Bar: ", "first failure text"]
        );
    }

    #[test]
    fn test_ok_without_run_is_soft_error() {
        let parser = parse(&["[       OK ] Foo.Bar (10 ms)"]);
        assert_eq!(parser.parsing_errors().len(), 1);
        assert!(parser.parsing_errors()[0].contains("success while in status not known"));
    }

    #[test]
    fn test_interleaved_marker_is_split() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "child output[       OK ] Foo.Bar (10 ms)",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Ok);
    }

    #[test]
    fn test_disabled_and_flaky_banners() {
        let parser = parse(&[
            "  YOU HAVE 3 DISABLED TESTS",
            "  YOU HAVE 2 FLAKY TESTS",
        ]);
        assert_eq!(parser.disabled_tests(), Tally::Count(3));
        assert_eq!(parser.flaky_tests(), Tally::Count(2));
    }

    #[test]
    fn test_zero_disabled_count_is_indeterminate() {
        let parser = parse(&["  YOU HAVE 0 DISABLED TESTS"]);
        assert!(parser.disabled_tests().is_indeterminate());
        assert_eq!(parser.disabled_tests().to_string(), "some");
    }

    #[test]
    fn test_retry_pass_becomes_warning() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "original failure",
            "[  FAILED  ] Foo.Bar (12 ms)",
            "RETRYING FAILED TESTS:",
            "[ RUN      ] Foo.Bar",
            "[       OK ] Foo.Bar (10 ms)",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Warning);
        let description = parser.failure_description("Foo.Bar");
        assert!(description.contains(&"original failure".to_string()));
        assert!(description.contains(&"RETRY OUTPUT:".to_string()));
        assert_eq!(parser.failed_tests(false, false), vec!["Foo.Bar"]);
    }

    #[test]
    fn test_suppression_block_stored_verbatim() {
        let parser = parse(&[
            "Suppression (error hash=#0123DEAD#):",
            "{",
            "   <insert_a_suppression_name_here>",
            "   Memcheck:Leak",
            "}",
        ]);
        assert_eq!(parser.suppression_hashes(), vec!["0123DEAD"]);
        let block = parser.suppression("0123DEAD");
        assert_eq!(block.first().unwrap(), "Suppression (error hash=#0123DEAD#):");
        assert_eq!(block.last().unwrap(), "}");
        assert_eq!(block.len(), 5);
    }

    #[test]
    fn test_duplicate_suppression_is_soft_error() {
        let parser = parse(&[
            "Suppression (error hash=#0123DEAD#):",
            "}",
            "Suppression (error hash=#0123DEAD#):",
            "}",
        ]);
        assert_eq!(parser.parsing_errors().len(), 1);
        assert!(parser.parsing_errors()[0].contains("suppression reported more than once"));
    }

    #[test]
    fn test_failing_tests_trailer_reclassifies() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "[       OK ] Foo.Bar (10 ms)",
            "[  PASSED  ] 1 test.",
            "Failing tests:",
            "Foo.Bar",
            "Foo.Crashy",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Failed);
        assert_eq!(parser.test_status("Foo.Crashy"), TestStatus::Failed);
        assert_eq!(
            parser.failure_description("Foo.Crashy"),
            vec!["Foo.Crashy: ", "Unknown error, see stdio log."]
        );
    }

    #[test]
    fn test_shard_summary_flushes_started_test() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "[1/10] 2.33s Foo.Bar (2.3s)",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Timeout);
        assert_eq!(parser.current_test(), None);
    }

    #[test]
    fn test_timeout_message() {
        let parser = parse(&[
            "[ RUN      ] Foo.Bar",
            "Test timeout (45000 ms) exceeded for Foo.Bar",
        ]);
        assert_eq!(parser.test_status("Foo.Bar"), TestStatus::Timeout);
        let description = parser.failure_description("Foo.Bar");
        assert_eq!(description.last().unwrap(), "Killed (timed out).");
    }

    #[test]
    fn test_master_name_first_occurrence_wins() {
        let parser = parse(&[
            r#"[Running for master: "Chromium"]"#,
            r#"[Running for master: "Other"]"#,
        ]);
        assert_eq!(parser.master_name(), Some("Chromium"));
    }

    #[test]
    fn test_fails_and_flaky_naming_filters() {
        let parser = parse(&[
            "[ RUN      ] Foo.FAILS_Bar",
            "[  FAILED  ] Foo.FAILS_Bar (1 ms)",
            "[ RUN      ] Foo.FLAKY_Baz",
            "[  FAILED  ] Foo.FLAKY_Baz (1 ms)",
        ]);
        assert!(parser.failed_tests(false, false).is_empty());
        assert_eq!(parser.failed_tests(true, false), vec!["Foo.FAILS_Bar"]);
        assert_eq!(parser.failed_tests(false, true), vec!["Foo.FLAKY_Baz"]);
    }
}
