//! Bridges the log classifier into step results.
//!
//! Attached as a follow-up callback on a test step, this parses the step's
//! captured `stdio` log with the GTest classifier and decorates the
//! presentation: per-test failure logs, a human-readable summary, and a
//! FAILURE status whenever the classifier disagrees with a clean exit.

use lane_gtest::{GTestLogParser, Tally};

use crate::presentation::StepStatus;
use crate::step::{Followup, StepResult};

/// Build a follow-up that classifies the step's test output.
pub fn gtest_followup() -> Followup {
    Box::new(|result: &mut StepResult| {
        let Some(stdio) = result.presentation().log("stdio") else {
            return;
        };

        let mut parser = GTestLogParser::new();
        for line in &stdio {
            parser.process_line(line);
        }

        decorate(result, &parser);
    })
}

fn decorate(result: &mut StepResult, parser: &GTestLogParser) {
    // Follow-ups run before the presentation is finalized, so the mutators
    // cannot fail here.
    let failed = parser.failed_tests(false, false);
    let presentation = result.presentation_mut();

    for test in &failed {
        let _ = presentation.set_log(test, parser.failure_description(test));
    }

    let mut notes = Vec::new();
    if !failed.is_empty() {
        notes.push(format!("{} failed", failed.len()));
    }
    if let Some(note) = tally_note(parser.disabled_tests(), "disabled") {
        notes.push(note);
    }
    if let Some(note) = tally_note(parser.flaky_tests(), "flaky") {
        notes.push(note);
    }
    if !notes.is_empty() {
        let _ = presentation.set_step_summary_text(notes.join(", "));
    }

    if !parser.completed_without_failure() {
        let _ = presentation.set_status(StepStatus::Failure);
    }
}

fn tally_note(tally: Tally, label: &str) -> Option<String> {
    match tally {
        Tally::Count(0) => None,
        other => Some(format!("{} {}", other, label)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use crate::step::StepResult;

    fn result_with_stdio(lines: &[&str]) -> StepResult {
        let mut result =
            StepResult::new(Step::builder("tests").arg("run").build().to_rendered(), 0);
        result
            .presentation_mut()
            .set_log("stdio", lines.iter().map(|l| l.to_string()).collect())
            .unwrap();
        result
    }

    #[test]
    fn test_clean_run_left_untouched() {
        let mut result = result_with_stdio(&[
            "[ RUN      ] Foo.Bar",
            "[       OK ] Foo.Bar (1 ms)",
            "[  PASSED  ] 1 test.",
        ]);
        gtest_followup()(&mut result);
        assert_eq!(result.presentation().status(), None);
        assert_eq!(result.presentation().step_summary_text(), None);
    }

    #[test]
    fn test_failures_set_status_and_logs() {
        let mut result = result_with_stdio(&[
            "[ RUN      ] Foo.Bar",
            "assertion failed",
            "[  FAILED  ] Foo.Bar (1 ms)",
        ]);
        gtest_followup()(&mut result);

        assert_eq!(result.presentation().status(), Some(StepStatus::Failure));
        assert_eq!(
            result.presentation().step_summary_text(),
            Some("1 failed")
        );
        let log = result.presentation().log("Foo.Bar").unwrap();
        assert!(log.contains(&"assertion failed".to_string()));
    }

    #[test]
    fn test_disabled_and_flaky_noted() {
        let mut result = result_with_stdio(&[
            "[ RUN      ] Foo.Bar",
            "[       OK ] Foo.Bar (1 ms)",
            "[  PASSED  ] 1 test.",
            "  YOU HAVE 4 DISABLED TESTS",
            "  YOU HAVE 1 FLAKY TEST",
        ]);
        gtest_followup()(&mut result);

        assert_eq!(result.presentation().status(), None);
        assert_eq!(
            result.presentation().step_summary_text(),
            Some("4 disabled, 1 flaky")
        );
    }

    #[test]
    fn test_no_stdio_is_a_no_op() {
        let mut result =
            StepResult::new(Step::builder("tests").arg("run").build().to_rendered(), 0);
        gtest_followup()(&mut result);
        assert_eq!(result.presentation().status(), None);
    }
}
