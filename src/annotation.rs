//! Step-lifecycle annotation stream.
//!
//! The orchestration loop reports step lifecycle events through the
//! `StepSink` trait; the build-coordination side only ever sees this typed
//! stream. `AnnotationStream` is the shipped implementation, rendering the
//! `@@@...@@@` wire form understood by annotation-consuming masters.

use std::io::Write;

use crate::presentation::StepStatus;

/// Typed sink for step-lifecycle events.
///
/// One step is reported as: `seed_step`* · `step_cursor` · `step_started` ·
/// free-form `emit` lines · presentation flush (text/logs/status) ·
/// `step_closed`. Implementations must tolerate arbitrary text in names and
/// log lines.
pub trait StepSink {
    /// Ask the consumer to treat a zero return code as step success.
    fn honor_zero_return_code(&mut self);

    /// Announce a step that will run later, so the consumer can display it
    /// as pending.
    fn seed_step(&mut self, name: &str);

    /// Direct subsequent annotations at the named step.
    fn step_cursor(&mut self, name: &str);

    /// The current step has started executing.
    fn step_started(&mut self);

    /// The current step is finished and its presentation is flushed.
    fn step_closed(&mut self);

    /// Attach display text to the current step.
    fn step_text(&mut self, text: &str);

    /// Attach one-line summary text to the current step.
    fn step_summary_text(&mut self, text: &str);

    /// Attach a named log to the current step. `perf` marks the log as a
    /// performance series.
    fn log_lines(&mut self, log_name: &str, lines: &[String], perf: bool);

    /// Report the step's final status.
    fn step_status(&mut self, status: StepStatus);

    /// Emit a free-form output line attributed to the current step.
    fn emit(&mut self, line: &str);
}

/// Renders step-lifecycle events in the `@@@...@@@` annotation wire form.
///
/// Writes are best-effort: the annotation channel is a reporting side
/// channel, and a broken pipe there must not take down the run.
pub struct AnnotationStream<W: Write> {
    out: W,
}

impl<W: Write> AnnotationStream<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consume the stream and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, line: &str) {
        let _ = writeln!(self.out, "{}", line);
        let _ = self.out.flush();
    }
}

impl<W: Write> StepSink for AnnotationStream<W> {
    fn honor_zero_return_code(&mut self) {
        self.line("@@@HONOR_ZERO_RETURN_CODE@@@");
    }

    fn seed_step(&mut self, name: &str) {
        self.line(&format!("@@@SEED_STEP {}@@@", name));
    }

    fn step_cursor(&mut self, name: &str) {
        self.line(&format!("@@@STEP_CURSOR {}@@@", name));
    }

    fn step_started(&mut self) {
        self.line("@@@STEP_STARTED@@@");
    }

    fn step_closed(&mut self) {
        self.line("@@@STEP_CLOSED@@@");
    }

    fn step_text(&mut self, text: &str) {
        self.line(&format!("@@@STEP_TEXT@{}@@@", text));
    }

    fn step_summary_text(&mut self, text: &str) {
        self.line(&format!("@@@STEP_SUMMARY_TEXT@{}@@@", text));
    }

    fn log_lines(&mut self, log_name: &str, lines: &[String], perf: bool) {
        for line in lines {
            self.line(&format!(
                "@@@STEP_LOG_LINE@{}@{}@@@",
                log_name,
                line.trim_end_matches('\n')
            ));
        }
        if perf {
            self.line(&format!("@@@STEP_LOG_END_PERF@{}@@@", log_name));
        } else {
            self.line(&format!("@@@STEP_LOG_END@{}@@@", log_name));
        }
    }

    fn step_status(&mut self, status: StepStatus) {
        match status {
            StepStatus::Success => {}
            StepStatus::Warning => self.line("@@@STEP_WARNINGS@@@"),
            StepStatus::Failure => self.line("@@@STEP_FAILURE@@@"),
            StepStatus::Exception => self.line("@@@STEP_EXCEPTION@@@"),
        }
    }

    fn emit(&mut self, line: &str) {
        self.line(line);
    }
}

/// Sink that discards every event, for un-annotated runs.
#[derive(Debug, Default)]
pub struct NullSink;

impl StepSink for NullSink {
    fn honor_zero_return_code(&mut self) {}
    fn seed_step(&mut self, _name: &str) {}
    fn step_cursor(&mut self, _name: &str) {}
    fn step_started(&mut self) {}
    fn step_closed(&mut self) {}
    fn step_text(&mut self, _text: &str) {}
    fn step_summary_text(&mut self, _text: &str) {}
    fn log_lines(&mut self, _log_name: &str, _lines: &[String], _perf: bool) {}
    fn step_status(&mut self, _status: StepStatus) {}
    fn emit(&mut self, _line: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(f: impl FnOnce(&mut AnnotationStream<Vec<u8>>)) -> String {
        let mut stream = AnnotationStream::new(Vec::new());
        f(&mut stream);
        String::from_utf8(stream.into_inner()).unwrap()
    }

    #[test]
    fn test_seed_and_cursor_wire_form() {
        let out = rendered(|s| {
            s.seed_step("compile");
            s.step_cursor("compile");
            s.step_started();
            s.step_closed();
        });
        assert_eq!(
            out,
            "@@@SEED_STEP compile@@@\n@@@STEP_CURSOR compile@@@\n\
             @@@STEP_STARTED@@@\n@@@STEP_CLOSED@@@\n"
        );
    }

    #[test]
    fn test_log_lines_wire_form() {
        let out = rendered(|s| {
            s.log_lines("stdio", &["a".to_string(), "b".to_string()], false);
        });
        assert_eq!(
            out,
            "@@@STEP_LOG_LINE@stdio@a@@@\n@@@STEP_LOG_LINE@stdio@b@@@\n\
             @@@STEP_LOG_END@stdio@@@\n"
        );
    }

    #[test]
    fn test_perf_log_end() {
        let out = rendered(|s| {
            s.log_lines("timings", &["1.0".to_string()], true);
        });
        assert!(out.ends_with("@@@STEP_LOG_END_PERF@timings@@@\n"));
    }

    #[test]
    fn test_status_lines() {
        let out = rendered(|s| {
            s.step_status(StepStatus::Success);
            s.step_status(StepStatus::Warning);
            s.step_status(StepStatus::Failure);
            s.step_status(StepStatus::Exception);
        });
        assert_eq!(
            out,
            "@@@STEP_WARNINGS@@@\n@@@STEP_FAILURE@@@\n@@@STEP_EXCEPTION@@@\n"
        );
    }
}
