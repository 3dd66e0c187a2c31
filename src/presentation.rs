//! Step presentation: the human/machine-facing summary of a step's outcome.
//!
//! A `Presentation` is mutable while the step runs and its follow-up
//! callbacks execute, then finalized exactly once. Finalizing flushes the
//! status, text, and logs to the annotation sink; afterwards every mutator
//! fails and accessors hand out independent copies.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::annotation::StepSink;

/// Final status of a step.
///
/// Unset status means "unknown": a step that ran to completion with a zero
/// return code and no explicit override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StepStatus {
    /// Step succeeded.
    Success,
    /// Step failed.
    Failure,
    /// Step completed with warnings.
    Warning,
    /// Step infrastructure raised a fault.
    Exception,
}

/// Errors from presentation mutators.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PresentationError {
    /// The presentation was already reported to the sink.
    #[error("presentation is finalized and can no longer be modified")]
    Finalized,
}

/// Mutable-until-finalized presentation of one step.
#[derive(Debug, Default)]
pub struct Presentation {
    finalized: bool,
    status: Option<StepStatus>,
    step_text: Option<String>,
    step_summary_text: Option<String>,
    logs: Vec<(String, Vec<String>)>,
    perf_logs: Vec<(String, Vec<String>)>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the presentation has been flushed to the sink.
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    fn check_open(&self) -> Result<(), PresentationError> {
        if self.finalized {
            Err(PresentationError::Finalized)
        } else {
            Ok(())
        }
    }

    pub fn status(&self) -> Option<StepStatus> {
        self.status
    }

    pub fn set_status(&mut self, status: StepStatus) -> Result<(), PresentationError> {
        self.check_open()?;
        self.status = Some(status);
        Ok(())
    }

    pub fn step_text(&self) -> Option<&str> {
        self.step_text.as_deref()
    }

    pub fn set_step_text(&mut self, text: impl Into<String>) -> Result<(), PresentationError> {
        self.check_open()?;
        self.step_text = Some(text.into());
        Ok(())
    }

    pub fn step_summary_text(&self) -> Option<&str> {
        self.step_summary_text.as_deref()
    }

    pub fn set_step_summary_text(
        &mut self,
        text: impl Into<String>,
    ) -> Result<(), PresentationError> {
        self.check_open()?;
        self.step_summary_text = Some(text.into());
        Ok(())
    }

    fn entry_mut<'a>(
        logs: &'a mut Vec<(String, Vec<String>)>,
        name: &str,
    ) -> &'a mut Vec<String> {
        if let Some(at) = logs.iter().position(|(n, _)| n == name) {
            &mut logs[at].1
        } else {
            logs.push((name.to_string(), Vec::new()));
            &mut logs.last_mut().expect("just pushed").1
        }
    }

    /// Append one line to the named log, creating the log if needed.
    pub fn append_log_line(
        &mut self,
        name: &str,
        line: impl Into<String>,
    ) -> Result<(), PresentationError> {
        self.check_open()?;
        Self::entry_mut(&mut self.logs, name).push(line.into());
        Ok(())
    }

    /// Replace (or create) the named log with the given lines.
    pub fn set_log(&mut self, name: &str, lines: Vec<String>) -> Result<(), PresentationError> {
        self.check_open()?;
        *Self::entry_mut(&mut self.logs, name) = lines;
        Ok(())
    }

    /// Replace (or create) the named performance log.
    pub fn set_perf_log(
        &mut self,
        name: &str,
        lines: Vec<String>,
    ) -> Result<(), PresentationError> {
        self.check_open()?;
        *Self::entry_mut(&mut self.perf_logs, name) = lines;
        Ok(())
    }

    /// Lines of the named log. Returns an owned copy; mutating it does not
    /// affect the presentation.
    pub fn log(&self, name: &str) -> Option<Vec<String>> {
        self.logs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.clone())
    }

    /// Lines of the named performance log, as an owned copy.
    pub fn perf_log(&self, name: &str) -> Option<Vec<String>> {
        self.perf_logs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, lines)| lines.clone())
    }

    /// Log names in insertion order.
    pub fn log_names(&self) -> Vec<String> {
        self.logs.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Performance log names in insertion order.
    pub fn perf_log_names(&self) -> Vec<String> {
        self.perf_logs.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Flush the presentation to the sink and seal it against further
    /// mutation. Flushing twice is an error.
    pub fn finalize(&mut self, sink: &mut dyn StepSink) -> Result<(), PresentationError> {
        self.check_open()?;
        self.finalized = true;

        if let Some(text) = &self.step_text {
            sink.step_text(text);
        }
        if let Some(text) = &self.step_summary_text {
            sink.step_summary_text(text);
        }
        for (name, lines) in &self.logs {
            sink.log_lines(name, lines, false);
        }
        for (name, lines) in &self.perf_logs {
            sink.log_lines(name, lines, true);
        }
        if let Some(status) = self.status {
            sink.step_status(status);
        }
        Ok(())
    }
}
