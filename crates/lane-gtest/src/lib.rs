//! Streaming classifier for GTest-style test-runner output.
//!
//! The classifier consumes raw test-binary output one line at a time and
//! builds a structured per-test status table: pass/fail/timeout records,
//! disabled/flaky tallies, memory-checker suppression blocks, and a
//! completed-cleanly verdict. It has no dependency on the step engine; the
//! lane feeds it a step's captured stdio and reads the resulting report.

mod parser;
mod result;

pub use parser::GTestLogParser;
pub use result::{Tally, TestEntry, TestReport, TestStatus};
