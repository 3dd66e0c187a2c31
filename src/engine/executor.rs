//! Step execution seam.
//!
//! The engine only depends on the `StepExecutor` signature: run this
//! command, give me the exit code and captured text. `ProcessExecutor` is
//! the real implementation; tests substitute canned executions or run the
//! engine in test mode, which bypasses the executor entirely.

use std::io::{self, BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::annotation::StepSink;
use crate::step::RenderedStep;

/// What a finished step execution produced.
#[derive(Debug, Clone, Default)]
pub struct Execution {
    /// Subprocess return code; -1 when the process died without one.
    pub retcode: i32,
    /// Captured stdout followed by stderr.
    pub output: String,
}

/// Errors from step execution. These are infrastructure faults, distinct
/// from a step exiting non-zero.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// The step had no command tokens.
    #[error("step \"{0}\" has an empty command")]
    EmptyCommand(String),

    /// The subprocess could not be launched.
    #[error("failed to launch `{command}`: {source}")]
    Launch {
        command: String,
        #[source]
        source: io::Error,
    },

    /// Reading the subprocess output failed.
    #[error("IO error while streaming step output: {0}")]
    Io(#[from] io::Error),
}

/// External collaborator that runs one step to completion.
pub trait StepExecutor {
    /// Execute the step, forwarding its output lines through the sink, and
    /// return the exit code plus the captured text. Blocks until the
    /// subprocess exits; timeout enforcement belongs to the collaborator
    /// behind this seam, not to the engine.
    fn execute(
        &mut self,
        step: &RenderedStep,
        sink: &mut dyn StepSink,
    ) -> Result<Execution, ExecutorError>;
}

/// Runs steps as local subprocesses.
#[derive(Debug, Default)]
pub struct ProcessExecutor;

impl ProcessExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl StepExecutor for ProcessExecutor {
    fn execute(
        &mut self,
        step: &RenderedStep,
        sink: &mut dyn StepSink,
    ) -> Result<Execution, ExecutorError> {
        let (program, args) = step
            .cmd
            .split_first()
            .ok_or_else(|| ExecutorError::EmptyCommand(step.name.clone()))?;

        let mut command = Command::new(program);
        command
            .args(args)
            .envs(&step.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &step.cwd {
            command.current_dir(cwd);
        }

        tracing::debug!(step = %step.name, command = ?step.cmd, "spawning step");

        let mut child = command.spawn().map_err(|source| ExecutorError::Launch {
            command: step.cmd.join(" "),
            source,
        })?;

        // Drain stderr on a helper thread so neither pipe can fill up and
        // stall the child.
        let stderr = child.stderr.take();
        let stderr_thread = std::thread::spawn(move || -> io::Result<String> {
            let mut buffer = String::new();
            if let Some(mut stderr) = stderr {
                stderr.read_to_string(&mut buffer)?;
            }
            Ok(buffer)
        });

        let mut output = String::new();
        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                // Child output must not smuggle annotation directives into
                // the stream unless the step opted in.
                if !step.allow_subannotations && line.starts_with("@@@") {
                    sink.emit(&format!("!{}", line));
                } else {
                    sink.emit(&line);
                }
                output.push_str(&line);
                output.push('\n');
            }
        }

        let status = child.wait()?;
        let stderr_text = stderr_thread
            .join()
            .unwrap_or_else(|_| Ok(String::new()))?;
        if !stderr_text.is_empty() {
            for line in stderr_text.lines() {
                if !step.allow_subannotations && line.starts_with("@@@") {
                    sink.emit(&format!("!{}", line));
                } else {
                    sink.emit(line);
                }
            }
            output.push_str(&stderr_text);
        }

        Ok(Execution {
            retcode: status.code().unwrap_or(-1),
            output,
        })
    }
}
