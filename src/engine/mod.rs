//! The orchestration loop: executes a recipe's steps one at a time,
//! tracking outcomes and the run-wide verdict.
//!
//! A run is `SETUP → EXECUTING → DONE`: the setup step merges properties
//! and resolves the recipe; the executing phase drives the sequencer,
//! rendering placeholders, executing each step (or synthesizing it from
//! canned test data), running follow-ups, binding placeholder outputs,
//! finalizing presentations, and folding return codes into the sticky
//! failure flag. Failure never skips steps already yielded; it only gates
//! how long a live generator keeps being consumed.

mod executor;

pub use executor::{Execution, ExecutorError, ProcessExecutor, StepExecutor};

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::annotation::StepSink;
use crate::placeholder::{bind, render_step, PlaceholderError};
use crate::presentation::{Presentation, PresentationError, StepStatus};
use crate::properties::PropertyBag;
use crate::recipe::{RecipeContext, RecipeRegistry};
use crate::sequence::{SequenceError, StepSequencer, StepsSource};
use crate::step::{HistoryError, Step, StepHistory, StepResult};

/// Name of the synthetic step that resolves the recipe.
pub const SETUP_STEP: &str = "setup_build";

/// Run-level exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Every step succeeded.
    Success = 0,
    /// At least one step failed without declaring keep-going, or the run
    /// aborted on an execution fault.
    StepFailure = 1,
    /// Recipe resolution or another part of setup failed; no steps ran.
    SetupFailure = 2,
}

impl ExitCode {
    pub fn as_i32(&self) -> i32 {
        *self as i32
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Canned data for one step when running under substitute test output.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StepTestData {
    /// Return code to synthesize.
    #[serde(default)]
    pub retcode: i32,

    /// Captured-output text to synthesize.
    #[serde(default)]
    pub output: String,

    /// Per-namespace data slices handed to placeholders.
    #[serde(default)]
    pub modules: HashMap<String, Value>,
}

impl StepTestData {
    pub fn with_retcode(retcode: i32) -> Self {
        Self {
            retcode,
            ..Self::default()
        }
    }

    pub fn with_module(namespace: &str, data: Value) -> Self {
        let mut datum = Self::default();
        datum.modules.insert(namespace.to_string(), data);
        datum
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = output.into();
        self
    }

    /// The namespace's slice of this step's test data; absent means an
    /// empty object, not "no test mode".
    pub fn module_data(&self, namespace: &str) -> Value {
        self.modules
            .get(namespace)
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

/// Canned data for a whole run, keyed by step name. Every entry must be
/// consumed: leftovers at the end of the run are a hard fault, so tests
/// cannot silently describe steps that never run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct RunTestData {
    steps: HashMap<String, StepTestData>,
}

impl RunTestData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(mut self, name: &str, datum: StepTestData) -> Self {
        self.steps.insert(name.to_string(), datum);
        self
    }

    fn take(&mut self, name: &str) -> Option<StepTestData> {
        self.steps.remove(name)
    }

    fn remaining(&self) -> Vec<String> {
        let mut names: Vec<String> = self.steps.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Hard faults that abort the run: programming errors in recipe code, not
/// recoverable outcomes.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    History(#[from] HistoryError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error(transparent)]
    Presentation(#[from] PresentationError),

    #[error(transparent)]
    Placeholder(#[from] PlaceholderError),

    /// Test data described steps that never ran.
    #[error("unconsumed test data for steps: {}", .0.join(", "))]
    UnconsumedTestData(Vec<String>),
}

/// What a completed run produced.
#[derive(Debug)]
pub struct RunOutcome {
    /// Unique run identifier.
    pub run_id: String,
    /// Run-level verdict.
    pub exit_code: ExitCode,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub finished_at: DateTime<Utc>,
    /// Every step result, in execution order.
    pub history: StepHistory,
}

impl RunOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code.is_success()
    }
}

/// The orchestration loop. Single-threaded by contract: one engine drives
/// one run to completion, and nothing reads the history while it grows.
pub struct Engine<'a> {
    executor: &'a mut dyn StepExecutor,
    sink: &'a mut dyn StepSink,
    test_data: Option<RunTestData>,
}

impl<'a> Engine<'a> {
    pub fn new(executor: &'a mut dyn StepExecutor, sink: &'a mut dyn StepSink) -> Self {
        Self {
            executor,
            sink,
            test_data: None,
        }
    }

    /// Run under substitute test output: steps are not executed, their
    /// return codes and placeholder data come from `test_data`.
    pub fn with_test_data(mut self, test_data: RunTestData) -> Self {
        self.test_data = Some(test_data);
        self
    }

    /// Execute the recipe named by the merged properties' `recipe` key.
    ///
    /// Returns the run outcome for every completed run, including failed
    /// and setup-failed ones; `Err` is reserved for contract violations.
    pub fn run(
        &mut self,
        registry: &RecipeRegistry,
        build_properties: PropertyBag,
        factory_properties: PropertyBag,
    ) -> Result<RunOutcome, EngineError> {
        let started_at = Utc::now();
        let run_id = Uuid::new_v4().to_string();

        let mut history = StepHistory::new();
        self.sink.honor_zero_return_code();

        // Setup phase: merge properties and resolve the recipe inside a
        // synthetic step so failures surface like any other step.
        self.sink.seed_step(SETUP_STEP);
        self.sink.step_cursor(SETUP_STEP);
        self.sink.step_started();

        let properties = PropertyBag::merge(factory_properties, build_properties);
        self.sink
            .emit(&format!("Running recipe with {}", properties.to_json()));

        let mut setup_result =
            StepResult::new(Step::builder(SETUP_STEP).build().to_rendered(), 0);
        let source =
            match resolve_steps(registry, &properties, setup_result.presentation_mut()) {
                Ok(source) => Some(source),
                Err(message) => {
                    tracing::warn!(%message, "build setup failed");
                    setup_result.presentation_mut().set_step_text(message)?;
                    setup_result
                        .presentation_mut()
                        .set_status(StepStatus::Failure)?;
                    None
                }
            };
        setup_result.finalize(self.sink)?;
        self.sink.step_closed();
        history.insert(setup_result)?;

        let Some(source) = source else {
            return Ok(RunOutcome {
                run_id,
                exit_code: ExitCode::SetupFailure,
                started_at,
                finished_at: Utc::now(),
                history,
            });
        };

        // Executing phase.
        let mut sequencer = StepSequencer::new(source);
        let mut failed = false;
        let mut fatal = false;

        while let Some(mut step) = sequencer.next(failed, &history)? {
            let test_datum = self
                .test_data
                .as_mut()
                .map(|td| td.take(&step.name).unwrap_or_default());

            let placeholders = render_step(&mut step, test_datum.as_ref())?;

            if history.contains(&step.name) {
                return Err(HistoryError::DuplicateStepName(step.name).into());
            }

            for seed in &step.seed_group {
                self.sink.seed_step(seed);
            }
            self.sink.step_cursor(&step.name);
            self.sink.step_started();

            let followup = step.followup.take();
            let rendered = step.to_rendered();
            let keep_going = rendered.keep_going;
            tracing::debug!(step = %rendered.name, "executing step");

            let execution = match &test_datum {
                Some(datum) => Ok(Execution {
                    retcode: datum.retcode,
                    output: datum.output.clone(),
                }),
                None => self.executor.execute(&rendered, &mut *self.sink),
            };

            match execution {
                Ok(execution) => {
                    let retcode = execution.retcode;
                    let mut result = StepResult::new(rendered, retcode);
                    if !execution.output.is_empty() {
                        result.presentation_mut().set_log(
                            "stdio",
                            execution.output.lines().map(str::to_string).collect(),
                        )?;
                    }
                    if retcode != 0 {
                        result.presentation_mut().set_status(StepStatus::Failure)?;
                        if test_datum.is_none() {
                            // Not emitted in test mode, to keep canned
                            // expectations uncluttered.
                            self.sink.emit(&format!(
                                "step returned non-zero exit code: {}",
                                retcode
                            ));
                        }
                    }
                    if let Some(followup) = followup {
                        followup(&mut result);
                    }
                    bind(&mut result, placeholders, test_datum.as_ref());
                    result.finalize(self.sink)?;
                    self.sink.step_closed();

                    failed = failed || (retcode != 0 && !keep_going);
                    history.insert(result)?;
                }
                Err(error) => {
                    // Execution fault: report the step as EXCEPTION and
                    // abort the run.
                    tracing::error!(error = %error, "step execution fault");
                    let mut result = StepResult::new(rendered, -1);
                    result
                        .presentation_mut()
                        .set_log("exception", vec![error.to_string()])?;
                    result
                        .presentation_mut()
                        .set_status(StepStatus::Exception)?;
                    result.finalize(self.sink)?;
                    self.sink.step_closed();
                    failed = true;
                    fatal = true;
                    history.insert(result)?;
                }
            }

            if fatal {
                break;
            }
        }

        if !fatal {
            if let Some(test_data) = &self.test_data {
                let remaining = test_data.remaining();
                if !remaining.is_empty() {
                    return Err(EngineError::UnconsumedTestData(remaining));
                }
            }
        }

        Ok(RunOutcome {
            run_id,
            exit_code: if failed {
                ExitCode::StepFailure
            } else {
                ExitCode::Success
            },
            started_at,
            finished_at: Utc::now(),
            history,
        })
    }
}

/// Resolve the recipe named by the properties and generate its steps.
/// Any error here is a setup failure, reported on the setup step.
fn resolve_steps(
    registry: &RecipeRegistry,
    properties: &PropertyBag,
    presentation: &mut Presentation,
) -> Result<StepsSource, String> {
    let recipe_name = properties
        .get_str("recipe")
        .ok_or_else(|| "recipe property not set".to_string())?;

    let resolved = registry.resolve(recipe_name).map_err(|e| e.to_string())?;

    let mut text = format!("recipe {} from {}", resolved.name, resolved.origin);
    if let Some(fingerprint) = &resolved.fingerprint {
        text.push_str(&format!(" @ {}", &fingerprint[..12.min(fingerprint.len())]));
    }
    presentation
        .set_step_text(text)
        .map_err(|e| e.to_string())?;

    resolved
        .recipe
        .generate(&RecipeContext { properties })
        .map_err(|e| e.to_string())
}
