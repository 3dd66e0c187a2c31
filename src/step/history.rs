//! Step results and the insertion-ordered run history.

use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

use crate::annotation::StepSink;
use crate::presentation::{Presentation, PresentationError};
use crate::step::RenderedStep;

/// Errors from history bookkeeping.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    /// Step names are unique within one run.
    #[error("step \"{0}\" is already in the step history")]
    DuplicateStepName(String),
}

/// Outcome of one executed step: the defensively copied step, its return
/// code, its presentation, and the structured outputs placeholders attached
/// under their namespaces.
#[derive(Debug)]
pub struct StepResult {
    step: RenderedStep,
    retcode: i32,
    presentation: Presentation,
    module_outputs: Vec<(String, Value)>,
}

impl StepResult {
    pub fn new(step: RenderedStep, retcode: i32) -> Self {
        Self {
            step,
            retcode,
            presentation: Presentation::new(),
            module_outputs: Vec::new(),
        }
    }

    /// The step this result belongs to, as an independent copy.
    pub fn step(&self) -> RenderedStep {
        self.step.clone()
    }

    /// The step's name.
    pub fn name(&self) -> &str {
        &self.step.name
    }

    /// The subprocess return code.
    pub fn retcode(&self) -> i32 {
        self.retcode
    }

    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut Presentation {
        &mut self.presentation
    }

    /// Attach a placeholder module's structured output under its namespace.
    /// A later attachment for the same namespace replaces the earlier one.
    pub fn attach_module_output(&mut self, namespace: &str, output: Value) {
        if let Some(entry) = self
            .module_outputs
            .iter_mut()
            .find(|(ns, _)| ns == namespace)
        {
            entry.1 = output;
        } else {
            self.module_outputs.push((namespace.to_string(), output));
        }
    }

    /// Structured output attached under the given namespace, if any.
    pub fn module_output(&self, namespace: &str) -> Option<&Value> {
        self.module_outputs
            .iter()
            .find(|(ns, _)| ns == namespace)
            .map(|(_, output)| output)
    }

    /// Flush the presentation to the sink and seal it.
    pub fn finalize(&mut self, sink: &mut dyn StepSink) -> Result<(), PresentationError> {
        self.presentation.finalize(sink)
    }
}

/// Insertion-ordered mapping from step name to result, covering the whole
/// run. Single-writer: only the orchestration loop grows it.
#[derive(Debug, Default)]
pub struct StepHistory {
    order: Vec<String>,
    by_name: HashMap<String, usize>,
    results: Vec<StepResult>,
}

impl StepHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a result. Duplicate step names are a contract violation.
    pub fn insert(&mut self, result: StepResult) -> Result<(), HistoryError> {
        let name = result.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(HistoryError::DuplicateStepName(name));
        }
        self.by_name.insert(name.clone(), self.results.len());
        self.order.push(name);
        self.results.push(result);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&StepResult> {
        self.by_name.get(name).map(|&at| &self.results[at])
    }

    /// The most recently inserted result, or None before the first step.
    pub fn last(&self) -> Option<&StepResult> {
        self.results.last()
    }

    /// The n'th inserted result (0-based), or None.
    pub fn nth(&self, n: usize) -> Option<&StepResult> {
        self.results.get(n)
    }

    /// Step names in insertion order.
    pub fn names(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Iterate results in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &StepResult> {
        self.results.iter()
    }
}
