//! Step sequencing: normalizes nested and generated step descriptions into
//! a flat ordered stream.
//!
//! Recipes describe builds declaratively and may emit single steps, batches
//! of steps, or live generators that react to prior results. The sequencer
//! flattens batches depth-first in emission order, marks co-yielded batches
//! with a shared seed group, and drives generators pull-by-pull so the
//! engine can stop consuming one after a failure.

use std::collections::VecDeque;
use thiserror::Error;

use crate::step::{Step, StepHistory};

/// Errors from step sequencing.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// The step source had a shape the sequencer does not accept.
    #[error("item is not a sequence or a step: {0}")]
    InvalidStepShape(String),
}

/// A source of steps: one step, an ordered batch, or a live generator.
pub enum StepsSource {
    /// A single step.
    Single(Step),
    /// An ordered sequence of steps and sub-sequences. Data only: nesting a
    /// generator inside a batch is a contract violation.
    Batch(Vec<StepsSource>),
    /// A lazy producer of further sources.
    Generator(Box<dyn StepGenerator>),
}

impl std::fmt::Debug for StepsSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepsSource::Single(step) => f.debug_tuple("Single").field(&step.name).finish(),
            StepsSource::Batch(items) => f.debug_tuple("Batch").field(&items.len()).finish(),
            StepsSource::Generator(_) => f.write_str("Generator"),
        }
    }
}

/// A pull-based producer of step sources: a lazy, finite, non-restartable
/// sequence driven by the orchestration loop.
///
/// Each pull receives the run's current failure flag and a read view of the
/// step history, so a generator can react to what earlier steps produced.
pub trait StepGenerator {
    fn next(
        &mut self,
        failed: bool,
        history: &StepHistory,
    ) -> Result<Option<StepsSource>, SequenceError>;
}

struct GeneratorFrame {
    generator: Box<dyn StepGenerator>,
    /// Whether every step of this generator's most recent yield declared
    /// keep-going; gates further pulls once the run has failed.
    keep_going: bool,
}

/// Normalizes a possibly-generator-producing, possibly-nested step source
/// into a flat ordered stream of steps.
pub struct StepSequencer {
    pending: VecDeque<StepsSource>,
    ready: VecDeque<Step>,
    frames: Vec<GeneratorFrame>,
}

impl StepSequencer {
    pub fn new(source: StepsSource) -> Self {
        let pending = match source {
            // The outermost batch is the list of top-level items; each may
            // itself be a generator.
            StepsSource::Batch(items) => items.into(),
            other => VecDeque::from([other]),
        };
        Self {
            pending,
            ready: VecDeque::new(),
            frames: Vec::new(),
        }
    }

    /// Produce the next step, or None when every source is exhausted.
    ///
    /// `failed` is the run's cumulative failure flag: once set, a live
    /// generator is only pulled again if its most recent yield declared
    /// keep-going; otherwise it is dropped and sequencing proceeds with the
    /// next top-level item. Steps already yielded are never withheld.
    pub fn next(
        &mut self,
        failed: bool,
        history: &StepHistory,
    ) -> Result<Option<Step>, SequenceError> {
        loop {
            if let Some(step) = self.ready.pop_front() {
                return Ok(Some(step));
            }

            if let Some(frame) = self.frames.last_mut() {
                if failed && !frame.keep_going {
                    self.frames.pop();
                    continue;
                }
                match frame.generator.next(failed, history)? {
                    Some(item) => self.admit(item, true)?,
                    None => {
                        self.frames.pop();
                    }
                }
                continue;
            }

            match self.pending.pop_front() {
                Some(item) => self.admit(item, false)?,
                None => return Ok(None),
            }
        }
    }

    /// Resolve one source item into ready steps or a new generator frame.
    /// `from_generator` marks items yielded by the innermost live generator
    /// so its keep-going gate can be updated.
    fn admit(&mut self, item: StepsSource, from_generator: bool) -> Result<(), SequenceError> {
        match item {
            StepsSource::Single(step) => {
                if from_generator {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.keep_going = step.keep_going;
                    }
                }
                self.ready.push_back(step);
            }
            StepsSource::Batch(items) => {
                let steps = flatten_batch(items)?;
                if from_generator {
                    if let Some(frame) = self.frames.last_mut() {
                        frame.keep_going =
                            !steps.is_empty() && steps.iter().all(|s| s.keep_going);
                    }
                }
                self.ready.extend(steps);
            }
            StepsSource::Generator(generator) => {
                self.frames.push(GeneratorFrame {
                    generator,
                    keep_going: true,
                });
            }
        }
        Ok(())
    }
}

/// Flatten a data batch depth-first, preserving emission order, and mark
/// the batch with a shared seed group: if the first flattened step carries
/// no grouping tag, it is synthesized as the ordered list of every step
/// name in the batch.
fn flatten_batch(items: Vec<StepsSource>) -> Result<Vec<Step>, SequenceError> {
    let mut steps = Vec::new();
    flatten_into(items, &mut steps)?;

    if let Some(first) = steps.first() {
        if first.seed_group.is_empty() {
            let names: Vec<String> = steps.iter().map(|s| s.name.clone()).collect();
            steps[0].seed_group = names;
        }
    }
    Ok(steps)
}

fn flatten_into(items: Vec<StepsSource>, out: &mut Vec<Step>) -> Result<(), SequenceError> {
    for item in items {
        match item {
            StepsSource::Single(step) => out.push(step),
            StepsSource::Batch(nested) => flatten_into(nested, out)?,
            StepsSource::Generator(_) => {
                return Err(SequenceError::InvalidStepShape(
                    "generator nested inside a step sequence".to_string(),
                ));
            }
        }
    }
    Ok(())
}
