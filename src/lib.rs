//! Buildlane - annotated build/test lane
//!
//! This crate implements a step orchestration engine for CI runs: recipes
//! describe steps (subprocess invocations), the engine executes them one at
//! a time, reports their lifecycle through an annotation stream, tracks
//! results in an ordered history, and folds return codes into a run-wide
//! verdict. Test-runner output is classified separately by the
//! `lane-gtest` crate.

pub mod annotation;
pub mod config;
pub mod engine;
pub mod gtest_followup;
pub mod placeholder;
pub mod presentation;
pub mod properties;
pub mod recipe;
pub mod sequence;
pub mod step;

pub use annotation::{AnnotationStream, NullSink, StepSink};
pub use config::LaneConfig;
pub use engine::{
    Engine, EngineError, ExitCode, ProcessExecutor, RunOutcome, RunTestData, StepTestData,
};
pub use gtest_followup::gtest_followup;
pub use placeholder::{JsonOutputPlaceholder, Placeholder};
pub use presentation::{Presentation, PresentationError, StepStatus};
pub use properties::PropertyBag;
pub use recipe::{FnRecipe, Recipe, RecipeContext, RecipeError, RecipeRegistry};
pub use sequence::{StepGenerator, StepSequencer, StepsSource};
pub use step::{Step, StepHistory, StepResult};
