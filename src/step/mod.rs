//! Step records: the unit of work the lane executes.
//!
//! Steps are created by recipe/generator code, normalized by the sequencer,
//! rendered (placeholders expanded), executed once, and then discarded; the
//! data fields survive as a `RenderedStep` copy inside the result.

mod history;

pub use history::{HistoryError, StepHistory, StepResult};

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use crate::placeholder::Placeholder;

/// Follow-up callback invoked with the step's result after execution and
/// before the presentation is finalized. May override status, text, logs.
pub type Followup = Box<dyn FnOnce(&mut StepResult)>;

/// One token of a step command: either a concrete argument or a deferred
/// placeholder contributed by a subsystem.
pub enum CommandToken {
    /// A literal argument.
    Arg(String),
    /// A placeholder expanded at render time.
    Placeholder(Box<dyn Placeholder>),
}

impl fmt::Debug for CommandToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandToken::Arg(s) => write!(f, "{:?}", s),
            CommandToken::Placeholder(p) => write!(f, "<placeholder:{}>", p.namespace()),
        }
    }
}

impl From<&str> for CommandToken {
    fn from(s: &str) -> Self {
        CommandToken::Arg(s.to_string())
    }
}

impl From<String> for CommandToken {
    fn from(s: String) -> Self {
        CommandToken::Arg(s)
    }
}

/// An externally executed unit of work within a run.
///
/// `name` must be unique within one run. `seed_group` lists the names of the
/// sibling steps this step was co-generated with, so the reporting sink can
/// show the whole batch as pending before any of it runs.
pub struct Step {
    /// Unique step name within the run.
    pub name: String,
    /// Command tokens; placeholders are expanded at render time.
    pub cmd: Vec<CommandToken>,
    /// Working directory for the subprocess, if any.
    pub cwd: Option<PathBuf>,
    /// Environment overrides merged over the inherited environment.
    pub env: BTreeMap<String, String>,
    /// Names of sibling steps seeded together with this one.
    pub seed_group: Vec<String>,
    /// Continue-on-failure declaration: a non-zero return code does not
    /// fail the run, and a producing generator keeps being consumed.
    pub keep_going: bool,
    /// Let child output carry raw annotation directives through unmasked.
    pub allow_subannotations: bool,
    /// Optional follow-up callback run against the result.
    pub followup: Option<Followup>,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("cmd", &self.cmd)
            .field("cwd", &self.cwd)
            .field("seed_group", &self.seed_group)
            .field("keep_going", &self.keep_going)
            .field("followup", &self.followup.is_some())
            .finish()
    }
}

impl Step {
    /// Start building a step with the given name.
    pub fn builder(name: impl Into<String>) -> StepBuilder {
        StepBuilder::new(name)
    }

    /// Snapshot the step's data fields into a `RenderedStep`.
    ///
    /// Any placeholder still present in the command renders as a
    /// `<namespace>` marker; the engine always expands placeholders first.
    pub fn to_rendered(&self) -> RenderedStep {
        RenderedStep {
            name: self.name.clone(),
            cmd: self
                .cmd
                .iter()
                .map(|token| match token {
                    CommandToken::Arg(s) => s.clone(),
                    CommandToken::Placeholder(p) => format!("<{}>", p.namespace()),
                })
                .collect(),
            cwd: self.cwd.clone(),
            env: self.env.clone(),
            seed_group: self.seed_group.clone(),
            keep_going: self.keep_going,
            allow_subannotations: self.allow_subannotations,
        }
    }
}

/// Builder for `Step`.
pub struct StepBuilder {
    step: Step,
}

impl StepBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            step: Step {
                name: name.into(),
                cmd: Vec::new(),
                cwd: None,
                env: BTreeMap::new(),
                seed_group: Vec::new(),
                keep_going: false,
                allow_subannotations: false,
                followup: None,
            },
        }
    }

    /// Append one literal argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.step.cmd.push(CommandToken::Arg(arg.into()));
        self
    }

    /// Append several literal arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.step
            .cmd
            .extend(args.into_iter().map(|a| CommandToken::Arg(a.into())));
        self
    }

    /// Append a placeholder token.
    pub fn placeholder(mut self, placeholder: Box<dyn Placeholder>) -> Self {
        self.step.cmd.push(CommandToken::Placeholder(placeholder));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.step.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.step.env.insert(key.into(), value.into());
        self
    }

    pub fn seed_group(mut self, names: Vec<String>) -> Self {
        self.step.seed_group = names;
        self
    }

    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.step.keep_going = keep_going;
        self
    }

    pub fn allow_subannotations(mut self, allow: bool) -> Self {
        self.step.allow_subannotations = allow;
        self
    }

    pub fn followup(mut self, followup: Followup) -> Self {
        self.step.followup = Some(followup);
        self
    }

    pub fn build(self) -> Step {
        self.step
    }
}

/// Defensive copy of a step's data fields after placeholder rendering: the
/// command is fully concrete and the follow-up callback is gone.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedStep {
    /// Step name.
    pub name: String,
    /// Concrete command tokens.
    pub cmd: Vec<String>,
    /// Working directory for the subprocess, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
    /// Environment overrides.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub env: BTreeMap<String, String>,
    /// Names of sibling steps seeded together with this one.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seed_group: Vec<String>,
    /// Continue-on-failure declaration.
    pub keep_going: bool,
    /// Whether raw annotation directives pass through unmasked.
    pub allow_subannotations: bool,
}
