//! JSON recipe documents.
//!
//! The on-disk recipe form: an ordered list of step objects and nested
//! lists. `${key}` tokens in commands and environment values expand from
//! the property bag. A step marked `generates_steps` becomes a live
//! generator: it runs with a JSON output placeholder appended to its
//! command, and the JSON array it emits is parsed as further step items.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::placeholder::JsonOutputPlaceholder;
use crate::properties::PropertyBag;
use crate::recipe::{Recipe, RecipeContext, RecipeError};
use crate::sequence::{SequenceError, StepGenerator, StepsSource};
use crate::step::{Step, StepHistory};

/// A whole recipe document.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeDoc {
    /// Top-level step items, in emission order.
    pub steps: Vec<RawItem>,
}

/// One item of a recipe document: a step or a nested list.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawItem {
    Step(Box<RawStep>),
    Batch(Vec<RawItem>),
}

/// The wire form of one step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawStep {
    /// Unique step name.
    pub name: String,
    /// Command tokens; `${key}` expands from the properties.
    pub cmd: Vec<String>,
    /// Working directory.
    #[serde(default)]
    pub cwd: Option<PathBuf>,
    /// Environment overrides; values also expand `${key}`.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Explicit seed group; synthesized for batches when absent.
    #[serde(default)]
    pub seed_steps: Vec<String>,
    /// Continue-on-failure declaration.
    #[serde(default)]
    pub keep_going: bool,
    /// Pass raw annotation directives through from child output.
    #[serde(default)]
    pub allow_subannotations: bool,
    /// Run this step as a generator of further steps.
    #[serde(default)]
    pub generates_steps: bool,
}

/// A recipe loaded from a JSON document.
#[derive(Debug)]
pub struct JsonRecipe {
    doc: RecipeDoc,
}

impl JsonRecipe {
    pub fn new(doc: RecipeDoc) -> Self {
        Self { doc }
    }

    pub fn from_str(content: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(content)?))
    }
}

impl Recipe for JsonRecipe {
    fn generate(&self, ctx: &RecipeContext<'_>) -> Result<StepsSource, RecipeError> {
        let items = self
            .doc
            .steps
            .iter()
            .map(|item| item_to_source(item, Some(ctx.properties)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(StepsSource::Batch(items))
    }
}

fn item_to_source(
    item: &RawItem,
    properties: Option<&PropertyBag>,
) -> Result<StepsSource, RecipeError> {
    match item {
        RawItem::Batch(items) => Ok(StepsSource::Batch(
            items
                .iter()
                .map(|nested| item_to_source(nested, properties))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        RawItem::Step(raw) => {
            let step = raw_to_step(raw, properties)?;
            if raw.generates_steps {
                Ok(StepsSource::Generator(Box::new(ScriptStepGenerator::new(
                    step,
                ))))
            } else {
                Ok(StepsSource::Single(step))
            }
        }
    }
}

fn raw_to_step(raw: &RawStep, properties: Option<&PropertyBag>) -> Result<Step, RecipeError> {
    let mut builder = Step::builder(&raw.name);
    for token in &raw.cmd {
        builder = builder.arg(expand(token, properties)?);
    }
    if raw.generates_steps {
        builder = builder.placeholder(Box::new(JsonOutputPlaceholder::new()));
    }
    if let Some(cwd) = &raw.cwd {
        builder = builder.cwd(cwd);
    }
    for (key, value) in &raw.env {
        builder = builder.env(key, expand(value, properties)?);
    }
    Ok(builder
        .seed_group(raw.seed_steps.clone())
        .keep_going(raw.keep_going)
        .allow_subannotations(raw.allow_subannotations)
        .build())
}

/// Expand `${key}` occurrences from the property bag. Steps emitted by a
/// generator carry no properties and pass through unexpanded.
fn expand(token: &str, properties: Option<&PropertyBag>) -> Result<String, RecipeError> {
    if !token.contains("${") {
        return Ok(token.to_string());
    }
    let Some(properties) = properties else {
        return Ok(token.to_string());
    };

    let mut out = String::new();
    let mut rest = token;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let end = after
            .find('}')
            .ok_or_else(|| RecipeError::UnterminatedInterpolation(token.to_string()))?;
        let key = &after[..end];
        let value = properties
            .get(key)
            .ok_or_else(|| RecipeError::UnknownProperty(key.to_string()))?;
        match value {
            Value::String(s) => out.push_str(s),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Bool(b) => out.push_str(&b.to_string()),
            _ => return Err(RecipeError::NonScalarProperty(key.to_string())),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

/// Generator backing a `generates_steps` step: yields the step itself,
/// then parses the JSON it emitted as further step items.
pub struct ScriptStepGenerator {
    step: Option<Step>,
    step_name: String,
    consumed: bool,
}

impl ScriptStepGenerator {
    pub fn new(step: Step) -> Self {
        let step_name = step.name.clone();
        Self {
            step: Some(step),
            step_name,
            consumed: false,
        }
    }
}

impl StepGenerator for ScriptStepGenerator {
    fn next(
        &mut self,
        _failed: bool,
        history: &StepHistory,
    ) -> Result<Option<StepsSource>, SequenceError> {
        if let Some(step) = self.step.take() {
            return Ok(Some(StepsSource::Single(step)));
        }
        if self.consumed {
            return Ok(None);
        }
        self.consumed = true;

        let result = history.get(&self.step_name).ok_or_else(|| {
            SequenceError::InvalidStepShape(format!(
                "generator step \"{}\" has no recorded result",
                self.step_name
            ))
        })?;
        let output = result
            .module_output("json")
            .and_then(|module| module.get("output"))
            .cloned()
            .unwrap_or(Value::Null);

        let items: Vec<RawItem> = serde_json::from_value(output).map_err(|e| {
            SequenceError::InvalidStepShape(format!(
                "generator step \"{}\" emitted invalid steps: {}",
                self.step_name, e
            ))
        })?;
        let sources = items
            .iter()
            .map(|item| {
                item_to_source(item, None)
                    .map_err(|e| SequenceError::InvalidStepShape(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Some(StepsSource::Batch(sources)))
    }
}
