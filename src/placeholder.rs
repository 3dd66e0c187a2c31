//! Command-line placeholders: deferred argument expansion and result
//! extraction for contributing subsystems.
//!
//! A placeholder is rendered into concrete command tokens before the step
//! runs, and after the step finishes it harvests structured output into an
//! accumulator attached to the result under the placeholder's namespace.
//! The orchestration core never learns the schema of either side.

use serde_json::{Map, Value};
use std::fs;
use std::io;
use tempfile::NamedTempFile;
use thiserror::Error;

use crate::engine::StepTestData;
use crate::presentation::Presentation;
use crate::step::{CommandToken, Step, StepResult};

/// Errors raised while rendering placeholders.
#[derive(Debug, Error)]
pub enum PlaceholderError {
    /// Could not set up the backing resource for a placeholder.
    #[error("failed to prepare placeholder backing file: {0}")]
    Io(#[from] io::Error),
}

/// A deferred command-argument / result-extraction capability owned by one
/// subsystem namespace.
pub trait Placeholder {
    /// The owning subsystem namespace; outputs land on the result under
    /// this name.
    fn namespace(&self) -> &'static str;

    /// Expand into zero or more concrete command tokens. `test_data` is the
    /// namespace's slice of canned data when running under substitute
    /// output, or None during real execution.
    fn render(&mut self, test_data: Option<&Value>) -> Result<Vec<String>, PlaceholderError>;

    /// Post-process the finished step: read real output (or the test-data
    /// slice), write structured results into `output`, and optionally
    /// decorate the presentation.
    fn step_finished(
        &mut self,
        presentation: &mut Presentation,
        output: &mut Map<String, Value>,
        test_data: Option<&Value>,
    );
}

/// Placeholders collected from one step's command, grouped by namespace in
/// first-appearance order.
#[derive(Default)]
pub struct RenderedPlaceholders {
    groups: Vec<(String, Vec<Box<dyn Placeholder>>)>,
}

impl RenderedPlaceholders {
    fn push(&mut self, placeholder: Box<dyn Placeholder>) {
        let namespace = placeholder.namespace().to_string();
        if let Some(group) = self.groups.iter_mut().find(|(ns, _)| *ns == namespace) {
            group.1.push(placeholder);
        } else {
            self.groups.push((namespace, vec![placeholder]));
        }
    }

    /// Namespaces present, in first-appearance order.
    pub fn namespaces(&self) -> Vec<String> {
        self.groups.iter().map(|(ns, _)| ns.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Rewrite the step's command in place, expanding every placeholder token
/// into concrete arguments, and return the placeholders grouped by
/// namespace for the post-execution bind.
pub fn render_step(
    step: &mut Step,
    test_data: Option<&StepTestData>,
) -> Result<RenderedPlaceholders, PlaceholderError> {
    let mut rendered = RenderedPlaceholders::default();
    let mut new_cmd = Vec::with_capacity(step.cmd.len());

    for token in step.cmd.drain(..) {
        match token {
            CommandToken::Arg(arg) => new_cmd.push(CommandToken::Arg(arg)),
            CommandToken::Placeholder(mut placeholder) => {
                let slice = test_data.map(|td| td.module_data(placeholder.namespace()));
                let args = placeholder.render(slice.as_ref())?;
                new_cmd.extend(args.into_iter().map(CommandToken::Arg));
                rendered.push(placeholder);
            }
        }
    }

    step.cmd = new_cmd;
    Ok(rendered)
}

/// Give every placeholder the chance to post-process the result, then
/// attach each namespace's accumulator to the result.
pub fn bind(
    result: &mut StepResult,
    placeholders: RenderedPlaceholders,
    test_data: Option<&StepTestData>,
) {
    for (namespace, group) in placeholders.groups {
        let mut output = Map::new();
        let slice = test_data.map(|td| td.module_data(&namespace));
        for mut placeholder in group {
            placeholder.step_finished(result.presentation_mut(), &mut output, slice.as_ref());
        }
        result.attach_module_output(&namespace, Value::Object(output));
    }
}

/// Path handed out when rendering a JSON output placeholder under
/// substitute test data: no file is created in that mode.
const TEST_MODE_PATH: &str = "/path/to/json.output";

/// Placeholder letting a step emit structured JSON through a file: renders
/// as the path of a backing temp file, and after the step finishes parses
/// the file into the `output` key of the `json` namespace.
#[derive(Default)]
pub struct JsonOutputPlaceholder {
    backing: Option<NamedTempFile>,
}

impl JsonOutputPlaceholder {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Placeholder for JsonOutputPlaceholder {
    fn namespace(&self) -> &'static str {
        "json"
    }

    fn render(&mut self, test_data: Option<&Value>) -> Result<Vec<String>, PlaceholderError> {
        if test_data.is_some() {
            return Ok(vec![TEST_MODE_PATH.to_string()]);
        }
        let backing = NamedTempFile::new()?;
        let path = backing.path().to_string_lossy().into_owned();
        self.backing = Some(backing);
        Ok(vec![path])
    }

    fn step_finished(
        &mut self,
        presentation: &mut Presentation,
        output: &mut Map<String, Value>,
        test_data: Option<&Value>,
    ) {
        if let Some(data) = test_data {
            let value = data.get("output").cloned().unwrap_or(Value::Null);
            output.insert("output".to_string(), value);
            return;
        }

        let parsed = self
            .backing
            .take()
            .ok_or_else(|| "json output placeholder was never rendered".to_string())
            .and_then(|backing| {
                fs::read_to_string(backing.path()).map_err(|e| e.to_string())
            })
            .and_then(|content| {
                serde_json::from_str::<Value>(&content).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(value) => {
                output.insert("output".to_string(), value);
            }
            Err(reason) => {
                // The presentation is open until the engine finalizes it.
                let _ = presentation
                    .append_log_line("json.output", format!("bad emitted JSON: {}", reason));
                output.insert("output".to_string(), Value::Null);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Step;
    use std::io::Write;

    #[test]
    fn test_render_expands_placeholder_in_place() {
        let mut step = Step::builder("gen")
            .arg("./gen.py")
            .placeholder(Box::new(JsonOutputPlaceholder::new()))
            .build();
        let test_data = StepTestData::default();
        let rendered = render_step(&mut step, Some(&test_data)).unwrap();

        assert_eq!(rendered.namespaces(), vec!["json"]);
        let cmd = step.to_rendered().cmd;
        assert_eq!(cmd, vec!["./gen.py", TEST_MODE_PATH]);
    }

    #[test]
    fn test_bind_attaches_test_data_slice() {
        let mut step = Step::builder("gen")
            .placeholder(Box::new(JsonOutputPlaceholder::new()))
            .build();
        let test_data = StepTestData::with_module(
            "json",
            serde_json::json!({"output": {"answer": 42}}),
        );
        let placeholders = render_step(&mut step, Some(&test_data)).unwrap();

        let mut result = StepResult::new(step.to_rendered(), 0);
        bind(&mut result, placeholders, Some(&test_data));

        assert_eq!(
            result.module_output("json").unwrap()["output"]["answer"],
            serde_json::json!(42)
        );
    }

    #[test]
    fn test_real_mode_reads_backing_file() {
        let mut placeholder = JsonOutputPlaceholder::new();
        let args = placeholder.render(None).unwrap();
        assert_eq!(args.len(), 1);

        let path = args[0].clone();
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .unwrap();
        writeln!(file, "{}", r#"[{"name": "extra", "cmd": ["true"]}]"#).unwrap();

        let mut presentation = Presentation::new();
        let mut output = Map::new();
        placeholder.step_finished(&mut presentation, &mut output, None);
        assert_eq!(output["output"][0]["name"], serde_json::json!("extra"));
    }

    #[test]
    fn test_real_mode_bad_json_is_logged_not_fatal() {
        let mut placeholder = JsonOutputPlaceholder::new();
        let args = placeholder.render(None).unwrap();
        std::fs::write(&args[0], "not json").unwrap();

        let mut presentation = Presentation::new();
        let mut output = Map::new();
        placeholder.step_finished(&mut presentation, &mut output, None);
        assert_eq!(output["output"], Value::Null);
        assert!(presentation.log("json.output").is_some());
    }

    #[test]
    fn test_absent_namespace_slice_is_empty_object() {
        let test_data = StepTestData::default();
        assert_eq!(test_data.module_data("json"), serde_json::json!({}));
    }
}
