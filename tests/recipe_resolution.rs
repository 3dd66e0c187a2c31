//! Recipe resolution integration tests: search roots, module:example form,
//! and the setup-failure exit code.

use std::fs;
use std::sync::Arc;

use buildlane::annotation::NullSink;
use buildlane::engine::{Engine, ExitCode, ProcessExecutor, RunTestData, StepTestData};
use buildlane::presentation::StepStatus;
use buildlane::properties::PropertyBag;
use buildlane::recipe::{FnRecipe, RecipeContext, RecipeError, RecipeOrigin, RecipeRegistry};
use buildlane::sequence::StepsSource;
use buildlane::step::Step;
use serde_json::json;

fn props(value: serde_json::Value) -> PropertyBag {
    PropertyBag::from_json(value).unwrap()
}

#[test]
fn test_unknown_recipe_exits_setup_failure() {
    let registry = RecipeRegistry::new();
    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;

    let outcome = Engine::new(&mut executor, &mut sink)
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "run_presubmit"})),
        )
        .unwrap();

    assert_eq!(outcome.exit_code, ExitCode::SetupFailure);
    assert_eq!(outcome.exit_code.as_i32(), 2);

    let setup = outcome.history.get("setup_build").unwrap();
    assert_eq!(setup.presentation().status(), Some(StepStatus::Failure));
    assert!(setup
        .presentation()
        .step_text()
        .unwrap()
        .contains("recipe not found: run_presubmit"));
}

#[test]
fn test_search_roots_consulted_in_priority_order() {
    let internal = tempfile::tempdir().unwrap();
    let external = tempfile::tempdir().unwrap();
    fs::write(
        internal.path().join("nightly.json"),
        r#"{"steps": [{"name": "internal_step", "cmd": ["true"]}]}"#,
    )
    .unwrap();
    fs::write(
        external.path().join("nightly.json"),
        r#"{"steps": [{"name": "external_step", "cmd": ["true"]}]}"#,
    )
    .unwrap();

    let mut registry = RecipeRegistry::new();
    registry.add_root(internal.path());
    registry.add_root(external.path());

    let resolved = registry.resolve("nightly").unwrap();
    assert_eq!(
        resolved.origin,
        RecipeOrigin::File(internal.path().join("nightly.json"))
    );

    // The engine runs the higher-priority recipe.
    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .with_test_data(RunTestData::new().step("internal_step", StepTestData::default()))
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "nightly"})),
        )
        .unwrap();
    assert!(outcome.history.contains("internal_step"));
}

#[test]
fn test_module_example_resolution_through_engine() {
    let mut registry = RecipeRegistry::new();
    registry.register_example(
        "generator_script",
        "example",
        Arc::new(FnRecipe(|_ctx: &RecipeContext<'_>| -> Result<StepsSource, RecipeError> {
            Ok(StepsSource::Single(
                Step::builder("example_step").arg("true").build(),
            ))
        })),
    );

    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .with_test_data(RunTestData::new().step("example_step", StepTestData::default()))
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "generator_script:example"})),
        )
        .unwrap();

    assert_eq!(outcome.exit_code, ExitCode::Success);
    assert!(outcome.history.contains("example_step"));

    let setup = outcome.history.get("setup_build").unwrap();
    assert!(setup
        .presentation()
        .step_text()
        .unwrap()
        .contains("module generator_script"));
}

#[test]
fn test_file_recipe_fingerprint_recorded_on_setup_step() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("compile.json"),
        r#"{"steps": [{"name": "compile", "cmd": ["true"]}]}"#,
    )
    .unwrap();
    let mut registry = RecipeRegistry::new();
    registry.add_root(dir.path());

    let resolved = registry.resolve("compile").unwrap();
    let fingerprint = resolved.fingerprint.unwrap();
    assert_eq!(fingerprint.len(), 64);

    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .with_test_data(RunTestData::new().step("compile", StepTestData::default()))
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "compile"})),
        )
        .unwrap();

    let text = outcome
        .history
        .get("setup_build")
        .unwrap()
        .presentation()
        .step_text()
        .unwrap()
        .to_string();
    assert!(text.contains(&fingerprint[..12]));
}

#[test]
fn test_malformed_recipe_file_is_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("broken.json"), "{ not json").unwrap();
    let mut registry = RecipeRegistry::new();
    registry.add_root(dir.path());

    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "broken"})),
        )
        .unwrap();

    assert_eq!(outcome.exit_code, ExitCode::SetupFailure);
}

#[test]
fn test_unknown_property_reference_is_setup_failure() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("sync.json"),
        r#"{"steps": [{"name": "checkout", "cmd": ["git", "checkout", "${revision}"]}]}"#,
    )
    .unwrap();
    let mut registry = RecipeRegistry::new();
    registry.add_root(dir.path());

    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "sync"})),
        )
        .unwrap();

    assert_eq!(outcome.exit_code, ExitCode::SetupFailure);
    assert!(outcome
        .history
        .get("setup_build")
        .unwrap()
        .presentation()
        .step_text()
        .unwrap()
        .contains("revision"));
}

#[test]
fn test_run_test_data_deserializes_from_json() {
    let raw = r#"{
        "compile": {"retcode": 0},
        "tests": {"retcode": 1, "output": "boom", "modules": {"json": {"output": [1]}}}
    }"#;
    let test_data: RunTestData = serde_json::from_str(raw).unwrap();

    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("verify.json"),
        r#"{"steps": [
            {"name": "compile", "cmd": ["true"]},
            {"name": "tests", "cmd": ["true"]}
        ]}"#,
    )
    .unwrap();
    let mut registry = RecipeRegistry::new();
    registry.add_root(dir.path());

    let mut executor = ProcessExecutor::new();
    let mut sink = NullSink;
    let outcome = Engine::new(&mut executor, &mut sink)
        .with_test_data(test_data)
        .run(
            &registry,
            PropertyBag::new(),
            props(json!({"recipe": "verify"})),
        )
        .unwrap();

    assert_eq!(outcome.exit_code, ExitCode::StepFailure);
    assert_eq!(outcome.history.get("tests").unwrap().retcode(), 1);
    assert_eq!(
        outcome
            .history
            .get("tests")
            .unwrap()
            .presentation()
            .log("stdio")
            .unwrap(),
        vec!["boom"]
    );
}
