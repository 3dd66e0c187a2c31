//! Buildlane CLI
//!
//! Entry point for the `buildlane` command-line tool.

use clap::{Parser, Subcommand};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;

use buildlane::annotation::{AnnotationStream, NullSink, StepSink};
use buildlane::config::LaneConfig;
use buildlane::engine::{Engine, ProcessExecutor, RunOutcome, RunTestData};
use buildlane::presentation::StepStatus;
use buildlane::properties::PropertyBag;
use buildlane::recipe::RecipeRegistry;
use lane_gtest::GTestLogParser;

/// Exit code for contract violations, outside the run-level 0/1/2 codes.
const EXIT_FAULT: i32 = 3;

#[derive(Parser)]
#[command(name = "buildlane")]
#[command(about = "Annotated build/test lane", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a recipe's steps and exit with the run verdict
    Run {
        /// Recipe name (overrides the `recipe` factory property)
        #[arg(long)]
        recipe: Option<String>,

        /// Build properties in JSON format
        #[arg(long, default_value = "{}")]
        build_properties: String,

        /// Factory properties in JSON format
        #[arg(long, default_value = "{}")]
        factory_properties: String,

        /// Canned per-step test data in JSON format; steps are not executed
        #[arg(long)]
        test_data: Option<String>,

        /// Path to lane config file (default: .lane/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Extra recipe search roots, highest priority first
        #[arg(long = "recipe-root")]
        recipe_root: Vec<PathBuf>,

        /// Suppress the annotation wire form on stdout
        #[arg(long)]
        no_annotate: bool,
    },

    /// Classify a GTest log and print the structured report
    ParseLog {
        /// Log file to read; stdin when omitted
        file: Option<PathBuf>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List resolvable recipes
    Recipes {
        /// Path to lane config file (default: .lane/config.toml)
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Extra recipe search roots, highest priority first
        #[arg(long = "recipe-root")]
        recipe_root: Vec<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let code = match cli.command {
        Commands::Run {
            recipe,
            build_properties,
            factory_properties,
            test_data,
            config,
            recipe_root,
            no_annotate,
        } => cmd_run(
            recipe,
            &build_properties,
            &factory_properties,
            test_data.as_deref(),
            config,
            recipe_root,
            no_annotate,
        ),
        Commands::ParseLog { file, json } => cmd_parse_log(file, json),
        Commands::Recipes {
            config,
            recipe_root,
        } => cmd_recipes(config, recipe_root),
    };
    process::exit(code);
}

fn parse_properties(raw: &str, which: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid {} JSON: {}", which, e))
}

fn build_registry(
    config: Option<PathBuf>,
    extra_roots: Vec<PathBuf>,
) -> Result<(RecipeRegistry, LaneConfig), String> {
    let config =
        LaneConfig::load_or_default(config.as_deref()).map_err(|e| e.to_string())?;
    let mut registry = RecipeRegistry::new();
    for root in &extra_roots {
        registry.add_root(root);
    }
    for root in &config.recipes.roots {
        registry.add_root(root);
    }
    Ok((registry, config))
}

fn cmd_run(
    recipe: Option<String>,
    build_properties: &str,
    factory_properties: &str,
    test_data: Option<&str>,
    config: Option<PathBuf>,
    recipe_root: Vec<PathBuf>,
    no_annotate: bool,
) -> i32 {
    let setup = (|| -> Result<(RecipeRegistry, LaneConfig, PropertyBag, PropertyBag), String> {
        let (registry, config) = build_registry(config, recipe_root)?;

        let build = parse_properties(build_properties, "build properties")?;
        let mut factory = match parse_properties(factory_properties, "factory properties")? {
            serde_json::Value::Object(map) => map,
            other => {
                return Err(format!(
                    "factory properties must be a JSON object, got {}",
                    other
                ))
            }
        };
        if let Some(name) = recipe {
            factory.insert("recipe".to_string(), serde_json::Value::String(name));
        }

        let build = PropertyBag::from_json(build).map_err(|e| e.to_string())?;
        let factory = PropertyBag::from_object(factory);
        Ok((registry, config, build, factory))
    })();

    let (registry, config, build, factory) = match setup {
        Ok(parts) => parts,
        Err(message) => {
            eprintln!("buildlane: {}", message);
            return 2;
        }
    };

    let test_data: Option<RunTestData> = match test_data {
        None => None,
        Some(raw) => match serde_json::from_str(raw) {
            Ok(data) => Some(data),
            Err(e) => {
                eprintln!("buildlane: invalid test data JSON: {}", e);
                return 2;
            }
        },
    };

    let mut executor = ProcessExecutor::new();
    let annotate = config.run.annotate && !no_annotate;
    let outcome = if annotate {
        let mut sink = AnnotationStream::new(io::stdout());
        run_engine(&mut executor, &mut sink, &registry, build, factory, test_data)
    } else {
        let mut sink = NullSink;
        run_engine(&mut executor, &mut sink, &registry, build, factory, test_data)
    };

    match outcome {
        Ok(outcome) => {
            print_summary(&outcome);
            outcome.exit_code.as_i32()
        }
        Err(e) => {
            eprintln!("buildlane: {}", e);
            EXIT_FAULT
        }
    }
}

fn run_engine(
    executor: &mut ProcessExecutor,
    sink: &mut dyn StepSink,
    registry: &RecipeRegistry,
    build: PropertyBag,
    factory: PropertyBag,
    test_data: Option<RunTestData>,
) -> Result<RunOutcome, buildlane::EngineError> {
    let mut engine = Engine::new(executor, sink);
    if let Some(test_data) = test_data {
        engine = engine.with_test_data(test_data);
    }
    engine.run(registry, build, factory)
}

fn print_summary(outcome: &RunOutcome) {
    eprintln!(
        "run {} finished with exit code {}",
        outcome.run_id,
        outcome.exit_code.as_i32()
    );
    for result in outcome.history.iter() {
        let status = match (result.presentation().status(), result.retcode()) {
            (Some(StepStatus::Warning), _) => "warning",
            (Some(StepStatus::Exception), _) => "exception",
            (Some(StepStatus::Failure), _) => "failed",
            (Some(StepStatus::Success), _) => "ok",
            (None, 0) => "ok",
            (None, _) => "failed",
        };
        eprintln!("  {:<10} {}", status, result.name());
    }
}

fn cmd_parse_log(file: Option<PathBuf>, json: bool) -> i32 {
    let content = match read_input(file) {
        Ok(content) => content,
        Err(message) => {
            eprintln!("buildlane: {}", message);
            return 2;
        }
    };

    let mut parser = GTestLogParser::new();
    parser.process_log(&content);

    if json {
        match serde_json::to_string_pretty(&parser.report()) {
            Ok(rendered) => println!("{}", rendered),
            Err(e) => {
                eprintln!("buildlane: failed to render report: {}", e);
                return 2;
            }
        }
    } else {
        print_report(&parser);
    }

    if parser.completed_without_failure() {
        0
    } else {
        1
    }
}

fn read_input(file: Option<PathBuf>) -> Result<String, String> {
    match file {
        Some(path) => {
            fs::read_to_string(&path).map_err(|e| format!("cannot read {}: {}", path.display(), e))
        }
        None => {
            let mut content = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut content)
                .map_err(|e| format!("cannot read stdin: {}", e))?;
            Ok(content)
        }
    }
}

fn print_report(parser: &GTestLogParser) {
    if let Some(master) = parser.master_name() {
        println!("master: {}", master);
    }
    println!(
        "completed: {}, disabled: {}, flaky: {}",
        parser.completed(),
        parser.disabled_tests(),
        parser.flaky_tests()
    );

    let failed = parser.failed_tests(false, false);
    if failed.is_empty() {
        println!("no failing tests");
    } else {
        println!("failing tests ({}):", failed.len());
        for test in &failed {
            println!("  {} [{}]", test, parser.test_status(test));
        }
    }

    let hashes = parser.suppression_hashes();
    if !hashes.is_empty() {
        println!("suppressions: {}", hashes.join(", "));
    }
    for error in parser.parsing_errors() {
        println!("parse error: {}", error);
    }
}

fn cmd_recipes(config: Option<PathBuf>, recipe_root: Vec<PathBuf>) -> i32 {
    match build_registry(config, recipe_root) {
        Ok((registry, _)) => {
            for name in registry.available() {
                println!("{}", name);
            }
            0
        }
        Err(message) => {
            eprintln!("buildlane: {}", message);
            2
        }
    }
}
