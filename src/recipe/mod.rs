//! Recipe resolution.
//!
//! A recipe turns the merged property bag into a source of steps. The
//! registry resolves recipe names from explicit configuration, never from
//! ambient process state: in-process registered recipes first, then
//! registered `module:example` recipes, then JSON recipe documents searched
//! across directory roots in priority order.

mod json_recipe;

pub use json_recipe::{JsonRecipe, RawItem, RawStep, RecipeDoc, ScriptStepGenerator};

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use walkdir::WalkDir;

use crate::properties::PropertyBag;
use crate::sequence::StepsSource;

/// Errors from recipe resolution and generation.
#[derive(Debug, Error)]
pub enum RecipeError {
    /// No source knows the recipe.
    #[error("recipe not found: {0}")]
    NotFound(String),

    /// A recipe file exists but could not be read.
    #[error("failed to read recipe {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A recipe file exists but is not a valid recipe document.
    #[error("malformed recipe {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A `${key}` interpolation referenced a property that is not set.
    #[error("unknown property `{0}` referenced by recipe")]
    UnknownProperty(String),

    /// A `${key}` interpolation referenced a property without a scalar
    /// value.
    #[error("property `{0}` is not a scalar and cannot be interpolated")]
    NonScalarProperty(String),

    /// A `${` was never closed.
    #[error("unterminated ${{...}} interpolation in `{0}`")]
    UnterminatedInterpolation(String),
}

/// Read view handed to recipe code.
pub struct RecipeContext<'a> {
    /// Merged build-over-factory properties, read-only.
    pub properties: &'a PropertyBag,
}

/// A source of steps for one run.
pub trait Recipe {
    fn generate(&self, ctx: &RecipeContext<'_>) -> Result<StepsSource, RecipeError>;
}

/// Adapter implementing `Recipe` for plain functions and closures.
pub struct FnRecipe<F>(pub F);

impl<F> Recipe for FnRecipe<F>
where
    F: Fn(&RecipeContext<'_>) -> Result<StepsSource, RecipeError>,
{
    fn generate(&self, ctx: &RecipeContext<'_>) -> Result<StepsSource, RecipeError> {
        (self.0)(ctx)
    }
}

/// Where a resolved recipe came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecipeOrigin {
    /// Registered in-process.
    Registered,
    /// A registered module example.
    ModuleExample { module: String },
    /// Loaded from a recipe document on disk.
    File(PathBuf),
}

impl fmt::Display for RecipeOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecipeOrigin::Registered => f.write_str("registry"),
            RecipeOrigin::ModuleExample { module } => write!(f, "module {}", module),
            RecipeOrigin::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A recipe resolved by name, with provenance.
pub struct ResolvedRecipe {
    /// The name it was resolved under.
    pub name: String,
    /// The recipe itself.
    pub recipe: Arc<dyn Recipe>,
    /// Where it came from.
    pub origin: RecipeOrigin,
    /// SHA-256 of the source file, for file-backed recipes.
    pub fingerprint: Option<String>,
}

/// Priority-ordered recipe sources. Search roots are explicit
/// configuration; nothing is discovered from ambient process state.
#[derive(Default)]
pub struct RecipeRegistry {
    registered: BTreeMap<String, Arc<dyn Recipe>>,
    module_examples: BTreeMap<String, BTreeMap<String, Arc<dyn Recipe>>>,
    roots: Vec<PathBuf>,
}

impl RecipeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-process recipe. Highest resolution priority.
    pub fn register(&mut self, name: &str, recipe: Arc<dyn Recipe>) {
        self.registered.insert(name.to_string(), recipe);
    }

    /// Register a module example, resolvable as `module:example`.
    pub fn register_example(&mut self, module: &str, example: &str, recipe: Arc<dyn Recipe>) {
        self.module_examples
            .entry(module.to_string())
            .or_default()
            .insert(example.to_string(), recipe);
    }

    /// Append a directory searched for `<name>.json` recipe documents.
    /// Roots are consulted in the order they were added.
    pub fn add_root(&mut self, root: impl Into<PathBuf>) {
        self.roots.push(root.into());
    }

    /// Resolve a recipe by name, or `module:example` form.
    pub fn resolve(&self, name: &str) -> Result<ResolvedRecipe, RecipeError> {
        if let Some((module, example)) = name.split_once(':') {
            return self
                .module_examples
                .get(module)
                .and_then(|examples| examples.get(example))
                .map(|recipe| ResolvedRecipe {
                    name: name.to_string(),
                    recipe: Arc::clone(recipe),
                    origin: RecipeOrigin::ModuleExample {
                        module: module.to_string(),
                    },
                    fingerprint: None,
                })
                .ok_or_else(|| RecipeError::NotFound(name.to_string()));
        }

        if let Some(recipe) = self.registered.get(name) {
            return Ok(ResolvedRecipe {
                name: name.to_string(),
                recipe: Arc::clone(recipe),
                origin: RecipeOrigin::Registered,
                fingerprint: None,
            });
        }

        for root in &self.roots {
            let path = root.join(format!("{}.json", name));
            if path.is_file() {
                return Self::load_file(name, &path);
            }
        }

        Err(RecipeError::NotFound(name.to_string()))
    }

    fn load_file(name: &str, path: &Path) -> Result<ResolvedRecipe, RecipeError> {
        let content = fs::read_to_string(path).map_err(|source| RecipeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fingerprint = hex::encode(Sha256::digest(content.as_bytes()));
        let recipe = JsonRecipe::from_str(&content).map_err(|source| RecipeError::Malformed {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(ResolvedRecipe {
            name: name.to_string(),
            recipe: Arc::new(recipe),
            origin: RecipeOrigin::File(path.to_path_buf()),
            fingerprint: Some(fingerprint),
        })
    }

    /// Every resolvable recipe name, sorted: registered names,
    /// `module:example` names, and `*.json` stems under the search roots.
    pub fn available(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registered.keys().cloned().collect();
        for (module, examples) in &self.module_examples {
            names.extend(examples.keys().map(|e| format!("{}:{}", module, e)));
        }
        for root in &self.roots {
            for entry in WalkDir::new(root)
                .max_depth(1)
                .into_iter()
                .filter_map(Result::ok)
            {
                let path = entry.path();
                if path.extension().is_some_and(|ext| ext == "json") {
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        names.push(stem.to_string());
                    }
                }
            }
        }
        names.sort();
        names.dedup();
        names
    }
}
