//! Lane configuration, typically from `.lane/config.toml`.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the lane config, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = ".lane/config.toml";

/// Errors loading the lane config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Lane configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LaneConfig {
    /// Recipe resolution settings.
    #[serde(default)]
    pub recipes: RecipesConfig,

    /// Run behavior settings.
    #[serde(default)]
    pub run: RunConfig,
}

/// `[recipes]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecipesConfig {
    /// Priority-ordered search roots for recipe documents.
    #[serde(default = "default_roots")]
    pub roots: Vec<PathBuf>,
}

impl Default for RecipesConfig {
    fn default() -> Self {
        Self {
            roots: default_roots(),
        }
    }
}

fn default_roots() -> Vec<PathBuf> {
    vec![PathBuf::from("recipes")]
}

/// `[run]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Emit the annotation wire form on stdout.
    #[serde(default = "default_annotate")]
    pub annotate: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            annotate: default_annotate(),
        }
    }
}

fn default_annotate() -> bool {
    true
}

impl LaneConfig {
    /// Load from a specific file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load from an explicit path, or from the default path if present,
    /// or fall back to built-in defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_PATH);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }
}
