//! Runner configuration
//!
//! Sources, lowest priority first:
//! 1. Built-in defaults
//! 2. A TOML file (`--config` or `SAFE_EVAL_CONFIG_PATH`), if given
//! 3. The legacy `DATA_DIR` environment variable
//! 4. `SAFE_EVAL_*` environment variables (e.g. `SAFE_EVAL_MAX_CALL_DEPTH`)
//! 5. Explicit overrides passed to [`ConfigBuilder`]

use std::path::{Path, PathBuf};

use config::{Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::interpreter::DEFAULT_MAX_CALL_DEPTH;

const ENV_PREFIX: &str = "SAFE_EVAL";
const CONFIG_PATH_VAR: &str = "SAFE_EVAL_CONFIG_PATH";
const LEGACY_DATA_DIR_VAR: &str = "DATA_DIR";
const DATA_DIR_VAR: &str = "SAFE_EVAL_DATA_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0}")]
    Load(#[from] config::ConfigError),

    #[error("{0}")]
    Invalid(String),
}

/// Settings for one evaluation
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    /// Directory holding the scope and script files
    pub data_dir: PathBuf,
    pub scope_file: String,
    pub script_file: String,
    /// User function nesting allowed before `RecursionError`
    pub max_call_depth: usize,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Load from files and environment with no overrides
    pub fn load() -> Result<Config, ConfigError> {
        Self::builder().build()
    }

    pub fn scope_path(&self) -> PathBuf {
        self.data_dir.join(&self.scope_file)
    }

    pub fn script_path(&self) -> PathBuf {
        self.data_dir.join(&self.script_file)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_call_depth == 0 {
            return Err(ConfigError::Invalid(
                "max_call_depth must be at least 1".to_string(),
            ));
        }
        if self.scope_file.trim().is_empty() || self.script_file.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "scope_file and script_file must not be empty".to_string(),
            ));
        }
        if self.log_level.trim().is_empty() {
            return Err(ConfigError::Invalid("log_level must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Builder applying explicit overrides on top of file and environment sources
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config_path: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    log_level: Option<String>,
    max_call_depth: Option<usize>,
}

impl ConfigBuilder {
    pub fn config_path(mut self, path: Option<PathBuf>) -> Self {
        self.config_path = path;
        self
    }

    pub fn data_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.data_dir = dir;
        self
    }

    pub fn log_level(mut self, level: Option<String>) -> Self {
        self.log_level = level;
        self
    }

    pub fn max_call_depth(mut self, depth: Option<usize>) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let mut builder = config::Config::builder()
            .set_default("data_dir", "/data")?
            .set_default("scope_file", "scope.json")?
            .set_default("script_file", "user_code.py")?
            .set_default("max_call_depth", DEFAULT_MAX_CALL_DEPTH as u64)?
            .set_default("log_level", "warn")?;

        let config_path = self
            .config_path
            .or_else(|| std::env::var(CONFIG_PATH_VAR).ok().map(PathBuf::from));
        if let Some(path) = config_path {
            builder = builder.add_source(toml_file(&path));
        }

        // DATA_DIR sits between the file and SAFE_EVAL_DATA_DIR
        let legacy_data_dir = match std::env::var_os(DATA_DIR_VAR) {
            Some(_) => None,
            None => std::env::var(LEGACY_DATA_DIR_VAR).ok(),
        };
        let data_dir = self
            .data_dir
            .map(|dir| dir.to_string_lossy().into_owned())
            .or(legacy_data_dir);

        builder = builder
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .set_override_option("data_dir", data_dir)?
            .set_override_option("log_level", self.log_level)?
            .set_override_option("max_call_depth", self.max_call_depth.map(|d| d as u64))?;

        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

// An explicitly named file must exist
fn toml_file(path: &Path) -> File<config::FileSourceFile, FileFormat> {
    File::from(path.to_path_buf())
        .format(FileFormat::Toml)
        .required(true)
}
