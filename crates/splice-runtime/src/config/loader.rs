//! Configuration loader with hierarchical merging.
//!
//! # Load Order
//!
//! 1. Default values (compile-time)
//! 2. Global config (`~/.splice/config.toml`)
//! 3. Project config (`.splice/config.toml`)
//! 4. Environment variables (`SPLICE_*`)
//!
//! Each layer overrides the previous.

use super::{
    default_config_path, ConfigError, SpliceConfig, PROJECT_CONFIG_DIR, PROJECT_CONFIG_FILE,
};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Helper macro for parsing boolean environment variables.
macro_rules! parse_env_bool {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = parse_bool(&val)
                .ok_or_else(|| ConfigError::invalid_env_var($var, "expected bool"))?;
        }
    };
}

/// Helper macro for parsing unsigned integer environment variables.
macro_rules! parse_env_u64 {
    ($field:expr, $var:literal) => {
        if let Ok(val) = std::env::var($var) {
            $field = val
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::invalid_env_var($var, e.to_string()))?;
        }
    };
}

/// Configuration loader with builder pattern.
///
/// # Example
///
/// ```no_run
/// use splice_runtime::config::ConfigLoader;
///
/// let config = ConfigLoader::new()
///     .with_project_root("/path/to/project")
///     .skip_env_vars()
///     .load()?;
/// # Ok::<(), splice_runtime::config::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Global config file path (defaults to ~/.splice/config.toml).
    global_config_path: Option<PathBuf>,

    /// Project root directory.
    project_root: Option<PathBuf>,

    skip_env: bool,
    skip_global: bool,
    skip_project: bool,
}

impl ConfigLoader {
    /// Creates a new loader with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a custom global config path.
    #[must_use]
    pub fn with_global_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.global_config_path = Some(path.into());
        self
    }

    /// Sets the project root directory.
    ///
    /// Project config will be loaded from `<project_root>/.splice/config.toml`.
    #[must_use]
    pub fn with_project_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_root = Some(path.into());
        self
    }

    /// Skips environment variable loading.
    ///
    /// Useful for testing with deterministic config.
    #[must_use]
    pub fn skip_env_vars(mut self) -> Self {
        self.skip_env = true;
        self
    }

    /// Skips global config loading.
    #[must_use]
    pub fn skip_global_config(mut self) -> Self {
        self.skip_global = true;
        self
    }

    /// Skips project config loading.
    #[must_use]
    pub fn skip_project_config(mut self) -> Self {
        self.skip_project = true;
        self
    }

    /// Loads and merges configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if any config file exists but cannot be parsed,
    /// or an environment variable holds an invalid value. Missing config
    /// files are silently ignored.
    pub fn load(&self) -> Result<SpliceConfig, ConfigError> {
        let mut layers = Vec::new();

        if !self.skip_global {
            let global_path = self
                .global_config_path
                .clone()
                .unwrap_or_else(default_config_path);

            if let Some(table) = Self::load_file(&global_path)? {
                debug!(path = %global_path.display(), "Loaded global config");
                layers.push((global_path, table));
            }
        }

        if !self.skip_project {
            if let Some(ref project_root) = self.project_root {
                let project_config_path = project_root
                    .join(PROJECT_CONFIG_DIR)
                    .join(PROJECT_CONFIG_FILE);

                if let Some(table) = Self::load_file(&project_config_path)? {
                    debug!(
                        path = %project_config_path.display(),
                        project = %project_root.display(),
                        "Loaded project config"
                    );
                    layers.push((project_config_path, table));
                }
            }
        }

        let last_path = layers.last().map(|(path, _)| path.clone());
        let mut config = SpliceConfig::from_layers(layers.into_iter().map(|(_, table)| table))
            .map_err(|e| ConfigError::parse_toml(last_path.unwrap_or_default(), e))?;

        if !self.skip_env {
            Self::apply_env_vars(&mut config)?;
        }

        Ok(config)
    }

    /// Loads a config file as a raw table, returning None if it doesn't exist.
    ///
    /// The table is also checked against the schema on its own so a bad
    /// value is reported against the file that holds it.
    fn load_file(path: &Path) -> Result<Option<toml::Table>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let table: toml::Table =
            toml::from_str(&content).map_err(|e| ConfigError::parse_toml(path, e))?;
        SpliceConfig::from_layers([table.clone()]).map_err(|e| ConfigError::parse_toml(path, e))?;

        Ok(Some(table))
    }

    /// Applies environment variable overrides.
    fn apply_env_vars(config: &mut SpliceConfig) -> Result<(), ConfigError> {
        parse_env_bool!(config.debug, "SPLICE_DEBUG");
        parse_env_bool!(config.sourcemap.hires, "SPLICE_HIRES");
        parse_env_bool!(
            config.orchestrator.cancel_superseded,
            "SPLICE_CANCEL_SUPERSEDED"
        );

        parse_env_u64!(config.executor.instruction_limit, "SPLICE_INSTRUCTION_LIMIT");
        parse_env_u64!(config.executor.timeout_ms, "SPLICE_TIMEOUT_MS");

        if let Ok(val) = std::env::var("SPLICE_SOURCE_NAME") {
            config.sourcemap.source = val;
        }

        Ok(())
    }
}

/// Parses a boolean from string.
///
/// Accepts: "true", "false", "1", "0", "yes", "no", "on", "off"
/// (case-insensitive).
fn parse_bool(s: &str) -> Option<bool> {
    match s.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
