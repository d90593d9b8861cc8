//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use serde::{Deserialize, Serialize};
use splice_buffer::{MapOptions, DEFAULT_SOURCE_NAME};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure.
///
/// This is the unified configuration after merging all layers. Every section
/// is optional in a config file.
///
/// # Example
///
/// ```
/// use splice_runtime::config::SpliceConfig;
///
/// let config = SpliceConfig::default();
/// assert!(!config.debug);
/// assert!(config.orchestrator.cancel_superseded);
/// assert_eq!(config.sourcemap.source, "user-code.js");
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SpliceConfig {
    /// Enable debug mode (debug-level terminal logging).
    pub debug: bool,

    /// Script execution limits.
    pub executor: ExecutorConfig,

    /// Source map generation.
    pub sourcemap: SourceMapConfig,

    /// Request scheduling.
    pub orchestrator: OrchestratorConfig,

    /// File watching in watch mode.
    pub watch: WatchConfig,

    /// Log file output.
    pub logging: LoggingConfig,
}

impl SpliceConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Deserializes from TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if deserialization fails.
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(toml_str)
    }

    /// Builds a config from TOML layers, later layers winning.
    ///
    /// A key present in a layer overrides the layers below it even when it
    /// holds the default value. Tables merge key by key and absent keys fall
    /// back to defaults.
    ///
    /// # Errors
    ///
    /// Returns error if the merged document does not fit the config schema.
    pub fn from_layers(
        layers: impl IntoIterator<Item = toml::Table>,
    ) -> Result<Self, toml::de::Error> {
        let mut merged = toml::Table::new();
        for layer in layers {
            merge_table(&mut merged, layer);
        }
        toml::Value::Table(merged).try_into()
    }
}

/// Deep-merges `overlay` into `base`.
fn merge_table(base: &mut toml::Table, overlay: toml::Table) {
    for (key, value) in overlay {
        if let toml::Value::Table(table) = value {
            if let Some(toml::Value::Table(existing)) = base.get_mut(&key) {
                merge_table(existing, table);
            } else {
                base.insert(key, toml::Value::Table(table));
            }
        } else {
            base.insert(key, value);
        }
    }
}

/// Script execution limits. Zero disables a limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Maximum Lua VM instructions per evaluation (0 = unlimited).
    pub instruction_limit: u64,

    /// Wall-clock limit per evaluation in milliseconds (0 = none).
    pub timeout_ms: u64,
}

impl ExecutorConfig {
    /// Instruction limit, if enabled.
    #[must_use]
    pub fn instruction_limit(&self) -> Option<u64> {
        (self.instruction_limit > 0).then_some(self.instruction_limit)
    }

    /// Timeout, if enabled.
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }
}

/// Source map generation settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SourceMapConfig {
    /// Name recorded in `sources`.
    pub source: String,

    /// Value of the map's `file` field (empty = omitted).
    pub file: String,

    /// Embed the input text as `sourcesContent`.
    pub include_content: bool,

    /// Map every character instead of chunk and line starts only.
    pub hires: bool,
}

impl Default for SourceMapConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_NAME.to_string(),
            file: String::new(),
            include_content: true,
            hires: false,
        }
    }
}

impl SourceMapConfig {
    /// Render options for [`EditBuffer::render`](splice_buffer::EditBuffer::render).
    #[must_use]
    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            source: self.source.clone(),
            file: (!self.file.is_empty()).then(|| self.file.clone()),
            include_content: self.include_content,
            hires: self.hires,
        }
    }
}

/// Request scheduling settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Cancel the in-flight evaluation when a newer request arrives.
    pub cancel_superseded: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            cancel_superseded: true,
        }
    }
}

/// File watching settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct WatchConfig {
    /// Quiet period after a file change before re-evaluating.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 50 }
    }
}

impl WatchConfig {
    /// Debounce window as a [`Duration`].
    #[must_use]
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Log file settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Write logs to a file in addition to the terminal.
    pub file: bool,

    /// Filter directive for the file layer.
    pub file_level: String,

    /// Directory for `splice.log` (empty = `~/.splice/logs`).
    pub file_path: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: false,
            file_level: "debug".into(),
            file_path: String::new(),
        }
    }
}

impl LoggingConfig {
    /// Log directory, falling back to `~/.splice/logs`.
    #[must_use]
    pub fn log_dir(&self) -> PathBuf {
        if self.file_path.is_empty() {
            super::default_config_dir().join("logs")
        } else {
            PathBuf::from(&self.file_path)
        }
    }
}
