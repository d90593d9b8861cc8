//! Configuration management with hierarchical layering.
//!
//! # Architecture
//!
//! ```text
//! Priority (highest to lowest):
//!
//! ┌───────────────────────────────────────────┐
//! │  1. CLI flags (ConfigResolver)            │  Per invocation
//! ├───────────────────────────────────────────┤
//! │  2. Environment Variables (SPLICE_*)      │  Runtime override
//! ├───────────────────────────────────────────┤
//! │  3. Project Config (.splice/config.toml)  │  Project-specific
//! ├───────────────────────────────────────────┤
//! │  4. Global Config (~/.splice/config.toml) │  User defaults
//! ├───────────────────────────────────────────┤
//! │  5. Default Values (compile-time)         │  Fallback
//! └───────────────────────────────────────────┘
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Config Field | Type |
//! |----------|--------------|------|
//! | `SPLICE_DEBUG` | `debug` | bool |
//! | `SPLICE_HIRES` | `sourcemap.hires` | bool |
//! | `SPLICE_CANCEL_SUPERSEDED` | `orchestrator.cancel_superseded` | bool |
//! | `SPLICE_SOURCE_NAME` | `sourcemap.source` | String |
//! | `SPLICE_INSTRUCTION_LIMIT` | `executor.instruction_limit` | u64 |
//! | `SPLICE_TIMEOUT_MS` | `executor.timeout_ms` | u64 |
//!
//! # Example Configuration
//!
//! ```toml
//! # ~/.splice/config.toml
//! debug = false
//!
//! [executor]
//! instruction_limit = 0
//! timeout_ms = 2000
//!
//! [sourcemap]
//! source = "user-code.js"
//! include_content = true
//! hires = false
//!
//! [orchestrator]
//! cancel_superseded = true
//!
//! [watch]
//! debounce_ms = 50
//!
//! [logging]
//! file = true
//! file_level = "debug"
//! ```

mod error;
mod loader;
mod resolver;
mod types;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use resolver::ConfigResolver;
pub use types::{
    ExecutorConfig, LoggingConfig, OrchestratorConfig, SourceMapConfig, SpliceConfig, WatchConfig,
};

/// Default global config directory.
pub fn default_config_dir() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".splice")
}

/// Default global config file path.
pub fn default_config_path() -> std::path::PathBuf {
    default_config_dir().join("config.toml")
}

/// Project config directory name.
pub const PROJECT_CONFIG_DIR: &str = ".splice";

/// Project config file name.
pub const PROJECT_CONFIG_FILE: &str = "config.toml";
