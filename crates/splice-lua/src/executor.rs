//! [`Executor`] implementation backed by Lua.

use crate::error::EvalError;
use crate::sandbox::{evaluate, EvalSettings};
use async_trait::async_trait;
use splice_runtime::config::SpliceConfig;
use splice_runtime::{EvaluationResult, Executor};
use splice_types::ErrorCode;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs each evaluation on a blocking worker with its own Lua VM.
#[derive(Debug, Clone, Default)]
pub struct LuaExecutor {
    settings: Arc<EvalSettings>,
}

impl LuaExecutor {
    /// Creates an executor with explicit settings.
    #[must_use]
    pub fn new(settings: EvalSettings) -> Self {
        Self {
            settings: Arc::new(settings),
        }
    }

    /// Creates an executor from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &SpliceConfig) -> Self {
        Self::new(EvalSettings::from_config(config))
    }

    /// The settings every evaluation uses.
    #[must_use]
    pub fn settings(&self) -> &EvalSettings {
        &self.settings
    }
}

#[async_trait]
impl Executor for LuaExecutor {
    async fn execute(
        &self,
        script: &str,
        original: &str,
        cancel: CancellationToken,
    ) -> EvaluationResult {
        let script = script.to_string();
        let original = original.to_string();
        let settings = Arc::clone(&self.settings);
        let started = Instant::now();

        let result = tokio::task::spawn_blocking(move || {
            evaluate(&script, &original, &settings, &cancel)
        })
        .await
        .unwrap_or_else(|e| Err(EvalError::internal(format!("evaluation worker failed: {e}"))));

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match result {
            Ok(transformed) => {
                debug!(
                    elapsed_ms,
                    text_len = transformed.text.len(),
                    console_lines = transformed.console.len(),
                    "script evaluated"
                );
                EvaluationResult::Success(transformed)
            }
            Err(err) => {
                debug!(elapsed_ms, code = err.code(), error = %err, "script failed");
                EvaluationResult::Failure(err.into())
            }
        }
    }
}
