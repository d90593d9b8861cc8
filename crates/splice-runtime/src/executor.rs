//! The seam between scheduling and script execution.

use crate::evaluation::EvaluationResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Runs one script against one input text.
///
/// # Contract
///
/// - Every call compiles `script` fresh and builds a fresh buffer from
///   `original`. Nothing is shared between calls.
/// - Never panics and never returns `Err`. Every failure is an
///   [`EvaluationResult::Failure`].
/// - `cancel` is a hint. An implementation should stop early once it is
///   cancelled, but callers must not rely on it: the orchestrator discards
///   stale results either way.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use splice_runtime::{EvaluationResult, Executor, FailureKind};
/// use tokio_util::sync::CancellationToken;
///
/// struct Reject;
///
/// #[async_trait]
/// impl Executor for Reject {
///     async fn execute(
///         &self,
///         _script: &str,
///         _original: &str,
///         _cancel: CancellationToken,
///     ) -> EvaluationResult {
///         EvaluationResult::failure(FailureKind::Runtime, "scripts are disabled")
///     }
/// }
/// ```
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    /// Evaluates `script` with `original` as the buffer's source text.
    async fn execute(
        &self,
        script: &str,
        original: &str,
        cancel: CancellationToken,
    ) -> EvaluationResult;
}
