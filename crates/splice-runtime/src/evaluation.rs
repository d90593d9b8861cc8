//! Outcome of one evaluation.

use splice_buffer::SourceMap;
use std::fmt;

/// Result of evaluating a script against an input text.
///
/// Executors never return `Err`: every failure mode is normalized into
/// [`EvaluationResult::Failure`] so the orchestrator handles one shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationResult {
    /// The script completed and the buffer rendered.
    Success(Transformed),
    /// The script failed to compile, raised, or was interrupted.
    Failure(EvalFailure),
}

impl EvaluationResult {
    /// Builds a failure result.
    #[must_use]
    pub fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(EvalFailure::new(kind, message))
    }

    /// Returns `true` for [`EvaluationResult::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the transformed output on success.
    #[must_use]
    pub fn as_success(&self) -> Option<&Transformed> {
        match self {
            Self::Success(t) => Some(t),
            Self::Failure(_) => None,
        }
    }

    /// Returns the failure on failure.
    #[must_use]
    pub fn as_failure(&self) -> Option<&EvalFailure> {
        match self {
            Self::Success(_) => None,
            Self::Failure(f) => Some(f),
        }
    }
}

/// A successful transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transformed {
    /// Rendered text followed by the `sourceMappingURL` line.
    pub output: String,
    /// Rendered text alone.
    pub text: String,
    /// Position map from `text` back to the input.
    pub map: SourceMap,
    /// Lines the script printed, in order.
    pub console: Vec<String>,
}

/// Broad category of a failed evaluation.
///
/// Informational only: consumers display [`EvalFailure::message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// The script did not parse.
    Compile,
    /// The script raised while running.
    Runtime,
    /// The buffer rejected an operation or could not be rendered.
    Adapter,
    /// Cancelled, over the instruction limit, or timed out.
    Interrupted,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Compile => "compile",
            Self::Runtime => "runtime",
            Self::Adapter => "adapter",
            Self::Interrupted => "interrupted",
        };
        f.write_str(s)
    }
}

/// A failed evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalFailure {
    /// Category of the failure.
    pub kind: FailureKind,
    /// Human-readable message shown to the user.
    pub message: String,
}

impl EvalFailure {
    /// Creates a failure.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for EvalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_accessors() {
        let result = EvaluationResult::failure(FailureKind::Compile, "unexpected symbol");
        assert!(!result.is_success());
        assert!(result.as_success().is_none());

        let failure = result.as_failure().expect("failure");
        assert_eq!(failure.kind, FailureKind::Compile);
        assert_eq!(failure.to_string(), "unexpected symbol");
    }

    #[test]
    fn kind_display() {
        assert_eq!(FailureKind::Interrupted.to_string(), "interrupted");
        assert_eq!(FailureKind::Adapter.to_string(), "adapter");
    }
}
