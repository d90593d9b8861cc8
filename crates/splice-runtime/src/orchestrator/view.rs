//! The single visible state published by the orchestrator.

use crate::evaluation::{EvalFailure, EvaluationResult, Transformed};
use splice_types::Sequence;

/// Snapshot of what a user should currently see.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct View {
    /// Sequence of the last applied request ([`Sequence::ZERO`] before any).
    pub sequence: Sequence,
    /// Last successful transformation. Survives later failures.
    pub success: Option<Transformed>,
    /// Failure of the last applied request, cleared by the next success.
    pub error: Option<EvalFailure>,
}

impl View {
    /// Output text (with reference line) of the last success.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.success.as_ref().map(|t| t.output.as_str())
    }

    /// Message of the current error.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }

    /// Returns `true` if the last applied request failed.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Applies the result of request `sequence`.
    pub(crate) fn apply(&mut self, sequence: Sequence, result: EvaluationResult) {
        self.sequence = sequence;
        match result {
            EvaluationResult::Success(transformed) => {
                self.success = Some(transformed);
                self.error = None;
            }
            EvaluationResult::Failure(failure) => {
                self.error = Some(failure);
            }
        }
    }
}
