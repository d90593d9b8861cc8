//! Error types for script evaluation.

use splice_buffer::BufferError;
use splice_runtime::{EvalFailure, FailureKind};
use splice_types::ErrorCode;
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while evaluating a script.
///
/// Converted into [`EvalFailure`] at the executor boundary; nothing here
/// escapes as a panic or an `Err` from [`Executor::execute`](splice_runtime::Executor::execute).
#[derive(Debug, Error)]
pub enum EvalError {
    /// The script failed to parse.
    #[error("compile error: {0}")]
    Compile(String),

    /// The script raised.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// The buffer rejected an operation or the map could not be encoded.
    #[error("buffer error: {message}")]
    Adapter {
        /// Code of the underlying [`BufferError`].
        code: &'static str,
        message: String,
    },

    /// A newer request superseded this evaluation.
    #[error("evaluation cancelled")]
    Cancelled,

    /// The instruction budget ran out.
    #[error("instruction limit exceeded ({0})")]
    InstructionLimit(u64),

    /// The wall-clock budget ran out.
    #[error("evaluation timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    /// VM setup failed or the worker died.
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    /// Creates an internal error from anything displayable.
    pub fn internal(err: impl std::fmt::Display) -> Self {
        Self::Internal(err.to_string())
    }

    /// Failure category reported to the orchestrator.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Compile(_) => FailureKind::Compile,
            Self::Runtime(_) | Self::Internal(_) => FailureKind::Runtime,
            Self::Adapter { .. } => FailureKind::Adapter,
            Self::Cancelled | Self::InstructionLimit(_) | Self::Timeout(_) => {
                FailureKind::Interrupted
            }
        }
    }
}

impl From<&BufferError> for EvalError {
    fn from(err: &BufferError) -> Self {
        Self::Adapter {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

impl From<BufferError> for EvalError {
    fn from(err: BufferError) -> Self {
        Self::from(&err)
    }
}

impl From<EvalError> for EvalFailure {
    fn from(err: EvalError) -> Self {
        EvalFailure::new(err.kind(), err.to_string())
    }
}

impl ErrorCode for EvalError {
    fn code(&self) -> &'static str {
        match self.kind() {
            FailureKind::Compile => "EVAL_COMPILE",
            FailureKind::Runtime => "EVAL_RUNTIME",
            FailureKind::Adapter => "EVAL_ADAPTER",
            FailureKind::Interrupted => "EVAL_INTERRUPTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Timeout(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splice_types::assert_error_codes;

    #[test]
    fn error_codes() {
        assert_error_codes(
            &[
                EvalError::Compile("x".into()),
                EvalError::Runtime("x".into()),
                EvalError::from(BufferError::ZeroLengthOverwrite { index: 0 }),
                EvalError::Cancelled,
                EvalError::InstructionLimit(10),
                EvalError::Timeout(Duration::from_millis(5)),
                EvalError::internal("x"),
            ],
            "EVAL_",
        );
    }

    #[test]
    fn adapter_keeps_buffer_code() {
        let err = EvalError::from(BufferError::OutOfBounds { index: 9, len: 3 });
        assert!(matches!(
            err,
            EvalError::Adapter {
                code: "BUFFER_OUT_OF_BOUNDS",
                ..
            }
        ));
        assert_eq!(
            err.to_string(),
            "buffer error: index 9 is out of bounds (original length 3)"
        );
    }

    #[test]
    fn into_failure() {
        let failure = EvalFailure::from(EvalError::Timeout(Duration::from_millis(250)));
        assert_eq!(failure.kind, FailureKind::Interrupted);
        assert_eq!(failure.message, "evaluation timed out after 250ms");

        let failure = EvalFailure::from(EvalError::internal("worker died"));
        assert_eq!(failure.kind, FailureKind::Runtime);
    }

    #[test]
    fn recoverability() {
        assert!(EvalError::Cancelled.is_recoverable());
        assert!(!EvalError::Compile("x".into()).is_recoverable());
        assert!(!EvalError::InstructionLimit(1).is_recoverable());
    }
}
