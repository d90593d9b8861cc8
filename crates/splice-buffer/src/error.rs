//! Errors raised by buffer operations and map encoding.

use splice_types::ErrorCode;
use thiserror::Error;

/// Errors returned by [`EditBuffer`](crate::EditBuffer) operations.
///
/// All indices are byte offsets into the original text.
#[derive(Debug, Error)]
pub enum BufferError {
    /// Index beyond the end of the original text.
    #[error("index {index} is out of bounds (original length {len})")]
    OutOfBounds { index: usize, len: usize },

    /// Range whose start comes after its end.
    #[error("invalid range {start}..{end}: start is after end")]
    InvalidRange { start: usize, end: usize },

    /// Index that falls inside a multi-byte UTF-8 character.
    #[error("index {index} is not on a character boundary")]
    NotCharBoundary { index: usize },

    /// `overwrite`/`update` over an empty range.
    #[error("cannot overwrite a zero-length range at {index}; use append_left or prepend_right instead")]
    ZeroLengthOverwrite { index: usize },

    /// Split point inside a range that was already replaced.
    #[error("cannot split a chunk that has already been edited (at {index})")]
    SplitEdited { index: usize },

    /// Source map serialization failed.
    #[error("failed to encode source map: {0}")]
    Encode(#[from] serde_json::Error),

    /// Malformed `sourceMappingURL` reference.
    #[error("invalid source map reference: {0}")]
    InvalidReference(String),
}

impl ErrorCode for BufferError {
    fn code(&self) -> &'static str {
        match self {
            Self::OutOfBounds { .. } => "BUFFER_OUT_OF_BOUNDS",
            Self::InvalidRange { .. } => "BUFFER_INVALID_RANGE",
            Self::NotCharBoundary { .. } => "BUFFER_NOT_CHAR_BOUNDARY",
            Self::ZeroLengthOverwrite { .. } => "BUFFER_ZERO_LENGTH_OVERWRITE",
            Self::SplitEdited { .. } => "BUFFER_SPLIT_EDITED",
            Self::Encode(_) => "BUFFER_ENCODE",
            Self::InvalidReference(_) => "BUFFER_INVALID_REFERENCE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
