//! Unified error-code interface.
//!
//! Every splice error type implements [`ErrorCode`] so hosts can log a
//! stable machine-readable code next to the human-readable message.
//!
//! # Example
//!
//! ```
//! use splice_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum MyError {
//!     OutOfBounds,
//!     Timeout,
//! }
//!
//! impl ErrorCode for MyError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::OutOfBounds => "MY_OUT_OF_BOUNDS",
//!             Self::Timeout => "MY_TIMEOUT",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Timeout)
//!     }
//! }
//!
//! let err = MyError::Timeout;
//! assert_eq!(err.code(), "MY_TIMEOUT");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error code and recoverability.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**: e.g. `"EVAL_COMPILE"`
/// - **Prefixed by domain**: `BUFFER_`, `EVAL_`, `CONFIG_`
/// - **Stable**: codes are part of the log contract
///
/// # Recoverability
///
/// An error is recoverable when the same request may succeed later without
/// the user changing anything (timeouts, cancellation). Errors caused by the
/// script or the input text are not recoverable: the user has to edit.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;

    /// Returns whether retrying without an edit may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Validates that an error code follows the naming convention.
///
/// # Panics
///
/// Panics with a descriptive message if the code is empty, lacks the
/// expected prefix, or is not UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use splice_types::{assert_error_code, ErrorCode};
///
/// #[derive(Debug)]
/// enum MyError { Timeout }
///
/// impl ErrorCode for MyError {
///     fn code(&self) -> &'static str { "MY_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&MyError::Timeout, "MY_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Validates every error in `errors` with [`assert_error_code`].
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}
