//! Shared types for the splice workspace.
//!
//! # Crate Architecture
//!
//! ```text
//! splice-types    : ErrorCode, Sequence, Revision       (this crate)
//!       ↓
//! splice-buffer   : EditBuffer, SourceMap
//!       ↓
//! splice-runtime  : Executor, Orchestrator, Session, config
//!       ↓
//! splice-lua      : LuaExecutor (mlua)
//!       ↓
//! splice-cli      : `splice` binary, Presenter
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::{Revision, Sequence};
