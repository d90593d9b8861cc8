//! Lua 5.4 executor for splice.
//!
//! A script is plain Lua with two names in scope:
//!
//! - `buffer`: the edit buffer over the input text (see below)
//! - `original`: the input text as a string
//!
//! The script mutates `buffer` and returns (or raises). Its return value is
//! ignored.
//!
//! ```lua
//! -- uppercase the first word and add a banner
//! local first = original:find(" ") or (#original + 1)
//! buffer:overwrite(0, first - 1, original:sub(1, first - 1):upper())
//! buffer:prepend("-- generated\n")
//! ```
//!
//! # Buffer methods
//!
//! | method | effect |
//! |--------|--------|
//! | `append(s)` / `prepend(s)` | add at the end / start of the output |
//! | `append_left(i, s)` / `prepend_left(i, s)` | insert at `i`, attached to the text before `i` |
//! | `append_right(i, s)` / `prepend_right(i, s)` | insert at `i`, attached to the text after `i` |
//! | `insert(i, s)` | same as `append_left` |
//! | `overwrite(a, b, s)` | replace `a..b`, dropping inserts attached to it |
//! | `update(a, b, s)` | replace `a..b`, keeping inserts at its edges |
//! | `remove(a, b)` | delete `a..b` |
//! | `to_string()`, `tostring(buffer)` | current output |
//! | `len()`, `#buffer` | output length in bytes |
//! | `has_changed()` | output differs from `original` |
//! | `original()` | the input text |
//!
//! Indices are 0-based byte offsets into `original`; ranges are half-open.
//! Mutating methods return the buffer, so calls chain.
//!
//! # Isolation
//!
//! Each evaluation gets a new VM with the standard library globals, so
//! nothing a script defines survives into the next run. It is not a
//! security boundary: `io` and `os` stay reachable.

mod buffer;
mod error;
mod executor;
mod sandbox;

pub use error::EvalError;
pub use executor::LuaExecutor;
pub use sandbox::{evaluate, EvalSettings, HOOK_INTERVAL};
