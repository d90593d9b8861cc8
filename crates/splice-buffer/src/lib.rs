//! Edit buffer and source maps for splice.
//!
//! An [`EditBuffer`] is built from an original text and records edits
//! (inserts, replacements, removals) against *original* byte offsets. The
//! original text is never mutated; edits are stored on chunks that cover it.
//! [`EditBuffer::render`] consumes the buffer and yields the edited text plus
//! a Source Map v3 ([`SourceMap`]) that maps every output position back to
//! the original.
//!
//! # Example
//!
//! ```
//! use splice_buffer::{embed_reference, EditBuffer, MapOptions};
//!
//! let mut buffer = EditBuffer::new("hello");
//! buffer.append(" world");
//!
//! let rendered = buffer.render(&MapOptions::default());
//! assert_eq!(rendered.text, "hello world");
//! assert_eq!(rendered.map.mappings, "AAAA");
//!
//! let output = embed_reference(&rendered.text, &rendered.map).expect("encode map");
//! assert!(output.starts_with("hello world\n//# sourceMappingURL=data:"));
//! ```

mod buffer;
mod error;
mod reference;
mod sourcemap;
mod vlq;

pub use buffer::{EditBuffer, Rendered};
pub use error::BufferError;
pub use reference::{embed_reference, split_reference, SOURCE_MAPPING_PREFIX};
pub use sourcemap::{MapOptions, SourceMap, DEFAULT_SOURCE_NAME};
