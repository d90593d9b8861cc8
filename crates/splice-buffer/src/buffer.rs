//! Chunked edit buffer.
//!
//! The original text is covered by an ordered list of chunks. Each chunk
//! owns a half-open original range plus three pieces of output: `intro`
//! (text inserted before it), `content` (the original slice or its
//! replacement) and `outro` (text inserted after it). Splitting a chunk at an
//! index makes that index addressable for inserts and replacements.
//!
//! # Left and right inserts
//!
//! An insert at index `i` either attaches to the text *ending* at `i`
//! (`*_left`) or to the text *starting* at `i` (`*_right`). The distinction
//! decides what happens when the neighbouring range is later overwritten or
//! removed: the insert goes away with the chunk it is attached to.
//!
//! ```text
//!   original:  h e l l o | w o r l d
//!                        ^ i = 5
//!   append_left(5, "X")   -> outro of chunk 0..5
//!   append_right(5, "Y")  -> intro of chunk 5..10
//! ```

use crate::error::BufferError;
use crate::sourcemap::{Locator, MapOptions, Mappings, SourceMap};
use std::fmt;

#[derive(Debug, Clone)]
struct Chunk {
    start: usize,
    end: usize,
    intro: String,
    content: String,
    outro: String,
    edited: bool,
}

impl Chunk {
    fn new(start: usize, end: usize, content: &str) -> Self {
        Self {
            start,
            end,
            intro: String::new(),
            content: content.to_string(),
            outro: String::new(),
            edited: false,
        }
    }

    /// Replaces the content. Inserts attached to the chunk survive only
    /// when `keep_edges` is set.
    fn edit(&mut self, content: &str, keep_edges: bool) {
        self.content = content.to_string();
        self.edited = true;
        if !keep_edges {
            self.intro.clear();
            self.outro.clear();
        }
    }

    fn len(&self) -> usize {
        self.intro.len() + self.content.len() + self.outro.len()
    }
}

/// Output of [`EditBuffer::render`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    /// Edited text.
    pub text: String,
    /// Map from `text` back to the original.
    pub map: SourceMap,
}

/// Mutable editing session over an original text.
///
/// All indices are byte offsets into the *original* text, whatever edits
/// were applied before. Ranges are half-open (`start..end`).
///
/// # Example
///
/// ```
/// use splice_buffer::EditBuffer;
///
/// let mut buffer = EditBuffer::new("let x = 1;");
/// buffer.overwrite(4, 5, "answer")?;
/// buffer.append_left(9, "00")?;
/// buffer.prepend("// generated\n");
/// assert_eq!(buffer.to_string(), "// generated\nlet answer = 100;");
/// # Ok::<(), splice_buffer::BufferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EditBuffer {
    original: String,
    intro: String,
    outro: String,
    chunks: Vec<Chunk>,
}

impl EditBuffer {
    /// Starts an editing session over `original`.
    #[must_use]
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let chunk = Chunk::new(0, original.len(), &original);
        Self {
            original,
            intro: String::new(),
            outro: String::new(),
            chunks: vec![chunk],
        }
    }

    /// Returns the original text.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// Appends `content` to the end of the output.
    pub fn append(&mut self, content: &str) -> &mut Self {
        self.outro.push_str(content);
        self
    }

    /// Prepends `content` to the start of the output.
    pub fn prepend(&mut self, content: &str) -> &mut Self {
        self.intro.insert_str(0, content);
        self
    }

    /// Inserts `content` at `index`, after earlier left inserts there.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] if `index` is out of bounds, not on a
    /// character boundary, or inside an edited range.
    pub fn append_left(&mut self, index: usize, content: &str) -> Result<&mut Self, BufferError> {
        self.check_index(index)?;
        self.split(index)?;
        match self.by_end(index) {
            Some(i) => self.chunks[i].outro.push_str(content),
            None => self.intro.push_str(content),
        }
        Ok(self)
    }

    /// Inserts `content` at `index`, before earlier left inserts there.
    ///
    /// # Errors
    ///
    /// See [`EditBuffer::append_left`].
    pub fn prepend_left(&mut self, index: usize, content: &str) -> Result<&mut Self, BufferError> {
        self.check_index(index)?;
        self.split(index)?;
        match self.by_end(index) {
            Some(i) => self.chunks[i].outro.insert_str(0, content),
            None => self.intro.insert_str(0, content),
        }
        Ok(self)
    }

    /// Inserts `content` at `index`, after earlier right inserts there.
    ///
    /// # Errors
    ///
    /// See [`EditBuffer::append_left`].
    pub fn append_right(&mut self, index: usize, content: &str) -> Result<&mut Self, BufferError> {
        self.check_index(index)?;
        self.split(index)?;
        match self.by_start(index) {
            Some(i) => self.chunks[i].intro.push_str(content),
            None => self.outro.push_str(content),
        }
        Ok(self)
    }

    /// Inserts `content` at `index`, before earlier right inserts there.
    ///
    /// # Errors
    ///
    /// See [`EditBuffer::append_left`].
    pub fn prepend_right(&mut self, index: usize, content: &str) -> Result<&mut Self, BufferError> {
        self.check_index(index)?;
        self.split(index)?;
        match self.by_start(index) {
            Some(i) => self.chunks[i].intro.insert_str(0, content),
            None => self.outro.insert_str(0, content),
        }
        Ok(self)
    }

    /// Replaces `start..end` with `content`, dropping inserts attached to the
    /// replaced range.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::ZeroLengthOverwrite`] for an empty range, or any
    /// range validation error.
    pub fn overwrite(
        &mut self,
        start: usize,
        end: usize,
        content: &str,
    ) -> Result<&mut Self, BufferError> {
        self.replace(start, end, content, false)
    }

    /// Replaces `start..end` with `content`, keeping inserts at the edges of
    /// the first replaced chunk.
    ///
    /// # Errors
    ///
    /// See [`EditBuffer::overwrite`].
    pub fn update(
        &mut self,
        start: usize,
        end: usize,
        content: &str,
    ) -> Result<&mut Self, BufferError> {
        self.replace(start, end, content, true)
    }

    /// Removes `start..end` and every insert attached to it.
    ///
    /// Removing an empty range is a no-op. Removing an already removed
    /// range is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError`] for invalid ranges or split points inside
    /// replaced text.
    pub fn remove(&mut self, start: usize, end: usize) -> Result<&mut Self, BufferError> {
        self.check_range(start, end)?;
        if start == end {
            return Ok(self);
        }

        self.split(start)?;
        self.split(end)?;
        let (first, last) = self.span(start, end)?;
        for chunk in &mut self.chunks[first..=last] {
            chunk.edit("", false);
        }
        Ok(self)
    }

    /// Byte length of the current output.
    #[must_use]
    pub fn len(&self) -> usize {
        self.intro.len() + self.chunks.iter().map(Chunk::len).sum::<usize>() + self.outro.len()
    }

    /// Returns `true` if the current output is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns `true` if the current output differs from the original.
    #[must_use]
    pub fn has_changed(&self) -> bool {
        self.to_string() != self.original
    }

    /// Freezes the buffer into its output text and source map.
    ///
    /// Consumes the buffer: a session renders exactly once.
    #[must_use]
    pub fn render(self, options: &MapOptions) -> Rendered {
        let map = self.generate_map(options);
        Rendered {
            text: self.to_string(),
            map,
        }
    }

    fn generate_map(&self, options: &MapOptions) -> SourceMap {
        let locator = Locator::new(&self.original);
        let mut mappings = Mappings::new(options.hires);

        mappings.advance(&self.intro);
        for chunk in &self.chunks {
            mappings.advance(&chunk.intro);
            let loc = locator.locate(chunk.start);
            if chunk.edited {
                mappings.add_edit(&chunk.content, loc);
            } else {
                mappings.add_unedited(&self.original[chunk.start..chunk.end], loc);
            }
            mappings.advance(&chunk.outro);
        }

        SourceMap {
            version: 3,
            file: options.file.clone(),
            sources: vec![options.source.clone()],
            sources_content: options
                .include_content
                .then(|| vec![Some(self.original.clone())]),
            names: Vec::new(),
            mappings: mappings.encode(),
        }
    }

    fn replace(
        &mut self,
        start: usize,
        end: usize,
        content: &str,
        keep_edges: bool,
    ) -> Result<&mut Self, BufferError> {
        self.check_range(start, end)?;
        if start == end {
            return Err(BufferError::ZeroLengthOverwrite { index: start });
        }

        self.split(start)?;
        self.split(end)?;
        let (first, last) = self.span(start, end)?;
        for chunk in &mut self.chunks[first + 1..=last] {
            chunk.edit("", false);
        }
        self.chunks[first].edit(content, keep_edges);
        Ok(self)
    }

    /// Makes `index` a chunk boundary.
    fn split(&mut self, index: usize) -> Result<(), BufferError> {
        let pos = self.chunks.partition_point(|c| c.end <= index);
        let Some(chunk) = self.chunks.get_mut(pos) else {
            return Ok(());
        };
        if chunk.start == index {
            return Ok(());
        }
        if chunk.edited && !chunk.content.is_empty() {
            return Err(BufferError::SplitEdited { index });
        }

        let mut tail = Chunk::new(index, chunk.end, &self.original[index..chunk.end]);
        tail.outro = std::mem::take(&mut chunk.outro);
        chunk.end = index;
        if chunk.edited {
            tail.content.clear();
            tail.edited = true;
        } else {
            chunk.content = self.original[chunk.start..index].to_string();
        }

        self.chunks.insert(pos + 1, tail);
        Ok(())
    }

    /// Chunk indices covering exactly `start..end` (both already split).
    fn span(&self, start: usize, end: usize) -> Result<(usize, usize), BufferError> {
        let len = self.original.len();
        let first = self
            .by_start(start)
            .ok_or(BufferError::OutOfBounds { index: start, len })?;
        let last = self
            .by_end(end)
            .ok_or(BufferError::OutOfBounds { index: end, len })?;
        Ok((first, last))
    }

    fn by_start(&self, index: usize) -> Option<usize> {
        self.chunks.binary_search_by_key(&index, |c| c.start).ok()
    }

    fn by_end(&self, index: usize) -> Option<usize> {
        if self.original.is_empty() {
            // left inserts into an empty original attach to the buffer intro
            return None;
        }
        self.chunks.binary_search_by_key(&index, |c| c.end).ok()
    }

    fn check_index(&self, index: usize) -> Result<(), BufferError> {
        let len = self.original.len();
        if index > len {
            return Err(BufferError::OutOfBounds { index, len });
        }
        if !self.original.is_char_boundary(index) {
            return Err(BufferError::NotCharBoundary { index });
        }
        Ok(())
    }

    fn check_range(&self, start: usize, end: usize) -> Result<(), BufferError> {
        if start > end {
            return Err(BufferError::InvalidRange { start, end });
        }
        self.check_index(start)?;
        self.check_index(end)
    }
}

impl fmt::Display for EditBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.intro)?;
        for chunk in &self.chunks {
            f.write_str(&chunk.intro)?;
            f.write_str(&chunk.content)?;
            f.write_str(&chunk.outro)?;
        }
        f.write_str(&self.outro)
    }
}
