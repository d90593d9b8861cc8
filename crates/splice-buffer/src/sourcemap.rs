//! Source Map v3 model and mapping generation.

use crate::error::BufferError;
use crate::vlq;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Default entry of the `sources` array.
pub const DEFAULT_SOURCE_NAME: &str = "user-code.js";

const DATA_URL_PREFIX: &str = "data:application/json;charset=utf-8;base64,";

/// Options for [`EditBuffer::render`](crate::EditBuffer::render).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapOptions {
    /// Name of the original text in `sources`.
    pub source: String,
    /// Optional `file` field (name of the generated output).
    pub file: Option<String>,
    /// Embed the original text as `sourcesContent`.
    pub include_content: bool,
    /// Map every original character instead of only chunk and line starts.
    pub hires: bool,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE_NAME.to_string(),
            file: None,
            include_content: true,
            hires: false,
        }
    }
}

/// A Source Map v3 document.
///
/// Field order matches the serialized JSON: `version`, `file`, `sources`,
/// `sourcesContent`, `names`, `mappings`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMap {
    /// Always 3.
    pub version: u8,
    /// Name of the generated file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Original source names. splice always emits exactly one.
    pub sources: Vec<String>,
    /// Original source texts, parallel to `sources`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sources_content: Option<Vec<Option<String>>>,
    /// Symbol names. Unused by splice, kept for format completeness.
    #[serde(default)]
    pub names: Vec<String>,
    /// Base64 VLQ encoded segments.
    pub mappings: String,
}

impl SourceMap {
    /// Serializes the map to compact JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Encode`] if serialization fails.
    pub fn to_json(&self) -> Result<String, BufferError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Encodes the map as a base64 `data:` URL suitable for a
    /// `sourceMappingURL` comment.
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::Encode`] if serialization fails.
    pub fn to_url(&self) -> Result<String, BufferError> {
        let json = self.to_json()?;
        Ok(format!("{DATA_URL_PREFIX}{}", STANDARD.encode(json)))
    }

    /// Decodes a map from a `data:` URL produced by [`SourceMap::to_url`].
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::InvalidReference`] for anything that is not a
    /// base64 JSON data URL, or [`BufferError::Encode`] for malformed JSON.
    pub fn from_url(url: &str) -> Result<Self, BufferError> {
        let payload = url
            .strip_prefix(DATA_URL_PREFIX)
            .ok_or_else(|| BufferError::InvalidReference("not a base64 JSON data URL".into()))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| BufferError::InvalidReference(format!("base64: {e}")))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Zero-based position in the original text (column in UTF-16 units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Location {
    pub line: u32,
    pub column: u32,
}

/// Converts byte offsets of the original text into line/column locations.
pub(crate) struct Locator<'a> {
    text: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Locator<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(text.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { text, line_starts }
    }

    pub(crate) fn locate(&self, offset: usize) -> Location {
        let line = self
            .line_starts
            .partition_point(|&start| start <= offset)
            .saturating_sub(1);
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        let column = self
            .text
            .get(line_start..offset)
            .map_or(0, |s| s.encode_utf16().count());
        Location {
            line: line as u32,
            column: column as u32,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    generated_column: u32,
    source: Location,
}

/// Accumulates mapping segments while walking the generated output.
pub(crate) struct Mappings {
    hires: bool,
    lines: Vec<Vec<Segment>>,
    column: u32,
}

impl Mappings {
    pub(crate) fn new(hires: bool) -> Self {
        Self {
            hires,
            lines: vec![Vec::new()],
            column: 0,
        }
    }

    /// Moves the generated cursor over text that has no original location.
    pub(crate) fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.newline();
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
    }

    /// Replacement content: every generated line start maps to `loc`.
    pub(crate) fn add_edit(&mut self, content: &str, loc: Location) {
        if content.is_empty() {
            return;
        }

        self.push(loc);
        let mut chars = content.chars().peekable();
        while let Some(ch) = chars.next() {
            if ch == '\n' {
                self.newline();
                if chars.peek().is_some() {
                    self.push(loc);
                }
            } else {
                self.column += ch.len_utf16() as u32;
            }
        }
    }

    /// Untouched original text starting at `loc`.
    pub(crate) fn add_unedited(&mut self, text: &str, mut loc: Location) {
        let mut first = true;
        for ch in text.chars() {
            if self.hires || first {
                self.push(loc);
            }

            if ch == '\n' {
                loc.line += 1;
                loc.column = 0;
                self.newline();
                first = true;
            } else {
                let width = ch.len_utf16() as u32;
                loc.column += width;
                self.column += width;
                first = false;
            }
        }
    }

    pub(crate) fn encode(&self) -> String {
        let mut out = String::new();
        let mut prev_line = 0i64;
        let mut prev_column = 0i64;

        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push(';');
            }
            let mut prev_generated = 0i64;
            for (j, segment) in line.iter().enumerate() {
                if j > 0 {
                    out.push(',');
                }
                let generated = i64::from(segment.generated_column);
                let line = i64::from(segment.source.line);
                let column = i64::from(segment.source.column);

                vlq::encode(generated - prev_generated, &mut out);
                // single source: index delta is always zero
                vlq::encode(0, &mut out);
                vlq::encode(line - prev_line, &mut out);
                vlq::encode(column - prev_column, &mut out);

                prev_generated = generated;
                prev_line = line;
                prev_column = column;
            }
        }

        out
    }

    fn push(&mut self, source: Location) {
        let segment = Segment {
            generated_column: self.column,
            source,
        };
        if let Some(line) = self.lines.last_mut() {
            line.push(segment);
        }
    }

    fn newline(&mut self) {
        self.lines.push(Vec::new());
        self.column = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(line: u32, column: u32) -> Location {
        Location { line, column }
    }

    #[test]
    fn locator_lines_and_columns() {
        let locator = Locator::new("ab\ncd\n\nx");
        assert_eq!(locator.locate(0), loc(0, 0));
        assert_eq!(locator.locate(1), loc(0, 1));
        assert_eq!(locator.locate(3), loc(1, 0));
        assert_eq!(locator.locate(4), loc(1, 1));
        assert_eq!(locator.locate(6), loc(2, 0));
        assert_eq!(locator.locate(7), loc(3, 0));
    }

    #[test]
    fn locator_counts_utf16_units() {
        // "é" is 2 bytes / 1 unit, "😀" is 4 bytes / 2 units
        let text = "é😀x";
        let locator = Locator::new(text);
        assert_eq!(locator.locate(2), loc(0, 1));
        assert_eq!(locator.locate(6), loc(0, 3));
    }

    #[test]
    fn unedited_multiline() {
        let mut m = Mappings::new(false);
        m.add_unedited("a\nb", loc(0, 0));
        assert_eq!(m.encode(), "AAAA;AACA");
    }

    #[test]
    fn unedited_hires_maps_every_char() {
        let mut m = Mappings::new(true);
        m.add_unedited("abc", loc(0, 0));
        assert_eq!(m.encode(), "AAAA,CAAC,CAAC");
    }

    #[test]
    fn edit_after_insert() {
        let mut m = Mappings::new(false);
        m.advance("> ");
        m.add_edit("xy", loc(0, 4));
        assert_eq!(m.encode(), "EAAI");
    }

    #[test]
    fn multiline_edit_maps_each_line_start() {
        let mut m = Mappings::new(false);
        m.add_edit("a\nb\n", loc(0, 0));
        assert_eq!(m.encode(), "AAAA;AAAA;");
    }

    #[test]
    fn empty_edit_has_no_segment() {
        let mut m = Mappings::new(false);
        m.add_edit("", loc(0, 0));
        assert_eq!(m.encode(), "");
    }

    #[test]
    fn map_json_shape() {
        let map = SourceMap {
            version: 3,
            file: None,
            sources: vec!["user-code.js".into()],
            sources_content: Some(vec![Some("hello".into())]),
            names: Vec::new(),
            mappings: "AAAA".into(),
        };
        assert_eq!(
            map.to_json().expect("serialize"),
            r#"{"version":3,"sources":["user-code.js"],"sourcesContent":["hello"],"names":[],"mappings":"AAAA"}"#
        );
    }

    #[test]
    fn url_decodes_back() {
        let map = SourceMap {
            version: 3,
            file: Some("out.js".into()),
            sources: vec!["in.js".into()],
            sources_content: None,
            names: Vec::new(),
            mappings: "AAAA;AACA".into(),
        };
        let url = map.to_url().expect("encode");
        assert!(url.starts_with("data:application/json;charset=utf-8;base64,"));
        assert_eq!(SourceMap::from_url(&url).expect("decode"), map);
    }

    #[test]
    fn from_url_rejects_other_schemes() {
        let err = SourceMap::from_url("https://example.com/map.json").unwrap_err();
        assert!(matches!(err, BufferError::InvalidReference(_)));
    }
}
