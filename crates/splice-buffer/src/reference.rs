//! The trailing `sourceMappingURL` line that ties output text to its map.

use crate::error::BufferError;
use crate::sourcemap::SourceMap;

/// Prefix of the trailing reference line.
pub const SOURCE_MAPPING_PREFIX: &str = "//# sourceMappingURL=";

/// Appends the map reference to `text` as a single trailing line.
///
/// The result is `<text>\n//# sourceMappingURL=<data url>`, also when `text`
/// is empty.
///
/// # Errors
///
/// Returns [`BufferError::Encode`] if the map cannot be serialized.
pub fn embed_reference(text: &str, map: &SourceMap) -> Result<String, BufferError> {
    let url = map.to_url()?;
    Ok(format!("{text}\n{SOURCE_MAPPING_PREFIX}{url}"))
}

/// Splits output produced by [`embed_reference`] into text and map URL.
///
/// Returns `None` when the last line is not a reference line.
#[must_use]
pub fn split_reference(output: &str) -> Option<(&str, &str)> {
    let (text, last) = output.rsplit_once('\n')?;
    let url = last.strip_prefix(SOURCE_MAPPING_PREFIX)?;
    Some((text, url))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map() -> SourceMap {
        SourceMap {
            version: 3,
            file: None,
            sources: vec!["user-code.js".into()],
            sources_content: None,
            names: Vec::new(),
            mappings: String::new(),
        }
    }

    #[test]
    fn empty_text_keeps_reference_line() {
        let out = embed_reference("", &map()).expect("embed");
        assert!(out.starts_with("\n//# sourceMappingURL=data:"));
        let (text, url) = split_reference(&out).expect("split");
        assert_eq!(text, "");
        assert_eq!(SourceMap::from_url(url).expect("decode"), map());
    }

    #[test]
    fn multiline_text_splits_on_last_line() {
        let out = embed_reference("a\nb\n", &map()).expect("embed");
        let (text, _) = split_reference(&out).expect("split");
        assert_eq!(text, "a\nb\n");
        assert_eq!(out.matches(SOURCE_MAPPING_PREFIX).count(), 1);
    }

    #[test]
    fn plain_text_has_no_reference() {
        assert!(split_reference("hello").is_none());
        assert!(split_reference("hello\nworld").is_none());
    }
}
