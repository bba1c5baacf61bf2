//! Glyph stream types.

use serde::{Deserialize, Serialize};

use super::BBox;

/// A single rendered character with its tight bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Glyph {
    /// Character value
    pub c: char,
    /// Glyph box
    pub bbox: BBox,
}

impl Glyph {
    /// Create a glyph.
    pub fn new(c: char, bbox: BBox) -> Self {
        Self { c, bbox }
    }
}

/// Concatenate the glyphs' characters into the string that sentence offsets index.
///
/// One glyph contributes exactly one `char`, so a character offset into the
/// result is also an index into `glyphs`.
pub fn glyph_text(glyphs: &[Glyph]) -> String {
    glyphs.iter().map(|g| g.c).collect()
}

/// A sentence located in a page's glyph stream.
///
/// `start..end` is a half-open range of glyph indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceSpan {
    pub start: usize,
    pub end: usize,
    pub text: String,
}

impl SentenceSpan {
    /// Create a sentence span.
    pub fn new(start: usize, end: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            end,
            text: text.into(),
        }
    }

    /// Number of glyphs covered.
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Whether the span covers no glyphs.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glyph_text_one_char_per_glyph() {
        let b = BBox::new(0.0, 0.0, 1.0, 1.0);
        let glyphs = vec![Glyph::new('h', b), Glyph::new('é', b), Glyph::new('∑', b)];
        let text = glyph_text(&glyphs);
        assert_eq!(text.chars().count(), glyphs.len());
        assert_eq!(text, "hé∑");
    }

    #[test]
    fn test_span_len() {
        assert_eq!(SentenceSpan::new(3, 7, "abcd").len(), 4);
        assert!(SentenceSpan::new(5, 5, "").is_empty());
        assert!(SentenceSpan::new(6, 2, "").is_empty());
    }
}
