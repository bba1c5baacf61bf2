//! Records exchanged with the PDF reader.
//!
//! These mirror what a content-stream reader reports per page: a loosely
//! typed block listing, a nested block → line → span → char structure, and
//! image references with their placements.

use serde::{Deserialize, Serialize};

use super::{BBox, Glyph};

/// One positional field of a block listing entry.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockField {
    Number(f32),
    Text(String),
    Other,
}

impl BlockField {
    /// Numeric value, if this field is a number.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            BlockField::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text value, if this field is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            BlockField::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// A block listing entry: `(x0, y0, x1, y1, text, block_no, block_type)`.
pub type BlockEntry = Vec<BlockField>;

/// Read the box and text out of a block listing entry.
///
/// Returns `None` for malformed entries: fewer than five fields, a
/// non-numeric coordinate, or a non-text fifth field.
pub fn parse_block_entry(entry: &[BlockField]) -> Option<(BBox, &str)> {
    if entry.len() < 5 {
        return None;
    }
    let x0 = entry[0].as_number()?;
    let y0 = entry[1].as_number()?;
    let x1 = entry[2].as_number()?;
    let y1 = entry[3].as_number()?;
    let text = entry[4].as_text()?;
    Some((BBox::new(x0, y0, x1, y1), text))
}

/// Kind of a raw block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Text,
    Image,
}

/// A run of glyphs in one font and size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSpan {
    pub font: String,
    pub size: f32,
    pub bbox: BBox,
    pub chars: Vec<Glyph>,
}

impl RawSpan {
    /// The span's characters as a string.
    pub fn text(&self) -> String {
        self.chars.iter().map(|g| g.c).collect()
    }
}

/// Spans sharing a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawLine {
    pub bbox: BBox,
    pub spans: Vec<RawSpan>,
}

impl RawLine {
    /// Concatenated span text.
    pub fn text(&self) -> String {
        self.spans.iter().map(RawSpan::text).collect()
    }

    fn last_glyph(&self) -> Option<&Glyph> {
        self.spans.iter().rev().find_map(|s| s.chars.last())
    }
}

/// A block of lines, or an image placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBlock {
    pub number: usize,
    pub kind: BlockKind,
    pub bbox: BBox,
    pub lines: Vec<RawLine>,
}

impl RawBlock {
    /// Line texts joined with newlines.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(RawLine::text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Everything the reader reports about one page's rendered text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawPageText {
    pub width: f32,
    pub height: f32,
    pub blocks: Vec<RawBlock>,
}

impl RawPageText {
    /// Flatten text blocks into the page's glyph stream.
    ///
    /// Image blocks are skipped. A line that does not end in whitespace is
    /// followed by a zero-width space glyph at its right edge so words on
    /// adjacent lines stay separated without widening any line's box.
    pub fn glyphs(&self) -> Vec<Glyph> {
        let mut glyphs = Vec::new();
        for block in self.blocks.iter().filter(|b| b.kind == BlockKind::Text) {
            for line in &block.lines {
                for span in &line.spans {
                    glyphs.extend_from_slice(&span.chars);
                }
                if let Some(last) = line.last_glyph() {
                    if !last.c.is_whitespace() {
                        let b = last.bbox;
                        glyphs.push(Glyph::new(' ', BBox::new(b.x1, b.y0, b.x1, b.y1)));
                    }
                }
            }
        }
        glyphs
    }

    /// The page's block listing, one entry per text block.
    pub fn block_entries(&self) -> Vec<BlockEntry> {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Text)
            .map(|b| {
                vec![
                    BlockField::Number(b.bbox.x0),
                    BlockField::Number(b.bbox.y0),
                    BlockField::Number(b.bbox.x1),
                    BlockField::Number(b.bbox.y1),
                    BlockField::Text(b.text()),
                    BlockField::Number(b.number as f32),
                    BlockField::Number(0.0),
                ]
            })
            .collect()
    }
}

/// An image object referenced from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Object number of the image XObject
    pub xref: u32,
    /// Resource name on the page (e.g. "Im0")
    pub name: String,
    /// Width in pixels
    pub width: Option<u32>,
    /// Height in pixels
    pub height: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glyphs_for(text: &str, x: f32, y: f32) -> Vec<Glyph> {
        text.chars()
            .enumerate()
            .map(|(i, c)| {
                let x0 = x + i as f32 * 5.0;
                Glyph::new(c, BBox::new(x0, y, x0 + 5.0, y + 10.0))
            })
            .collect()
    }

    fn line(text: &str, x: f32, y: f32) -> RawLine {
        let chars = glyphs_for(text, x, y);
        let bbox = BBox::union_all(chars.iter().map(|g| &g.bbox)).unwrap();
        RawLine {
            bbox,
            spans: vec![RawSpan {
                font: "Helvetica".to_string(),
                size: 10.0,
                bbox,
                chars,
            }],
        }
    }

    #[test]
    fn test_parse_block_entry() {
        let entry = vec![
            BlockField::Number(1.0),
            BlockField::Number(2.0),
            BlockField::Number(3.0),
            BlockField::Number(4.0),
            BlockField::Text("hi".to_string()),
        ];
        let (bbox, text) = parse_block_entry(&entry).unwrap();
        assert_eq!(bbox, BBox::new(1.0, 2.0, 3.0, 4.0));
        assert_eq!(text, "hi");
    }

    #[test]
    fn test_parse_block_entry_skips_malformed() {
        let short = vec![BlockField::Number(1.0); 4];
        assert!(parse_block_entry(&short).is_none());

        let bad_coord = vec![
            BlockField::Text("x".to_string()),
            BlockField::Number(2.0),
            BlockField::Number(3.0),
            BlockField::Number(4.0),
            BlockField::Text("hi".to_string()),
        ];
        assert!(parse_block_entry(&bad_coord).is_none());

        let no_text = vec![
            BlockField::Number(1.0),
            BlockField::Number(2.0),
            BlockField::Number(3.0),
            BlockField::Number(4.0),
            BlockField::Other,
        ];
        assert!(parse_block_entry(&no_text).is_none());
    }

    #[test]
    fn test_glyphs_skip_image_blocks_and_join_lines() {
        let page = RawPageText {
            width: 612.0,
            height: 792.0,
            blocks: vec![
                RawBlock {
                    number: 0,
                    kind: BlockKind::Text,
                    bbox: BBox::new(0.0, 0.0, 20.0, 22.0),
                    lines: vec![line("ab", 0.0, 0.0), line("cd", 0.0, 12.0)],
                },
                RawBlock {
                    number: 1,
                    kind: BlockKind::Image,
                    bbox: BBox::new(0.0, 100.0, 50.0, 150.0),
                    lines: vec![],
                },
            ],
        };

        let glyphs = page.glyphs();
        let text: String = glyphs.iter().map(|g| g.c).collect();
        assert_eq!(text, "ab cd ");

        // Joiner sits on the right edge of its line with zero width
        let joiner = glyphs[2];
        assert_eq!(joiner.bbox, BBox::new(10.0, 0.0, 10.0, 10.0));
    }

    #[test]
    fn test_block_entries_text_only() {
        let page = RawPageText {
            width: 612.0,
            height: 792.0,
            blocks: vec![
                RawBlock {
                    number: 0,
                    kind: BlockKind::Image,
                    bbox: BBox::new(0.0, 0.0, 5.0, 5.0),
                    lines: vec![],
                },
                RawBlock {
                    number: 1,
                    kind: BlockKind::Text,
                    bbox: BBox::new(0.0, 0.0, 20.0, 22.0),
                    lines: vec![line("ab", 0.0, 0.0), line("cd", 0.0, 12.0)],
                },
            ],
        };
        let entries = page.block_entries();
        assert_eq!(entries.len(), 1);
        let (_, text) = parse_block_entry(&entries[0]).unwrap();
        assert_eq!(text, "ab\ncd");
    }
}
