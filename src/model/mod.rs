//! Data model for positioned PDF content.
//!
//! Geometry primitives, the uniform [`Fragment`] record, glyph streams and the
//! records exchanged with the PDF reader and the table parser.

mod fragment;
mod geometry;
mod glyph;
mod raw;
mod table;

pub use fragment::{Fragment, FragmentContent, FragmentKind};
pub use geometry::BBox;
pub use glyph::{glyph_text, Glyph, SentenceSpan};
pub use raw::{
    parse_block_entry, BlockEntry, BlockField, BlockKind, ImageRef, RawBlock, RawLine,
    RawPageText, RawSpan,
};
pub use table::{ParsedTable, TableGrid};
