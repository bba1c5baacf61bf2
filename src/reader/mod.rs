//! PDF reading: the positioned-content boundary the analysis layer consumes.

mod backend;
pub(crate) mod header;
pub(crate) mod interpreter;
mod layout;
#[cfg(test)]
pub(crate) mod mock;
mod options;

use std::collections::HashMap;
use std::path::Path;

pub use backend::{DocumentInfo, LopdfBackend};
pub use options::{ErrorMode, ExtractOptions, PageSelection, TextMode};

use crate::error::Result;
use crate::model::{BBox, BlockEntry, ImageRef, RawPageText};

/// Per-page access to a document's positioned content.
///
/// Page numbers are 1-indexed. Implementations need not be thread-safe:
/// extractors read every page they need before fanning work out.
pub trait DocumentReader {
    /// Number of pages in the document.
    fn page_count(&self) -> u32;

    /// Block listing: `(x0, y0, x1, y1, text, block_no, block_type)` entries.
    fn page_blocks(&self, page: u32) -> Result<Vec<BlockEntry>>;

    /// Blocks → lines → spans → chars, including image blocks.
    fn page_text(&self, page: u32) -> Result<RawPageText>;

    /// Images referenced from the page.
    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>>;

    /// Every image placement on the page, keyed by image xref, in drawing order.
    fn page_placements(&self, page: u32) -> Result<HashMap<u32, Vec<BBox>>>;

    /// Every place the image `xref` is drawn on the page.
    fn image_placements(&self, page: u32, xref: u32) -> Result<Vec<BBox>> {
        Ok(self
            .page_placements(page)?
            .remove(&xref)
            .unwrap_or_default())
    }
}

/// Open a document for extraction.
pub fn open<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<LopdfBackend> {
    LopdfBackend::open_with_password(path, options.password.as_deref())
}
