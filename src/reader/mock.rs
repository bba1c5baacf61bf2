//! In-memory reader for unit tests.

use std::cell::Cell;
use std::collections::{BTreeSet, HashMap};

use crate::error::{Error, Result};
use crate::model::{BBox, BlockEntry, BlockField, ImageRef, RawPageText};

use super::DocumentReader;

/// One page of canned reader output.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockPage {
    pub blocks: Vec<BlockEntry>,
    pub text: RawPageText,
    pub images: Vec<ImageRef>,
    pub placements: HashMap<u32, Vec<BBox>>,
}

impl MockPage {
    /// Add a well-formed block listing entry.
    pub fn block(mut self, text: &str, bbox: (f32, f32, f32, f32)) -> Self {
        let number = self.blocks.len() as f32;
        self.blocks.push(vec![
            BlockField::Number(bbox.0),
            BlockField::Number(bbox.1),
            BlockField::Number(bbox.2),
            BlockField::Number(bbox.3),
            BlockField::Text(text.to_string()),
            BlockField::Number(number),
            BlockField::Number(0.0),
        ]);
        self
    }

    /// Add a raw entry as-is.
    pub fn entry(mut self, entry: BlockEntry) -> Self {
        self.blocks.push(entry);
        self
    }

    /// Add an image with its placements.
    pub fn image(mut self, xref: u32, placements: Vec<BBox>) -> Self {
        self.images.push(ImageRef {
            xref,
            name: format!("Im{xref}"),
            width: None,
            height: None,
        });
        self.placements.insert(xref, placements);
        self
    }

    /// Set the glyph structure.
    pub fn text(mut self, text: RawPageText) -> Self {
        self.text = text;
        self
    }
}

/// Canned pages; pages listed in `failing` return a parse error.
#[derive(Debug, Clone, Default)]
pub(crate) struct MockReader {
    pub pages: Vec<MockPage>,
    pub failing: BTreeSet<u32>,
    /// Calls to `page_placements`
    pub placement_scans: Cell<usize>,
}

impl MockReader {
    pub fn new(pages: Vec<MockPage>) -> Self {
        Self {
            pages,
            failing: BTreeSet::new(),
            placement_scans: Cell::new(0),
        }
    }

    pub fn failing_on(mut self, page: u32) -> Self {
        self.failing.insert(page);
        self
    }

    fn page(&self, page: u32) -> Result<&MockPage> {
        if self.failing.contains(&page) {
            return Err(Error::PdfParse(format!("broken page {page}")));
        }
        page.checked_sub(1)
            .and_then(|i| self.pages.get(i as usize))
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }
}

impl DocumentReader for MockReader {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_blocks(&self, page: u32) -> Result<Vec<BlockEntry>> {
        Ok(self.page(page)?.blocks.clone())
    }

    fn page_text(&self, page: u32) -> Result<RawPageText> {
        Ok(self.page(page)?.text.clone())
    }

    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>> {
        Ok(self.page(page)?.images.clone())
    }

    fn page_placements(&self, page: u32) -> Result<HashMap<u32, Vec<BBox>>> {
        self.placement_scans.set(self.placement_scans.get() + 1);
        Ok(self.page(page)?.placements.clone())
    }
}
