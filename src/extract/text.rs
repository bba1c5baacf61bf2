//! Prose extraction.

use std::path::Path;
use std::sync::Arc;

use super::{run_pages, Extractor};
use crate::analysis::{RuleSegmenter, SentenceReconstructor, SentenceSegmenter};
use crate::error::Result;
use crate::model::{
    glyph_text, parse_block_entry, BlockEntry, Fragment, FragmentKind, RawPageText,
};
use crate::reader::{self, DocumentReader, ExtractOptions, TextMode};

/// Emits prose as text fragments.
///
/// In [`TextMode::Blocks`] every non-empty block becomes one fragment. In
/// [`TextMode::Sentences`] the page's glyph stream is segmented into
/// sentences and each sentence yields one fragment per visual line.
#[derive(Clone)]
pub struct TextExtractor {
    options: ExtractOptions,
    segmenter: Arc<dyn SentenceSegmenter>,
}

impl TextExtractor {
    /// Create a text extractor with the rule-based segmenter.
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            options,
            segmenter: Arc::new(RuleSegmenter::new()),
        }
    }

    /// Replace the sentence segmenter.
    pub fn with_segmenter<S: SentenceSegmenter + 'static>(mut self, segmenter: S) -> Self {
        self.segmenter = Arc::new(segmenter);
        self
    }

    /// Get the options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from an open document.
    pub fn extract_from(&self, reader: &dyn DocumentReader) -> Result<Vec<Fragment>> {
        match self.options.text_mode {
            TextMode::Blocks => run_pages(
                reader,
                &self.options,
                |r, page| r.page_blocks(page),
                |page, entries: Vec<BlockEntry>| block_fragments(&entries, page),
            ),
            TextMode::Sentences => {
                let reconstructor = SentenceReconstructor::new(self.options.reconstruct.clone());
                run_pages(
                    reader,
                    &self.options,
                    |r, page| r.page_text(page),
                    |page, text: RawPageText| {
                        let glyphs = text.glyphs();
                        let spans = self.segmenter.segment(&glyph_text(&glyphs));
                        reconstructor.reconstruct(&glyphs, &spans, page)
                    },
                )
            }
        }
    }
}

/// One text fragment per well-formed, non-blank block.
fn block_fragments(entries: &[BlockEntry], page: u32) -> Vec<Fragment> {
    let mut skipped = 0;
    let fragments: Vec<Fragment> = entries
        .iter()
        .filter_map(|entry| {
            let parsed = parse_block_entry(entry);
            if parsed.is_none() {
                skipped += 1;
            }
            parsed
        })
        .filter_map(|(bbox, text)| {
            let text = text.trim();
            (!text.is_empty()).then(|| Fragment::text(text, bbox, page))
        })
        .collect();

    if skipped > 0 {
        log::debug!("Page {}: skipped {} malformed block entries", page, skipped);
    }
    fragments
}

impl Extractor for TextExtractor {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Text
    }

    fn name(&self) -> &str {
        match self.options.text_mode {
            TextMode::Blocks => "text",
            TextMode::Sentences => "sentences",
        }
    }

    fn extract(&self, path: &Path) -> Result<Vec<Fragment>> {
        let backend = reader::open(path, &self.options)?;
        self.extract_from(&backend)
    }
}

impl std::fmt::Debug for TextExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextExtractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
