//! Formula extraction: classify blocks, then merge multi-part formulas.

use std::path::Path;

use super::{run_pages, Extractor};
use crate::analysis::{FormulaClassifier, FragmentMerger};
use crate::error::Result;
use crate::model::{parse_block_entry, BlockEntry, Fragment, FragmentKind};
use crate::reader::{self, DocumentReader, ExtractOptions};

/// Emits merged formula fragments.
#[derive(Debug, Clone)]
pub struct FormulaExtractor {
    options: ExtractOptions,
    classifier: FormulaClassifier,
    merger: FragmentMerger,
}

impl FormulaExtractor {
    /// Create a formula extractor; thresholds come from `options`.
    pub fn new(options: ExtractOptions) -> Self {
        Self {
            classifier: FormulaClassifier::new(options.classifier.clone()),
            merger: FragmentMerger::new(options.merge.clone()),
            options,
        }
    }

    /// Get the options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract from an open document.
    pub fn extract_from(&self, reader: &dyn DocumentReader) -> Result<Vec<Fragment>> {
        run_pages(
            reader,
            &self.options,
            |r, page| r.page_blocks(page),
            |page, entries: Vec<BlockEntry>| self.page_formulas(&entries, page),
        )
    }

    /// Classified and merged formulas of one page.
    fn page_formulas(&self, entries: &[BlockEntry], page: u32) -> Vec<Fragment> {
        let candidates: Vec<Fragment> = entries
            .iter()
            .filter_map(|entry| parse_block_entry(entry))
            .filter_map(|(bbox, text)| {
                let text = text.trim();
                (!text.is_empty() && self.classifier.is_formula(text))
                    .then(|| Fragment::formula(text, bbox, page))
            })
            .collect();

        log::debug!(
            "Page {}: {} of {} blocks classified as formulas",
            page,
            candidates.len(),
            entries.len()
        );
        self.merger.merge(candidates)
    }
}

impl Extractor for FormulaExtractor {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Formula
    }

    fn name(&self) -> &str {
        "formula"
    }

    fn extract(&self, path: &Path) -> Result<Vec<Fragment>> {
        let backend = reader::open(path, &self.options)?;
        self.extract_from(&backend)
    }
}
