//! Extractors: one per fragment kind, behind a common trait.
//!
//! Each extractor owns its document handle for the duration of one call. Raw
//! page data is read sequentially, then transformed page by page, in
//! parallel when enabled. Output is always in page order.

mod formula;
mod image;
mod table;
mod text;

use std::collections::BTreeMap;
use std::path::Path;

use rayon::prelude::*;

pub use formula::FormulaExtractor;
pub use image::ImageExtractor;
pub use table::TableExtractor;
pub use text::TextExtractor;

use crate::error::{Error, Result};
use crate::model::{Fragment, FragmentKind};
use crate::reader::{DocumentReader, ErrorMode, ExtractOptions};

/// Produces fragments of one kind from a document on disk.
pub trait Extractor: Send + Sync {
    /// Kind of fragment this extractor emits.
    fn kind(&self) -> FragmentKind;

    /// Short name, for logs.
    fn name(&self) -> &str;

    /// Extract every fragment of this kind, in page order.
    fn extract(&self, path: &Path) -> Result<Vec<Fragment>>;
}

/// Read the selected pages one after another, then transform them.
///
/// A page that fails to read aborts the run in strict mode and is logged and
/// skipped in lenient mode.
pub(crate) fn run_pages<T, R, F>(
    reader: &dyn DocumentReader,
    options: &ExtractOptions,
    read: R,
    transform: F,
) -> Result<Vec<Fragment>>
where
    T: Send,
    R: Fn(&dyn DocumentReader, u32) -> Result<T>,
    F: Fn(u32, T) -> Vec<Fragment> + Send + Sync,
{
    let pages = options.pages.resolve(reader.page_count())?;

    let mut inputs = Vec::with_capacity(pages.len());
    for page in pages {
        match read(reader, page) {
            Ok(data) => inputs.push((page, data)),
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("Skipping page {}: {}", page, e);
            }
            Err(e) => return Err(e),
        }
    }

    let per_page: Vec<Vec<Fragment>> = if options.parallel {
        inputs
            .into_par_iter()
            .map(|(page, data)| transform(page, data))
            .collect()
    } else {
        inputs
            .into_iter()
            .map(|(page, data)| transform(page, data))
            .collect()
    };

    Ok(per_page.into_iter().flatten().collect())
}

/// Extractors keyed by the kind they produce.
#[derive(Default)]
pub struct ExtractorRegistry {
    extractors: BTreeMap<FragmentKind, Box<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the four built-in extractors and default options.
    pub fn with_defaults() -> Self {
        Self::with_options(ExtractOptions::default())
    }

    /// Registry with the four built-in extractors sharing `options`.
    pub fn with_options(options: ExtractOptions) -> Self {
        let mut registry = Self::new();
        registry.register(TextExtractor::new(options.clone()));
        registry.register(FormulaExtractor::new(options.clone()));
        registry.register(ImageExtractor::new(options.clone()));
        registry.register(TableExtractor::new(options));
        registry
    }

    /// Register an extractor, replacing any previous one for its kind.
    pub fn register<E>(&mut self, extractor: E) -> Option<Box<dyn Extractor>>
    where
        E: Extractor + 'static,
    {
        self.extractors.insert(extractor.kind(), Box::new(extractor))
    }

    /// Extractor for a kind.
    pub fn get(&self, kind: FragmentKind) -> Option<&dyn Extractor> {
        self.extractors.get(&kind).map(|e| e.as_ref())
    }

    /// Registered kinds, in combined-output order.
    pub fn kinds(&self) -> Vec<FragmentKind> {
        self.extractors.keys().copied().collect()
    }

    /// Run the extractor for one kind.
    pub fn extract<P: AsRef<Path>>(&self, path: P, kind: FragmentKind) -> Result<Vec<Fragment>> {
        let extractor = self
            .get(kind)
            .ok_or_else(|| Error::UnsupportedKind(kind.to_string()))?;
        let fragments = extractor.extract(path.as_ref())?;
        log::debug!("{}: {} fragments", extractor.name(), fragments.len());
        Ok(fragments)
    }

    /// Run every registered extractor and concatenate the results.
    ///
    /// Extractors run concurrently; the output is ordered text, formula,
    /// image, table. The first failure, in that order, is returned.
    pub fn extract_all<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Fragment>> {
        let path = path.as_ref();
        let results: Vec<Result<Vec<Fragment>>> = self
            .extractors
            .par_iter()
            .map(|(_, extractor)| extractor.extract(path))
            .collect();

        let mut fragments = Vec::new();
        for result in results {
            fragments.extend(result?);
        }
        Ok(fragments)
    }
}

impl std::fmt::Debug for ExtractorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractorRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}
