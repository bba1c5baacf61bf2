//! # sempdf
//!
//! Semantic reconstruction of PDF content from positioned fragments.
//!
//! This library reads the positioned text, glyphs and image placements of a
//! PDF and turns them into classified, located [`Fragment`]s: prose blocks or
//! sentence lines, merged multi-part formulas, image placements and tables,
//! each with a bounding box and page number.
//!
//! ## Quick Start
//!
//! ```no_run
//! use sempdf::{extract_file, render, FragmentKind};
//!
//! fn main() -> sempdf::Result<()> {
//!     // Formulas, with multi-line formulas merged into one fragment
//!     let formulas = extract_file("paper.pdf", FragmentKind::Formula)?;
//!
//!     let json = render::to_json(&formulas, render::JsonFormat::Pretty)?;
//!     println!("{}", json);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Formula detection**: symbol and word-density heuristics, no model
//! - **Fragment merging**: vertically stacked and same-line parts are joined
//! - **Sentence boxes**: one box per visual line of each sentence
//! - **Tables**: stream-mode detection from text alignment
//! - **Parallel processing**: Uses Rayon for per-page analysis
//! - **Overlay**: annotated copies for visual verification

pub mod analysis;
pub mod error;
pub mod extract;
pub mod model;
pub mod reader;
pub mod render;

#[cfg(feature = "ffi")]
pub mod ffi;

// Re-export commonly used types
pub use analysis::{ClassifierConfig, FormulaClassifier, FragmentMerger, MergeConfig};
pub use error::{Error, Result};
pub use extract::{
    Extractor, ExtractorRegistry, FormulaExtractor, ImageExtractor, TableExtractor,
    TextExtractor,
};
pub use model::{BBox, Fragment, FragmentContent, FragmentKind, TableGrid};
pub use reader::{
    DocumentReader, ErrorMode, ExtractOptions, LopdfBackend, PageSelection, TextMode,
};
pub use render::JsonFormat;

use std::path::Path;

/// Extract fragments of one kind from a PDF file.
///
/// # Arguments
///
/// * `path` - Path to the PDF file
/// * `kind` - Which fragments to extract
///
/// # Example
///
/// ```no_run
/// use sempdf::{extract_file, FragmentKind};
///
/// let images = extract_file("paper.pdf", FragmentKind::Image).unwrap();
/// for image in &images {
///     println!("xref {:?} on page {} at {}", image.xref, image.page, image.bbox);
/// }
/// ```
pub fn extract_file<P: AsRef<Path>>(path: P, kind: FragmentKind) -> Result<Vec<Fragment>> {
    extract_file_with_options(path, kind, ExtractOptions::default())
}

/// Extract fragments of one kind with custom options.
///
/// # Example
///
/// ```no_run
/// use sempdf::{extract_file_with_options, ExtractOptions, FragmentKind, TextMode};
///
/// let options = ExtractOptions::new()
///     .lenient()
///     .with_text_mode(TextMode::Sentences);
/// let sentences = extract_file_with_options("paper.pdf", FragmentKind::Text, options).unwrap();
/// ```
pub fn extract_file_with_options<P: AsRef<Path>>(
    path: P,
    kind: FragmentKind,
    options: ExtractOptions,
) -> Result<Vec<Fragment>> {
    ExtractorRegistry::with_options(options).extract(path, kind)
}

/// Extract every kind of fragment: text, then formulas, images and tables.
///
/// # Example
///
/// ```no_run
/// let fragments = sempdf::extract_all("paper.pdf").unwrap();
/// println!("{} fragments", fragments.len());
/// ```
pub fn extract_all<P: AsRef<Path>>(path: P) -> Result<Vec<Fragment>> {
    ExtractorRegistry::with_defaults().extract_all(path)
}

/// Extract every kind of fragment and serialize the list as JSON.
///
/// # Example
///
/// ```no_run
/// use sempdf::{to_json, JsonFormat};
///
/// let json = to_json("paper.pdf", JsonFormat::Pretty).unwrap();
/// std::fs::write("fragments.json", json).unwrap();
/// ```
pub fn to_json<P: AsRef<Path>>(path: P, format: JsonFormat) -> Result<String> {
    let fragments = extract_all(path)?;
    render::to_json(&fragments, format)
}

/// Extract fragments on tokio's blocking pool.
///
/// # Example
///
/// ```no_run
/// # async fn run() -> sempdf::Result<()> {
/// use sempdf::{extract_file_async, ExtractOptions, FragmentKind};
///
/// let tables = extract_file_async("paper.pdf", FragmentKind::Table, ExtractOptions::new()).await?;
/// # Ok(())
/// # }
/// ```
#[cfg(feature = "async")]
pub async fn extract_file_async<P: AsRef<Path>>(
    path: P,
    kind: FragmentKind,
    options: ExtractOptions,
) -> Result<Vec<Fragment>> {
    let path = path.as_ref().to_path_buf();
    tokio::task::spawn_blocking(move || extract_file_with_options(path, kind, options))
        .await
        .map_err(|e| Error::Other(format!("Extraction task failed: {}", e)))?
}

/// Builder for extracting fragments from PDF documents.
///
/// # Example
///
/// ```no_run
/// use sempdf::{FragmentKind, MergeConfig, PageSelection, Sempdf};
///
/// let formulas = Sempdf::new()
///     .lenient()
///     .with_pages(PageSelection::Range(1..=10))
///     .with_merge_config(MergeConfig::default().with_vertical_tolerance(8.0))
///     .extract("paper.pdf", FragmentKind::Formula)?;
/// # Ok::<(), sempdf::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Sempdf {
    options: ExtractOptions,
}

impl Sempdf {
    /// Create a new builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Skip pages that cannot be read instead of failing.
    pub fn lenient(mut self) -> Self {
        self.options = self.options.lenient();
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.options = self.options.sequential();
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options = self.options.with_pages(pages);
        self
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.options = self.options.with_password(password);
        self
    }

    /// Choose between block and sentence text fragments.
    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.options = self.options.with_text_mode(mode);
        self
    }

    /// Set the formula merge tolerances.
    pub fn with_merge_config(mut self, config: MergeConfig) -> Self {
        self.options = self.options.with_merge(config);
        self
    }

    /// Set the formula classifier thresholds.
    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.options = self.options.with_classifier(config);
        self
    }

    /// Get the accumulated options.
    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract fragments of one kind.
    pub fn extract<P: AsRef<Path>>(&self, path: P, kind: FragmentKind) -> Result<Vec<Fragment>> {
        extract_file_with_options(path, kind, self.options.clone())
    }

    /// Extract every kind of fragment.
    pub fn extract_all<P: AsRef<Path>>(&self, path: P) -> Result<Vec<Fragment>> {
        ExtractorRegistry::with_options(self.options.clone()).extract_all(path)
    }
}
