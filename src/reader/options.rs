//! Extraction options and configuration.

use std::ops::RangeInclusive;

use crate::analysis::{ClassifierConfig, MergeConfig, ReconstructConfig};
use crate::error::{Error, Result};

/// Options for extracting fragments from a document.
#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Error handling mode
    pub error_mode: ErrorMode,

    /// Whether to transform pages in parallel
    pub parallel: bool,

    /// Page selection (which pages to extract)
    pub pages: PageSelection,

    /// Password for encrypted documents
    pub password: Option<String>,

    /// What the text extractor emits
    pub text_mode: TextMode,

    /// Formula classifier thresholds
    pub classifier: ClassifierConfig,

    /// Fragment merge tolerances
    pub merge: MergeConfig,

    /// Sentence line bucketing
    pub reconstruct: ReconstructConfig,
}

impl ExtractOptions {
    /// Create new extract options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set error mode.
    pub fn with_error_mode(mut self, mode: ErrorMode) -> Self {
        self.error_mode = mode;
        self
    }

    /// Enable lenient mode (skip pages that fail to read).
    pub fn lenient(mut self) -> Self {
        self.error_mode = ErrorMode::Lenient;
        self
    }

    /// Enable or disable parallel page processing.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Disable parallel processing.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Set page selection.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.pages = pages;
        self
    }

    /// Set password for encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the text extraction mode.
    pub fn with_text_mode(mut self, mode: TextMode) -> Self {
        self.text_mode = mode;
        self
    }

    /// Set classifier configuration.
    pub fn with_classifier(mut self, config: ClassifierConfig) -> Self {
        self.classifier = config;
        self
    }

    /// Set merge configuration.
    pub fn with_merge(mut self, config: MergeConfig) -> Self {
        self.merge = config;
        self
    }

    /// Set sentence reconstruction configuration.
    pub fn with_reconstruct(mut self, config: ReconstructConfig) -> Self {
        self.reconstruct = config;
        self
    }
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            error_mode: ErrorMode::Strict,
            parallel: true,
            pages: PageSelection::All,
            password: None,
            text_mode: TextMode::Blocks,
            classifier: ClassifierConfig::default(),
            merge: MergeConfig::default(),
            reconstruct: ReconstructConfig::default(),
        }
    }
}

/// Error handling mode for per-page reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Fail on the first page that cannot be read
    #[default]
    Strict,
    /// Log and skip pages that cannot be read
    Lenient,
}

/// What the text extractor emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    /// One fragment per non-empty text block
    #[default]
    Blocks,
    /// One fragment per visual line of each sentence
    Sentences,
}

/// Page selection for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PageSelection {
    /// All pages
    #[default]
    All,
    /// A range of pages (inclusive, 1-indexed)
    Range(RangeInclusive<u32>),
    /// Specific pages (1-indexed, ascending)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number is selected.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Selected pages of a document with `page_count` pages, ascending.
    ///
    /// Explicitly named pages past the end of the document are an error;
    /// a range is clipped to the document.
    pub fn resolve(&self, page_count: u32) -> Result<Vec<u32>> {
        match self {
            PageSelection::All => Ok((1..=page_count).collect()),
            PageSelection::Range(range) => {
                if *range.start() > page_count {
                    return Err(Error::PageOutOfRange(*range.start(), page_count));
                }
                Ok((*range.start()..=(*range.end()).min(page_count)).collect())
            }
            PageSelection::Pages(pages) => {
                if let Some(&bad) = pages.iter().find(|p| **p == 0 || **p > page_count) {
                    return Err(Error::PageOutOfRange(bad, page_count));
                }
                Ok(pages.clone())
            }
        }
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10", "all").
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(PageSelection::All);
        }

        let invalid = || Error::InvalidPageRange(s.to_string());
        let page = |p: &str| -> Result<u32> {
            match p.trim().parse::<u32>() {
                Ok(0) | Err(_) => Err(invalid()),
                Ok(n) => Ok(n),
            }
        };

        // Simple range (e.g., "1-10")
        if let Some((start, end)) = s.split_once('-') {
            if !s.contains(',') {
                let (start, end) = (page(start)?, page(end)?);
                if start > end {
                    return Err(invalid());
                }
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            match part.split_once('-') {
                Some((start, end)) => {
                    let (start, end) = (page(start)?, page(end)?);
                    if start > end {
                        return Err(invalid());
                    }
                    pages.extend(start..=end);
                }
                None => pages.push(page(part)?),
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
