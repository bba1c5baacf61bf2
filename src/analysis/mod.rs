//! Semantic analysis over reader output.
//!
//! Everything here except table parsing is pure: classification, merging,
//! reconstruction and segmentation take values and return values.

mod classifier;
mod merge;
mod segmenter;
mod sentence;
mod table;

pub use classifier::{
    classify, ClassifierConfig, FormulaClassifier, DEFAULT_OPERATORS, DEFAULT_SYMBOLS,
};
pub use merge::{merge, FragmentMerger, MergeConfig};
pub use segmenter::{RuleSegmenter, SentenceSegmenter};
pub use sentence::{ReconstructConfig, SentenceReconstructor};
pub use table::{
    page_chunks, StreamTableParser, TableDetectorConfig, TableParser, TextChunk,
};
