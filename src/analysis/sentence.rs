//! Glyph-to-sentence reconstruction.
//!
//! A sentence drawn across several visual lines becomes one fragment per
//! line: every fragment carries the whole sentence, and its box covers only
//! that line's glyphs.

use crate::model::{BBox, Fragment, Glyph, SentenceSpan};

/// Sentence reconstruction settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconstructConfig {
    /// Quantization step for glyph top edges; glyphs in one step share a line
    pub line_bucket: f32,
}

impl Default for ReconstructConfig {
    fn default() -> Self {
        Self { line_bucket: 2.0 }
    }
}

impl ReconstructConfig {
    /// Set the line bucket step.
    pub fn with_line_bucket(mut self, step: f32) -> Self {
        self.line_bucket = step;
        self
    }
}

/// Maps sentence spans back onto the glyphs that draw them.
#[derive(Debug, Clone, Default)]
pub struct SentenceReconstructor {
    config: ReconstructConfig,
}

impl SentenceReconstructor {
    /// Create a reconstructor.
    pub fn new(config: ReconstructConfig) -> Self {
        Self { config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ReconstructConfig {
        &self.config
    }

    /// One text fragment per visual line of every sentence, in span order.
    pub fn reconstruct(
        &self,
        glyphs: &[Glyph],
        spans: &[SentenceSpan],
        page: u32,
    ) -> Vec<Fragment> {
        spans
            .iter()
            .flat_map(|span| self.reconstruct_sentence(glyphs, span, page))
            .collect()
    }

    /// Line fragments for a single sentence.
    ///
    /// Spans reaching past the glyph stream are clipped; a span with no glyphs
    /// or blank text yields nothing.
    pub fn reconstruct_sentence(
        &self,
        glyphs: &[Glyph],
        span: &SentenceSpan,
        page: u32,
    ) -> Vec<Fragment> {
        let end = span.end.min(glyphs.len());
        if span.start >= end {
            return Vec::new();
        }
        let text = span.text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        self.line_boxes(&glyphs[span.start..end])
            .into_iter()
            .map(|bbox| Fragment::text(text, bbox, page))
            .collect()
    }

    /// Union box per line bucket, in order of first appearance.
    fn line_boxes(&self, glyphs: &[Glyph]) -> Vec<BBox> {
        let mut lines: Vec<(i64, BBox)> = Vec::new();
        for glyph in glyphs {
            let key = self.bucket(glyph.bbox.y0);
            match lines.iter_mut().find(|(k, _)| *k == key) {
                Some((_, bbox)) => *bbox = bbox.union(&glyph.bbox),
                None => lines.push((key, glyph.bbox)),
            }
        }
        lines.into_iter().map(|(_, bbox)| bbox).collect()
    }

    fn bucket(&self, y: f32) -> i64 {
        let step = if self.config.line_bucket > 0.0 {
            self.config.line_bucket
        } else {
            1.0
        };
        (y / step).round() as i64
    }
}
