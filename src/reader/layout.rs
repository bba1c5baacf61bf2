//! Grouping of positioned glyphs into spans, lines and blocks.
//!
//! Glyphs are consumed in emission order; nothing is re-sorted, so the block
//! structure follows the producer's drawing order the way a reader's native
//! text listing does.

use crate::model::{BBox, BlockKind, RawBlock, RawLine, RawPageText, RawSpan};

use super::interpreter::{PageScan, PositionedGlyph};

/// Baseline drift, as a fraction of font size, that starts a new line.
const LINE_TOLERANCE_FACTOR: f32 = 0.3;

/// Horizontal gap, as a multiple of font size, that splits a span.
const SPAN_GAP_FACTOR: f32 = 1.0;

/// Line spacing assumed when a block has fewer than two distinct lines.
const DEFAULT_LINE_SPACING: f32 = 12.0;

/// Paragraph-break thresholds.
const SPACING_BREAK_FACTOR: f32 = 1.5;
const FONT_SIZE_BREAK: f32 = 1.0;
const MARGIN_BREAK: f32 = 20.0;

/// A line under construction, with the baseline and size it was started with.
struct LineBuilder {
    baseline: f32,
    size: f32,
    spans: Vec<RawSpan>,
}

impl LineBuilder {
    fn start(g: &PositionedGlyph) -> Self {
        Self {
            baseline: g.baseline,
            size: g.size,
            spans: vec![new_span(g)],
        }
    }

    fn last_glyph_box(&self) -> Option<BBox> {
        self.spans
            .last()
            .and_then(|s| s.chars.last())
            .map(|g| g.bbox)
    }

    /// Whether `g` belongs on this line.
    fn accepts(&self, g: &PositionedGlyph) -> bool {
        let tolerance = self.size.max(g.size) * LINE_TOLERANCE_FACTOR;
        if (g.baseline - self.baseline).abs() > tolerance {
            return false;
        }
        // A jump back to the left edge is a new line even on the same baseline.
        match self.last_glyph_box() {
            Some(prev) => g.glyph.bbox.x0 >= prev.x0 - g.size,
            None => true,
        }
    }

    fn push(&mut self, g: &PositionedGlyph) {
        let split = match (self.spans.last(), self.last_glyph_box()) {
            (Some(span), Some(prev)) => {
                span.font != g.font
                    || (span.size - g.size).abs() > f32::EPSILON
                    || g.glyph.bbox.x0 - prev.x1 > g.size * SPAN_GAP_FACTOR
            }
            _ => true,
        };

        if split {
            self.spans.push(new_span(g));
        } else if let Some(span) = self.spans.last_mut() {
            span.bbox = span.bbox.union(&g.glyph.bbox);
            span.chars.push(g.glyph);
        }
    }

    fn finish(self) -> Option<(f32, f32, RawLine)> {
        let bbox = BBox::union_all(self.spans.iter().map(|s| &s.bbox))?;
        Some((
            self.baseline,
            self.size,
            RawLine {
                bbox,
                spans: self.spans,
            },
        ))
    }
}

fn new_span(g: &PositionedGlyph) -> RawSpan {
    RawSpan {
        font: g.font.clone(),
        size: g.size,
        bbox: g.glyph.bbox,
        chars: vec![g.glyph],
    }
}

/// A finished line with the metrics block breaking looks at.
struct MeasuredLine {
    baseline: f32,
    size: f32,
    line: RawLine,
}

/// Group glyphs into lines, in emission order.
fn group_lines(glyphs: &[PositionedGlyph]) -> Vec<MeasuredLine> {
    let mut lines = Vec::new();
    let mut current: Option<LineBuilder> = None;

    for g in glyphs {
        match current.as_mut() {
            Some(line) if line.accepts(g) => line.push(g),
            _ => {
                if let Some((baseline, size, line)) = current.take().and_then(LineBuilder::finish) {
                    lines.push(MeasuredLine {
                        baseline,
                        size,
                        line,
                    });
                }
                current = Some(LineBuilder::start(g));
            }
        }
    }
    if let Some((baseline, size, line)) = current.and_then(LineBuilder::finish) {
        lines.push(MeasuredLine {
            baseline,
            size,
            line,
        });
    }

    lines
}

/// Average distance between consecutive baselines.
fn average_line_spacing(lines: &[MeasuredLine]) -> f32 {
    let spacings: Vec<f32> = lines
        .windows(2)
        .map(|w| (w[1].baseline - w[0].baseline).abs())
        .filter(|s| *s > 0.1)
        .collect();

    if spacings.is_empty() {
        return DEFAULT_LINE_SPACING;
    }
    spacings.iter().sum::<f32>() / spacings.len() as f32
}

fn should_break_block(prev: &MeasuredLine, curr: &MeasuredLine, avg_spacing: f32) -> bool {
    // Moving up the page means a new column or a new flow.
    if curr.baseline < prev.baseline {
        return true;
    }

    if curr.baseline - prev.baseline > avg_spacing * SPACING_BREAK_FACTOR {
        return true;
    }

    if (prev.size - curr.size).abs() > FONT_SIZE_BREAK {
        return true;
    }

    (prev.line.bbox.x0 - curr.line.bbox.x0).abs() > MARGIN_BREAK
}

/// Build the page's text structure from one content-stream scan.
///
/// Text blocks come first in drawing order, followed by one image block per
/// image placement.
pub(crate) fn build_page_text(scan: &PageScan, width: f32, height: f32) -> RawPageText {
    let lines = group_lines(&scan.glyphs);
    let avg_spacing = average_line_spacing(&lines);

    let mut grouped: Vec<Vec<MeasuredLine>> = Vec::new();
    for line in lines {
        let start_new = match grouped.last().and_then(|b| b.last()) {
            Some(prev) => should_break_block(prev, &line, avg_spacing),
            None => true,
        };
        if start_new {
            grouped.push(vec![line]);
        } else if let Some(block) = grouped.last_mut() {
            block.push(line);
        }
    }

    let mut blocks: Vec<RawBlock> = grouped
        .into_iter()
        .filter_map(|lines| {
            let bbox = BBox::union_all(lines.iter().map(|l| &l.line.bbox))?;
            Some(RawBlock {
                number: 0,
                kind: BlockKind::Text,
                bbox,
                lines: lines.into_iter().map(|l| l.line).collect(),
            })
        })
        .collect();

    blocks.extend(scan.placements.iter().map(|p| RawBlock {
        number: 0,
        kind: BlockKind::Image,
        bbox: p.bbox,
        lines: Vec::new(),
    }));

    for (i, block) in blocks.iter_mut().enumerate() {
        block.number = i;
    }

    log::debug!(
        "Layout: {} glyphs -> {} blocks ({} images)",
        scan.glyphs.len(),
        blocks.len(),
        scan.placements.len()
    );

    RawPageText {
        width,
        height,
        blocks,
    }
}
