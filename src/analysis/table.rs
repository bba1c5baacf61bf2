//! Stream-mode table detection.
//!
//! Tables are found from text alignment alone, without ruling lines: chunks
//! of text are grouped into rows, left edges that line up across rows become
//! column edges, and runs of rows that follow those edges become tables.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{BBox, BlockKind, Glyph, ParsedTable, RawPageText, RawSpan, TableGrid};
use crate::reader::{DocumentReader, LopdfBackend};

/// Parses the tables of a document.
pub trait TableParser: Send + Sync {
    /// Every table in the document, with its page and bounding box.
    fn parse(&self, path: &Path) -> Result<Vec<ParsedTable>>;

    /// Every table in an already open document.
    ///
    /// Parsers that only work from a file keep this default, which fails.
    fn parse_reader(&self, reader: &dyn DocumentReader) -> Result<Vec<ParsedTable>> {
        let _ = reader;
        Err(Error::TableParse(
            "parser cannot read an open document".to_string(),
        ))
    }
}

/// Table detector configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Minimum number of rows to consider as table
    pub min_rows: usize,
    /// Minimum number of columns to consider as table
    pub min_columns: usize,
    /// Maximum number of columns (above this, likely word-level splitting)
    pub max_columns: usize,
    /// Row tolerance as a fraction of font size
    pub row_tolerance_factor: f32,
    /// Minimum column alignment ratio (0.0-1.0)
    pub min_alignment_ratio: f32,
    /// Minimum gap between columns (points)
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            row_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Left edges within this many points share a bucket.
const EDGE_BUCKET: f32 = 5.0;

/// How far a chunk may sit from a column edge and still align with it.
const ALIGN_TOLERANCE: f32 = 5.0;

/// Slack before a column's left edge when assigning cells.
const CELL_SLACK: f32 = 10.0;

/// Whitespace runs this long separate cells inside one span.
const CELL_SPACE_RUN: usize = 2;

/// A piece of text on one line that may form a table cell.
#[derive(Debug, Clone, PartialEq)]
pub struct TextChunk {
    pub text: String,
    pub bbox: BBox,
    pub size: f32,
}

/// Split a page's text spans into cell-sized chunks.
///
/// A span is cut at runs of two or more whitespace characters and at any
/// whitespace run at least one font size wide.
pub fn page_chunks(page: &RawPageText) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    for block in page.blocks.iter().filter(|b| b.kind == BlockKind::Text) {
        for line in &block.lines {
            for span in &line.spans {
                span_chunks(span, &mut chunks);
            }
        }
    }
    chunks
}

fn span_chunks(span: &RawSpan, out: &mut Vec<TextChunk>) {
    let mut current: Vec<&Glyph> = Vec::new();
    let mut blanks = 0;
    let mut blank_width = 0.0;

    for glyph in &span.chars {
        if glyph.c.is_whitespace() {
            blanks += 1;
            blank_width += glyph.bbox.width();
            current.push(glyph);
            continue;
        }
        if blanks >= CELL_SPACE_RUN || (blanks > 0 && blank_width >= span.size) {
            flush_chunk(&mut current, span.size, out);
        }
        blanks = 0;
        blank_width = 0.0;
        current.push(glyph);
    }
    flush_chunk(&mut current, span.size, out);
}

fn flush_chunk(glyphs: &mut Vec<&Glyph>, size: f32, out: &mut Vec<TextChunk>) {
    let text: String = glyphs.iter().map(|g| g.c).collect();
    let text = text.trim();
    let bbox = BBox::union_all(
        glyphs
            .iter()
            .filter(|g| !g.c.is_whitespace())
            .map(|g| &g.bbox),
    );
    if let (false, Some(bbox)) = (text.is_empty(), bbox) {
        out.push(TextChunk {
            text: text.to_string(),
            bbox,
            size,
        });
    }
    glyphs.clear();
}

/// Chunks sharing a row.
#[derive(Debug, Clone)]
struct Row {
    /// Average top edge
    top: f32,
    /// Chunks sorted by left edge
    chunks: Vec<TextChunk>,
}

/// Text-alignment table detector.
#[derive(Debug, Clone, Default)]
pub struct StreamTableParser {
    config: TableDetectorConfig,
    password: Option<String>,
}

impl StreamTableParser {
    /// Create a parser with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a parser with custom configuration.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self {
            config,
            password: None,
        }
    }

    /// Password used when opening encrypted documents.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &TableDetectorConfig {
        &self.config
    }

    /// Tables on one page, top to bottom.
    pub fn detect_page(&self, page: &RawPageText, page_number: u32) -> Vec<ParsedTable> {
        self.detect(page_chunks(page), page_number)
    }

    /// Tables among the given chunks.
    pub fn detect(&self, chunks: Vec<TextChunk>, page: u32) -> Vec<ParsedTable> {
        let min_chunks = self.config.min_rows * self.config.min_columns;
        if chunks.len() < min_chunks {
            log::debug!(
                "Table detection, page {}: not enough chunks ({} < {})",
                page,
                chunks.len(),
                min_chunks
            );
            return Vec::new();
        }

        let rows = self.group_rows(chunks);
        if rows.len() < self.config.min_rows {
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        if columns.len() < self.config.min_columns {
            log::debug!(
                "Table detection, page {}: {} column edges, no table",
                page,
                columns.len()
            );
            return Vec::new();
        }

        let regions = self.find_regions(&rows, &columns);
        log::debug!(
            "Table detection, page {}: {} rows, columns at {:?}, {} candidate regions",
            page,
            rows.len(),
            columns,
            regions.len()
        );

        regions
            .into_iter()
            .filter_map(|(start, end)| self.build_table(&rows[start..=end], page))
            .collect()
    }

    /// Turn a candidate region into a table, unless it turns out to be a list.
    fn build_table(&self, rows: &[Row], page: u32) -> Option<ParsedTable> {
        let columns = self.detect_columns(rows);
        if columns.len() < self.config.min_columns {
            return None;
        }
        if columns.len() > self.config.max_columns {
            log::debug!(
                "Table detection: skipping region with too many columns ({} > {})",
                columns.len(),
                self.config.max_columns
            );
            return None;
        }
        if is_list_pattern(rows, &columns) {
            log::debug!("Table detection: skipping region that reads as a list");
            return None;
        }

        let bbox = BBox::union_all(rows.iter().flat_map(|r| r.chunks.iter().map(|c| &c.bbox)))?;
        log::debug!(
            "Table on page {}: {} rows x {} columns, top {:.1}",
            page,
            rows.len(),
            columns.len(),
            rows[0].top
        );

        let mut grid = TableGrid::new();
        for row in rows {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
            for chunk in &row.chunks {
                let col = column_for(chunk.bbox.x0, &columns, bbox.x1);
                cells[col].push(&chunk.text);
            }
            grid.push_row(cells.into_iter().map(|c| c.join(" ")).collect());
        }

        Some(ParsedTable { grid, page, bbox })
    }

    /// Group chunks into rows, top to bottom.
    fn group_rows(&self, mut chunks: Vec<TextChunk>) -> Vec<Row> {
        chunks.sort_by(|a, b| a.bbox.reading_order(&b.bbox));

        let mut rows: Vec<Row> = Vec::new();
        let mut current: Vec<TextChunk> = Vec::new();
        let mut anchor: Option<f32> = None;

        for chunk in chunks {
            let tolerance = chunk.size * self.config.row_tolerance_factor;
            match anchor {
                Some(y) if (chunk.bbox.y0 - y).abs() <= tolerance => current.push(chunk),
                _ => {
                    if !current.is_empty() {
                        rows.push(finish_row(std::mem::take(&mut current)));
                    }
                    anchor = Some(chunk.bbox.y0);
                    current.push(chunk);
                }
            }
        }
        if !current.is_empty() {
            rows.push(finish_row(current));
        }

        rows
    }

    /// Column edges: left edges shared by enough rows.
    ///
    /// Rows with several chunks carry the column structure; when too few of
    /// them exist every row is counted instead.
    fn detect_columns(&self, rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|r| r.chunks.len() >= 2).collect();

        let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
        let considered = if multi.len() >= self.config.min_rows {
            for row in &multi {
                let buckets: BTreeSet<i32> =
                    row.chunks.iter().map(|c| edge_bucket(c.bbox.x0)).collect();
                for bucket in buckets {
                    *counts.entry(bucket).or_insert(0) += 1;
                }
            }
            multi.len()
        } else {
            for chunk in rows.iter().flat_map(|r| &r.chunks) {
                *counts.entry(edge_bucket(chunk.bbox.x0)).or_insert(0) += 1;
            }
            rows.len()
        };

        let min_occurrences =
            ((considered as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = Vec::new();
        for (bucket, count) in counts {
            if count < min_occurrences {
                continue;
            }
            let edge = bucket as f32 * EDGE_BUCKET;
            match edges.last() {
                Some(last) if edge - last < self.config.min_column_gap => {}
                _ => edges.push(edge),
            }
        }
        edges
    }

    /// Contiguous runs of at least `min_rows` well-aligned rows.
    fn find_regions(&self, rows: &[Row], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }
}

impl TableParser for StreamTableParser {
    fn parse(&self, path: &Path) -> Result<Vec<ParsedTable>> {
        let backend = LopdfBackend::open_with_password(path, self.password.as_deref())
            .map_err(table_error)?;
        let tables = self.parse_reader(&backend)?;
        log::debug!("Parsed {} tables from {}", tables.len(), path.display());
        Ok(tables)
    }

    /// Tables of every page, page by page.
    fn parse_reader(&self, reader: &dyn DocumentReader) -> Result<Vec<ParsedTable>> {
        let mut tables = Vec::new();
        for page in 1..=reader.page_count() {
            let text = reader.page_text(page).map_err(table_error)?;
            tables.extend(self.detect_page(&text, page));
        }
        Ok(tables)
    }
}

fn table_error(err: Error) -> Error {
    match err {
        Error::TableParse(_) => err,
        other => Error::TableParse(other.to_string()),
    }
}

fn finish_row(mut chunks: Vec<TextChunk>) -> Row {
    chunks.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));
    let top = chunks.iter().map(|c| c.bbox.y0).sum::<f32>() / chunks.len() as f32;
    Row { top, chunks }
}

fn edge_bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

/// Fraction of a row's chunks that start on a column edge.
fn alignment_score(row: &Row, columns: &[f32]) -> f32 {
    if row.chunks.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .chunks
        .iter()
        .filter(|c| columns.iter().any(|col| (c.bbox.x0 - col).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.chunks.len() as f32
}

/// Column index for a chunk starting at `x`.
fn column_for(x: f32, columns: &[f32], right: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right + 100.0);
        if x >= start - CELL_SLACK && x < end - CELL_SLACK {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// Whether the first column holds list markers rather than data.
///
/// Bullets are never table data; numbering only disqualifies two-column
/// regions, since real tables often number their rows.
fn is_list_pattern(rows: &[Row], columns: &[f32]) -> bool {
    if columns.len() < 2 || rows.is_empty() {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for first in rows.iter().filter_map(|r| r.chunks.first()) {
        if is_bullet_marker(&first.text) {
            bullets += 1;
        } else if is_number_marker(&first.text) {
            numbers += 1;
        }
    }

    let total = rows.len() as f32;
    let bullet_ratio = bullets as f32 / total;
    let marker_ratio = (bullets + numbers) as f32 / total;
    bullet_ratio >= 0.5 || (columns.len() == 2 && marker_ratio >= 0.5)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "□"
            | "◆" | "◇" | "▶" | "▷" | "➤" | "➜"
    )
}

/// "1.", "12)", "3", "a.", "B)"
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}
