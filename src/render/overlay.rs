//! Visual verification overlay.
//!
//! Writes a copy of a document with one rectangle annotation per fragment so
//! extraction results can be checked by eye in any PDF viewer. Fragments are
//! validated here, at the rendering boundary: the analysis layer assumes
//! well-formed boxes and never rejects geometry itself.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use lopdf::{dictionary, Document as LopdfDocument, Object, ObjectId};
use regex::Regex;
use serde::Serialize;
use unicode_normalization::UnicodeNormalization;

use crate::error::{Error, Result};
use crate::model::{BBox, Fragment, FragmentContent, FragmentKind};
use crate::reader::header;
use crate::reader::interpreter::{self, MediaBox};

/// Average glyph advance used to size labels, in em.
const LABEL_ADVANCE_EM: f32 = 0.5;

/// Label line height, in em.
const LABEL_LINE_EM: f32 = 1.2;

/// Why a fragment's box cannot be drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BBoxRejection {
    /// A coordinate is NaN or infinite
    NonFinite,
    /// Width or height below the minimum size
    Degenerate { width: f32, height: f32 },
    /// The fragment's page does not exist in the document
    PageOutOfRange { page: u32, page_count: u32 },
}

impl std::fmt::Display for BBoxRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BBoxRejection::NonFinite => f.write_str("non-numeric coordinates"),
            BBoxRejection::Degenerate { width, height } => {
                write!(f, "degenerate box {:.2} x {:.2}", width, height)
            }
            BBoxRejection::PageOutOfRange { page, page_count } => {
                write!(f, "page {} outside document of {} pages", page, page_count)
            }
        }
    }
}

/// Check that a fragment's box can be drawn.
pub fn validate_bbox(
    fragment: &Fragment,
    min_size: f32,
) -> std::result::Result<BBox, BBoxRejection> {
    let bbox = fragment.bbox;
    if !bbox.is_finite() {
        return Err(BBoxRejection::NonFinite);
    }
    if bbox.is_degenerate(min_size) {
        return Err(BBoxRejection::Degenerate {
            width: bbox.width(),
            height: bbox.height(),
        });
    }
    Ok(bbox)
}

/// Case-insensitive, whole-word matcher for boilerplate terms.
///
/// Terms and content are both NFKC-normalized, so full-width and ligature
/// forms match their plain spellings.
#[derive(Debug, Clone, Default)]
pub struct BoilerplateFilter {
    pattern: Option<Regex>,
}

impl BoilerplateFilter {
    /// Build a filter from a list of terms. Blank terms are ignored.
    pub fn new<I, S>(terms: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let alternatives: Vec<String> = terms
            .into_iter()
            .map(|t| t.as_ref().nfkc().collect::<String>())
            .filter(|t| !t.trim().is_empty())
            .map(|t| regex::escape(t.trim()))
            .collect();

        if alternatives.is_empty() {
            return Ok(Self::default());
        }

        // \b would not anchor terms that begin or end with punctuation.
        let source = format!(r"(?i)(?:^|\W)(?:{})(?:$|\W)", alternatives.join("|"));
        let pattern = Regex::new(&source)
            .map_err(|e| Error::Overlay(format!("Invalid boilerplate terms: {}", e)))?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Whether `text` contains one of the terms as a whole word.
    pub fn matches(&self, text: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(&text.nfkc().collect::<String>()),
            None => false,
        }
    }

    /// Whether a fragment's content is boilerplate. Images never are.
    pub fn matches_fragment(&self, fragment: &Fragment) -> bool {
        match &fragment.content {
            Some(FragmentContent::Text(text)) => self.matches(text),
            Some(FragmentContent::Table(grid)) => self.matches(&grid.plain_text()),
            None => false,
        }
    }

    /// Whether the filter has any terms.
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
    }
}

/// Options for [`annotate_copy`].
#[derive(Debug, Clone)]
pub struct OverlayOptions {
    /// Minimum width and height of a drawable box
    pub min_size: f32,
    /// Fragments whose content contains one of these terms are not drawn
    pub boilerplate: Vec<String>,
    /// Draw a kind label in the corner of each box
    pub draw_labels: bool,
    /// Label font size in points
    pub label_font_size: f32,
}

impl Default for OverlayOptions {
    fn default() -> Self {
        Self {
            min_size: 1.0,
            boilerplate: Vec::new(),
            draw_labels: true,
            label_font_size: 6.0,
        }
    }
}

impl OverlayOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum drawable box size.
    pub fn with_min_size(mut self, min_size: f32) -> Self {
        self.min_size = min_size;
        self
    }

    /// Add a boilerplate term.
    pub fn with_boilerplate(mut self, term: impl Into<String>) -> Self {
        self.boilerplate.push(term.into());
        self
    }

    /// Enable or disable kind labels.
    pub fn with_labels(mut self, draw_labels: bool) -> Self {
        self.draw_labels = draw_labels;
        self
    }

    /// Set the label font size.
    pub fn with_label_font_size(mut self, size: f32) -> Self {
        self.label_font_size = size;
        self
    }
}

/// What [`annotate_copy`] did with each fragment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OverlayReport {
    /// Boxes written to the copy
    pub drawn: usize,
    /// Fragments with an invalid box or page
    pub rejected: usize,
    /// Fragments suppressed as boilerplate
    pub filtered: usize,
    /// Drawn boxes whose label did not fit
    pub skipped_labels: usize,
}

/// Stroke colour per kind, as RGB components.
fn kind_color(kind: FragmentKind) -> [f32; 3] {
    match kind {
        FragmentKind::Text => [0.0, 0.3, 1.0],
        FragmentKind::Formula => [1.0, 0.0, 0.0],
        FragmentKind::Image => [0.0, 0.6, 0.0],
        FragmentKind::Table => [1.0, 0.5, 0.0],
    }
}

/// Size of a one-line label, or `None` when it does not fit inside `bbox`.
fn label_size(label: &str, font_size: f32, bbox: &BBox) -> Option<(f32, f32)> {
    let width = label.chars().count() as f32 * font_size * LABEL_ADVANCE_EM;
    let height = font_size * LABEL_LINE_EM;
    (width <= bbox.width() && height <= bbox.height()).then_some((width, height))
}

/// Map a top-left box back to PDF user space as `[llx, lly, urx, ury]`.
fn user_space_rect(bbox: &BBox, media: &MediaBox) -> [f32; 4] {
    [
        media.x0 + bbox.x0,
        media.y1 - bbox.y1,
        media.x0 + bbox.x1,
        media.y1 - bbox.y0,
    ]
}

fn rect_object(rect: [f32; 4]) -> Object {
    Object::Array(rect.iter().map(|v| Object::Real(*v)).collect())
}

fn square_annotation(fragment: &Fragment, rect: [f32; 4]) -> lopdf::Dictionary {
    let color = kind_color(fragment.kind);
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "Square",
        "Rect" => rect_object(rect),
        "C" => Object::Array(color.iter().map(|c| Object::Real(*c)).collect()),
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(1)],
        "F" => Object::Integer(4),
        "Contents" => Object::string_literal(fragment.kind.as_str()),
    }
}

fn label_annotation(label: &str, rect: [f32; 4], font_size: f32) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Annot",
        "Subtype" => "FreeText",
        "Rect" => rect_object(rect),
        "DA" => Object::string_literal(format!("/Helv {} Tf 0 g", font_size)),
        "Border" => vec![Object::Integer(0), Object::Integer(0), Object::Integer(0)],
        "F" => Object::Integer(4),
        "Contents" => Object::string_literal(label),
    }
}

/// Write a copy of `input` to `output` with every valid, non-boilerplate
/// fragment outlined.
///
/// Invalid fragments and labels that do not fit are skipped with a warning;
/// only failures to read the input or write the output are errors.
pub fn annotate_copy<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    fragments: &[Fragment],
    options: &OverlayOptions,
) -> Result<OverlayReport> {
    let input = input.as_ref();
    header::sniff_path(input)?;
    let mut doc = LopdfDocument::load(input)?;
    if doc.is_encrypted() {
        return Err(Error::Encrypted);
    }

    let filter = BoilerplateFilter::new(&options.boilerplate)?;
    let pages = doc.get_pages();
    let page_count = pages.len() as u32;
    let mut report = OverlayReport::default();
    let mut added: BTreeMap<ObjectId, Vec<Object>> = BTreeMap::new();

    for (index, fragment) in fragments.iter().enumerate() {
        let checked = validate_bbox(fragment, options.min_size).and_then(|bbox| {
            pages
                .get(&fragment.page)
                .map(|page_id| (bbox, *page_id))
                .ok_or(BBoxRejection::PageOutOfRange {
                    page: fragment.page,
                    page_count,
                })
        });
        let (bbox, page_id) = match checked {
            Ok(found) => found,
            Err(reason) => {
                log::warn!("Skipping fragment {} ({}): {}", index, fragment.kind, reason);
                report.rejected += 1;
                continue;
            }
        };

        if filter.matches_fragment(fragment) {
            log::debug!("Fragment {} on page {} is boilerplate", index, fragment.page);
            report.filtered += 1;
            continue;
        }

        let media = interpreter::media_box(&doc, page_id);
        let rect = user_space_rect(&bbox, &media);
        let mut annots = vec![doc.add_object(square_annotation(fragment, rect))];

        if options.draw_labels {
            let label = fragment.kind.as_str();
            match label_size(label, options.label_font_size, &bbox) {
                Some((width, height)) => {
                    let label_rect = [rect[0], rect[3] - height, rect[0] + width, rect[3]];
                    let annotation = label_annotation(label, label_rect, options.label_font_size);
                    annots.push(doc.add_object(annotation));
                }
                None => {
                    log::warn!(
                        "Label '{}' does not fit in {} on page {}",
                        label,
                        bbox,
                        fragment.page
                    );
                    report.skipped_labels += 1;
                }
            }
        }

        added
            .entry(page_id)
            .or_default()
            .extend(annots.into_iter().map(Object::Reference));
        report.drawn += 1;
    }

    for (page_id, annots) in added {
        append_annotations(&mut doc, page_id, annots)?;
    }

    let mut file = File::create(output.as_ref())?;
    doc.save_to(&mut file)?;

    log::debug!(
        "Overlay: {} drawn, {} rejected, {} filtered, {} labels skipped",
        report.drawn,
        report.rejected,
        report.filtered,
        report.skipped_labels
    );
    Ok(report)
}

/// Append annotation references to a page, keeping existing annotations.
fn append_annotations(
    doc: &mut LopdfDocument,
    page_id: ObjectId,
    annots: Vec<Object>,
) -> Result<()> {
    let mut all: Vec<Object> = match doc.get_dictionary(page_id)?.get(b"Annots") {
        Ok(Object::Array(existing)) => existing.clone(),
        Ok(Object::Reference(id)) => doc
            .get_object(*id)
            .and_then(Object::as_array)
            .cloned()
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    all.extend(annots);

    doc.get_object_mut(page_id)
        .and_then(Object::as_dict_mut)?
        .set("Annots", Object::Array(all));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TableGrid;
    use lopdf::Stream;

    fn blank_pdf(pages: usize) -> Vec<u8> {
        let mut doc = LopdfDocument::with_version("1.5");
        let pages_id = doc.new_object_id();
        let kids: Vec<Object> = (0..pages)
            .map(|_| {
                let content_id = doc.add_object(Stream::new(dictionary! {}, Vec::new()));
                let page_id = doc.add_object(dictionary! {
                    "Type" => "Page",
                    "Parent" => Object::Reference(pages_id),
                    "Contents" => Object::Reference(content_id),
                    "MediaBox" => vec![
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(612),
                        Object::Integer(792),
                    ],
                });
                Object::Reference(page_id)
            })
            .collect();
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Count" => Object::Integer(pages as i64),
                "Kids" => kids,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        doc.trailer.set("Root", Object::Reference(catalog_id));

        let mut buf = Vec::new();
        doc.save_to(&mut buf).unwrap();
        buf
    }

    fn write_input(dir: &tempfile::TempDir, pages: usize) -> std::path::PathBuf {
        let path = dir.path().join("input.pdf");
        std::fs::write(&path, blank_pdf(pages)).unwrap();
        path
    }

    fn page_annotations(path: &Path, page: u32) -> Vec<lopdf::Dictionary> {
        let doc = LopdfDocument::load(path).unwrap();
        let page_id = doc.get_pages()[&page];
        let Ok(Object::Array(refs)) = doc.get_dictionary(page_id).unwrap().get(b"Annots") else {
            return Vec::new();
        };
        refs.iter()
            .map(|r| doc.get_dictionary(r.as_reference().unwrap()).unwrap().clone())
            .collect()
    }

    fn subtype(dict: &lopdf::Dictionary) -> String {
        String::from_utf8_lossy(dict.get(b"Subtype").unwrap().as_name().unwrap()).to_string()
    }

    #[test]
    fn test_validate_bbox() {
        let ok = Fragment::text("x", BBox::new(0.0, 0.0, 10.0, 10.0), 1);
        assert_eq!(validate_bbox(&ok, 1.0), Ok(ok.bbox));

        let thin = Fragment::text("x", BBox::new(0.0, 0.0, 0.5, 10.0), 1);
        assert!(matches!(
            validate_bbox(&thin, 1.0),
            Err(BBoxRejection::Degenerate { .. })
        ));

        let flat = Fragment::text("x", BBox::new(5.0, 5.0, 50.0, 5.0), 1);
        assert!(validate_bbox(&flat, 1.0).is_err());

        let nan = Fragment::text("x", BBox::new(f32::NAN, 0.0, 10.0, 10.0), 1);
        assert_eq!(validate_bbox(&nan, 1.0), Err(BBoxRejection::NonFinite));

        let inverted = Fragment::text("x", BBox::new(10.0, 10.0, 0.0, 0.0), 1);
        assert!(validate_bbox(&inverted, 1.0).is_err());
    }

    #[test]
    fn test_boilerplate_whole_words_case_insensitive() {
        let filter = BoilerplateFilter::new(["Confidential", "arXiv"]).unwrap();
        assert!(filter.matches("CONFIDENTIAL draft"));
        assert!(filter.matches("see arxiv:2101.00001"));
        assert!(!filter.matches("confidentiality agreement"));
        assert!(!filter.matches("E = mc^2"));
    }

    #[test]
    fn test_boilerplate_nfkc() {
        let filter = BoilerplateFilter::new(["confidential"]).unwrap();
        assert!(filter.matches("ＣＯＮＦＩＤＥＮＴＩＡＬ"));

        let filter = BoilerplateFilter::new(["ﬁgure"]).unwrap();
        assert!(filter.matches("Figure 3"));
    }

    #[test]
    fn test_boilerplate_punctuation_terms() {
        let filter = BoilerplateFilter::new(["(c) ACME"]).unwrap();
        assert!(filter.matches("Copyright (c) ACME 2024"));
    }

    #[test]
    fn test_empty_filter_matches_nothing() {
        let filter = BoilerplateFilter::new(["", "  "]).unwrap();
        assert!(filter.is_empty());
        assert!(!filter.matches("anything"));
    }

    #[test]
    fn test_fragment_matching() {
        let filter = BoilerplateFilter::new(["total"]).unwrap();
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        let table = Fragment::table(TableGrid::from_rows(vec![vec!["Total", "3"]]), bbox, 1);
        assert!(filter.matches_fragment(&table));
        assert!(!filter.matches_fragment(&Fragment::image(3, bbox, 1)));
    }

    #[test]
    fn test_label_fit() {
        let roomy = BBox::new(0.0, 0.0, 100.0, 20.0);
        let (width, height) = label_size("formula", 6.0, &roomy).unwrap();
        assert_eq!(width, 21.0);
        assert!((height - 7.2).abs() < 1e-4);

        let narrow = BBox::new(0.0, 0.0, 10.0, 20.0);
        assert_eq!(label_size("formula", 6.0, &narrow), None);
    }

    #[test]
    fn test_user_space_rect() {
        let media = MediaBox::LETTER;
        let rect = user_space_rect(&BBox::new(72.0, 80.0, 172.0, 92.0), &media);
        assert_eq!(rect, [72.0, 700.0, 172.0, 712.0]);
    }

    #[test]
    fn test_annotate_copy() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, 2);
        let output = dir.path().join("annotated.pdf");

        let fragments = vec![
            Fragment::formula("x = y+1", BBox::new(72.0, 80.0, 172.0, 100.0), 1),
            Fragment::text("Confidential", BBox::new(72.0, 20.0, 200.0, 32.0), 1),
            Fragment::text("tiny", BBox::new(72.0, 200.0, 72.5, 210.0), 1),
            Fragment::image(9, BBox::new(10.0, 10.0, 14.0, 14.0), 2),
            Fragment::table(
                TableGrid::from_rows(vec![vec!["a"]]),
                BBox::new(0.0, 0.0, 50.0, 50.0),
                5,
            ),
        ];
        let options = OverlayOptions::new().with_boilerplate("confidential");
        let report = annotate_copy(&input, &output, &fragments, &options).unwrap();

        assert_eq!(
            report,
            OverlayReport {
                drawn: 2,
                rejected: 2,
                filtered: 1,
                skipped_labels: 1,
            }
        );

        let first = page_annotations(&output, 1);
        let kinds: Vec<String> = first.iter().map(subtype).collect();
        assert_eq!(kinds, vec!["Square", "FreeText"]);

        let second = page_annotations(&output, 2);
        assert_eq!(second.len(), 1);
        assert_eq!(subtype(&second[0]), "Square");
    }

    #[test]
    fn test_annotate_without_labels() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(&dir, 1);
        let output = dir.path().join("annotated.pdf");

        let bbox = BBox::new(72.0, 80.0, 300.0, 100.0);
        let fragments = vec![Fragment::text("Hello there", bbox, 1)];
        let options = OverlayOptions::new().with_labels(false);
        let report = annotate_copy(&input, &output, &fragments, &options).unwrap();

        assert_eq!(report.drawn, 1);
        assert_eq!(report.skipped_labels, 0);
        assert_eq!(page_annotations(&output, 1).len(), 1);
    }

    #[test]
    fn test_annotate_rejects_non_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"just text").unwrap();
        let result = annotate_copy(
            &input,
            dir.path().join("out.pdf"),
            &[],
            &OverlayOptions::default(),
        );
        assert!(matches!(result, Err(Error::UnknownFormat)));
    }
}
