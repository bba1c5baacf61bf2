//! Content-stream interpretation.
//!
//! Walks a page's operators tracking the graphics and text state, and turns
//! every shown character into a glyph with a page-space box and every image
//! `Do` into a placement. Coordinates are converted to a top-left origin.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Dictionary, Document as LopdfDocument, Object, ObjectId};

use crate::error::{Error, Result};
use crate::model::{BBox, Glyph};

/// TJ adjustments beyond this many thousandths of an em read as word breaks.
const TJ_SPACE_THRESHOLD: f32 = 200.0;

/// Glyph width in thousandths of an em when the font has no metrics.
const FALLBACK_WIDTH: f32 = 500.0;
const FALLBACK_ASCENT: f32 = 800.0;
const FALLBACK_DESCENT: f32 = -200.0;

/// Nesting limit for inherited page attributes.
const MAX_INHERIT_DEPTH: usize = 32;

/// Highest code a two-byte CID font can show.
const MAX_CID: u32 = 0xFFFF;

/// An affine transform `[a b c d e f]` in PDF row-vector convention.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Matrix {
    a: f32,
    b: f32,
    c: f32,
    d: f32,
    e: f32,
    f: f32,
}

impl Matrix {
    pub(crate) const IDENTITY: Matrix = Matrix::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);

    pub(crate) const fn new(a: f32, b: f32, c: f32, d: f32, e: f32, f: f32) -> Self {
        Self { a, b, c, d, e, f }
    }

    fn translation(tx: f32, ty: f32) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// `self × other`: apply `self` first, then `other`.
    pub(crate) fn concat(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            e: self.e * other.a + self.f * other.c + other.e,
            f: self.e * other.b + self.f * other.d + other.f,
        }
    }

    pub(crate) fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// Length of the transformed unit y vector.
    fn vertical_scale(&self) -> f32 {
        (self.c * self.c + self.d * self.d).sqrt()
    }

    fn from_operands(operands: &[Object]) -> Option<Matrix> {
        if operands.len() < 6 {
            return None;
        }
        Some(Matrix::new(
            number(&operands[0])?,
            number(&operands[1])?,
            number(&operands[2])?,
            number(&operands[3])?,
            number(&operands[4])?,
            number(&operands[5])?,
        ))
    }
}

/// The page's visible area in PDF user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct MediaBox {
    pub x0: f32,
    pub y0: f32,
    pub x1: f32,
    pub y1: f32,
}

impl MediaBox {
    /// US Letter.
    pub(crate) const LETTER: MediaBox = MediaBox {
        x0: 0.0,
        y0: 0.0,
        x1: 612.0,
        y1: 792.0,
    };

    pub(crate) fn width(&self) -> f32 {
        self.x1 - self.x0
    }

    pub(crate) fn height(&self) -> f32 {
        self.y1 - self.y0
    }

    /// Map a user-space rectangle given by its corner points to a top-left box.
    fn to_top_left(&self, points: &[(f32, f32)]) -> BBox {
        let (mut min_x, mut min_y) = (f32::INFINITY, f32::INFINITY);
        let (mut max_x, mut max_y) = (f32::NEG_INFINITY, f32::NEG_INFINITY);
        for &(x, y) in points {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        BBox::new(
            min_x - self.x0,
            self.y1 - max_y,
            max_x - self.x0,
            self.y1 - min_y,
        )
    }
}

/// A glyph plus the style and baseline the layout pass groups on.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PositionedGlyph {
    pub glyph: Glyph,
    pub font: String,
    /// Effective font size in page units
    pub size: f32,
    /// Baseline distance from the top of the page
    pub baseline: f32,
}

/// One drawing of an image XObject.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Placement {
    pub xref: u32,
    pub name: String,
    pub bbox: BBox,
}

/// Everything one pass over a content stream produces.
#[derive(Debug, Clone, Default)]
pub(crate) struct PageScan {
    pub glyphs: Vec<PositionedGlyph>,
    pub placements: Vec<Placement>,
}

/// Width and vertical metrics of a font, in thousandths of an em.
#[derive(Debug, Clone)]
pub(crate) struct FontMetrics {
    base_font: String,
    first_char: u32,
    widths: Vec<f32>,
    cid_widths: HashMap<u32, f32>,
    default_width: f32,
    ascent: f32,
    descent: f32,
    two_byte: bool,
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self {
            base_font: "Unknown".to_string(),
            first_char: 0,
            widths: Vec::new(),
            cid_widths: HashMap::new(),
            default_width: FALLBACK_WIDTH,
            ascent: FALLBACK_ASCENT,
            descent: FALLBACK_DESCENT,
            two_byte: false,
        }
    }
}

impl FontMetrics {
    pub(crate) fn from_dict(doc: &LopdfDocument, font: &Dictionary) -> Self {
        let mut metrics = FontMetrics {
            base_font: font
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
            ..FontMetrics::default()
        };

        let is_type0 = font
            .get(b"Subtype")
            .ok()
            .and_then(|o| o.as_name().ok())
            .is_some_and(|n| n == b"Type0");

        let descriptor_owner = if is_type0 {
            metrics.two_byte = true;
            let descendant = font
                .get(b"DescendantFonts")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .and_then(|arr| arr.first())
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_dict().ok());
            if let Some(cid_font) = descendant {
                if let Some(dw) = cid_font.get(b"DW").ok().and_then(number) {
                    metrics.default_width = dw;
                } else {
                    metrics.default_width = 1000.0;
                }
                if let Ok(w) = cid_font.get(b"W") {
                    metrics.cid_widths = parse_cid_widths(doc, resolve(doc, w));
                }
            }
            descendant
        } else {
            metrics.first_char = font
                .get(b"FirstChar")
                .ok()
                .and_then(number)
                .map(|n| n.max(0.0) as u32)
                .unwrap_or(0);
            metrics.widths = font
                .get(b"Widths")
                .ok()
                .map(|o| resolve(doc, o))
                .and_then(|o| o.as_array().ok())
                .map(|arr| {
                    arr.iter()
                        .map(|w| number(resolve(doc, w)).unwrap_or(0.0))
                        .collect()
                })
                .unwrap_or_default();
            Some(font)
        };

        let descriptor = descriptor_owner
            .and_then(|d| d.get(b"FontDescriptor").ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());
        if let Some(desc) = descriptor {
            if let Some(ascent) = desc.get(b"Ascent").ok().and_then(number) {
                if ascent > 0.0 {
                    metrics.ascent = ascent;
                }
            }
            if let Some(descent) = desc.get(b"Descent").ok().and_then(number) {
                if descent < 0.0 {
                    metrics.descent = descent;
                }
            }
            if !is_type0 {
                if let Some(missing) = desc.get(b"MissingWidth").ok().and_then(number) {
                    if missing > 0.0 {
                        metrics.default_width = missing;
                    }
                }
            }
        }

        metrics
    }

    /// Advance width of a character code.
    fn width(&self, code: u32) -> f32 {
        if self.two_byte {
            return self
                .cid_widths
                .get(&code)
                .copied()
                .unwrap_or(self.default_width);
        }
        code.checked_sub(self.first_char)
            .and_then(|i| self.widths.get(i as usize))
            .copied()
            .filter(|w| *w > 0.0)
            .unwrap_or(self.default_width)
    }
}

/// Parse a CID font `/W` array: `c [w1 w2 …]` and `c_first c_last w` runs.
///
/// Codes outside `0..=MAX_CID` and inverted runs are skipped.
fn parse_cid_widths(doc: &LopdfDocument, w: &Object) -> HashMap<u32, f32> {
    let mut widths = HashMap::new();
    let Ok(items) = w.as_array() else {
        return widths;
    };

    let mut i = 0;
    while i < items.len() {
        let Some(first) = number(resolve(doc, &items[i])) else {
            break;
        };
        match items.get(i + 1).map(|o| resolve(doc, o)) {
            Some(Object::Array(run)) => {
                if let Some(first) = cid(first) {
                    let codes = (first..=MAX_CID).zip(run.iter());
                    for (code, w) in codes {
                        if let Some(w) = number(resolve(doc, w)) {
                            widths.insert(code, w);
                        }
                    }
                }
                i += 2;
            }
            Some(last) => {
                let (Some(last), Some(w)) = (
                    number(last),
                    items.get(i + 2).and_then(|o| number(resolve(doc, o))),
                ) else {
                    break;
                };
                match (cid(first), cid(last.min(MAX_CID as f32))) {
                    (Some(first), Some(last)) if first <= last => {
                        for code in first..=last {
                            widths.insert(code, w);
                        }
                    }
                    _ => log::debug!("Skipping /W run {}..{}", first, last),
                }
                i += 3;
            }
            None => break,
        }
    }
    widths
}

/// A `/W` code as a CID, if it is a whole number in range.
fn cid(value: f32) -> Option<u32> {
    if value.is_finite() && value >= 0.0 && value <= MAX_CID as f32 {
        Some(value as u32)
    } else {
        None
    }
}

/// Text state parameters saved and restored with the graphics state.
#[derive(Debug, Clone)]
struct TextState {
    char_spacing: f32,
    word_spacing: f32,
    h_scaling: f32,
    leading: f32,
    rise: f32,
    font: Option<Vec<u8>>,
    size: f32,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            char_spacing: 0.0,
            word_spacing: 0.0,
            h_scaling: 1.0,
            leading: 0.0,
            rise: 0.0,
            font: None,
            size: 12.0,
        }
    }
}

#[derive(Debug, Clone)]
struct GraphicsState {
    ctm: Matrix,
    text: TextState,
}

/// Interprets one page's content stream.
pub(crate) struct Interpreter<'a> {
    doc: &'a LopdfDocument,
    fonts: BTreeMap<Vec<u8>, &'a Dictionary>,
    metrics: HashMap<Vec<u8>, FontMetrics>,
    fallback_metrics: FontMetrics,
    xobjects: Option<&'a Dictionary>,
    media: MediaBox,
    state: GraphicsState,
    stack: Vec<GraphicsState>,
    tm: Matrix,
    tlm: Matrix,
    in_text: bool,
    out: PageScan,
}

impl<'a> Interpreter<'a> {
    /// Prepare an interpreter for a page.
    pub(crate) fn new(doc: &'a LopdfDocument, page_id: ObjectId, media: MediaBox) -> Self {
        let fonts = doc.get_page_fonts(page_id).unwrap_or_default();
        let metrics = fonts
            .iter()
            .map(|(name, dict)| (name.clone(), FontMetrics::from_dict(doc, dict)))
            .collect();
        let xobjects = page_resources(doc, page_id)
            .and_then(|res| res.get(b"XObject").ok())
            .map(|o| resolve(doc, o))
            .and_then(|o| o.as_dict().ok());

        Self {
            doc,
            fonts,
            metrics,
            fallback_metrics: FontMetrics::default(),
            xobjects,
            media,
            state: GraphicsState {
                ctm: Matrix::IDENTITY,
                text: TextState::default(),
            },
            stack: Vec::new(),
            tm: Matrix::IDENTITY,
            tlm: Matrix::IDENTITY,
            in_text: false,
            out: PageScan::default(),
        }
    }

    /// Interpret decompressed content bytes.
    pub(crate) fn run(mut self, content: &[u8]) -> Result<PageScan> {
        let content =
            lopdf::content::Content::decode(content).map_err(|e| Error::PdfParse(e.to_string()))?;

        for op in &content.operations {
            self.apply(&op.operator, &op.operands);
        }
        Ok(self.out)
    }

    fn apply(&mut self, operator: &str, operands: &[Object]) {
        match operator {
            "q" => self.stack.push(self.state.clone()),
            "Q" => {
                if let Some(saved) = self.stack.pop() {
                    self.state = saved;
                }
            }
            "cm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.state.ctm = m.concat(&self.state.ctm);
                }
            }
            "BT" => {
                self.in_text = true;
                self.tm = Matrix::IDENTITY;
                self.tlm = Matrix::IDENTITY;
            }
            "ET" => self.in_text = false,
            "Tf" => {
                if operands.len() >= 2 {
                    if let Object::Name(name) = &operands[0] {
                        self.state.text.font = Some(name.clone());
                    }
                    self.state.text.size = number(&operands[1]).unwrap_or(12.0);
                }
            }
            "Tc" => self.set_text_param(operands, |t, v| t.char_spacing = v),
            "Tw" => self.set_text_param(operands, |t, v| t.word_spacing = v),
            "Tz" => self.set_text_param(operands, |t, v| t.h_scaling = v / 100.0),
            "TL" => self.set_text_param(operands, |t, v| t.leading = v),
            "Ts" => self.set_text_param(operands, |t, v| t.rise = v),
            "Td" | "TD" => {
                if operands.len() >= 2 {
                    let tx = number(&operands[0]).unwrap_or(0.0);
                    let ty = number(&operands[1]).unwrap_or(0.0);
                    if operator == "TD" {
                        self.state.text.leading = -ty;
                    }
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = Matrix::from_operands(operands) {
                    self.tm = m;
                    self.tlm = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "'" => {
                self.next_line();
                if let Some(Object::String(bytes, _)) = operands.first() {
                    self.show(bytes);
                }
            }
            "\"" => {
                if operands.len() >= 3 {
                    self.state.text.word_spacing = number(&operands[0]).unwrap_or(0.0);
                    self.state.text.char_spacing = number(&operands[1]).unwrap_or(0.0);
                    self.next_line();
                    if let Object::String(bytes, _) = &operands[2] {
                        self.show(bytes);
                    }
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = operands.first() {
                    self.show_array(items);
                }
            }
            "Do" => {
                if let Some(Object::Name(name)) = operands.first() {
                    self.draw_xobject(name);
                }
            }
            _ => {}
        }
    }

    fn set_text_param(&mut self, operands: &[Object], set: impl FnOnce(&mut TextState, f32)) {
        if let Some(v) = operands.first().and_then(number) {
            set(&mut self.state.text, v);
        }
    }

    fn move_line(&mut self, tx: f32, ty: f32) {
        self.tlm = Matrix::translation(tx, ty).concat(&self.tlm);
        self.tm = self.tlm;
    }

    fn next_line(&mut self) {
        let leading = self.state.text.leading;
        self.move_line(0.0, -leading);
    }

    fn current_metrics(&self) -> &FontMetrics {
        self.state
            .text
            .font
            .as_ref()
            .and_then(|name| self.metrics.get(name))
            .unwrap_or(&self.fallback_metrics)
    }

    fn show_array(&mut self, items: &[Object]) {
        let start = self.out.glyphs.len();
        for item in items {
            match item {
                Object::String(bytes, _) => self.show(bytes),
                other => {
                    let Some(n) = number(other) else { continue };
                    let adjustment = -n;
                    if adjustment > TJ_SPACE_THRESHOLD && self.ends_word(start) {
                        self.emit(" ", adjustment);
                    }
                    let text = &self.state.text;
                    let tx = adjustment / 1000.0 * text.size * text.h_scaling;
                    self.tm = Matrix::translation(tx, 0.0).concat(&self.tm);
                }
            }
        }
    }

    /// Whether the last glyph shown since `start` ends a word.
    fn ends_word(&self, start: usize) -> bool {
        self.out.glyphs[start..]
            .last()
            .is_some_and(|g| !g.glyph.c.is_whitespace() && !is_spaceless_script_char(g.glyph.c))
    }

    fn show(&mut self, bytes: &[u8]) {
        if !self.in_text {
            return;
        }

        let font_dict: Option<&'a Dictionary> = self
            .state
            .text
            .font
            .as_ref()
            .and_then(|name| self.fonts.get(name).copied());
        let encoding = font_dict.and_then(|dict| dict.get_font_encoding(self.doc).ok());
        let step = if self.current_metrics().two_byte { 2 } else { 1 };

        for code_bytes in bytes.chunks(step) {
            let code = code_bytes
                .iter()
                .fold(0u32, |acc, b| (acc << 8) | u32::from(*b));
            let width = self.current_metrics().width(code);

            let text = match &encoding {
                Some(enc) => LopdfDocument::decode_text(enc, code_bytes)
                    .unwrap_or_else(|_| decode_code_simple(code_bytes)),
                None => decode_code_simple(code_bytes),
            };
            self.emit(&text, width);

            let ts = &self.state.text;
            let word_spacing = if step == 1 && code == 32 {
                ts.word_spacing
            } else {
                0.0
            };
            let tx = (width / 1000.0 * ts.size + ts.char_spacing + word_spacing) * ts.h_scaling;
            self.tm = Matrix::translation(tx, 0.0).concat(&self.tm);
        }
    }

    /// Emit one glyph per char of `text`, splitting `width` evenly between them.
    fn emit(&mut self, text: &str, width: f32) {
        let count = text.chars().count();
        if count == 0 {
            return;
        }

        let ts = &self.state.text;
        let metrics = self.current_metrics();
        let font_matrix = Matrix::new(ts.size * ts.h_scaling, 0.0, 0.0, ts.size, 0.0, ts.rise);
        let trm = font_matrix.concat(&self.tm).concat(&self.state.ctm);

        let ascent = metrics.ascent / 1000.0;
        let descent = metrics.descent / 1000.0;
        let step = width / 1000.0 / count as f32;
        let font = metrics.base_font.clone();
        let size = ts.size * self.tm.concat(&self.state.ctm).vertical_scale();
        let baseline = self.media.y1 - trm.apply(0.0, 0.0).1;

        for (i, c) in text.chars().enumerate() {
            let x0 = step * i as f32;
            let x1 = x0 + step;
            let corners = [
                trm.apply(x0, descent),
                trm.apply(x1, descent),
                trm.apply(x1, ascent),
                trm.apply(x0, ascent),
            ];
            self.out.glyphs.push(PositionedGlyph {
                glyph: Glyph::new(c, self.media.to_top_left(&corners)),
                font: font.clone(),
                size,
                baseline,
            });
        }
    }

    fn draw_xobject(&mut self, name: &[u8]) {
        let Some(xobjects) = self.xobjects else {
            return;
        };
        let Ok(Object::Reference(id)) = xobjects.get(name) else {
            return;
        };
        let Ok(Object::Stream(stream)) = self.doc.get_object(*id) else {
            return;
        };

        match stream.dict.get(b"Subtype").ok().and_then(|o| o.as_name().ok()) {
            Some(b"Image") => {
                let ctm = self.state.ctm;
                let corners = [
                    ctm.apply(0.0, 0.0),
                    ctm.apply(1.0, 0.0),
                    ctm.apply(1.0, 1.0),
                    ctm.apply(0.0, 1.0),
                ];
                self.out.placements.push(Placement {
                    xref: id.0,
                    name: String::from_utf8_lossy(name).to_string(),
                    bbox: self.media.to_top_left(&corners),
                });
            }
            Some(b"Form") => {
                log::debug!(
                    "Skipping form XObject {}",
                    String::from_utf8_lossy(name)
                );
            }
            _ => {}
        }
    }
}

/// Numeric value of an operand.
pub(crate) fn number(obj: &Object) -> Option<f32> {
    match obj {
        Object::Integer(i) => Some(*i as f32),
        Object::Real(r) => Some(*r),
        _ => None,
    }
}

/// Follow a reference, leaving direct objects untouched.
pub(crate) fn resolve<'a>(doc: &'a LopdfDocument, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

/// Look up a page attribute, walking up the page tree for inherited ones.
pub(crate) fn inherited<'a>(
    doc: &'a LopdfDocument,
    page_id: ObjectId,
    key: &[u8],
) -> Option<&'a Object> {
    let mut node = doc.get_dictionary(page_id).ok()?;
    for _ in 0..MAX_INHERIT_DEPTH {
        if let Ok(value) = node.get(key) {
            return Some(resolve(doc, value));
        }
        let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
        node = doc.get_dictionary(parent).ok()?;
    }
    None
}

/// The page's resource dictionary.
pub(crate) fn page_resources(doc: &LopdfDocument, page_id: ObjectId) -> Option<&Dictionary> {
    inherited(doc, page_id, b"Resources").and_then(|o| o.as_dict().ok())
}

/// The page's MediaBox, or US Letter when absent or malformed.
pub(crate) fn media_box(doc: &LopdfDocument, page_id: ObjectId) -> MediaBox {
    let values: Option<Vec<f32>> = inherited(doc, page_id, b"MediaBox")
        .and_then(|o| o.as_array().ok())
        .map(|arr| arr.iter().filter_map(|o| number(resolve(doc, o))).collect());

    match values.as_deref() {
        Some([x0, y0, x1, y1, ..]) => MediaBox {
            x0: x0.min(*x1),
            y0: y0.min(*y1),
            x1: x0.max(*x1),
            y1: y0.max(*y1),
        },
        _ => MediaBox::LETTER,
    }
}

/// Concatenated, decompressed content streams of a page.
pub(crate) fn page_content(doc: &LopdfDocument, page_id: ObjectId) -> Result<Vec<u8>> {
    let page_dict = doc
        .get_dictionary(page_id)
        .map_err(|e| Error::PdfParse(e.to_string()))?;

    let Ok(contents) = page_dict.get(b"Contents") else {
        return Ok(Vec::new());
    };

    let streams: Vec<&Object> = match resolve(doc, contents) {
        Object::Array(arr) => arr.iter().map(|o| resolve(doc, o)).collect(),
        other => vec![other],
    };

    let mut content = Vec::new();
    for obj in streams {
        match obj {
            Object::Stream(s) => {
                let data = s
                    .decompressed_content()
                    .unwrap_or_else(|_| s.content.clone());
                content.extend_from_slice(&data);
                content.push(b' ');
            }
            _ => return Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }
    Ok(content)
}

/// Decode a character code without font encoding information.
fn decode_code_simple(bytes: &[u8]) -> String {
    match bytes {
        [b] => (*b as char).to_string(),
        [hi, lo] => char::from_u32(u32::from(u16::from_be_bytes([*hi, *lo])))
            .map(String::from)
            .unwrap_or_default(),
        _ => String::new(),
    }
}

/// Characters of scripts written without word spaces.
fn is_spaceless_script_char(c: char) -> bool {
    let code = c as u32;

    // CJK Unified Ideographs and extensions
    (0x4E00..=0x9FFF).contains(&code)
    || (0x3400..=0x4DBF).contains(&code)
    || (0x20000..=0x2EBEF).contains(&code)
    // Hiragana, Katakana
    || (0x3040..=0x30FF).contains(&code)
    // CJK symbols and punctuation
    || (0x3000..=0x303F).contains(&code)
}
