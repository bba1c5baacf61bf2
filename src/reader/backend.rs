//! `lopdf`-backed document reader.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use lopdf::{Document as LopdfDocument, Object, ObjectId};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::{BBox, BlockEntry, ImageRef, RawPageText};

use super::header;
use super::interpreter::{self, Interpreter, PageScan};
use super::layout::build_page_text;
use super::DocumentReader;

/// Document-level facts shown by `sempdf info`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DocumentInfo {
    /// PDF version from the header (e.g. "1.7")
    pub version: String,
    /// Number of pages
    pub page_count: u32,
    /// Document title
    pub title: Option<String>,
    /// Document author
    pub author: Option<String>,
    /// Creation date
    pub created: Option<DateTime<Utc>>,
    /// Whether the document declares encryption
    pub encrypted: bool,
}

/// Concrete [`DocumentReader`] backed by `lopdf::Document`.
///
/// Owns the loaded document. Dropping the backend releases it, so an
/// extraction that holds the backend in a local releases the document on
/// every exit path.
pub struct LopdfBackend {
    doc: LopdfDocument,
    pages: BTreeMap<u32, ObjectId>,
    version: String,
    source: String,
}

impl LopdfBackend {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_password(path, None)
    }

    /// Open a PDF file, supplying a password for encrypted documents.
    pub fn open_with_password<P: AsRef<Path>>(path: P, password: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let version = header::sniff_path(path)?;
        let doc = LopdfDocument::load(path)?;
        Self::from_document(doc, version, path.display().to_string(), password)
    }

    /// Load from an in-memory byte slice.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let version = header::sniff_bytes(data)?;
        let doc = LopdfDocument::load_mem(data)?;
        Self::from_document(doc, version, "<memory>".to_string(), None)
    }

    fn from_document(
        doc: LopdfDocument,
        version: String,
        source: String,
        password: Option<&str>,
    ) -> Result<Self> {
        // lopdf 0.34 decrypts with the empty user password on load and
        // offers no way to retry with another one.
        if password.is_some() && doc.is_encrypted() {
            log::warn!("Password was provided but lopdf 0.34 doesn't support user passwords");
        }

        let pages = doc.get_pages();
        log::debug!("Opened {} (PDF {}, {} pages)", source, version, pages.len());
        Ok(Self {
            doc,
            pages,
            version,
            source,
        })
    }

    /// Direct access to the underlying `lopdf::Document`.
    pub fn raw_doc(&self) -> &LopdfDocument {
        &self.doc
    }

    /// PDF version string from the file header.
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Read the document information dictionary.
    pub fn info(&self) -> DocumentInfo {
        let mut info = DocumentInfo {
            version: self.version.clone(),
            page_count: self.page_count(),
            encrypted: self.doc.is_encrypted(),
            ..DocumentInfo::default()
        };

        let dict = self
            .doc
            .trailer
            .get(b"Info")
            .ok()
            .map(|o| interpreter::resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());
        if let Some(dict) = dict {
            info.title = info_string(dict, b"Title");
            info.author = info_string(dict, b"Author");
            info.created = info_string(dict, b"CreationDate").and_then(|s| parse_pdf_date(&s));
        }
        info
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.pages
            .get(&page)
            .copied()
            .ok_or(Error::PageOutOfRange(page, self.page_count()))
    }

    /// Interpret one page's content stream.
    fn scan(&self, page: u32) -> Result<(PageScan, f32, f32)> {
        let page_id = self.page_id(page)?;
        let media = interpreter::media_box(&self.doc, page_id);
        let content = interpreter::page_content(&self.doc, page_id)
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page, e)))?;
        let scan = Interpreter::new(&self.doc, page_id, media)
            .run(&content)
            .map_err(|e| Error::PdfParse(format!("Page {}: {}", page, e)))?;
        Ok((scan, media.width(), media.height()))
    }
}

impl Drop for LopdfBackend {
    fn drop(&mut self) {
        log::debug!("Released {}", self.source);
    }
}

impl DocumentReader for LopdfBackend {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_blocks(&self, page: u32) -> Result<Vec<BlockEntry>> {
        Ok(self.page_text(page)?.block_entries())
    }

    fn page_text(&self, page: u32) -> Result<RawPageText> {
        let (scan, width, height) = self.scan(page)?;
        Ok(build_page_text(&scan, width, height))
    }

    fn page_images(&self, page: u32) -> Result<Vec<ImageRef>> {
        let page_id = self.page_id(page)?;
        let xobjects = interpreter::page_resources(&self.doc, page_id)
            .and_then(|res| res.get(b"XObject").ok())
            .map(|o| interpreter::resolve(&self.doc, o))
            .and_then(|o| o.as_dict().ok());

        let Some(xobjects) = xobjects else {
            return Ok(Vec::new());
        };

        let mut images: Vec<ImageRef> = Vec::new();
        for (name, obj) in xobjects.iter() {
            let Object::Reference(id) = obj else { continue };
            let Ok(Object::Stream(stream)) = self.doc.get_object(*id) else {
                continue;
            };
            let is_image = stream
                .dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                .is_some_and(|n| n == b"Image");
            if !is_image || images.iter().any(|i| i.xref == id.0) {
                continue;
            }

            let dimension = |key: &[u8]| {
                stream
                    .dict
                    .get(key)
                    .ok()
                    .and_then(|o| o.as_i64().ok())
                    .and_then(|v| u32::try_from(v).ok())
            };
            images.push(ImageRef {
                xref: id.0,
                name: String::from_utf8_lossy(name).to_string(),
                width: dimension(b"Width"),
                height: dimension(b"Height"),
            });
        }
        Ok(images)
    }

    fn page_placements(&self, page: u32) -> Result<HashMap<u32, Vec<BBox>>> {
        let (scan, _, _) = self.scan(page)?;
        let mut placements: HashMap<u32, Vec<BBox>> = HashMap::new();
        for p in scan.placements {
            placements.entry(p.xref).or_default().push(p.bbox);
        }
        Ok(placements)
    }
}

/// Read a text string from the information dictionary.
fn info_string(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => {
            let text = match bytes.as_slice() {
                [0xFE, 0xFF, rest @ ..] => {
                    let units: Vec<u16> = rest
                        .chunks_exact(2)
                        .map(|c| u16::from_be_bytes([c[0], c[1]]))
                        .collect();
                    String::from_utf16_lossy(&units)
                }
                other => match std::str::from_utf8(other) {
                    Ok(s) => s.to_string(),
                    Err(_) => other.iter().map(|&b| b as char).collect(),
                },
            };
            let text = text.trim().to_string();
            (!text.is_empty()).then_some(text)
        }
        Object::Name(bytes) => Some(String::from_utf8_lossy(bytes).to_string()),
        _ => None,
    }
}

/// Parse a PDF date (`D:YYYYMMDDHHmmSS…`), ignoring the zone suffix.
fn parse_pdf_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);
    let field = |range: std::ops::Range<usize>, default: u32| -> Option<u32> {
        match s.get(range) {
            Some(v) if v.bytes().all(|b| b.is_ascii_digit()) => v.parse().ok(),
            Some(_) => None,
            None => Some(default),
        }
    };

    let year = i32::try_from(field(0..4, u32::MAX)?).ok()?;
    let date = NaiveDate::from_ymd_opt(year, field(4..6, 1)?, field(6..8, 1)?)?;
    let time = date.and_hms_opt(field(8..10, 0)?, field(10..12, 0)?, field(12..14, 0)?)?;
    Some(DateTime::from_naive_utc_and_offset(time, Utc))
}
