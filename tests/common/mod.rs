//! Synthetic PDFs for the integration tests.

#![allow(dead_code)]

use std::path::PathBuf;

use lopdf::{dictionary, Document, Object, Stream, StringFormat};
use tempfile::TempDir;

/// Page 1: a prose line, a one-line formula, a formula split over two
/// lines of different sizes, and one image drawn twice.
pub const PAGE_ONE: &[u8] = b"\
BT /F1 12 Tf 72 700 Td (The energy relation is stated below.) Tj ET
BT /F1 12 Tf 150 600 Td (E = mc^2) Tj ET
BT /F1 12 Tf 300 500 Td (x = y+1) Tj ET
BT /F1 10 Tf 300 488 Td (+ z^2) Tj ET
q 40 0 0 20 72 300 cm /Im0 Do Q
q 40 0 0 20 300 300 cm /Im0 Do Q
";

/// Page 2: a three by three table laid out with text positioning only.
pub const PAGE_TWO: &[u8] = b"\
BT /F1 10 Tf 70 700 Td (Fruit) Tj 100 0 Td (Qty) Tj 100 0 Td (Price) Tj ET
BT /F1 10 Tf 70 685 Td (Apple) Tj 100 0 Td (3) Tj 100 0 Td (120) Tj ET
BT /F1 10 Tf 70 670 Td (Pear) Tj 100 0 Td (5) Tj 100 0 Td (80) Tj ET
";

/// Build a Letter-sized PDF with one page per content stream. Every page
/// shares a Helvetica font `F1` and a 4x2 grey image `Im0`.
pub fn build_pdf(pages: &[&[u8]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => Object::Integer(4),
            "Height" => Object::Integer(2),
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => Object::Integer(8),
        },
        vec![128; 8],
    ));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => Object::Reference(font_id) },
        "XObject" => dictionary! { "Im0" => Object::Reference(image_id) },
    });

    let kids: Vec<Object> = pages
        .iter()
        .map(|content| {
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.to_vec()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => Object::Reference(pages_id),
                "Contents" => Object::Reference(content_id),
                "Resources" => Object::Reference(resources_id),
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(pages.len() as i64),
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(612),
                Object::Integer(792),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(b"Fragments".to_vec(), StringFormat::Literal),
        "Author" => Object::String(b"sempdf tests".to_vec(), StringFormat::Literal),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));
    doc.trailer.set("Info", Object::Reference(info_id));

    let mut buf = Vec::new();
    doc.save_to(&mut buf).expect("serialize test PDF");
    buf
}

/// The two-page sample document.
pub fn sample_pdf() -> Vec<u8> {
    build_pdf(&[PAGE_ONE, PAGE_TWO])
}

/// Write `bytes` into `dir` and return the file path.
pub fn write_pdf(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).expect("write test PDF");
    path
}

/// A temporary directory holding the sample document.
pub fn sample_file() -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = write_pdf(&dir, "sample.pdf", &sample_pdf());
    (dir, path)
}

/// Compare two boxes with a tolerance for float rounding.
pub fn assert_bbox_near(actual: sempdf::BBox, expected: [f32; 4]) {
    let actual: [f32; 4] = actual.into();
    for (a, e) in actual.iter().zip(expected.iter()) {
        assert!(
            (a - e).abs() < 0.01,
            "bbox {:?} differs from {:?}",
            actual,
            expected
        );
    }
}
