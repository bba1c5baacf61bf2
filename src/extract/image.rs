//! Image placement extraction.

use std::path::Path;

use super::{run_pages, Extractor};
use crate::error::Result;
use crate::model::{BBox, Fragment, FragmentKind};
use crate::reader::{self, DocumentReader, ExtractOptions};

/// Emits one image fragment per placement of every image on a page.
#[derive(Debug, Clone)]
pub struct ImageExtractor {
    options: ExtractOptions,
}

impl ImageExtractor {
    /// Create an image extractor.
    pub fn new(options: ExtractOptions) -> Self {
        Self { options }
    }

    /// Extract from an open document.
    pub fn extract_from(&self, reader: &dyn DocumentReader) -> Result<Vec<Fragment>> {
        run_pages(
            reader,
            &self.options,
            read_placements,
            |page, images: Vec<(u32, Vec<BBox>)>| {
                images
                    .into_iter()
                    .flat_map(|(xref, boxes)| {
                        boxes
                            .into_iter()
                            .map(move |bbox| Fragment::image(xref, bbox, page))
                    })
                    .collect()
            },
        )
    }
}

/// Placements of each image on the page, in image-reference order.
fn read_placements(reader: &dyn DocumentReader, page: u32) -> Result<Vec<(u32, Vec<BBox>)>> {
    let images = reader.page_images(page)?;
    if images.is_empty() {
        return Ok(Vec::new());
    }

    let mut placements = reader.page_placements(page)?;
    Ok(images
        .into_iter()
        .map(|image| {
            let boxes = placements.remove(&image.xref).unwrap_or_default();
            (image.xref, boxes)
        })
        .collect())
}

impl Extractor for ImageExtractor {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Image
    }

    fn name(&self) -> &str {
        "image"
    }

    fn extract(&self, path: &Path) -> Result<Vec<Fragment>> {
        let backend = reader::open(path, &self.options)?;
        self.extract_from(&backend)
    }
}
