//! Rendering of fragment lists: JSON, plain text, and annotated PDF copies.

mod json;
pub mod overlay;
mod text;

pub use json::{from_json, to_json, JsonFormat};
pub use overlay::{
    annotate_copy, validate_bbox, BBoxRejection, BoilerplateFilter, OverlayOptions,
    OverlayReport,
};
pub use text::to_text;
