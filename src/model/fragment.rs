//! The uniform extraction record.

use serde::{Deserialize, Serialize};

use super::{BBox, TableGrid};

/// Kind of extracted content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FragmentKind {
    /// Prose (a block or a sentence line)
    Text,
    /// Mathematical formula
    Formula,
    /// Image placement
    Image,
    /// Parsed table
    Table,
}

impl FragmentKind {
    /// All kinds, in the order combined extraction emits them.
    pub const ALL: [FragmentKind; 4] = [
        FragmentKind::Text,
        FragmentKind::Formula,
        FragmentKind::Image,
        FragmentKind::Table,
    ];

    /// Lowercase name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            FragmentKind::Text => "text",
            FragmentKind::Formula => "formula",
            FragmentKind::Image => "image",
            FragmentKind::Table => "table",
        }
    }
}

impl std::fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FragmentKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(FragmentKind::Text),
            "formula" => Ok(FragmentKind::Formula),
            "image" => Ok(FragmentKind::Image),
            "table" => Ok(FragmentKind::Table),
            other => Err(crate::Error::UnsupportedKind(other.to_string())),
        }
    }
}

/// Payload of a fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FragmentContent {
    /// Text or formula source
    Text(String),
    /// Table cells
    Table(TableGrid),
}

/// A positioned, classified unit of content.
///
/// Fragments are values: merging consumes fragments and produces new ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    /// Content kind
    #[serde(rename = "type")]
    pub kind: FragmentKind,

    /// Text, or table cells; absent for images
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<FragmentContent>,

    /// Region on the page
    pub bbox: BBox,

    /// Page number (1-indexed)
    pub page: u32,

    /// Image object number (images only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub xref: Option<u32>,
}

impl Fragment {
    /// Create a prose fragment.
    pub fn text(content: impl Into<String>, bbox: BBox, page: u32) -> Self {
        Self {
            kind: FragmentKind::Text,
            content: Some(FragmentContent::Text(content.into())),
            bbox,
            page,
            xref: None,
        }
    }

    /// Create a formula fragment.
    pub fn formula(content: impl Into<String>, bbox: BBox, page: u32) -> Self {
        Self {
            kind: FragmentKind::Formula,
            ..Self::text(content, bbox, page)
        }
    }

    /// Create an image placement fragment.
    pub fn image(xref: u32, bbox: BBox, page: u32) -> Self {
        Self {
            kind: FragmentKind::Image,
            content: None,
            bbox,
            page,
            xref: Some(xref),
        }
    }

    /// Create a table fragment.
    pub fn table(grid: TableGrid, bbox: BBox, page: u32) -> Self {
        Self {
            kind: FragmentKind::Table,
            content: Some(FragmentContent::Table(grid)),
            bbox,
            page,
            xref: None,
        }
    }

    /// Text content, if this fragment carries text.
    pub fn text_content(&self) -> Option<&str> {
        match &self.content {
            Some(FragmentContent::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Table cells, if this fragment is a table.
    pub fn table_content(&self) -> Option<&TableGrid> {
        match &self.content {
            Some(FragmentContent::Table(t)) => Some(t),
            _ => None,
        }
    }

    /// Whether the fragment satisfies its kind's payload invariant.
    pub fn is_well_formed(&self) -> bool {
        match self.kind {
            FragmentKind::Text | FragmentKind::Formula => self
                .text_content()
                .is_some_and(|t| !t.trim().is_empty()),
            FragmentKind::Image => self.xref.is_some(),
            FragmentKind::Table => self.table_content().is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_fragment_json_shape() {
        let frag = Fragment::text("Hello", BBox::new(1.0, 2.0, 3.0, 4.0), 1);
        let value = serde_json::to_value(&frag).unwrap();
        assert_eq!(
            value,
            json!({"type": "text", "content": "Hello", "bbox": [1.0, 2.0, 3.0, 4.0], "page": 1})
        );
    }

    #[test]
    fn test_image_fragment_has_xref_and_no_content() {
        let frag = Fragment::image(12, BBox::new(0.0, 0.0, 10.0, 10.0), 3);
        let value = serde_json::to_value(&frag).unwrap();
        assert_eq!(value["type"], "image");
        assert_eq!(value["xref"], 12);
        assert!(value.get("content").is_none());
    }

    #[test]
    fn test_table_fragment_content_is_grid() {
        let grid = TableGrid::from_rows(vec![vec!["a", "b"]]);
        let frag = Fragment::table(grid, BBox::new(0.0, 0.0, 10.0, 10.0), 2);
        let value = serde_json::to_value(&frag).unwrap();
        assert_eq!(value["content"], json!([["a", "b"]]));

        let back: Fragment = serde_json::from_value(value).unwrap();
        assert_eq!(back, frag);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("Formula".parse::<FragmentKind>().unwrap(), FragmentKind::Formula);
        assert!("chart".parse::<FragmentKind>().is_err());
    }

    #[test]
    fn test_well_formed() {
        let bbox = BBox::new(0.0, 0.0, 1.0, 1.0);
        assert!(Fragment::text("x", bbox, 1).is_well_formed());
        assert!(!Fragment::formula("   ", bbox, 1).is_well_formed());
        assert!(Fragment::image(5, bbox, 1).is_well_formed());
    }
}
