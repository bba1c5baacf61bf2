//! JSON rendering for fragment lists.

use crate::error::{Error, Result};
use crate::model::Fragment;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize fragments as a JSON array of fragment records.
pub fn to_json(fragments: &[Fragment], format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(fragments),
        JsonFormat::Compact => serde_json::to_string(fragments),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

/// Parse fragments back from JSON.
pub fn from_json(json: &str) -> Result<Vec<Fragment>> {
    serde_json::from_str(json).map_err(|e| Error::Render(format!("JSON parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, TableGrid};
    use serde_json::{json, Value};

    fn sample() -> Vec<Fragment> {
        let bbox = BBox::new(0.0, 0.0, 40.0, 20.0);
        vec![
            Fragment::formula("x = y+1\n+ z", bbox, 1),
            Fragment::image(12, bbox, 2),
            Fragment::table(TableGrid::from_rows(vec![vec!["a", "b"]]), bbox, 3),
        ]
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"type\": \"formula\""));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&sample(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_record_shapes() {
        let value: Value = serde_json::from_str(&to_json(&sample(), JsonFormat::Compact).unwrap())
            .unwrap();
        assert_eq!(
            value[0],
            json!({"type": "formula", "content": "x = y+1\n+ z", "bbox": [0.0, 0.0, 40.0, 20.0], "page": 1})
        );
        assert_eq!(value[1]["xref"], 12);
        assert!(value[1].get("content").is_none());
        assert_eq!(value[2]["content"], json!([["a", "b"]]));
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(to_json(&[], JsonFormat::Compact).unwrap(), "[]");
    }

    #[test]
    fn test_from_json() {
        let json = to_json(&sample(), JsonFormat::Pretty).unwrap();
        assert_eq!(from_json(&json).unwrap(), sample());
        assert!(matches!(from_json("{"), Err(Error::Render(_))));
    }
}
