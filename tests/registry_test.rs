//! Integration tests for the extractor registry.

use std::path::Path;

use sempdf::error::Result;
use sempdf::{BBox, Error, Extractor, ExtractorRegistry, Fragment, FragmentKind};

/// Mock extractor returning one fragment tagged with its name.
struct MockExtractor {
    kind: FragmentKind,
    name: &'static str,
}

impl MockExtractor {
    fn new(kind: FragmentKind, name: &'static str) -> Self {
        Self { kind, name }
    }
}

impl Extractor for MockExtractor {
    fn kind(&self) -> FragmentKind {
        self.kind
    }

    fn name(&self) -> &str {
        self.name
    }

    fn extract(&self, _path: &Path) -> Result<Vec<Fragment>> {
        let bbox = BBox::new(0.0, 0.0, 10.0, 10.0);
        let fragment = match self.kind {
            FragmentKind::Image => Fragment::image(7, bbox, 1),
            FragmentKind::Table => Fragment::table(Default::default(), bbox, 1),
            kind => Fragment {
                kind,
                ..Fragment::text(self.name, bbox, 1)
            },
        };
        Ok(vec![fragment])
    }
}

/// Mock extractor that always fails.
struct FailingExtractor {
    kind: FragmentKind,
}

impl Extractor for FailingExtractor {
    fn kind(&self) -> FragmentKind {
        self.kind
    }

    fn name(&self) -> &str {
        "failing"
    }

    fn extract(&self, _path: &Path) -> Result<Vec<Fragment>> {
        Err(Error::Other(format!("{} failed", self.kind)))
    }
}

#[test]
fn test_registry_new_is_empty() {
    let registry = ExtractorRegistry::new();
    assert!(registry.kinds().is_empty());
    assert!(registry.get(FragmentKind::Text).is_none());
}

#[test]
fn test_registry_with_defaults() {
    let registry = ExtractorRegistry::with_defaults();
    assert_eq!(registry.kinds(), FragmentKind::ALL.to_vec());
    assert_eq!(
        registry.get(FragmentKind::Formula).map(|e| e.kind()),
        Some(FragmentKind::Formula)
    );
}

#[test]
fn test_registry_register_replaces() {
    let mut registry = ExtractorRegistry::new();
    assert!(registry
        .register(MockExtractor::new(FragmentKind::Text, "first"))
        .is_none());

    let previous = registry.register(MockExtractor::new(FragmentKind::Text, "second"));
    assert_eq!(previous.map(|e| e.name().to_string()), Some("first".to_string()));

    let fragments = registry.extract("any.pdf", FragmentKind::Text).unwrap();
    assert_eq!(fragments[0].text_content(), Some("second"));
}

#[test]
fn test_registry_unsupported_kind() {
    let registry = ExtractorRegistry::new();
    let result = registry.extract("any.pdf", FragmentKind::Table);
    match result {
        Err(Error::UnsupportedKind(kind)) => assert_eq!(kind, "table"),
        other => panic!("expected UnsupportedKind, got {:?}", other),
    }

    assert!(registry.extract_all("any.pdf").unwrap().is_empty());
}

#[test]
fn test_extract_all_orders_by_kind() {
    let mut registry = ExtractorRegistry::new();
    registry.register(MockExtractor::new(FragmentKind::Table, "table"));
    registry.register(MockExtractor::new(FragmentKind::Image, "image"));
    registry.register(MockExtractor::new(FragmentKind::Formula, "formula"));
    registry.register(MockExtractor::new(FragmentKind::Text, "text"));

    let fragments = registry.extract_all("any.pdf").unwrap();
    let kinds: Vec<FragmentKind> = fragments.iter().map(|f| f.kind).collect();
    assert_eq!(kinds, FragmentKind::ALL.to_vec());
    assert_eq!(fragments[1].text_content(), Some("formula"));
}

#[test]
fn test_extract_all_returns_first_failure() {
    let mut registry = ExtractorRegistry::new();
    registry.register(MockExtractor::new(FragmentKind::Text, "text"));
    registry.register(FailingExtractor {
        kind: FragmentKind::Table,
    });
    registry.register(FailingExtractor {
        kind: FragmentKind::Formula,
    });

    let err = registry.extract_all("any.pdf").unwrap_err();
    assert_eq!(err.to_string(), "formula failed");
}
