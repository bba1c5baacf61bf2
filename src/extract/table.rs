//! Table extraction through a [`TableParser`].

use std::path::Path;
use std::sync::Arc;

use super::Extractor;
use crate::analysis::{StreamTableParser, TableParser};
use crate::error::Result;
use crate::model::{Fragment, FragmentKind, ParsedTable};
use crate::reader::{DocumentReader, ExtractOptions};

/// Emits one table fragment per parsed table, ordered by page.
#[derive(Clone)]
pub struct TableExtractor {
    options: ExtractOptions,
    parser: Arc<dyn TableParser>,
}

impl TableExtractor {
    /// Create a table extractor backed by the stream-mode parser.
    pub fn new(options: ExtractOptions) -> Self {
        let parser = match &options.password {
            Some(password) => StreamTableParser::new().with_password(password.clone()),
            None => StreamTableParser::new(),
        };
        Self {
            options,
            parser: Arc::new(parser),
        }
    }

    /// Replace the table parser.
    pub fn with_parser<P: TableParser + 'static>(mut self, parser: P) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    /// Detect tables in an open document with the configured parser.
    pub fn extract_from(&self, reader: &dyn DocumentReader) -> Result<Vec<Fragment>> {
        let tables = self.parser.parse_reader(reader)?;
        Ok(self.to_fragments(tables))
    }

    /// Keep selected pages and order by page; tables on one page keep the
    /// parser's order.
    fn to_fragments(&self, mut tables: Vec<ParsedTable>) -> Vec<Fragment> {
        tables.retain(|t| self.options.pages.includes(t.page));
        tables.sort_by_key(|t| t.page);
        tables
            .into_iter()
            .map(|t| Fragment::table(t.grid, t.bbox, t.page))
            .collect()
    }
}

impl Extractor for TableExtractor {
    fn kind(&self) -> FragmentKind {
        FragmentKind::Table
    }

    fn name(&self) -> &str {
        "table"
    }

    fn extract(&self, path: &Path) -> Result<Vec<Fragment>> {
        let tables = self.parser.parse(path)?;
        log::debug!("Table parser returned {} tables", tables.len());
        Ok(self.to_fragments(tables))
    }
}

impl std::fmt::Debug for TableExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableExtractor")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{BBox, TableGrid};
    use crate::reader::mock::{MockPage, MockReader};
    use crate::reader::PageSelection;

    struct FixedParser(Vec<ParsedTable>);

    impl TableParser for FixedParser {
        fn parse(&self, _path: &Path) -> Result<Vec<ParsedTable>> {
            Ok(self.0.clone())
        }
    }

    /// Answers only from an open document.
    struct ReaderParser(Vec<ParsedTable>);

    impl TableParser for ReaderParser {
        fn parse(&self, _path: &Path) -> Result<Vec<ParsedTable>> {
            Err(Error::TableParse("needs a reader".to_string()))
        }

        fn parse_reader(&self, _reader: &dyn DocumentReader) -> Result<Vec<ParsedTable>> {
            Ok(self.0.clone())
        }
    }

    struct FailingParser;

    impl TableParser for FailingParser {
        fn parse(&self, _path: &Path) -> Result<Vec<ParsedTable>> {
            Err(Error::TableParse("no tables for you".to_string()))
        }
    }

    fn table(label: &str, page: u32) -> ParsedTable {
        ParsedTable {
            grid: TableGrid::from_rows(vec![vec![label, "1"], vec!["x", "2"]]),
            page,
            bbox: BBox::new(0.0, 0.0, 100.0, 40.0),
        }
    }

    #[test]
    fn test_tables_sorted_by_page_stably() {
        let parser = FixedParser(vec![table("c", 3), table("a1", 1), table("a2", 1)]);
        let out = TableExtractor::new(ExtractOptions::default())
            .with_parser(parser)
            .extract(Path::new("doc.pdf"))
            .unwrap();

        let labels: Vec<(u32, &str)> = out
            .iter()
            .map(|f| (f.page, f.table_content().unwrap().cell(0, 0).unwrap()))
            .collect();
        assert_eq!(labels, vec![(1, "a1"), (1, "a2"), (3, "c")]);
        assert!(out.iter().all(|f| f.kind == FragmentKind::Table));
    }

    #[test]
    fn test_page_selection_filters_tables() {
        let parser = FixedParser(vec![table("a", 1), table("b", 2)]);
        let options = ExtractOptions::default().with_pages(PageSelection::Pages(vec![2]));
        let out = TableExtractor::new(options)
            .with_parser(parser)
            .extract(Path::new("doc.pdf"))
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].page, 2);
    }

    #[test]
    fn test_extract_from_uses_configured_parser() {
        let reader = MockReader::new(vec![MockPage::default(), MockPage::default()]);
        let out = TableExtractor::new(ExtractOptions::default())
            .with_parser(ReaderParser(vec![table("b", 2), table("a", 1)]))
            .extract_from(&reader)
            .unwrap();
        let pages: Vec<u32> = out.iter().map(|f| f.page).collect();
        assert_eq!(pages, vec![1, 2]);

        let result = TableExtractor::new(ExtractOptions::default())
            .with_parser(FixedParser(vec![table("a", 1)]))
            .extract_from(&reader);
        assert!(matches!(result, Err(Error::TableParse(_))));
    }

    #[test]
    fn test_parser_failure_is_surfaced() {
        let result = TableExtractor::new(ExtractOptions::default())
            .with_parser(FailingParser)
            .extract(Path::new("doc.pdf"));
        assert!(matches!(result, Err(Error::TableParse(_))));
    }

    #[test]
    fn test_missing_file_is_table_error() {
        let result = TableExtractor::new(ExtractOptions::default())
            .extract(Path::new("/nonexistent/sempdf/missing.pdf"));
        assert!(matches!(result, Err(Error::TableParse(_))));
    }
}
