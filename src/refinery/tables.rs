// * Row/Cell Extraction
// * Walks every <table> in a (possibly malformed) HTML document and lifts
// * rows and cells into plain owned data. scraper's DOM is not Send, so the
// * extraction happens up front and only owned structs cross task boundaries.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

// * Precompiled CSS selectors for performance
static SELECTOR_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table").expect("Invalid table selector"));
static SELECTOR_THEAD: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("thead").expect("Invalid thead selector"));
static SELECTOR_TBODY: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tbody").expect("Invalid tbody selector"));
static SELECTOR_TR: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("Invalid tr selector"));
static SELECTOR_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("td, th").expect("Invalid cell selector"));
static SELECTOR_EMPHASIS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("strong, b").expect("Invalid emphasis selector"));

/// One table cell with decoded, whitespace-collapsed text and the
/// structural attributes the downstream heuristics read.
#[derive(Debug, Clone, PartialEq)]
pub struct RawCell {
    pub text: String,
    pub is_header: bool,
    pub colspan: u32,
    pub has_emphasis: bool,
    pub has_width_attr: bool,
}

/// One table row in document order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub cells: Vec<RawCell>,
}

impl RawRow {
    /// First cell's text, or empty when the row has no cells.
    pub fn key_text(&self) -> &str {
        self.cells.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Second cell's text, or empty.
    pub fn value_text(&self) -> &str {
        self.cells.get(1).map(|c| c.text.as_str()).unwrap_or("")
    }
}

/// One table lifted out of the document, plus table-level signals.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Zero-based position of the table in the document.
    pub index: usize,
    pub rows: Vec<RawRow>,
    pub css_classes: Vec<String>,
    pub has_thead: bool,
    pub has_tbody: bool,
}

impl RawTable {
    pub fn has_thead_tbody(&self) -> bool {
        self.has_thead || self.has_tbody
    }
}

/// Extracts every table in document order. Tables with zero extractable
/// rows are dropped silently.
pub fn extract_tables(html: &str) -> Vec<RawTable> {
    let document = Html::parse_document(html);
    let mut tables = Vec::new();

    for (index, table) in document.select(&SELECTOR_TABLE).enumerate() {
        let extracted = extract_table(&table, index);
        if extracted.rows.is_empty() {
            tracing::debug!(table_index = index, "Dropping table with no extractable rows");
            continue;
        }
        tables.push(extracted);
    }

    tables
}

/// Lifts a single <table> element. All <tr> descendants are collected
/// regardless of thead/tbody nesting.
fn extract_table(table: &ElementRef, index: usize) -> RawTable {
    let css_classes = table
        .value()
        .attr("class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();

    let has_thead = table.select(&SELECTOR_THEAD).next().is_some();
    // ! The HTML5 tree builder inserts an implicit tbody around bare rows,
    // ! so this flag reports the DOM shape, not the source markup.
    let has_tbody = table.select(&SELECTOR_TBODY).next().is_some();

    let mut rows = Vec::new();
    for tr in table.select(&SELECTOR_TR) {
        let cells: Vec<RawCell> = tr.select(&SELECTOR_CELL).map(extract_cell).collect();
        // * Keep only rows with at least one non-empty cell
        if cells.iter().any(|c| !c.text.is_empty()) {
            rows.push(RawRow { cells });
        }
    }

    RawTable {
        index,
        rows,
        css_classes,
        has_thead,
        has_tbody,
    }
}

fn extract_cell(cell: ElementRef) -> RawCell {
    let text = collapse_whitespace(&cell.text().collect::<String>());
    let is_header = cell.value().name() == "th";
    let colspan = cell
        .value()
        .attr("colspan")
        .and_then(|v| v.trim().parse::<u32>().ok())
        .unwrap_or(1);
    let has_emphasis = cell.select(&SELECTOR_EMPHASIS).next().is_some();
    let has_width_attr = cell.value().attr("width").is_some()
        || cell
            .value()
            .attr("style")
            .map(|s| s.to_lowercase().contains("width"))
            .unwrap_or(false);

    RawCell {
        text,
        is_header,
        colspan,
        has_emphasis,
        has_width_attr,
    }
}

/// Collapses internal whitespace runs to single spaces and trims.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
