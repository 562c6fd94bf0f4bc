// * Table Structure Analysis
// * Six independent layout scores computed from the row stream, then an
// * argmax selection with a fixed priority order. Pure scoring - no state
// * machine here; the chosen layout drives the strategy parsers.

use std::sync::Arc;

use crate::config::constants::*;
use crate::refinery::schema::{SourceMetadata, TableStructure};
use crate::refinery::tables::{RawRow, RawTable};
use crate::refinery::values::has_multiple_inline_values;
use regex::Regex;
use std::sync::LazyLock;

// * Continuation sub-pattern for the complex layout: "- <mode>: <value>"
static DASH_MODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^-\s*\w[\w /+.-]*\s*:\s*.+").expect("Invalid dash mode regex")
});

// * Category-like words accepted in header rows
const CATEGORY_KEYWORDS: &[&str] = &[
    "specification",
    "specifications",
    "general",
    "display",
    "memory",
    "power",
    "connectivity",
    "software",
    "physical",
    "performance",
    "features",
    "output",
    "interface",
];

/// True for the literal "Category"/"Specification" banner or a row whose
/// cells are all header cells.
pub fn is_table_header_row(row: &RawRow) -> bool {
    if row.cells.len() < 2 {
        return false;
    }
    if row.key_text().eq_ignore_ascii_case("category")
        && row.value_text().eq_ignore_ascii_case("specification")
    {
        return true;
    }
    row.cells.iter().all(|c| c.is_header)
}

/// Returns the category title when the row is a category header: a single
/// cell spanning the table, or a two-cell row with a blank value and a
/// category keyword in the key.
pub fn category_header_text(row: &RawRow) -> Option<String> {
    if row.cells.len() == 1 && row.cells[0].colspan >= 2 && is_category_like(&row.cells[0].text) {
        return Some(row.cells[0].text.clone());
    }
    if row.cells.len() == 2
        && row.value_text().is_empty()
        && contains_category_keyword(row.key_text())
    {
        return Some(row.key_text().to_string());
    }
    None
}

fn contains_category_keyword(text: &str) -> bool {
    let lowered = text.to_lowercase();
    CATEGORY_KEYWORDS.iter().any(|k| lowered.contains(k))
}

fn is_category_like(text: &str) -> bool {
    if text.is_empty() || text.split_whitespace().count() > 6 {
        return false;
    }
    if contains_category_keyword(text) {
        return true;
    }
    let letters: Vec<char> = text.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.is_empty() {
        return false;
    }
    let upper = letters.iter().filter(|c| c.is_uppercase()).count();
    upper as f64 / letters.len() as f64 >= 0.6
}

/// Row-stream statistics the scorers and the fingerprinter consume.
/// Collected once per table.
#[derive(Debug, Clone, Default)]
pub struct RowStats {
    pub total_rows: usize,
    pub header_rows: usize,
    pub category_header_rows: usize,
    pub keyed_rows: usize,
    pub continuation_rows: usize,
    /// Keyed rows that are exactly two cells and not inline-compound.
    pub clean_keyed_rows: usize,
    /// Keyed rows whose value cell splits into more than one inline value.
    pub inline_multi_rows: usize,
    /// Keyed rows whose key cell carries emphasis markup.
    pub emphasis_key_rows: usize,
    /// Keyed rows whose key cell is a header cell while the value is not.
    pub header_cell_key_rows: usize,
    /// Continuation rows matching the "- <mode>: <value>" sub-pattern.
    pub dash_mode_rows: usize,
}

impl RowStats {
    pub fn collect(table: &RawTable) -> Self {
        let mut stats = Self {
            total_rows: table.rows.len(),
            ..Self::default()
        };

        for row in &table.rows {
            if is_table_header_row(row) {
                stats.header_rows += 1;
                continue;
            }
            if category_header_text(row).is_some() {
                stats.category_header_rows += 1;
                continue;
            }

            let key = row.key_text();
            let value = row.value_text();

            if !key.is_empty() && !value.is_empty() {
                stats.keyed_rows += 1;
                let inline = has_multiple_inline_values(value);
                if inline {
                    stats.inline_multi_rows += 1;
                }
                if row.cells.len() == 2 && !inline {
                    stats.clean_keyed_rows += 1;
                }
                if row.cells[0].has_emphasis {
                    stats.emphasis_key_rows += 1;
                }
                if row.cells[0].is_header && !row.cells[1].is_header {
                    stats.header_cell_key_rows += 1;
                }
            } else if key.is_empty() && !value.is_empty() {
                stats.continuation_rows += 1;
                if DASH_MODE.is_match(value) {
                    stats.dash_mode_rows += 1;
                }
            }
        }

        stats
    }

    pub fn data_rows(&self) -> usize {
        self.keyed_rows + self.continuation_rows
    }

    pub fn continuation_ratio(&self) -> f64 {
        ratio(self.continuation_rows, self.data_rows())
    }

    pub fn inline_ratio(&self) -> f64 {
        ratio(self.inline_multi_rows, self.keyed_rows)
    }

    pub fn emphasis_ratio(&self) -> f64 {
        ratio(self.emphasis_key_rows, self.keyed_rows)
    }
}

fn ratio(num: usize, denom: usize) -> f64 {
    if denom == 0 {
        0.0
    } else {
        num as f64 / denom as f64
    }
}

/// Outcome of structure analysis for one table.
#[derive(Debug, Clone)]
pub struct StructureAnalysis {
    pub structure: TableStructure,
    pub confidence: f64,
    /// All six scores in evaluation order, for diagnostics.
    pub scores: Vec<(TableStructure, f64)>,
}

pub fn score_inline_multi_value(stats: &RowStats, source: &SourceMetadata) -> f64 {
    let ratio = stats.inline_ratio();
    if ratio <= INLINE_RATIO_THRESHOLD {
        return 0.0;
    }
    let mut score = INLINE_SCORE_BASE + INLINE_SCORE_RATIO_WEIGHT * ratio;
    if source.has_thead_tbody {
        score += INLINE_THEAD_BONUS;
    }
    if source.has_strong_tags {
        score += INLINE_EMPHASIS_BONUS;
    }
    score.min(SCORE_CAP)
}

pub fn score_plain_multi_value(stats: &RowStats) -> f64 {
    if stats.continuation_rows == 0 {
        return 0.0;
    }
    (PLAIN_SCORE_BASE + PLAIN_SCORE_RATIO_WEIGHT * stats.continuation_ratio()).min(SCORE_CAP)
}

pub fn score_hybrid_multi_value(stats: &RowStats) -> f64 {
    if stats.emphasis_key_rows == 0 {
        return 0.0;
    }
    let emphasis = stats.emphasis_ratio();
    let base = if emphasis >= STRONG_KEY_RATIO_THRESHOLD {
        HYBRID_SCORE_BASE_STRONG
    } else {
        HYBRID_SCORE_BASE_WEAK
    };
    (base + HYBRID_EMPHASIS_WEIGHT * emphasis
        + HYBRID_CONTINUATION_WEIGHT * stats.continuation_ratio())
    .min(SCORE_CAP)
}

pub fn score_simple_key_value(stats: &RowStats) -> f64 {
    if stats.keyed_rows == 0 {
        return 0.0;
    }
    let classifiable = stats.total_rows.saturating_sub(stats.header_rows);
    let mut score = SIMPLE_CLEAN_WEIGHT * ratio(stats.clean_keyed_rows, classifiable);
    if stats.header_cell_key_rows > 0 {
        score += SIMPLE_HEADER_KEY_BONUS;
    }
    // ! Any continuation row disqualifies the simple layout; the penalty
    // ! keeps this score below every continuation-aware score.
    if stats.continuation_rows > 0 {
        score *= SIMPLE_CONTINUATION_PENALTY;
    }
    score.min(SCORE_CAP)
}

pub fn score_category_key_value(stats: &RowStats) -> f64 {
    if stats.category_header_rows == 0 {
        return 0.0;
    }
    let fraction = ratio(stats.category_header_rows, stats.total_rows);
    let mut score = (CATEGORY_SCORE_BASE + CATEGORY_FRACTION_WEIGHT * fraction).min(SCORE_CAP);
    if stats.continuation_rows > 0 {
        score *= CATEGORY_CONTINUATION_PENALTY;
    }
    score
}

pub fn score_complex_multi_value(stats: &RowStats) -> f64 {
    if stats.continuation_rows == 0 {
        return 0.0;
    }
    let dash_fraction = ratio(stats.dash_mode_rows, stats.continuation_rows);
    let mut score = COMPLEX_CONTINUATION_WEIGHT * stats.continuation_ratio()
        + COMPLEX_DASH_WEIGHT * dash_fraction;
    if stats.total_rows <= COMPLEX_SMALL_TABLE_ROWS
        && stats.continuation_ratio() >= COMPLEX_SMALL_TABLE_MIN_RATIO
    {
        score += COMPLEX_SMALL_TABLE_BONUS;
    }
    score.min(SCORE_CAP)
}

/// Runs the six scorers concurrently and waits for all of them before
/// selecting - a join point, never first-to-finish. Ties break by the
/// fixed priority order Inline > Plain > Hybrid > Simple > Category >
/// Complex, matching the evaluation order.
pub async fn analyze(stats: Arc<RowStats>, source: &SourceMetadata) -> StructureAnalysis {
    let source = source.clone();

    let inline = {
        let (stats, source) = (Arc::clone(&stats), source.clone());
        tokio::task::spawn_blocking(move || score_inline_multi_value(&stats, &source))
    };
    let plain = {
        let stats = Arc::clone(&stats);
        tokio::task::spawn_blocking(move || score_plain_multi_value(&stats))
    };
    let hybrid = {
        let stats = Arc::clone(&stats);
        tokio::task::spawn_blocking(move || score_hybrid_multi_value(&stats))
    };
    let simple = {
        let stats = Arc::clone(&stats);
        tokio::task::spawn_blocking(move || score_simple_key_value(&stats))
    };
    let category = {
        let stats = Arc::clone(&stats);
        tokio::task::spawn_blocking(move || score_category_key_value(&stats))
    };
    let complex = {
        let stats = Arc::clone(&stats);
        tokio::task::spawn_blocking(move || score_complex_multi_value(&stats))
    };

    let (inline, plain, hybrid, simple, category, complex) =
        tokio::join!(inline, plain, hybrid, simple, category, complex);

    let scores = vec![
        (TableStructure::InlineMultiValue, inline.unwrap_or(0.0)),
        (TableStructure::PlainMultiValue, plain.unwrap_or(0.0)),
        (TableStructure::HybridMultiValue, hybrid.unwrap_or(0.0)),
        (TableStructure::SimpleKeyValue, simple.unwrap_or(0.0)),
        (TableStructure::CategoryKeyValue, category.unwrap_or(0.0)),
        (TableStructure::ComplexMultiValue, complex.unwrap_or(0.0)),
    ];

    select_structure(scores)
}

/// Synchronous selection over a computed score vector.
pub fn select_structure(scores: Vec<(TableStructure, f64)>) -> StructureAnalysis {
    let mut best = scores[0];
    for candidate in &scores[1..] {
        // * Strictly greater: earlier entries win ties by priority order
        if candidate.1 > best.1 {
            best = *candidate;
        }
    }

    // * Degenerate tables (header-only, single-cell rows) score zero
    // * everywhere; fall back to the simple layout at low confidence.
    if best.1 == 0.0 {
        best = (
            TableStructure::SimpleKeyValue,
            FALLBACK_STRUCTURE_CONFIDENCE,
        );
    }

    tracing::debug!(
        structure = best.0.as_str(),
        confidence = best.1,
        "Structure selected"
    );

    StructureAnalysis {
        structure: best.0,
        confidence: best.1,
        scores,
    }
}
