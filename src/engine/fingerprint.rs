// * Source/Vendor Fingerprinting
// * Produces advisory structural signals and a best-effort vendor label.
// * Everything here is a scoring hint for diagnostics; nothing downstream
// * may branch on it for correctness - only the structure analyzer's
// * scores decide the parsing strategy.

use crate::engine::patterns::RegexCache;
use crate::engine::structure::RowStats;
use crate::refinery::schema::SourceMetadata;
use crate::refinery::tables::RawTable;

// * Continuation density above which a table reads as a list-heavy layout
const CONTINUATION_DENSE_THRESHOLD: f64 = 0.4;

/// How a vendor rule recognizes its table shape. Rules are data, so new
/// vendor shapes are additive - append a rule, never edit a branch.
#[derive(Debug, Clone)]
pub enum VendorSignal {
    /// Regex over the table's space-joined class list.
    ClassMatches(&'static str),
    /// Width attributes or width styling on cells.
    WidthStyling,
    /// Category-header rows present.
    CategoryHeaders,
    /// A colspan banner row containing "Specification".
    SpecificationBanner,
    /// Continuation-row density above the threshold.
    ContinuationDense(f64),
}

#[derive(Debug, Clone)]
pub struct VendorRule {
    pub label: &'static str,
    pub signal: VendorSignal,
}

/// Default rule table, first match wins. Calibrated against the known
/// site shapes; unseen layouts will produce false labels - the label is
/// informational only.
pub fn default_vendor_rules() -> Vec<VendorRule> {
    vec![
        VendorRule {
            label: "Amazon",
            signal: VendorSignal::ClassMatches(r"(?i)a-keyvalue|prodDet"),
        },
        VendorRule {
            label: "PrimeABGB",
            signal: VendorSignal::ClassMatches(r"(?i)woocommerce|shop_attributes"),
        },
        VendorRule {
            label: "ASUS",
            signal: VendorSignal::WidthStyling,
        },
        VendorRule {
            label: "AMD",
            signal: VendorSignal::CategoryHeaders,
        },
        VendorRule {
            label: "MDComputers",
            signal: VendorSignal::SpecificationBanner,
        },
        VendorRule {
            label: "PCStudio",
            signal: VendorSignal::ContinuationDense(CONTINUATION_DENSE_THRESHOLD),
        },
    ]
}

/// Builds the advisory fingerprint for one table.
pub fn fingerprint(
    table: &RawTable,
    stats: &RowStats,
    rules: &[VendorRule],
    patterns: &RegexCache,
) -> SourceMetadata {
    let has_strong_tags = table
        .rows
        .iter()
        .any(|r| r.cells.iter().any(|c| c.has_emphasis));
    let has_width_attributes = table
        .rows
        .iter()
        .any(|r| r.cells.iter().any(|c| c.has_width_attr));
    let has_inline_multi_values = stats.inline_multi_rows > 0;

    let mut metadata = SourceMetadata {
        css_classes: table.css_classes.clone(),
        has_thead_tbody: table.has_thead_tbody(),
        has_strong_tags,
        has_width_attributes,
        has_inline_multi_values,
        vendor: "Unknown".to_string(),
        table_structure_type: structure_type_label(stats),
        complexity: complexity_label(stats),
    };

    for rule in rules {
        if rule_matches(&rule.signal, table, stats, &metadata, patterns) {
            metadata.vendor = rule.label.to_string();
            break;
        }
    }

    tracing::debug!(
        table_index = table.index,
        vendor = %metadata.vendor,
        complexity = %metadata.complexity,
        "Table fingerprinted"
    );

    metadata
}

fn rule_matches(
    signal: &VendorSignal,
    table: &RawTable,
    stats: &RowStats,
    metadata: &SourceMetadata,
    patterns: &RegexCache,
) -> bool {
    match signal {
        VendorSignal::ClassMatches(pattern) => {
            let joined = table.css_classes.join(" ");
            if joined.is_empty() {
                return false;
            }
            match patterns.get(pattern) {
                Ok(regex) => regex.is_match(&joined),
                Err(error) => {
                    // ! A broken rule pattern must not break fingerprinting
                    tracing::warn!(pattern, %error, "Skipping vendor rule with invalid pattern");
                    false
                }
            }
        }
        VendorSignal::WidthStyling => metadata.has_width_attributes,
        VendorSignal::CategoryHeaders => stats.category_header_rows > 0,
        VendorSignal::SpecificationBanner => table.rows.iter().any(|row| {
            row.cells.len() == 1
                && row.cells[0].colspan >= 2
                && row.cells[0].text.to_lowercase().contains("specification")
        }),
        VendorSignal::ContinuationDense(threshold) => stats.continuation_ratio() > *threshold,
    }
}

fn structure_type_label(stats: &RowStats) -> String {
    if stats.inline_multi_rows > 0 {
        "inline-compound"
    } else if stats.continuation_rows > 0 {
        "continuation-list"
    } else if stats.category_header_rows > 0 {
        "categorized"
    } else {
        "flat-key-value"
    }
    .to_string()
}

fn complexity_label(stats: &RowStats) -> String {
    let multi_signals = stats.inline_multi_rows > 0 && stats.continuation_rows > 0;
    if multi_signals {
        "High"
    } else if stats.inline_multi_rows > 0
        || stats.continuation_rows > 0
        || stats.category_header_rows > 0
    {
        "Moderate"
    } else {
        "Simple"
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinery::tables::{RawCell, RawRow};

    fn cell(text: &str) -> RawCell {
        RawCell {
            text: text.to_string(),
            is_header: false,
            colspan: 1,
            has_emphasis: false,
            has_width_attr: false,
        }
    }

    fn kv_row(key: &str, value: &str) -> RawRow {
        RawRow {
            cells: vec![cell(key), cell(value)],
        }
    }

    fn plain_table(rows: Vec<RawRow>, classes: &[&str]) -> RawTable {
        RawTable {
            index: 0,
            rows,
            css_classes: classes.iter().map(|s| s.to_string()).collect(),
            has_thead: false,
            has_tbody: false,
        }
    }

    fn fingerprint_table(table: &RawTable) -> SourceMetadata {
        let stats = RowStats::collect(table);
        let patterns = RegexCache::new();
        fingerprint(table, &stats, &default_vendor_rules(), &patterns)
    }

    #[test]
    fn test_class_rule_matches_first() {
        let table = plain_table(
            vec![kv_row("Memory", "16 GB")],
            &["a-keyvalue", "prodDetTable"],
        );
        let metadata = fingerprint_table(&table);
        assert_eq!(metadata.vendor, "Amazon");
        assert_eq!(metadata.css_classes.len(), 2);
    }

    #[test]
    fn test_width_styling_rule() {
        let mut table = plain_table(vec![kv_row("Memory", "16 GB")], &[]);
        table.rows[0].cells[0].has_width_attr = true;

        let metadata = fingerprint_table(&table);
        assert_eq!(metadata.vendor, "ASUS");
        assert!(metadata.has_width_attributes);
    }

    #[test]
    fn test_specification_banner_rule() {
        let banner = RawRow {
            cells: vec![RawCell {
                text: "Specification".to_string(),
                colspan: 2,
                ..cell("")
            }],
        };
        let table = plain_table(vec![banner, kv_row("Memory", "16 GB")], &[]);

        let metadata = fingerprint_table(&table);
        // * The banner also reads as a category header, and the category
        // * rule sits earlier in the table
        assert!(metadata.vendor == "AMD" || metadata.vendor == "MDComputers");
    }

    #[test]
    fn test_unknown_vendor_default() {
        let table = plain_table(vec![kv_row("Memory", "16 GB")], &["random-class"]);
        let metadata = fingerprint_table(&table);
        assert_eq!(metadata.vendor, "Unknown");
    }

    #[test]
    fn test_rule_table_is_additive() {
        let table = plain_table(vec![kv_row("Memory", "16 GB")], &["a-keyvalue"]);
        let stats = RowStats::collect(&table);
        let patterns = RegexCache::new();

        let mut extended = default_vendor_rules();
        extended.push(VendorRule {
            label: "NewVendor",
            signal: VendorSignal::ClassMatches(r"(?i)a-keyvalue"),
        });

        // * Appending a rule never changes the outcome for inputs matched
        // * by an earlier rule
        let metadata = fingerprint(&table, &stats, &extended, &patterns);
        assert_eq!(metadata.vendor, "Amazon");
    }

    #[test]
    fn test_complexity_labels() {
        let simple = plain_table(vec![kv_row("Memory", "16 GB")], &[]);
        assert_eq!(fingerprint_table(&simple).complexity, "Simple");

        let moderate = plain_table(
            vec![kv_row("Power Connector", "8-pin"), kv_row("", "6-pin")],
            &[],
        );
        assert_eq!(fingerprint_table(&moderate).complexity, "Moderate");

        let high = plain_table(
            vec![
                kv_row("Engine Clock", "Boost Clock: 2610 MHz Game Clock: 2500 MHz"),
                kv_row("", "6-pin"),
            ],
            &[],
        );
        let metadata = fingerprint_table(&high);
        assert_eq!(metadata.complexity, "High");
        assert!(metadata.has_inline_multi_values);
        assert_eq!(metadata.table_structure_type, "inline-compound");
    }
}
