// * Layout-Specific Strategy Parsers
// * Six state machines sharing one row walk: AwaitingKey collects keyed
// * rows, AccumulatingContinuation extends the previous key. The inline
// * variant never accumulates across rows; the category variant tracks the
// * current explicit category between header rows.

use unicode_segmentation::UnicodeSegmentation;

use crate::engine::structure::{category_header_text, is_table_header_row};
use crate::refinery::schema::{
    SpecValue, SpecificationValue, TableStructure, ValueOrigin,
};
use crate::refinery::tables::RawTable;
use crate::refinery::typing::{self, normalize_key};
use crate::refinery::values::split_inline_values;

// * Keys that typically carry the product's display name
const NAME_KEYS: &[&str] = &["model", "product name", "name", "graphics engine", "chipset", "gpu"];

// * Product names longer than this are cell noise, not names
const MAX_NAME_WORDS: usize = 12;

/// Walk state shared by all strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    AwaitingKey,
    AccumulatingContinuation,
}

/// One key's collected occurrences, in row order.
#[derive(Debug, Clone)]
pub struct ParsedEntry {
    pub key: String,
    pub values: Vec<SpecificationValue>,
    /// Category declared by a real header row, when the category strategy
    /// saw one before this entry.
    pub explicit_category: Option<String>,
}

/// Raw output of one strategy walk over one table.
#[derive(Debug, Clone, Default)]
pub struct TableParse {
    pub entries: Vec<ParsedEntry>,
    pub header_rows: usize,
    pub continuation_rows: usize,
    pub inline_value_count: usize,
    pub warnings: Vec<String>,
    pub product_name: Option<String>,
}

/// Walks the rows once with the strategy chosen by the structure analyzer.
pub fn parse_table(table: &RawTable, structure: TableStructure) -> TableParse {
    let mut parse = TableParse::default();
    let mut state = WalkState::AwaitingKey;
    let mut current_category: Option<String> = None;
    // * Accumulation target: the most recent keyed row's key, which is not
    // * necessarily the last vector entry when a duplicate key merged
    let mut last_key: Option<String> = None;
    let accumulates_list_items = matches!(
        structure,
        TableStructure::PlainMultiValue
            | TableStructure::HybridMultiValue
            | TableStructure::ComplexMultiValue
    );

    for row in &table.rows {
        if is_table_header_row(row) {
            parse.header_rows += 1;
            continue;
        }

        if let Some(title) = category_header_text(row) {
            if structure == TableStructure::CategoryKeyValue {
                current_category = Some(title);
            }
            continue;
        }

        let key = normalize_key(row.key_text());
        let value = row.value_text().to_string();

        if !key.is_empty() && !value.is_empty() {
            // * Keyed row: close out any accumulation, open a new entry
            if state == WalkState::AccumulatingContinuation {
                tracing::trace!(key = %key, "Accumulation closed by new key");
            }
            state = WalkState::AwaitingKey;
            last_key = Some(key.clone());

            if structure == TableStructure::InlineMultiValue {
                push_inline_row(&mut parse, &key, &value, current_category.clone());
            } else {
                let order = next_order(&parse, &key);
                let spec_value = build_value(&key, &value, ValueOrigin::Direct, order);
                push_value(&mut parse, &key, spec_value, current_category.clone());
            }
        } else if key.is_empty() && !value.is_empty() {
            // * Continuation row: extends the previous key
            if structure == TableStructure::InlineMultiValue {
                // ! The inline walk saves per row and has nothing pending
                parse
                    .warnings
                    .push(format!("Orphan continuation row skipped: \"{value}\""));
                continue;
            }

            let Some(last) = last_key.clone() else {
                parse
                    .warnings
                    .push(format!("Continuation row before any key: \"{value}\""));
                continue;
            };

            state = WalkState::AccumulatingContinuation;
            parse.continuation_rows += 1;

            let order = next_order(&parse, &last);
            let mut spec_value = build_value(&last, &value, ValueOrigin::Continuation, order);
            if accumulates_list_items {
                spec_value = spec_value.as_list_item();
            }
            push_value(&mut parse, &last, spec_value, current_category.clone());
        }
        // * Rows with a key but no value (or neither) carry nothing
    }

    parse.product_name = guess_product_name(&parse);
    parse
}

/// Inline strategy: split the value cell; more than one result stores all
/// of them against this key, a single result behaves like simple key/value.
fn push_inline_row(parse: &mut TableParse, key: &str, value: &str, category: Option<String>) {
    let inline = split_inline_values(value);

    if inline.len() > 1 {
        parse.inline_value_count += inline.len();
        for part in inline {
            let order = next_order(parse, key);
            let spec_value = build_value(key, &part.value, ValueOrigin::InlineSplit, order)
                .with_prefix(part.prefix);
            push_value(parse, key, spec_value, category.clone());
        }
    } else {
        let order = next_order(parse, key);
        let spec_value = build_value(key, value, ValueOrigin::Direct, order);
        push_value(parse, key, spec_value, category);
    }
}

fn build_value(key: &str, value: &str, origin: ValueOrigin, order: usize) -> SpecificationValue {
    let detection = typing::detect(key, value);
    SpecificationValue::new(value, value, origin, order)
        .with_type(detection.value_type, detection.confidence)
        .with_numeric(detection.numeric, detection.unit)
}

/// Next order index within a key's value list.
fn next_order(parse: &TableParse, key: &str) -> usize {
    parse
        .entries
        .iter()
        .find(|e| e.key == key)
        .map(|e| e.values.len())
        .unwrap_or(0)
}

/// Appends a value, merging into the existing entry when the key repeats.
fn push_value(
    parse: &mut TableParse,
    key: &str,
    value: SpecificationValue,
    category: Option<String>,
) {
    if let Some(entry) = parse.entries.iter_mut().find(|e| e.key == key) {
        entry.values.push(value);
        if entry.explicit_category.is_none() {
            entry.explicit_category = category;
        }
    } else {
        parse.entries.push(ParsedEntry {
            key: key.to_string(),
            values: vec![value],
            explicit_category: category,
        });
    }
}

/// Materializes a key's value list into its final shape, by origin:
/// labeled inline splits become a map, unlabeled ones a list, continuation
/// runs a primary + additional structure, anything else an ordered list.
pub fn materialize_value(values: &[SpecificationValue]) -> SpecValue {
    if values.len() == 1 {
        return SpecValue::Scalar(values[0].normalized_text.clone());
    }

    let any_inline = values.iter().any(|v| v.is_inline_value);
    if any_inline {
        if values.iter().all(|v| !v.prefix.is_empty()) {
            return SpecValue::Labeled(
                values
                    .iter()
                    .map(|v| (v.prefix.clone(), v.normalized_text.clone()))
                    .collect(),
            );
        }
        return SpecValue::List(values.iter().map(|v| v.normalized_text.clone()).collect());
    }

    let clean_split =
        !values[0].is_continuation && values[1..].iter().all(|v| v.is_continuation);
    if clean_split {
        return SpecValue::Composite {
            primary: values[0].normalized_text.clone(),
            additional: values[1..].iter().map(|v| v.normalized_text.clone()).collect(),
        };
    }

    SpecValue::List(values.iter().map(|v| v.normalized_text.clone()).collect())
}

fn guess_product_name(parse: &TableParse) -> Option<String> {
    for entry in &parse.entries {
        let lowered = entry.key.to_lowercase();
        if NAME_KEYS.contains(&lowered.as_str()) {
            let candidate = entry.values.first()?.normalized_text.clone();
            if candidate.unicode_words().count() <= MAX_NAME_WORDS {
                return Some(candidate);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refinery::schema::ValueType;
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

    fn table(rows: Vec<RawRow>) -> RawTable {
        RawTable {
            index: 0,
            rows,
            css_classes: vec![],
            has_thead: false,
            has_tbody: false,
        }
    }

    #[test]
    fn test_simple_walk() {
        let t = table(vec![
            kv_row("Memory", "16 GB GDDR6"),
            kv_row("Engine Clock", "2610 MHz"),
        ]);

        let parse = parse_table(&t, TableStructure::SimpleKeyValue);
        assert_eq!(parse.entries.len(), 2);
        assert_eq!(parse.entries[0].key, "Memory");
        assert_eq!(parse.entries[0].values.len(), 1);
        assert_eq!(parse.entries[0].values[0].value_type, ValueType::Memory);
        assert_eq!(parse.entries[1].values[0].numeric, Some(2610.0));
    }

    #[test]
    fn test_continuation_accumulates_on_previous_key() {
        let t = table(vec![
            kv_row("Power Connector", "8-pin"),
            kv_row("", "6-pin"),
        ]);

        let parse = parse_table(&t, TableStructure::PlainMultiValue);
        assert_eq!(parse.entries.len(), 1);

        let entry = &parse.entries[0];
        assert_eq!(entry.values.len(), 2);
        assert!(!entry.values[0].is_continuation);
        assert!(entry.values[1].is_continuation);
        assert!(entry.values[1].is_list_item);
        assert_eq!(entry.values[1].order, 1);
        assert_eq!(parse.continuation_rows, 1);
    }

    #[test]
    fn test_continuation_follows_most_recent_key_after_merge() {
        // * A repeated key merges into its earlier entry; a continuation
        // * after it must still extend that key, not the last vector entry
        let t = table(vec![
            kv_row("Outputs", "HDMI"),
            kv_row("Memory", "16 GB"),
            kv_row("Outputs", "DVI"),
            kv_row("", "DisplayPort"),
        ]);

        let parse = parse_table(&t, TableStructure::PlainMultiValue);
        let outputs = parse.entries.iter().find(|e| e.key == "Outputs").unwrap();
        let memory = parse.entries.iter().find(|e| e.key == "Memory").unwrap();

        assert_eq!(outputs.values.len(), 3);
        assert!(outputs.values[2].is_continuation);
        assert_eq!(outputs.values[2].normalized_text, "DisplayPort");
        assert_eq!(memory.values.len(), 1);
    }

    #[test]
    fn test_list_item_flag_only_for_accumulating_strategies() {
        let t = table(vec![kv_row("Outputs", "HDMI"), kv_row("", "DisplayPort")]);

        let plain = parse_table(&t, TableStructure::PlainMultiValue);
        assert!(plain.entries[0].values[1].is_list_item);

        let simple = parse_table(&t, TableStructure::SimpleKeyValue);
        assert!(simple.entries[0].values[1].is_continuation);
        assert!(!simple.entries[0].values[1].is_list_item);
    }

    #[test]
    fn test_inline_walk_splits_compound_cells() {
        let t = table(vec![kv_row(
            "Engine Clock",
            "Boost Clock: 2610 MHz Game Clock: 2500 MHz",
        )]);

        let parse = parse_table(&t, TableStructure::InlineMultiValue);
        assert_eq!(parse.entries.len(), 1);

        let entry = &parse.entries[0];
        assert_eq!(entry.values.len(), 2);
        assert!(entry.values.iter().all(|v| v.is_inline_value));
        assert_eq!(entry.values[0].prefix, "Boost Clock");
        assert_eq!(entry.values[1].prefix, "Game Clock");
        assert_eq!(parse.inline_value_count, 2);
    }

    #[test]
    fn test_inline_walk_single_value_behaves_like_simple() {
        let t = table(vec![kv_row("Memory", "16 GB GDDR6")]);

        let parse = parse_table(&t, TableStructure::InlineMultiValue);
        let entry = &parse.entries[0];
        assert_eq!(entry.values.len(), 1);
        assert!(!entry.values[0].is_inline_value);
        assert_eq!(parse.inline_value_count, 0);
    }

    #[test]
    fn test_inline_walk_skips_orphan_continuations() {
        let t = table(vec![
            kv_row("Memory", "16 GB"),
            kv_row("", "orphaned"),
        ]);

        let parse = parse_table(&t, TableStructure::InlineMultiValue);
        assert_eq!(parse.entries.len(), 1);
        assert_eq!(parse.entries[0].values.len(), 1);
        assert_eq!(parse.warnings.len(), 1);
    }

    #[test]
    fn test_category_walk_tags_explicit_categories() {
        let header = RawRow {
            cells: vec![RawCell {
                text: "GRAPHICS CARD SPECIFICATIONS".to_string(),
                colspan: 2,
                ..cell("")
            }],
        };
        let t = table(vec![
            kv_row("Interface", "PCI Express 4.0"),
            header,
            kv_row("Memory", "16 GB"),
        ]);

        let parse = parse_table(&t, TableStructure::CategoryKeyValue);
        assert_eq!(parse.entries.len(), 2);
        assert_eq!(parse.entries[0].explicit_category, None);
        assert_eq!(
            parse.entries[1].explicit_category.as_deref(),
            Some("GRAPHICS CARD SPECIFICATIONS")
        );
    }

    #[test]
    fn test_literal_header_row_is_counted_and_ignored() {
        let t = table(vec![
            kv_row("Category", "Specification"),
            kv_row("Memory", "16 GB"),
        ]);

        let parse = parse_table(&t, TableStructure::SimpleKeyValue);
        assert_eq!(parse.header_rows, 1);
        assert_eq!(parse.entries.len(), 1);
    }

    #[test]
    fn test_continuation_before_any_key_warns() {
        let t = table(vec![kv_row("", "floating value")]);

        let parse = parse_table(&t, TableStructure::PlainMultiValue);
        assert!(parse.entries.is_empty());
        assert_eq!(parse.warnings.len(), 1);
    }

    #[test]
    fn test_product_name_guess() {
        let t = table(vec![
            kv_row("Model", "ROG Strix RX 7900 XTX OC"),
            kv_row("Memory", "24 GB"),
        ]);

        let parse = parse_table(&t, TableStructure::SimpleKeyValue);
        assert_eq!(
            parse.product_name.as_deref(),
            Some("ROG Strix RX 7900 XTX OC")
        );
    }

    #[test]
    fn test_materialize_scalar() {
        let values = vec![
            SpecificationValue::new("16 GB", "16 GB", ValueOrigin::Direct, 0),
        ];
        assert_eq!(
            materialize_value(&values),
            SpecValue::Scalar("16 GB".to_string())
        );
    }

    #[test]
    fn test_materialize_labeled_map() {
        let values = vec![
            SpecificationValue::new("2610 MHz", "2610 MHz", ValueOrigin::InlineSplit, 0)
                .with_prefix("Boost Clock"),
            SpecificationValue::new("2500 MHz", "2500 MHz", ValueOrigin::InlineSplit, 1)
                .with_prefix("Game Clock"),
        ];
        match materialize_value(&values) {
            SpecValue::Labeled(map) => {
                assert_eq!(map.get("Boost Clock").map(String::as_str), Some("2610 MHz"));
                assert_eq!(map.get("Game Clock").map(String::as_str), Some("2500 MHz"));
            }
            other => panic!("expected labeled map, got {other:?}"),
        }
    }

    #[test]
    fn test_materialize_unlabeled_inline_list() {
        let values = vec![
            SpecificationValue::new("a", "a", ValueOrigin::InlineSplit, 0),
            SpecificationValue::new("b", "b", ValueOrigin::InlineSplit, 1).with_prefix("B"),
        ];
        assert_eq!(
            materialize_value(&values),
            SpecValue::List(vec!["a".to_string(), "b".to_string()])
        );
    }

    #[test]
    fn test_materialize_composite_from_continuations() {
        let values = vec![
            SpecificationValue::new("8-pin", "8-pin", ValueOrigin::Direct, 0),
            SpecificationValue::new("6-pin", "6-pin", ValueOrigin::Continuation, 1),
        ];
        assert_eq!(
            materialize_value(&values),
            SpecValue::Composite {
                primary: "8-pin".to_string(),
                additional: vec!["6-pin".to_string()],
            }
        );
    }
}
