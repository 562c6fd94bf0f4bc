// * Inline Compound Value Extraction
// * Detects cells whose text packs several logically distinct values into
// * one string and splits them into (prefix, value) pairs. Patterns are
// * checked in a fixed priority order; the first one that applies wins.

use regex::Regex;
use std::sync::LazyLock;

use crate::refinery::tables::collapse_whitespace;

// * Priority 1: paired clock values ("Boost Clock: X ... Game Clock: Y")
static PAIRED_CLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)(boost\s*clock)\s*:?\s*([\d.,]+\s*mhz)\b.*?(game\s*clock)\s*:?\s*([\d.,]+\s*mhz)")
        .expect("Invalid paired clock regex")
});

// * Priority 2: repeated display outputs ("2x HDMI 2.1 2x DisplayPort 1.4a")
static DISPLAY_OUTPUT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+)\s*x\s*(hdmi|displayport|display\s*port|dvi(?:-[di])?|vga|usb(?:-c)?)(\s*\d+(?:\.\d+)?[a-z]*)?")
        .expect("Invalid display output regex")
});

// * Priority 3: repeated dimension groups ("A x B x C mm ... A x B x C inches")
static DIMENSION_GROUP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d+(?:\.\d+)?\s*x\s*\d+(?:\.\d+)?(?:\s*x\s*\d+(?:\.\d+)?)?)\s*(mm|cm|inch(?:es)?|in)\b")
        .expect("Invalid dimension group regex")
});

// * Unit-like tokens that terminate a value rather than open a new label.
// * Keeps "1500 MHz Boost Clock: ..." from reading "MHz Boost Clock" as a label.
const UNIT_STOPWORDS: &[&str] = &[
    "mhz", "ghz", "gbps", "mbps", "gb", "mb", "tb", "w", "watt", "watts", "mm", "cm", "m", "in",
    "inch", "inches", "kg", "g", "lb", "lbs", "oz", "hz", "v", "a", "db", "dba", "rpm", "bit",
];

/// One value split out of a compound cell.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineValue {
    /// Label prefix; empty for unlabeled values.
    pub prefix: String,
    pub value: String,
}

impl InlineValue {
    fn new(prefix: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            prefix: collapse_whitespace(&prefix.into()),
            value: collapse_whitespace(&value.into()),
        }
    }
}

/// Cheap pre-check used by the structure analyzer: does this cell text
/// encode more than one logical value? Same pattern set as the full split,
/// first match short-circuits.
pub fn has_multiple_inline_values(text: &str) -> bool {
    if text.trim().is_empty() {
        return false;
    }
    if PAIRED_CLOCK.is_match(text) {
        return true;
    }
    if DISPLAY_OUTPUT.find_iter(text).count() >= 2 {
        return true;
    }
    if DIMENSION_GROUP.find_iter(text).count() >= 2 {
        return true;
    }
    generic_label_pairs(text).map(|p| p.len()).unwrap_or(0) >= 2
}

/// Splits a cell's text into its logical values. The single-value fallback
/// always returns exactly one pair with an empty prefix.
pub fn split_inline_values(text: &str) -> Vec<InlineValue> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return vec![InlineValue::new("", "")];
    }

    // * 1. Paired clock pattern -> exactly two labeled values
    if let Some(caps) = PAIRED_CLOCK.captures(trimmed) {
        return vec![
            InlineValue::new(&caps[1], &caps[2]),
            InlineValue::new(&caps[3], &caps[4]),
        ];
    }

    // * 2. Repeated display outputs -> one value per match, prefix = interface
    let outputs: Vec<_> = DISPLAY_OUTPUT.captures_iter(trimmed).collect();
    if outputs.len() >= 2 {
        return outputs
            .iter()
            .map(|caps| InlineValue::new(&caps[2], caps.get(0).map(|m| m.as_str()).unwrap_or("")))
            .collect();
    }

    // * 3. Repeated dimension groups -> one value per match, prefix = unit
    let dimensions: Vec<_> = DIMENSION_GROUP.captures_iter(trimmed).collect();
    if dimensions.len() >= 2 {
        return dimensions
            .iter()
            .map(|caps| InlineValue::new(&caps[2], caps.get(0).map(|m| m.as_str()).unwrap_or("")))
            .collect();
    }

    // * 4. Generic repeated "Label: value" groups
    if let Some(pairs) = generic_label_pairs(trimmed) {
        if pairs.len() >= 2 {
            return pairs;
        }
    }

    // * 5. Fallback: the whole text is a single unlabeled value
    vec![InlineValue::new("", trimmed)]
}

/// Splits "Label1: v1 Label2: v2 ..." into pairs by walking the colon
/// segments. Each inner segment carries the previous label's value followed
/// by the next label; the label is recovered as the trailing run of
/// capitalized, non-unit words.
fn generic_label_pairs(text: &str) -> Option<Vec<InlineValue>> {
    let segments: Vec<&str> = text.split(':').collect();
    if segments.len() < 3 {
        return None;
    }

    let mut labels: Vec<String> = vec![collapse_whitespace(segments[0])];
    let mut values: Vec<String> = Vec::new();

    for segment in &segments[1..segments.len() - 1] {
        let (value, label) = split_trailing_label(segment)?;
        values.push(value);
        labels.push(label);
    }
    values.push(collapse_whitespace(segments[segments.len() - 1]));

    if labels.first().map(|l| l.is_empty()).unwrap_or(true) {
        return None;
    }
    if values.iter().any(|v| v.is_empty()) {
        return None;
    }

    Some(
        labels
            .into_iter()
            .zip(values)
            .map(|(label, value)| InlineValue::new(label, value))
            .collect(),
    )
}

/// Splits a colon segment into (value, next label). The label is the
/// trailing run (up to four words) of capitalized alphabetic tokens that
/// are not unit words; returns None when no such run exists.
fn split_trailing_label(segment: &str) -> Option<(String, String)> {
    let tokens: Vec<&str> = segment.split_whitespace().collect();
    let mut label_start = tokens.len();

    for (i, token) in tokens.iter().enumerate().rev() {
        let is_label_word = token.chars().next().map(|c| c.is_uppercase()).unwrap_or(false)
            && token.chars().all(|c| c.is_alphabetic() || c == '-' || c == '/')
            && !UNIT_STOPWORDS.contains(&token.to_lowercase().as_str());
        if is_label_word && tokens.len() - i <= 4 {
            label_start = i;
        } else {
            break;
        }
    }

    if label_start == tokens.len() {
        return None;
    }

    let value = tokens[..label_start].join(" ");
    let label = tokens[label_start..].join(" ");
    Some((value, label))
}
