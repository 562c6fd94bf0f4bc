// * Semantic Type Detection
// * Two-stage inference: exact key lookup first, then an ordered pattern
// * ladder over the lower-cased value. Numeric magnitude and unit are pulled
// * in an independent second pass; their absence is not an error.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

use crate::config::constants::{KEY_LOOKUP_CONFIDENCE, TEXT_FALLBACK_CONFIDENCE};
use crate::refinery::schema::ValueType;
use crate::refinery::tables::collapse_whitespace;

// * Stage 1: exact key -> type table (normalized key, original casing)
static KEY_TYPE_MAP: LazyLock<HashMap<&'static str, ValueType>> = LazyLock::new(|| {
    HashMap::from([
        ("Memory", ValueType::Memory),
        ("Memory Size", ValueType::Memory),
        ("Video Memory", ValueType::Memory),
        ("Memory Type", ValueType::Memory),
        ("Engine Clock", ValueType::Clock),
        ("Memory Clock", ValueType::Clock),
        ("Boost Clock", ValueType::Clock),
        ("Game Clock", ValueType::Clock),
        ("Base Clock", ValueType::Clock),
        ("Core Clock", ValueType::Clock),
        ("Memory Speed", ValueType::TransferSpeed),
        ("Memory Interface", ValueType::BusInterface),
        ("Bus Standard", ValueType::BusInterface),
        ("Interface", ValueType::BusInterface),
        ("Digital Max Resolution", ValueType::Resolution),
        ("Max Resolution", ValueType::Resolution),
        ("Resolution", ValueType::Resolution),
        ("Recommended PSU", ValueType::Power),
        ("Power Consumption", ValueType::Power),
        ("TDP", ValueType::Power),
        ("Power Connector", ValueType::PinCount),
        ("Power Connectors", ValueType::PinCount),
        ("CUDA Cores", ValueType::Count),
        ("Stream Processors", ValueType::Count),
        ("DirectX Support", ValueType::Version),
        ("DirectX", ValueType::Version),
        ("OpenGL Support", ValueType::Version),
        ("OpenGL", ValueType::Version),
        ("HDMI", ValueType::DisplayOutput),
        ("DisplayPort", ValueType::DisplayOutput),
        ("Dimensions", ValueType::Dimension),
        ("Card Dimensions", ValueType::Dimension),
        ("Weight", ValueType::Weight),
        ("Net Weight", ValueType::Weight),
        ("HDCP Support", ValueType::Boolean),
    ])
});

// * Stage 2: ordered (type, pattern, confidence) rules, first match wins.
// * Evaluated against the trimmed, lower-cased value.
static TYPE_PATTERNS: LazyLock<Vec<(ValueType, Regex, f64)>> = LazyLock::new(|| {
    let rule = |t, p: &str, c| (t, Regex::new(p).expect("Invalid type pattern"), c);
    vec![
        rule(ValueType::Memory, r"^\d+(\.\d+)?\s*(gb|mb|tb)\b", 0.9),
        rule(ValueType::Clock, r"\d+(\.\d+)?\s*(mhz|ghz)\b", 0.9),
        rule(ValueType::TransferSpeed, r"\d+(\.\d+)?\s*(gbps|mbps)\b", 0.9),
        rule(ValueType::BusInterface, r"pci\s*(express|e)\s*\d?(\.\d+)?", 0.85),
        // * Anchored so three-part physical dimensions never read as NxM
        rule(
            ValueType::Resolution,
            r"^\d{3,5}\s*[x×]\s*\d{3,5}(\s*@\s*\d+\s*hz)?$",
            0.85,
        ),
        rule(ValueType::Power, r"\d+(\.\d+)?\s*w(att)?s?\b", 0.85),
        rule(ValueType::Count, r"^\d{1,4}$", 0.75),
        rule(
            ValueType::Version,
            r"^v?\d+(\.\d+)+$|\b(directx|opengl|vulkan)\b",
            0.8,
        ),
        rule(
            ValueType::DisplayOutput,
            r"\d+\s*x\s*(hdmi|displayport|display\s*port|dvi|vga|usb)",
            0.85,
        ),
        rule(ValueType::PinCount, r"\d+\s*-?\s*pin\b", 0.85),
        rule(
            ValueType::Dimension,
            r"\d+(\.\d+)?\s*x\s*\d+(\.\d+)?(\s*x\s*\d+(\.\d+)?)?\s*(mm|cm|inch(es)?|in)\b",
            0.85,
        ),
        rule(ValueType::Weight, r"\d+(\.\d+)?\s*(kg|g|lb|lbs|oz)\b", 0.85),
        rule(
            ValueType::Boolean,
            r"^(yes|no|true|false|supported|not supported)$",
            0.8,
        ),
        rule(ValueType::Numeric, r"^[\d,]+(\.\d+)?$", 0.65),
    ]
});

// * Numeric magnitude + unit: known unit token first, then any word
static NUMBER_WITH_UNIT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(GHz|MHz|Gbps|Mbps|GB|MB|TB|mm|cm|kg|lbs|lb|oz|W|g|in(?:ch(?:es)?)?)\b")
        .expect("Invalid number-with-unit regex")
});
static NUMBER_WITH_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d[\d,]*(?:\.\d+)?)\s*([A-Za-z][A-Za-z-]*)?").expect("Invalid number regex")
});

/// Outcome of type inference for one value string.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDetection {
    pub value_type: ValueType,
    pub confidence: f64,
    pub numeric: Option<f64>,
    pub unit: String,
}

/// Infers the semantic type for a (key, value) pair.
pub fn detect(key: &str, value: &str) -> TypeDetection {
    let normalized_key = normalize_key(key);
    let (numeric, unit) = extract_numeric(value);

    // * Stage 1: exact key lookup
    if let Some(&value_type) = KEY_TYPE_MAP.get(normalized_key.as_str()) {
        return TypeDetection {
            value_type,
            confidence: KEY_LOOKUP_CONFIDENCE,
            numeric,
            unit,
        };
    }

    // * Stage 2: pattern ladder over the lower-cased value
    let lowered = value.trim().to_lowercase();
    for (value_type, pattern, confidence) in TYPE_PATTERNS.iter() {
        if pattern.is_match(&lowered) {
            return TypeDetection {
                value_type: *value_type,
                confidence: *confidence,
                numeric,
                unit,
            };
        }
    }

    TypeDetection {
        value_type: ValueType::Text,
        confidence: TEXT_FALLBACK_CONFIDENCE,
        numeric,
        unit,
    }
}

/// Pulls the first numeric magnitude and its unit out of a value string.
/// No numeric token yields (None, "") - not an error.
pub fn extract_numeric(value: &str) -> (Option<f64>, String) {
    if let Some(caps) = NUMBER_WITH_UNIT.captures(value) {
        let magnitude = parse_magnitude(&caps[1]);
        return (magnitude, caps[2].to_string());
    }

    if let Some(caps) = NUMBER_WITH_WORD.captures(value) {
        let magnitude = parse_magnitude(&caps[1]);
        let unit = caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default();
        return (magnitude, unit);
    }

    (None, String::new())
}

fn parse_magnitude(token: &str) -> Option<f64> {
    token.replace(',', "").parse::<f64>().ok()
}

/// Strips emphasis markup leftovers and punctuation from a key, keeping
/// spaces, hyphens, and parentheses.
pub fn normalize_key(key: &str) -> String {
    let stripped: String = key
        .replace("<strong>", "")
        .replace("</strong>", "")
        .replace("<b>", "")
        .replace("</b>", "")
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '(' | ')'))
        .collect();
    collapse_whitespace(&stripped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_lookup_wins() {
        let detection = detect("Memory", "16 GB GDDR6");
        assert_eq!(detection.value_type, ValueType::Memory);
        assert_eq!(detection.confidence, KEY_LOOKUP_CONFIDENCE);
        assert_eq!(detection.numeric, Some(16.0));
        assert_eq!(detection.unit, "GB");
    }

    #[test]
    fn test_clock_via_key_lookup() {
        let detection = detect("Engine Clock", "2610 MHz");
        assert_eq!(detection.value_type, ValueType::Clock);
        assert_eq!(detection.numeric, Some(2610.0));
        assert_eq!(detection.unit, "MHz");
    }

    #[test]
    fn test_pattern_fallback_clock() {
        let detection = detect("Some Unknown Key", "1500 MHz");
        assert_eq!(detection.value_type, ValueType::Clock);
        assert_eq!(detection.confidence, 0.9);
    }

    #[test]
    fn test_pattern_fallback_memory() {
        let detection = detect("Unmapped", "8 GB GDDR6X");
        assert_eq!(detection.value_type, ValueType::Memory);
    }

    #[test]
    fn test_bus_interface_pattern() {
        let detection = detect("Unmapped", "PCI Express 4.0");
        assert_eq!(detection.value_type, ValueType::BusInterface);
    }

    #[test]
    fn test_resolution_vs_dimension() {
        let resolution = detect("Unmapped", "7680 x 4320");
        assert_eq!(resolution.value_type, ValueType::Resolution);

        // * Three-part group with a unit reads as a physical dimension
        let dimension = detect("Unmapped", "242 x 112 x 38 mm");
        assert_eq!(dimension.value_type, ValueType::Dimension);
    }

    #[test]
    fn test_pin_count_pattern() {
        let detection = detect("Unmapped", "8-pin");
        assert_eq!(detection.value_type, ValueType::PinCount);
        assert_eq!(detection.numeric, Some(8.0));
    }

    #[test]
    fn test_boolean_pattern() {
        let detection = detect("Unmapped", "Yes");
        assert_eq!(detection.value_type, ValueType::Boolean);
        assert_eq!(detection.numeric, None);
        assert_eq!(detection.unit, "");
    }

    #[test]
    fn test_text_fallback() {
        let detection = detect("Unmapped", "Triple fan axial-tech design");
        assert_eq!(detection.value_type, ValueType::Text);
        assert_eq!(detection.confidence, TEXT_FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_version_pattern() {
        assert_eq!(detect("Unmapped", "12.1").value_type, ValueType::Version);
        assert_eq!(
            detect("Unmapped", "DirectX 12 Ultimate").value_type,
            ValueType::Version
        );
    }

    #[test]
    fn test_count_and_numeric_patterns() {
        assert_eq!(detect("Unmapped", "5120").value_type, ValueType::Count);
        assert_eq!(detect("Unmapped", "10,240").value_type, ValueType::Numeric);
    }

    #[test]
    fn test_numeric_extraction_with_commas() {
        let (numeric, _unit) = extract_numeric("10,240 units");
        assert_eq!(numeric, Some(10240.0));
    }

    #[test]
    fn test_no_numeric_token_is_not_an_error() {
        let (numeric, unit) = extract_numeric("GDDR6");
        assert_eq!(numeric, None);
        assert_eq!(unit, "");
    }

    #[test]
    fn test_key_normalization() {
        assert_eq!(normalize_key("<strong>Memory Clock:</strong>"), "Memory Clock");
        assert_eq!(normalize_key("  Power   (Total) * "), "Power (Total)");
        assert_eq!(normalize_key("Multi-GPU Support?"), "Multi-GPU Support");
    }
}
