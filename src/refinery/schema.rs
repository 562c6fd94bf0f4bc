// * Extraction Data Model
// * Result types produced by the specification extraction pipeline.
// * Everything here is created fresh per parse call and immutable once returned.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, SystemTime};

/// Semantic type inferred for an extracted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Memory,
    Clock,
    TransferSpeed,
    BusInterface,
    Resolution,
    Power,
    Count,
    Version,
    DisplayOutput,
    PinCount,
    Dimension,
    Weight,
    Boolean,
    Numeric,
    Text,
    Unknown,
}

impl ValueType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Memory => "Memory",
            ValueType::Clock => "Clock",
            ValueType::TransferSpeed => "TransferSpeed",
            ValueType::BusInterface => "BusInterface",
            ValueType::Resolution => "Resolution",
            ValueType::Power => "Power",
            ValueType::Count => "Count",
            ValueType::Version => "Version",
            ValueType::DisplayOutput => "DisplayOutput",
            ValueType::PinCount => "PinCount",
            ValueType::Dimension => "Dimension",
            ValueType::Weight => "Weight",
            ValueType::Boolean => "Boolean",
            ValueType::Numeric => "Numeric",
            ValueType::Text => "Text",
            ValueType::Unknown => "Unknown",
        }
    }
}

/// The six mutually exclusive table layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableStructure {
    InlineMultiValue,
    PlainMultiValue,
    HybridMultiValue,
    SimpleKeyValue,
    CategoryKeyValue,
    ComplexMultiValue,
}

impl TableStructure {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableStructure::InlineMultiValue => "InlineMultiValue",
            TableStructure::PlainMultiValue => "PlainMultiValue",
            TableStructure::HybridMultiValue => "HybridMultiValue",
            TableStructure::SimpleKeyValue => "SimpleKeyValue",
            TableStructure::CategoryKeyValue => "CategoryKeyValue",
            TableStructure::ComplexMultiValue => "ComplexMultiValue",
        }
    }

    /// Strategy name echoed into parse metadata.
    pub fn strategy_name(&self) -> String {
        format!("Universal_{}", self.as_str())
    }
}

/// How a value occurrence entered the result set.
/// Continuation and inline-split are mutually exclusive origins; using an
/// enum makes the invalid combination unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueOrigin {
    /// Taken directly from a keyed row's value cell.
    Direct,
    /// Came from a row with an empty key cell, extending the previous key.
    Continuation,
    /// Split out of a multi-value cell.
    InlineSplit,
}

/// One extracted value occurrence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationValue {
    pub raw_text: String,
    pub normalized_text: String,
    pub numeric: Option<f64>,
    pub unit: String,
    pub value_type: ValueType,
    pub confidence: f64,
    pub is_continuation: bool,
    pub is_inline_value: bool,
    pub is_list_item: bool,
    pub order: usize,
    /// Label prefix for inline-split values (e.g. "Boost Clock").
    pub prefix: String,
}

impl SpecificationValue {
    /// Builds a value occurrence. Confidence is clamped to [0, 1]; the
    /// origin enum guarantees continuation and inline-split never combine.
    pub fn new(
        raw_text: impl Into<String>,
        normalized_text: impl Into<String>,
        origin: ValueOrigin,
        order: usize,
    ) -> Self {
        Self {
            raw_text: raw_text.into(),
            normalized_text: normalized_text.into(),
            numeric: None,
            unit: String::new(),
            value_type: ValueType::Unknown,
            confidence: 0.0,
            is_continuation: origin == ValueOrigin::Continuation,
            is_inline_value: origin == ValueOrigin::InlineSplit,
            is_list_item: false,
            order,
            prefix: String::new(),
        }
    }

    pub fn with_type(mut self, value_type: ValueType, confidence: f64) -> Self {
        self.value_type = value_type;
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }

    pub fn with_numeric(mut self, numeric: Option<f64>, unit: impl Into<String>) -> Self {
        self.numeric = numeric;
        self.unit = unit.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn as_list_item(mut self) -> Self {
        self.is_list_item = true;
        self
    }
}

/// Materialized value shape for one key: scalar, ordered list, label map,
/// or a primary value with continuation extras.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SpecValue {
    Scalar(String),
    List(Vec<String>),
    Labeled(BTreeMap<String, String>),
    Composite {
        primary: String,
        additional: Vec<String>,
    },
}

impl SpecValue {
    /// Flattens to the plain string shape the downstream normalizer consumes.
    pub fn to_flat_string(&self) -> String {
        match self {
            SpecValue::Scalar(s) => s.clone(),
            SpecValue::List(items) => items.join("; "),
            SpecValue::Labeled(map) => map
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
            SpecValue::Composite {
                primary,
                additional,
            } => {
                if additional.is_empty() {
                    primary.clone()
                } else {
                    format!("{}; {}", primary, additional.join("; "))
                }
            }
        }
    }
}

/// Canonical entry for one key inside one table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypedSpecification {
    pub value: SpecValue,
    pub value_type: ValueType,
    pub unit: String,
    pub numeric: Option<f64>,
    pub confidence: f64,
    pub has_multiple_values: bool,
    pub value_count: usize,
    /// Full ordered list of contributing occurrences.
    pub alternatives: Vec<SpecificationValue>,
}

impl TypedSpecification {
    /// The only way to build an entry; keeps `value_count`,
    /// `has_multiple_values`, and `alternatives` in lockstep.
    pub fn from_values(value: SpecValue, alternatives: Vec<SpecificationValue>) -> Self {
        let value_count = alternatives.len();
        let primary = alternatives.first();
        Self {
            value,
            value_type: primary.map(|v| v.value_type).unwrap_or(ValueType::Unknown),
            unit: primary.map(|v| v.unit.clone()).unwrap_or_default(),
            numeric: primary.and_then(|v| v.numeric),
            confidence: primary.map(|v| v.confidence).unwrap_or(0.0),
            has_multiple_values: value_count > 1,
            value_count,
            alternatives,
        }
    }
}

/// Named bucket of specification entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGroup {
    pub name: String,
    pub order: usize,
    pub confidence: f64,
    /// True when the category came from an actual header row.
    pub is_explicit: bool,
    pub specs: BTreeMap<String, TypedSpecification>,
    pub multi_value_count: usize,
}

/// Structural fingerprint signals - advisory evidence only, never gating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SourceMetadata {
    pub css_classes: Vec<String>,
    pub has_thead_tbody: bool,
    pub has_strong_tags: bool,
    pub has_width_attributes: bool,
    pub has_inline_multi_values: bool,
    /// Best-guess vendor label. Informational; expect false labels on
    /// unseen layouts.
    pub vendor: String,
    pub table_structure_type: String,
    pub complexity: String,
}

/// Per-table parse bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParseMetadata {
    pub structure: TableStructure,
    pub confidence: f64,
    pub strategy: String,
    pub processing_time: Duration,
    pub total_rows: usize,
    pub data_rows: usize,
    pub header_rows: usize,
    pub continuation_rows: usize,
    pub inline_value_count: usize,
    pub multi_value_spec_count: usize,
    pub warnings: Vec<String>,
    pub parsed_at: SystemTime,
}

impl ParseMetadata {
    /// Field-wise equality ignoring the per-run timestamp and latency.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.structure == other.structure
            && self.confidence == other.confidence
            && self.strategy == other.strategy
            && self.total_rows == other.total_rows
            && self.data_rows == other.data_rows
            && self.header_rows == other.header_rows
            && self.continuation_rows == other.continuation_rows
            && self.inline_value_count == other.inline_value_count
            && self.multi_value_spec_count == other.multi_value_spec_count
            && self.warnings == other.warnings
    }
}

/// Six component scores plus the weighted overall score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityMetrics {
    pub structure_score: f64,
    pub type_accuracy: f64,
    pub completeness: f64,
    pub multi_value_score: f64,
    pub category_score: f64,
    pub performance_score: f64,
    pub overall: f64,
}

/// One table's extraction result.
///
/// The three key-indexed mappings (`specifications`, `typed_specs`,
/// `multi_value_specs`) are built together in one pass and share the same
/// key set at all times.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSpecification {
    pub product_name: Option<String>,
    pub specifications: BTreeMap<String, SpecValue>,
    pub typed_specs: BTreeMap<String, TypedSpecification>,
    pub multi_value_specs: BTreeMap<String, Vec<SpecificationValue>>,
    pub categorized: BTreeMap<String, CategoryGroup>,
    pub parse_metadata: ParseMetadata,
    pub source_metadata: SourceMetadata,
    pub quality: QualityMetrics,
}

impl ProductSpecification {
    /// Flattened key -> string view; the exact shape the external
    /// canonical-template normalizer consumes.
    pub fn simple_specs(&self) -> BTreeMap<String, String> {
        self.specifications
            .iter()
            .map(|(k, v)| (k.clone(), v.to_flat_string()))
            .collect()
    }

    /// Field-wise equality ignoring timestamp and latency.
    pub fn content_eq(&self, other: &Self) -> bool {
        self.product_name == other.product_name
            && self.specifications == other.specifications
            && self.typed_specs == other.typed_specs
            && self.multi_value_specs == other.multi_value_specs
            && self.categorized == other.categorized
            && self.parse_metadata.content_eq(&other.parse_metadata)
            && self.source_metadata == other.source_metadata
            && self.quality == other.quality
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn direct_value(text: &str, order: usize) -> SpecificationValue {
        SpecificationValue::new(text, text, ValueOrigin::Direct, order)
            .with_type(ValueType::Text, 0.6)
    }

    #[test]
    fn test_origin_flags_are_exclusive() {
        let cont = SpecificationValue::new("6-pin", "6-pin", ValueOrigin::Continuation, 1);
        assert!(cont.is_continuation);
        assert!(!cont.is_inline_value);

        let inline = SpecificationValue::new("2610 MHz", "2610 MHz", ValueOrigin::InlineSplit, 0);
        assert!(inline.is_inline_value);
        assert!(!inline.is_continuation);
    }

    #[test]
    fn test_confidence_is_clamped() {
        let v = direct_value("x", 0).with_type(ValueType::Clock, 1.7);
        assert_eq!(v.confidence, 1.0);
        let v = direct_value("x", 0).with_type(ValueType::Clock, -0.2);
        assert_eq!(v.confidence, 0.0);
    }

    #[test]
    fn test_typed_specification_invariants() {
        let values = vec![direct_value("8-pin", 0), direct_value("6-pin", 1)];
        let typed = TypedSpecification::from_values(
            SpecValue::List(vec!["8-pin".into(), "6-pin".into()]),
            values,
        );
        assert_eq!(typed.value_count, typed.alternatives.len());
        assert!(typed.has_multiple_values);

        let single = TypedSpecification::from_values(
            SpecValue::Scalar("16 GB".into()),
            vec![direct_value("16 GB", 0)],
        );
        assert_eq!(single.value_count, 1);
        assert!(!single.has_multiple_values);
    }

    #[test]
    fn test_spec_value_flattening() {
        assert_eq!(SpecValue::Scalar("a".into()).to_flat_string(), "a");
        assert_eq!(
            SpecValue::List(vec!["a".into(), "b".into()]).to_flat_string(),
            "a; b"
        );

        let mut map = BTreeMap::new();
        map.insert("Boost Clock".to_string(), "2610 MHz".to_string());
        map.insert("Game Clock".to_string(), "2500 MHz".to_string());
        assert_eq!(
            SpecValue::Labeled(map).to_flat_string(),
            "Boost Clock: 2610 MHz; Game Clock: 2500 MHz"
        );

        assert_eq!(
            SpecValue::Composite {
                primary: "8-pin".into(),
                additional: vec!["6-pin".into()],
            }
            .to_flat_string(),
            "8-pin; 6-pin"
        );
    }

    #[test]
    fn test_strategy_name() {
        assert_eq!(
            TableStructure::SimpleKeyValue.strategy_name(),
            "Universal_SimpleKeyValue"
        );
    }
}
