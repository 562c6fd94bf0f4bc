// * Extraction Quality Scoring
// * Pure function of a completed per-table result: six component scores
// * combined with fixed weights into one overall score.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::constants::*;
use crate::refinery::schema::{
    CategoryGroup, QualityMetrics, SpecValue, TypedSpecification, ValueType,
};

/// Computes quality metrics for one table's extraction.
pub fn assess(
    structure_confidence: f64,
    typed_specs: &BTreeMap<String, TypedSpecification>,
    categorized: &BTreeMap<String, CategoryGroup>,
    processing_time: Duration,
) -> QualityMetrics {
    let total = typed_specs.len();

    let type_accuracy = fraction(
        typed_specs
            .values()
            .filter(|s| s.value_type != ValueType::Unknown)
            .count(),
        total,
    );

    let completeness = fraction(
        typed_specs
            .values()
            .filter(|s| !is_empty_value(&s.value))
            .count(),
        total,
    );

    let multi_value_score = fraction(
        typed_specs
            .values()
            .filter(|s| s.has_multiple_values)
            .count(),
        total,
    );

    let category_score = if categorized.is_empty() {
        CATEGORY_ABSENT_SCORE
    } else {
        CATEGORY_PRESENT_SCORE
    };

    let elapsed_ms = processing_time.as_millis();
    let performance_score = if elapsed_ms < PERF_FAST_MS {
        PERF_FAST_SCORE
    } else if elapsed_ms < PERF_SLOW_MS {
        PERF_MEDIUM_SCORE
    } else {
        PERF_SLOW_SCORE
    };

    let overall = WEIGHT_STRUCTURE * structure_confidence
        + WEIGHT_TYPE_ACCURACY * type_accuracy
        + WEIGHT_COMPLETENESS * completeness
        + WEIGHT_MULTI_VALUE * multi_value_score
        + WEIGHT_CATEGORY * category_score
        + WEIGHT_PERFORMANCE * performance_score;

    QualityMetrics {
        structure_score: structure_confidence,
        type_accuracy,
        completeness,
        multi_value_score,
        category_score,
        performance_score,
        overall,
    }
}

fn fraction(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn is_empty_value(value: &SpecValue) -> bool {
    match value {
        SpecValue::Scalar(s) => s.is_empty(),
        SpecValue::List(items) => items.iter().all(|s| s.is_empty()),
        SpecValue::Labeled(map) => map.values().all(|s| s.is_empty()),
        SpecValue::Composite { primary, additional } => {
            primary.is_empty() && additional.iter().all(|s| s.is_empty())
        }
    }
}
