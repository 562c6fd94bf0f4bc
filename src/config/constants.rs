// * Configuration Constants
// * Central location for all calibrated thresholds and weights.
// ! These values were tuned against a fixture corpus of real vendor tables.
// ! Do not adjust individual values without re-running the full fixture set.

// * Schema version tag emitted in the API envelope metadata
pub const SCHEMA_VERSION: &str = "1.0";

// * Minimum fraction of keyed rows with inline compound values before the
// * inline-multi-value layout scores at all
pub const INLINE_RATIO_THRESHOLD: f64 = 0.15;

// * Emphasis-keyed row fraction above which a table reads as deliberately
// * styled (bold keys) rather than incidentally formatted
pub const STRONG_KEY_RATIO_THRESHOLD: f64 = 0.3;

// * Structure score caps and bases
pub const SCORE_CAP: f64 = 0.95;
pub const INLINE_SCORE_BASE: f64 = 0.55;
pub const INLINE_SCORE_RATIO_WEIGHT: f64 = 0.35;
pub const PLAIN_SCORE_BASE: f64 = 0.55;
pub const PLAIN_SCORE_RATIO_WEIGHT: f64 = 0.30;
pub const HYBRID_SCORE_BASE_STRONG: f64 = 0.30;
pub const HYBRID_SCORE_BASE_WEAK: f64 = 0.15;
pub const HYBRID_EMPHASIS_WEIGHT: f64 = 0.40;
pub const HYBRID_CONTINUATION_WEIGHT: f64 = 0.25;
pub const SIMPLE_CLEAN_WEIGHT: f64 = 0.80;
pub const SIMPLE_HEADER_KEY_BONUS: f64 = 0.10;
pub const SIMPLE_CONTINUATION_PENALTY: f64 = 0.30;
pub const CATEGORY_SCORE_BASE: f64 = 0.50;
pub const CATEGORY_FRACTION_WEIGHT: f64 = 2.0;
pub const CATEGORY_CONTINUATION_PENALTY: f64 = 0.50;
pub const COMPLEX_CONTINUATION_WEIGHT: f64 = 0.40;
pub const COMPLEX_DASH_WEIGHT: f64 = 0.40;
pub const COMPLEX_SMALL_TABLE_BONUS: f64 = 0.35;
pub const COMPLEX_SMALL_TABLE_ROWS: usize = 6;
pub const COMPLEX_SMALL_TABLE_MIN_RATIO: f64 = 0.5;

// * Bonuses applied to the inline score from advisory source signals
pub const INLINE_THEAD_BONUS: f64 = 0.03;
pub const INLINE_EMPHASIS_BONUS: f64 = 0.02;

// * Confidence assigned when no layout scores above zero
pub const FALLBACK_STRUCTURE_CONFIDENCE: f64 = 0.3;

// * Type detection confidences
pub const KEY_LOOKUP_CONFIDENCE: f64 = 0.95;
pub const TEXT_FALLBACK_CONFIDENCE: f64 = 0.6;

// * Category confidences (explicit header vs inferred from key text)
pub const CATEGORY_EXPLICIT_CONFIDENCE: f64 = 0.95;
pub const CATEGORY_INFERRED_CONFIDENCE: f64 = 0.85;

// * Quality score weights - must sum to 1.00 (checked by test)
pub const WEIGHT_STRUCTURE: f64 = 0.25;
pub const WEIGHT_TYPE_ACCURACY: f64 = 0.20;
pub const WEIGHT_COMPLETENESS: f64 = 0.20;
pub const WEIGHT_MULTI_VALUE: f64 = 0.15;
pub const WEIGHT_CATEGORY: f64 = 0.10;
pub const WEIGHT_PERFORMANCE: f64 = 0.10;

// * Performance score latency bands
pub const PERF_FAST_MS: u128 = 1_000;
pub const PERF_SLOW_MS: u128 = 5_000;
pub const PERF_FAST_SCORE: f64 = 0.9;
pub const PERF_MEDIUM_SCORE: f64 = 0.7;
pub const PERF_SLOW_SCORE: f64 = 0.5;

// * Category organization signal
pub const CATEGORY_PRESENT_SCORE: f64 = 0.9;
pub const CATEGORY_ABSENT_SCORE: f64 = 0.5;

// * Result cache defaults and quality-adaptive TTL tiers
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 256;
pub const CACHE_TTL_HIGH_SECS: u64 = 24 * 3600;
pub const CACHE_TTL_MEDIUM_SECS: u64 = 2 * 3600;
pub const CACHE_TTL_LOW_SECS: u64 = 3600;
pub const CACHE_QUALITY_HIGH: f64 = 0.8;
pub const CACHE_QUALITY_MEDIUM: f64 = 0.6;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quality_weights_sum_to_one() {
        let sum = WEIGHT_STRUCTURE
            + WEIGHT_TYPE_ACCURACY
            + WEIGHT_COMPLETENESS
            + WEIGHT_MULTI_VALUE
            + WEIGHT_CATEGORY
            + WEIGHT_PERFORMANCE;
        assert!((sum - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_ttl_tiers_are_ordered() {
        assert!(CACHE_TTL_HIGH_SECS > CACHE_TTL_MEDIUM_SECS);
        assert!(CACHE_TTL_MEDIUM_SECS > CACHE_TTL_LOW_SECS);
        assert!(CACHE_QUALITY_HIGH > CACHE_QUALITY_MEDIUM);
    }
}
