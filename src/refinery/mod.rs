// * The Refinery: Specification Extraction Pipeline
// * Turns raw HTML containing vendor specification tables into structured,
// * typed, categorized key/value data with confidence and quality scores.
// * Extractor -> Fingerprinter -> Structure Analyzer -> Strategy Parser ->
// * Category Mapper -> Quality Analyzer -> Result Cache, one pass per table.

pub mod errors;
pub mod schema;
pub mod tables;
pub mod typing;
pub mod values;

// * Re-exports for convenient access
pub use errors::ExtractError;
pub use schema::{
    CategoryGroup, ParseMetadata, ProductSpecification, QualityMetrics, SourceMetadata,
    SpecValue, SpecificationValue, TableStructure, TypedSpecification, ValueType,
};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::config::constants::{DEFAULT_MAX_CACHE_ENTRIES, SCHEMA_VERSION};
use crate::engine::cache::{ttl_for_quality, CacheKey, ResultCache};
use crate::engine::fingerprint::{self, VendorRule};
use crate::engine::patterns::RegexCache;
use crate::engine::structure::{self, RowStats};
use crate::engine::{categories, quality, strategies};
use tables::RawTable;

/// Parse options supplied by the caller.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    /// Memoize results per (content, options) pair.
    pub enable_caching: bool,
    /// Propagate document-level failures instead of recording them.
    pub throw_on_error: bool,
    /// Result cache size bound.
    pub max_cache_entries: usize,
    /// Upper bound on any cache entry's lifetime.
    pub cache_expiry: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            enable_caching: true,
            throw_on_error: false,
            max_cache_entries: DEFAULT_MAX_CACHE_ENTRIES,
            cache_expiry: Duration::from_secs(24 * 3600),
        }
    }
}

impl ExtractorConfig {
    /// Canonical string folded into the cache key so different options
    /// never share an entry.
    fn cache_fingerprint(&self) -> String {
        format!(
            "caching:{};throw:{};max:{};expiry_secs:{}",
            self.enable_caching,
            self.throw_on_error,
            self.max_cache_entries,
            self.cache_expiry.as_secs()
        )
    }
}

/// Engine counters, observable by callers and tests.
#[derive(Debug, Default)]
pub struct EngineCounters {
    tables_analyzed: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
}

/// Result envelope returned by every parse call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub success: bool,
    pub specifications: Vec<ProductSpecification>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub elapsed: Duration,
}

impl ExtractionResult {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| "{}".to_string())
    }

    /// API rendering: `{success, data, errors, warnings, metadata}`.
    pub fn to_api_response(&self) -> serde_json::Value {
        let table_count = self.specifications.len();
        let average_quality = if table_count == 0 {
            0.0
        } else {
            self.specifications
                .iter()
                .map(|s| s.quality.overall)
                .sum::<f64>()
                / table_count as f64
        };
        let multi_value_table_count = self
            .specifications
            .iter()
            .filter(|s| s.parse_metadata.multi_value_spec_count > 0)
            .count();

        serde_json::json!({
            "success": self.success,
            "data": self.specifications,
            "errors": self.errors,
            "warnings": self.warnings,
            "metadata": {
                "schema_version": SCHEMA_VERSION,
                "table_count": table_count,
                "average_quality": average_quality,
                "multi_value_table_count": multi_value_table_count,
            },
        })
    }
}

/// The specification extraction engine.
///
/// # Example
/// ```ignore
/// use spec_flow::refinery::SpecExtractor;
///
/// let extractor = SpecExtractor::new();
/// let result = extractor.extract(html).await?;
/// for spec in &result.specifications {
///     println!("{:?}: {} keys", spec.product_name, spec.specifications.len());
/// }
/// ```
pub struct SpecExtractor {
    config: ExtractorConfig,
    cache: Arc<ResultCache>,
    patterns: Arc<RegexCache>,
    vendor_rules: Arc<Vec<VendorRule>>,
    counters: Arc<EngineCounters>,
}

impl SpecExtractor {
    /// Creates an extractor with default options.
    pub fn new() -> Self {
        Self::with_config(ExtractorConfig::default())
    }

    /// Creates an extractor with custom options.
    pub fn with_config(config: ExtractorConfig) -> Self {
        Self {
            cache: Arc::new(ResultCache::new(config.max_cache_entries)),
            patterns: Arc::new(RegexCache::new()),
            vendor_rules: Arc::new(fingerprint::default_vendor_rules()),
            counters: Arc::new(EngineCounters::default()),
            config,
        }
    }

    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Structure analyzer invocations since construction.
    pub fn tables_analyzed(&self) -> u64 {
        self.counters.tables_analyzed.load(Ordering::Relaxed)
    }

    pub fn cache_hits(&self) -> u64 {
        self.counters.cache_hits.load(Ordering::Relaxed)
    }

    pub fn cache_misses(&self) -> u64 {
        self.counters.cache_misses.load(Ordering::Relaxed)
    }

    /// Runs the full pipeline over one HTML document. With
    /// `throw_on_error` unset (the default) this always returns `Ok`;
    /// failures are recorded inside the envelope instead.
    pub async fn extract(&self, html: &str) -> Result<ExtractionResult, ExtractError> {
        let started = Instant::now();
        let mut warnings: Vec<String> = Vec::new();
        let mut errors: Vec<String> = Vec::new();

        // * Empty input is a warning, not an error
        if html.trim().is_empty() {
            warnings.push("Empty HTML input; nothing to extract".to_string());
            return Ok(envelope(true, Vec::new(), errors, warnings, started));
        }

        let cache_key = CacheKey::new(html, &self.config.cache_fingerprint());
        if self.config.enable_caching {
            if let Some(cached) = self.cache.get(&cache_key) {
                self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
                debug!(tables = cached.len(), "Cache hit; skipping pipeline");
                return Ok(envelope(true, (*cached).clone(), errors, warnings, started));
            }
            self.counters.cache_misses.fetch_add(1, Ordering::Relaxed);
        }

        // * Document-wide node selection is the pipeline-level boundary
        let html_owned = html.to_string();
        let tables =
            match tokio::task::spawn_blocking(move || tables::extract_tables(&html_owned)).await {
                Ok(tables) => tables,
                Err(join_error) => {
                    let failure = ExtractError::DocumentParse(join_error.to_string());
                    if self.config.throw_on_error {
                        return Err(failure);
                    }
                    error!(%failure, "Document-level extraction failed");
                    errors.push(failure.to_string());
                    return Ok(envelope(false, Vec::new(), errors, warnings, started));
                }
            };

        if tables.is_empty() {
            warnings.push("No specification tables found in document".to_string());
            return Ok(envelope(true, Vec::new(), errors, warnings, started));
        }

        // * Per-table fan-out; join_all reassembles in document order.
        // * The task boundary is also the per-table failure boundary: a
        // * panic inside one table never aborts the batch.
        let handles: Vec<_> = tables
            .into_iter()
            .map(|table| {
                let patterns = Arc::clone(&self.patterns);
                let rules = Arc::clone(&self.vendor_rules);
                let counters = Arc::clone(&self.counters);
                tokio::spawn(process_table(table, patterns, rules, counters))
            })
            .collect();

        let mut specifications = Vec::new();
        for (index, joined) in join_all(handles).await.into_iter().enumerate() {
            match joined {
                Ok(spec) => specifications.push(spec),
                Err(join_error) => {
                    warn!(table_index = index, %join_error, "Table skipped");
                    warnings.push(
                        ExtractError::Table(index, join_error.to_string()).to_string(),
                    );
                }
            }
        }

        // * Store only when enabled and at least one table produced specs
        if self.config.enable_caching && !specifications.is_empty() {
            let mean_quality = specifications
                .iter()
                .map(|s| s.quality.overall)
                .sum::<f64>()
                / specifications.len() as f64;
            let ttl = ttl_for_quality(mean_quality, self.config.cache_expiry);
            self.cache
                .insert(cache_key, specifications.clone(), ttl);
            debug!(mean_quality, ttl_secs = ttl.as_secs(), "Result cached");
        }

        Ok(envelope(true, specifications, errors, warnings, started))
    }
}

impl Default for SpecExtractor {
    fn default() -> Self {
        Self::new()
    }
}

fn envelope(
    success: bool,
    specifications: Vec<ProductSpecification>,
    errors: Vec<String>,
    warnings: Vec<String>,
    started: Instant,
) -> ExtractionResult {
    ExtractionResult {
        success,
        specifications,
        errors,
        warnings,
        elapsed: started.elapsed(),
    }
}

/// Runs the per-table pipeline: stats -> fingerprint -> structure analysis
/// (six concurrent scores, joined) -> strategy walk -> assembly.
async fn process_table(
    table: RawTable,
    patterns: Arc<RegexCache>,
    rules: Arc<Vec<VendorRule>>,
    counters: Arc<EngineCounters>,
) -> ProductSpecification {
    let started = Instant::now();

    let stats = Arc::new(RowStats::collect(&table));
    let source = fingerprint::fingerprint(&table, &stats, &rules, &patterns);

    counters.tables_analyzed.fetch_add(1, Ordering::Relaxed);
    let analysis = structure::analyze(Arc::clone(&stats), &source).await;

    let parse = strategies::parse_table(&table, analysis.structure);

    debug!(
        table_index = table.index,
        structure = analysis.structure.as_str(),
        confidence = analysis.confidence,
        keys = parse.entries.len(),
        "Table parsed"
    );

    assemble(&stats, source, &analysis, parse, started)
}

/// Builds the final per-table result. The three key-indexed mappings are
/// populated together in one pass and stay in lockstep.
fn assemble(
    stats: &RowStats,
    source_metadata: SourceMetadata,
    analysis: &structure::StructureAnalysis,
    parse: strategies::TableParse,
    started: Instant,
) -> ProductSpecification {
    let mut specifications = BTreeMap::new();
    let mut typed_specs = BTreeMap::new();
    let mut multi_value_specs = BTreeMap::new();
    let mut multi_value_spec_count = 0usize;

    for entry in &parse.entries {
        let value = strategies::materialize_value(&entry.values);
        let typed = TypedSpecification::from_values(value.clone(), entry.values.clone());
        if typed.has_multiple_values {
            multi_value_spec_count += 1;
        }

        specifications.insert(entry.key.clone(), value);
        typed_specs.insert(entry.key.clone(), typed);
        multi_value_specs.insert(entry.key.clone(), entry.values.clone());
    }

    let categorized = categories::group_by_category(&parse.entries, &typed_specs);

    let processing_time = started.elapsed();
    let quality = quality::assess(
        analysis.confidence,
        &typed_specs,
        &categorized,
        processing_time,
    );

    let parse_metadata = ParseMetadata {
        structure: analysis.structure,
        confidence: analysis.confidence,
        strategy: analysis.structure.strategy_name(),
        processing_time,
        total_rows: stats.total_rows,
        data_rows: stats.data_rows(),
        header_rows: parse.header_rows,
        continuation_rows: parse.continuation_rows,
        inline_value_count: parse.inline_value_count,
        multi_value_spec_count,
        warnings: parse.warnings,
        parsed_at: SystemTime::now(),
    };

    ProductSpecification {
        product_name: parse.product_name,
        specifications,
        typed_specs,
        multi_value_specs,
        categorized,
        parse_metadata,
        source_metadata,
        quality,
    }
}
