// * Display Category Mapping
// * Known keys resolve through a static table; everything else falls back
// * to substring heuristics on the lower-cased key. Explicit categories
// * declared by real header rows take precedence over both.

use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

use crate::config::constants::{CATEGORY_EXPLICIT_CONFIDENCE, CATEGORY_INFERRED_CONFIDENCE};
use crate::engine::strategies::ParsedEntry;
use crate::refinery::schema::{CategoryGroup, TypedSpecification};

pub const DEFAULT_CATEGORY: &str = "General";

// * Known key -> category table
static KEY_CATEGORY_MAP: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("Memory", "Memory"),
        ("Memory Size", "Memory"),
        ("Memory Type", "Memory"),
        ("Memory Clock", "Memory"),
        ("Memory Speed", "Memory"),
        ("Memory Interface", "Memory"),
        ("Video Memory", "Memory"),
        ("Engine Clock", "Performance"),
        ("Boost Clock", "Performance"),
        ("Game Clock", "Performance"),
        ("Base Clock", "Performance"),
        ("Core Clock", "Performance"),
        ("CUDA Cores", "Performance"),
        ("Stream Processors", "Performance"),
        ("Power Connector", "Power"),
        ("Power Connectors", "Power"),
        ("Power Consumption", "Power"),
        ("Recommended PSU", "Power"),
        ("TDP", "Power"),
        ("HDMI", "Display"),
        ("DisplayPort", "Display"),
        ("Resolution", "Display"),
        ("Digital Max Resolution", "Display"),
        ("Max Resolution", "Display"),
        ("Interface", "Connectivity"),
        ("Bus Standard", "Connectivity"),
        ("DirectX Support", "Software"),
        ("DirectX", "Software"),
        ("OpenGL Support", "Software"),
        ("OpenGL", "Software"),
        ("Dimensions", "Physical"),
        ("Card Dimensions", "Physical"),
        ("Weight", "Physical"),
        ("Net Weight", "Physical"),
        ("Slot Size", "Physical"),
    ])
});

// * Substring fallback ladder, checked in order on the lower-cased key
const SUBSTRING_RULES: &[(&[&str], &str)] = &[
    (&["clock", "frequency"], "Performance"),
    (&["memory", "ram"], "Memory"),
    (&["power", "watt"], "Power"),
    (&["dimension", "size", "weight"], "Physical"),
    (&["display", "output", "resolution"], "Display"),
    (&["interface", "connector", "port"], "Connectivity"),
    (&["directx", "opengl", "support"], "Software"),
];

/// Maps an extracted key to its display category.
pub fn categorize(key: &str) -> &'static str {
    if let Some(category) = KEY_CATEGORY_MAP.get(key) {
        return category;
    }

    let lowered = key.to_lowercase();
    for (needles, category) in SUBSTRING_RULES {
        if needles.iter().any(|needle| lowered.contains(needle)) {
            return category;
        }
    }

    DEFAULT_CATEGORY
}

/// Groups typed entries into category buckets. Explicit categories carry
/// higher confidence than inferred ones; group order follows first
/// appearance in the table.
pub fn group_by_category(
    entries: &[ParsedEntry],
    typed: &BTreeMap<String, TypedSpecification>,
) -> BTreeMap<String, CategoryGroup> {
    let mut groups: BTreeMap<String, CategoryGroup> = BTreeMap::new();
    let mut next_order = 0usize;

    for entry in entries {
        let Some(spec) = typed.get(&entry.key) else {
            continue;
        };

        let (name, is_explicit) = match &entry.explicit_category {
            Some(name) => (name.clone(), true),
            None => (categorize(&entry.key).to_string(), false),
        };

        let group = groups.entry(name.clone()).or_insert_with(|| {
            let order = next_order;
            next_order += 1;
            CategoryGroup {
                name,
                order,
                confidence: if is_explicit {
                    CATEGORY_EXPLICIT_CONFIDENCE
                } else {
                    CATEGORY_INFERRED_CONFIDENCE
                },
                is_explicit,
                specs: BTreeMap::new(),
                multi_value_count: 0,
            }
        });

        // * An explicit declaration upgrades a previously inferred group
        if is_explicit && !group.is_explicit {
            group.is_explicit = true;
            group.confidence = CATEGORY_EXPLICIT_CONFIDENCE;
        }

        if spec.has_multiple_values {
            group.multi_value_count += 1;
        }
        group.specs.insert(entry.key.clone(), spec.clone());
    }

    groups
}
