// * Regex Compilation Cache
// * Explicit shared cache for patterns that arrive as data (vendor rules).
// * Constructed once and injected; never a hidden process-wide static.
// * Fixed pattern sets elsewhere stay as LazyLock statics - those are
// * immutable precompiled state, not a mutable cache.

use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

pub struct RegexCache {
    compiled: RwLock<HashMap<String, Arc<Regex>>>,
}

impl RegexCache {
    pub fn new() -> Self {
        Self {
            compiled: RwLock::new(HashMap::new()),
        }
    }

    // * Returns the compiled pattern, compiling and caching on first use.
    // * Entries are insert-or-replace whole records; concurrent identical
    // * misses may both compile (best-effort, duplicate work is acceptable).
    pub fn get(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        if let Some(compiled) = self
            .compiled
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(pattern)
        {
            return Ok(Arc::clone(compiled));
        }

        let compiled = Arc::new(Regex::new(pattern)?);
        self.compiled
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(pattern.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.compiled
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new()
    }
}
