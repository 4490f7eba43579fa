use std::collections::HashMap;

/// Cache entry for one path prefix
#[derive(Clone, Debug, Default)]
struct CacheEntry {
    db_key: Option<String>,
    tables: Vec<String>,
}

/// Per-request cache of resolved keys and tables.
///
/// Owned by a single request and threaded explicitly through the resolution
/// calls; create a fresh one for every top-level request. Reusing one
/// across requests returns stale keys.
#[derive(Debug, Default)]
pub struct TxCache {
    /// Entries keyed by path prefix (predicates included)
    entries: HashMap<String, CacheEntry>,
    /// Free-form values callbacks stash for later callbacks of the same request
    scratch: HashMap<String, serde_json::Value>,
}

impl TxCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Previously resolved store key for a path prefix
    pub fn db_key(&self, path: &str) -> Option<&str> {
        self.entries
            .get(path)
            .and_then(|entry| entry.db_key.as_deref())
            .filter(|key| !key.is_empty())
    }

    pub fn put_db_key(&mut self, path: &str, key: &str) {
        self.entries.entry(path.to_string()).or_default().db_key = Some(key.to_string());
    }

    /// Previously resolved table list for a path
    pub fn tables(&self, path: &str) -> Option<&[String]> {
        self.entries
            .get(path)
            .map(|entry| entry.tables.as_slice())
            .filter(|tables| !tables.is_empty())
    }

    pub fn put_tables(&mut self, path: &str, tables: Vec<String>) {
        self.entries.entry(path.to_string()).or_default().tables = tables;
    }

    pub fn stash(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.scratch.insert(name.into(), value);
    }

    pub fn fetch(&self, name: &str) -> Option<&serde_json::Value> {
        self.scratch.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.scratch.is_empty()
    }

    /// Clear the entire cache
    pub fn clear(&mut self) {
        self.entries.clear();
        self.scratch.clear();
    }
}
