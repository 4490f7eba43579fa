use anyhow::Result;
use parking_lot::RwLock;

use crate::model::{DbNum, Value, WriteSet};
use crate::store::traits::DbHandle;

/// In-memory store contents, usable as a [`DbHandle`] for callbacks.
#[derive(Debug, Default)]
pub struct MemoryDb {
    data: RwLock<WriteSet>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_write_set(data: WriteSet) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    pub fn set_entry(&self, db: DbNum, table: &str, key: &str, value: Value) {
        let mut data = self.data.write();
        data.entry(db)
            .or_default()
            .entry(table.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    pub fn delete_entry(&self, db: DbNum, table: &str, key: &str) -> bool {
        let mut data = self.data.write();
        data.get_mut(&db)
            .and_then(|tables| tables.get_mut(table))
            .map(|entries| entries.remove(key).is_some())
            .unwrap_or(false)
    }

    /// Copy of everything currently stored
    pub fn snapshot(&self) -> WriteSet {
        self.data.read().clone()
    }
}

impl DbHandle for MemoryDb {
    fn get_entry(&self, db: DbNum, table: &str, key: &str) -> Result<Option<Value>> {
        let data = self.data.read();
        Ok(data
            .get(&db)
            .and_then(|tables| tables.get(table))
            .and_then(|entries| entries.get(key))
            .cloned())
    }

    fn get_keys(&self, db: DbNum, table: &str) -> Result<Vec<String>> {
        let data = self.data.read();
        Ok(data
            .get(&db)
            .and_then(|tables| tables.get(table))
            .map(|entries| entries.keys().cloned().collect())
            .unwrap_or_default())
    }
}
