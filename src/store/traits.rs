use anyhow::Result;

use crate::model::{DbNum, Value};

/// Read access to the key-value configuration store, handed to callbacks.
///
/// The core never writes through this handle: it only computes what should
/// be written and leaves the commit to the embedding service.
pub trait DbHandle: Send + Sync {
    /// Fetch one record; `None` if the key does not exist
    fn get_entry(&self, db: DbNum, table: &str, key: &str) -> Result<Option<Value>>;

    /// All keys of a table
    fn get_keys(&self, db: DbNum, table: &str) -> Result<Vec<String>>;

    /// Check if a record exists
    fn exists(&self, db: DbNum, table: &str, key: &str) -> Result<bool> {
        Ok(self.get_entry(db, table, key)?.is_some())
    }
}
