use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::DbNum;

/// Key component separators per database instance.
///
/// Unlisted databases use [`DbNum::default_key_separator`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbLayout {
    #[serde(default)]
    separators: BTreeMap<DbNum, String>,
}

impl DbLayout {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_separator(mut self, db: DbNum, separator: impl Into<String>) -> Self {
        self.separators.insert(db, separator.into());
        self
    }

    pub fn separator(&self, db: DbNum) -> &str {
        self.separators
            .get(&db)
            .map(|s| s.as_str())
            .unwrap_or_else(|| db.default_key_separator())
    }
}
