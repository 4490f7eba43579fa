use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use crate::model::{DbNum, Operation, LIST_FIELD_SUFFIX, LIST_ITEM_SEPARATOR};

/// Field map of one store record. An empty field map in a write set means
/// "delete this whole key".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Value {
    pub fields: BTreeMap<String, String>,
}

/// store key -> record
pub type TableData = BTreeMap<String, Value>;

/// table name -> records
pub type DbData = BTreeMap<String, TableData>;

/// Composed write set: database instance -> table -> key -> fields
pub type WriteSet = BTreeMap<DbNum, DbData>;

/// Cascading sub-operations attached by callbacks, applied in addition to
/// the primary operation's writes.
pub type SubOpMap = HashMap<Operation, WriteSet>;

impl Value {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn is_populated(&self) -> bool {
        !self.fields.is_empty()
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|v| v.as_str())
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.fields.remove(name)
    }

    /// Items of a list field. The `@` suffix is added if missing.
    pub fn get_list(&self, name: &str) -> Vec<String> {
        let data = self.get(&list_field_name(name)).unwrap_or("");
        if data.is_empty() {
            return Vec::new();
        }
        data.split(LIST_ITEM_SEPARATOR).map(str::to_string).collect()
    }

    /// Store a list field; an empty list removes the field.
    pub fn set_list(&mut self, name: &str, items: &[String]) {
        let name = list_field_name(name);
        if items.is_empty() {
            self.fields.remove(&name);
        } else {
            self.fields.insert(name, items.join(LIST_ITEM_SEPARATOR));
        }
    }
}

/// True for field names carrying the list-accumulation suffix
pub fn is_list_field(name: &str) -> bool {
    name.ends_with(LIST_FIELD_SUFFIX)
}

/// Field name without the list suffix
pub fn base_field_name(name: &str) -> &str {
    name.strip_suffix(LIST_FIELD_SUFFIX).unwrap_or(name)
}

fn list_field_name(name: &str) -> String {
    if is_list_field(name) {
        name.to_string()
    } else {
        format!("{}{}", name, LIST_FIELD_SUFFIX)
    }
}
