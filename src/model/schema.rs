use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{DbNum, YangType, NONE_TABLE};

/// Static metadata of one schema node, keyed by schema path in [`SchemaTable`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub yang_type: YangType,
    /// Database instance the node's table lives in
    #[serde(default)]
    pub db: DbNum,
    /// Statically mapped table; `"NONE"` means no static table
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,
    /// Registered table-resolution callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_xfmr: Option<String>,
    /// Registered key-resolution callback
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_xfmr: Option<String>,
    /// Constant key used instead of predicate values
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    /// Key component separator overriding the database default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delim: Option<String>,
    /// Key leaves of a list node in declaration order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_leaves: Vec<String>,
    /// Registered subtree callback covering this node and its descendants
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtree_xfmr: Option<String>,
}

impl NodeSpec {
    pub fn new(yang_type: YangType, db: DbNum) -> Self {
        Self {
            yang_type,
            db,
            ..Default::default()
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table_name = Some(table.into());
        self
    }

    pub fn with_table_xfmr(mut self, name: impl Into<String>) -> Self {
        self.table_xfmr = Some(name.into());
        self
    }

    pub fn with_key_xfmr(mut self, name: impl Into<String>) -> Self {
        self.key_xfmr = Some(name.into());
        self
    }

    pub fn with_key_name(mut self, key: impl Into<String>) -> Self {
        self.key_name = Some(key.into());
        self
    }

    pub fn with_key_leaves(mut self, leaves: &[&str]) -> Self {
        self.key_leaves = leaves.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_delim(mut self, delim: impl Into<String>) -> Self {
        self.delim = Some(delim.into());
        self
    }

    /// Static table name, ignoring the `NONE` marker
    pub fn static_table(&self) -> Option<&str> {
        self.table_name
            .as_deref()
            .filter(|name| *name != NONE_TABLE)
    }
}

/// How a key component is shaped, used when splitting a raw store key whose
/// components may themselves contain the separator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyKind {
    #[default]
    Plain,
    MacAddress,
    IpAddress,
}

impl KeyKind {
    pub fn is_address(&self) -> bool {
        matches!(self, KeyKind::MacAddress | KeyKind::IpAddress)
    }
}

/// One named component of a composite store key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyComponent {
    pub name: String,
    #[serde(default)]
    pub kind: KeyKind,
    /// Registered value-transform callback for this component
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_xfmr: Option<String>,
}

impl KeyComponent {
    pub fn plain(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: KeyKind::Plain,
            value_xfmr: None,
        }
    }

    pub fn of_kind(name: impl Into<String>, kind: KeyKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value_xfmr: None,
        }
    }

    pub fn with_value_xfmr(mut self, name: impl Into<String>) -> Self {
        self.value_xfmr = Some(name.into());
        self
    }
}

/// A keyed list inside a store table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListSpec {
    pub name: String,
    pub key_components: Vec<KeyComponent>,
    /// Registered callback converting a store key back into key leaves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_reader: Option<String>,
}

/// Store-side metadata of one table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    #[serde(default)]
    pub db: DbNum,
    /// Constant key for singleton tables
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_name: Option<String>,
    #[serde(default)]
    pub lists: Vec<ListSpec>,
    /// Singleton containers; the container name is the store key
    #[serde(default)]
    pub containers: Vec<String>,
    /// field name -> registered value-transform callback
    #[serde(default)]
    pub field_xfmrs: HashMap<String, String>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>, db: DbNum) -> Self {
        Self {
            name: name.into(),
            db,
            ..Default::default()
        }
    }

    pub fn list(&self, name: &str) -> Option<&ListSpec> {
        self.lists.iter().find(|l| l.name == name)
    }

    /// True if any key component declares a value transform
    pub fn has_key_value_xfmr(&self) -> bool {
        self.lists
            .iter()
            .flat_map(|l| l.key_components.iter())
            .any(|c| c.value_xfmr.is_some())
    }

    /// True if any field or key component declares a value transform
    pub fn has_xfmr_fn(&self) -> bool {
        !self.field_xfmrs.is_empty() || self.has_key_value_xfmr()
    }
}

/// Per-schema-path metadata consulted by the resolution engine.
/// Built by an external schema loader; this crate only reads it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaTable {
    #[serde(default)]
    pub nodes: HashMap<String, NodeSpec>,
    #[serde(default)]
    pub tables: HashMap<String, TableSpec>,
}

impl SchemaTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn insert_node(&mut self, xpath: impl Into<String>, spec: NodeSpec) {
        self.nodes.insert(xpath.into(), spec);
    }

    pub fn insert_table(&mut self, spec: TableSpec) {
        self.tables.insert(spec.name.clone(), spec);
    }

    pub fn node(&self, xpath: &str) -> Option<&NodeSpec> {
        self.nodes.get(xpath)
    }

    pub fn table(&self, name: &str) -> Option<&TableSpec> {
        self.tables.get(name)
    }
}
