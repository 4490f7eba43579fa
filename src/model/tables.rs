use serde::{Deserialize, Serialize};

/// One declared table relationship: `table` depends on `parent` and must be
/// written after it. A table whose parent is itself is a root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRelation {
    #[serde(rename = "tablename")]
    pub table: String,
    pub parent: String,
}

impl TableRelation {
    pub fn new(table: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            parent: parent.into(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_empty() || self.parent == self.table
    }
}

/// Table relationship file contents
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableList {
    #[serde(rename = "tablelist", default)]
    pub relations: Vec<TableRelation>,
}
