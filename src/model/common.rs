use serde::{Deserialize, Serialize};
use std::fmt;

/// Marker used in schema metadata for "no static table".
pub const NONE_TABLE: &str = "NONE";

/// Key component used for unkeyed list nodes under SUBSCRIBE.
pub const WILDCARD_KEY: &str = "*";

/// Suffix marking a list-valued field (comma separated items).
pub const LIST_FIELD_SUFFIX: &str = "@";

/// Separator between items of a list-valued field.
pub const LIST_ITEM_SEPARATOR: &str = ",";

/// Request operation kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operation {
    Get,
    Create,
    Replace,
    Update,
    Delete,
    Subscribe,
}

impl Operation {
    /// Read operations tolerate callback failures and return partial results.
    pub fn is_read(&self) -> bool {
        matches!(self, Operation::Get)
    }

    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Create | Operation::Replace | Operation::Update | Operation::Delete
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Get => "GET",
            Operation::Create => "CREATE",
            Operation::Replace => "REPLACE",
            Operation::Update => "UPDATE",
            Operation::Delete => "DELETE",
            Operation::Subscribe => "SUBSCRIBE",
        };
        f.write_str(name)
    }
}

/// Database instance of the key-value configuration store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DbNum {
    #[serde(rename = "APPL_DB")]
    ApplDb,
    #[serde(rename = "ASIC_DB")]
    AsicDb,
    #[serde(rename = "COUNTERS_DB")]
    CountersDb,
    #[serde(rename = "LOGLEVEL_DB")]
    LogLevelDb,
    #[serde(rename = "CONFIG_DB")]
    ConfigDb,
    #[serde(rename = "FLEX_COUNTER_DB")]
    FlexCounterDb,
    #[serde(rename = "STATE_DB")]
    StateDb,
    #[serde(rename = "ERROR_DB")]
    ErrorDb,
    #[serde(rename = "EVENT_DB")]
    EventDb,
}

impl DbNum {
    pub const ALL: [DbNum; 9] = [
        DbNum::ApplDb,
        DbNum::AsicDb,
        DbNum::CountersDb,
        DbNum::LogLevelDb,
        DbNum::ConfigDb,
        DbNum::FlexCounterDb,
        DbNum::StateDb,
        DbNum::ErrorDb,
        DbNum::EventDb,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DbNum::ApplDb => "APPL_DB",
            DbNum::AsicDb => "ASIC_DB",
            DbNum::CountersDb => "COUNTERS_DB",
            DbNum::LogLevelDb => "LOGLEVEL_DB",
            DbNum::ConfigDb => "CONFIG_DB",
            DbNum::FlexCounterDb => "FLEX_COUNTER_DB",
            DbNum::StateDb => "STATE_DB",
            DbNum::ErrorDb => "ERROR_DB",
            DbNum::EventDb => "EVENT_DB",
        }
    }

    pub fn from_name(name: &str) -> Option<DbNum> {
        DbNum::ALL.into_iter().find(|db| db.name() == name)
    }

    /// Key component separator the store uses for this database by default
    pub fn default_key_separator(&self) -> &'static str {
        match self {
            DbNum::ApplDb | DbNum::AsicDb | DbNum::CountersDb | DbNum::FlexCounterDb => ":",
            _ => "|",
        }
    }
}

impl Default for DbNum {
    fn default() -> Self {
        DbNum::ConfigDb
    }
}

impl fmt::Display for DbNum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Schema node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum YangType {
    Module,
    List,
    Container,
    Leaf,
    LeafList,
    Choice,
    Case,
    Rpc,
    Notif,
}

impl Default for YangType {
    fn default() -> Self {
        YangType::Container
    }
}
