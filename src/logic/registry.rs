//! Named callback registry.
//!
//! Domain handlers register their callbacks under a string name at startup;
//! schema metadata refers to them by that name. Each category has its own
//! parameter struct and return type.

use log::debug;
use std::collections::HashMap;

use crate::error::{Result, XlateError};
use crate::model::{DbNum, Operation, SubOpMap, WriteSet};
use crate::store::{DbHandle, TxCache};

/// Parameters of a key-resolution callback
pub struct KeyXfmrParams<'a> {
    /// Path prefix up to and including the list segment being resolved
    pub uri: &'a str,
    pub request_uri: &'a str,
    pub oper: Operation,
    pub db: DbNum,
    /// Key accumulated so far from enclosing segments
    pub key: &'a str,
    pub store: Option<&'a dyn DbHandle>,
    pub tx_cache: &'a mut TxCache,
    /// Cascading sub-operations (write operations only)
    pub sub_ops: Option<&'a mut SubOpMap>,
}

/// Parameters of a table-resolution callback
pub struct TableXfmrParams<'a> {
    pub uri: &'a str,
    pub request_uri: &'a str,
    pub oper: Operation,
    pub db: DbNum,
    pub key: &'a str,
    pub store: Option<&'a dyn DbHandle>,
    /// Store data already read for this request (GET only)
    pub db_data: Option<&'a WriteSet>,
    pub tx_cache: &'a mut TxCache,
    pub sub_ops: Option<&'a mut SubOpMap>,
    /// Output: set when the table has no physical presence
    pub is_virtual_tbl: bool,
}

/// Parameters of a subtree write callback
pub struct SubtreeWriteParams<'a> {
    pub uri: &'a str,
    pub request_uri: &'a str,
    pub oper: Operation,
    pub db: DbNum,
    pub key: &'a str,
    /// Request payload below `uri`
    pub payload: Option<&'a serde_json::Value>,
    pub store: Option<&'a dyn DbHandle>,
    pub tx_cache: &'a mut TxCache,
    pub sub_ops: &'a mut SubOpMap,
}

/// Parameters of a subtree read callback
pub struct SubtreeReadParams<'a> {
    pub uri: &'a str,
    pub request_uri: &'a str,
    pub db: DbNum,
    pub table: &'a str,
    pub key: &'a str,
    pub db_data: &'a WriteSet,
    pub store: Option<&'a dyn DbHandle>,
    pub tx_cache: &'a mut TxCache,
}

/// Parameters of a value-transform callback
#[derive(Debug, Clone, Copy)]
pub struct ValueXfmrParams<'a> {
    pub oper: Operation,
    pub db: DbNum,
    pub table: &'a str,
    pub key: &'a str,
    pub field: &'a str,
    pub value: &'a str,
}

/// Parameters of a store-key to schema-keys callback
#[derive(Debug, Clone, Copy)]
pub struct KeyReadParams<'a> {
    pub db: DbNum,
    pub table: &'a str,
    pub list: &'a str,
    pub key: &'a str,
}

pub type KeyXfmr = Box<dyn Fn(&mut KeyXfmrParams<'_>) -> anyhow::Result<String> + Send + Sync>;
pub type TableXfmr =
    Box<dyn Fn(&mut TableXfmrParams<'_>) -> anyhow::Result<Vec<String>> + Send + Sync>;
pub type SubtreeWriter =
    Box<dyn Fn(&mut SubtreeWriteParams<'_>) -> anyhow::Result<WriteSet> + Send + Sync>;
pub type SubtreeReader = Box<
    dyn Fn(&mut SubtreeReadParams<'_>) -> anyhow::Result<serde_json::Map<String, serde_json::Value>>
        + Send
        + Sync,
>;
pub type ValueXfmr = Box<dyn Fn(&ValueXfmrParams<'_>) -> anyhow::Result<String> + Send + Sync>;
pub type KeyReader =
    Box<dyn Fn(&KeyReadParams<'_>) -> anyhow::Result<HashMap<String, String>> + Send + Sync>;

/// A registered callback, one variant per category
pub enum Callback {
    KeyResolver(KeyXfmr),
    TableResolver(TableXfmr),
    SubtreeWriter(SubtreeWriter),
    SubtreeReader(SubtreeReader),
    ValueTransform(ValueXfmr),
    KeyReader(KeyReader),
}

impl Callback {
    pub fn kind(&self) -> &'static str {
        match self {
            Callback::KeyResolver(_) => "key-resolver",
            Callback::TableResolver(_) => "table-resolver",
            Callback::SubtreeWriter(_) => "subtree-writer",
            Callback::SubtreeReader(_) => "subtree-reader",
            Callback::ValueTransform(_) => "value-transform",
            Callback::KeyReader(_) => "key-reader",
        }
    }
}

/// Callback registry, populated once at startup and read-only afterwards
#[derive(Default)]
pub struct XfmrRegistry {
    callbacks: HashMap<String, Callback>,
}

impl XfmrRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; a later registration under the same name wins.
    pub fn register(&mut self, name: impl Into<String>, callback: Callback) -> &mut Self {
        let name = name.into();
        debug!("registering {} callback '{}'", callback.kind(), name);
        self.callbacks.insert(name, callback);
        self
    }

    pub fn register_key_xfmr<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut KeyXfmrParams<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register(name, Callback::KeyResolver(Box::new(f)))
    }

    pub fn register_table_xfmr<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut TableXfmrParams<'_>) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.register(name, Callback::TableResolver(Box::new(f)))
    }

    pub fn register_subtree_writer<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut SubtreeWriteParams<'_>) -> anyhow::Result<WriteSet> + Send + Sync + 'static,
    {
        self.register(name, Callback::SubtreeWriter(Box::new(f)))
    }

    pub fn register_subtree_reader<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&mut SubtreeReadParams<'_>) -> anyhow::Result<serde_json::Map<String, serde_json::Value>>
            + Send
            + Sync
            + 'static,
    {
        self.register(name, Callback::SubtreeReader(Box::new(f)))
    }

    pub fn register_value_xfmr<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&ValueXfmrParams<'_>) -> anyhow::Result<String> + Send + Sync + 'static,
    {
        self.register(name, Callback::ValueTransform(Box::new(f)))
    }

    pub fn register_key_reader<F>(&mut self, name: &str, f: F) -> &mut Self
    where
        F: Fn(&KeyReadParams<'_>) -> anyhow::Result<HashMap<String, String>> + Send + Sync + 'static,
    {
        self.register(name, Callback::KeyReader(Box::new(f)))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.callbacks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn lookup(&self, name: &str) -> Result<&Callback> {
        self.callbacks
            .get(name)
            .ok_or_else(|| XlateError::CallbackNotRegistered(name.to_string()))
    }

    fn mismatch(name: &str, expected: &'static str, actual: &Callback) -> XlateError {
        XlateError::CallbackKindMismatch {
            name: name.to_string(),
            expected,
            actual: actual.kind(),
        }
    }

    pub fn call_key_xfmr(&self, name: &str, params: &mut KeyXfmrParams<'_>) -> Result<String> {
        match self.lookup(name)? {
            Callback::KeyResolver(f) => {
                debug!("before key xfmr {} uri({}) oper({})", name, params.uri, params.oper);
                let uri = params.uri;
                let key = f(params).map_err(|e| XlateError::callback(name, uri, e))?;
                debug!("key xfmr {} returned '{}'", name, key);
                Ok(key)
            }
            other => Err(Self::mismatch(name, "key-resolver", other)),
        }
    }

    pub fn call_table_xfmr(
        &self,
        name: &str,
        params: &mut TableXfmrParams<'_>,
    ) -> Result<Vec<String>> {
        match self.lookup(name)? {
            Callback::TableResolver(f) => {
                debug!("before table xfmr {} uri({}) oper({})", name, params.uri, params.oper);
                let uri = params.uri;
                let tables = f(params).map_err(|e| XlateError::callback(name, uri, e))?;
                debug!("table xfmr {} returned {:?}", name, tables);
                Ok(tables)
            }
            other => Err(Self::mismatch(name, "table-resolver", other)),
        }
    }

    pub fn call_subtree_writer(
        &self,
        name: &str,
        params: &mut SubtreeWriteParams<'_>,
    ) -> Result<WriteSet> {
        match self.lookup(name)? {
            Callback::SubtreeWriter(f) => {
                let uri = params.uri;
                f(params).map_err(|e| XlateError::callback(name, uri, e))
            }
            other => Err(Self::mismatch(name, "subtree-writer", other)),
        }
    }

    pub fn call_subtree_reader(
        &self,
        name: &str,
        params: &mut SubtreeReadParams<'_>,
    ) -> Result<serde_json::Map<String, serde_json::Value>> {
        match self.lookup(name)? {
            Callback::SubtreeReader(f) => {
                let uri = params.uri;
                f(params).map_err(|e| XlateError::callback(name, uri, e))
            }
            other => Err(Self::mismatch(name, "subtree-reader", other)),
        }
    }

    pub fn call_value_xfmr(&self, name: &str, params: &ValueXfmrParams<'_>) -> Result<String> {
        match self.lookup(name)? {
            Callback::ValueTransform(f) => {
                f(params).map_err(|e| XlateError::callback(name, params.table, e))
            }
            other => Err(Self::mismatch(name, "value-transform", other)),
        }
    }

    pub fn call_key_reader(
        &self,
        name: &str,
        params: &KeyReadParams<'_>,
    ) -> Result<HashMap<String, String>> {
        match self.lookup(name)? {
            Callback::KeyReader(f) => {
                f(params).map_err(|e| XlateError::callback(name, params.table, e))
            }
            other => Err(Self::mismatch(name, "key-reader", other)),
        }
    }

    /// Run a subtree write callback and fold its returned writes and any
    /// sub-operations it attached into the caller's maps.
    pub fn invoke_subtree_writer(
        &self,
        name: &str,
        params: &mut SubtreeWriteParams<'_>,
        composer: &crate::logic::ResultComposer,
        result: &mut WriteSet,
    ) -> Result<()> {
        let written = self.call_subtree_writer(name, params)?;
        composer.merge(result, &written, params.oper);
        Ok(())
    }
}

impl std::fmt::Debug for XfmrRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<(&String, &'static str)> =
            self.callbacks.iter().map(|(n, c)| (n, c.kind())).collect();
        names.sort();
        f.debug_struct("XfmrRegistry").field("callbacks", &names).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Value;

    fn key_params<'a>(cache: &'a mut TxCache) -> KeyXfmrParams<'a> {
        KeyXfmrParams {
            uri: "/interfaces/interface[name=Eth1/1]",
            request_uri: "/interfaces/interface[name=Eth1/1]/config",
            oper: Operation::Update,
            db: DbNum::ConfigDb,
            key: "",
            store: None,
            tx_cache: cache,
            sub_ops: None,
        }
    }

    #[test]
    fn test_key_xfmr_dispatch() {
        let mut registry = XfmrRegistry::new();
        registry.register_key_xfmr("intf_key", |p| Ok(p.uri.replace("Eth1/1", "Ethernet0")));

        let mut cache = TxCache::new();
        let mut params = key_params(&mut cache);
        let key = registry.call_key_xfmr("intf_key", &mut params).unwrap();
        assert_eq!(key, "/interfaces/interface[name=Ethernet0]");
    }

    #[test]
    fn test_unregistered_and_mismatched_callbacks() {
        let mut registry = XfmrRegistry::new();
        registry.register_value_xfmr("alias", |p| Ok(p.value.to_uppercase()));

        let mut cache = TxCache::new();
        let mut params = key_params(&mut cache);
        match registry.call_key_xfmr("missing", &mut params) {
            Err(XlateError::CallbackNotRegistered(name)) => assert_eq!(name, "missing"),
            other => panic!("unexpected result: {:?}", other),
        }
        match registry.call_key_xfmr("alias", &mut params) {
            Err(XlateError::CallbackKindMismatch { expected, actual, .. }) => {
                assert_eq!(expected, "key-resolver");
                assert_eq!(actual, "value-transform");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_callback_error_is_wrapped() {
        let mut registry = XfmrRegistry::new();
        registry.register_key_xfmr("broken", |_| Err(anyhow::anyhow!("no such interface")));

        let mut cache = TxCache::new();
        let mut params = key_params(&mut cache);
        let err = registry.call_key_xfmr("broken", &mut params).unwrap_err();
        match err {
            XlateError::Callback { name, path, source } => {
                assert_eq!(name, "broken");
                assert_eq!(path, "/interfaces/interface[name=Eth1/1]");
                assert_eq!(source.to_string(), "no such interface");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_subtree_writer_attaches_sub_ops() {
        let mut registry = XfmrRegistry::new();
        registry.register_subtree_writer("vlan_member_sbt", |p| {
            let mut cascade = WriteSet::new();
            cascade
                .entry(DbNum::ConfigDb)
                .or_default()
                .entry("VLAN_MEMBER".to_string())
                .or_default()
                .insert("Vlan10|Ethernet0".to_string(), Value::new());
            p.sub_ops.insert(Operation::Delete, cascade);

            let mut out = WriteSet::new();
            out.entry(DbNum::ConfigDb)
                .or_default()
                .entry("VLAN".to_string())
                .or_default()
                .insert("Vlan10".to_string(), Value::from_pairs([("vlanid", "10")]));
            Ok(out)
        });

        let composer = crate::logic::ResultComposer::new();
        let mut cache = TxCache::new();
        let mut sub_ops = SubOpMap::new();
        let mut result = WriteSet::new();
        let mut params = SubtreeWriteParams {
            uri: "/vlans/vlan[id=10]",
            request_uri: "/vlans/vlan[id=10]",
            oper: Operation::Update,
            db: DbNum::ConfigDb,
            key: "Vlan10",
            payload: None,
            store: None,
            tx_cache: &mut cache,
            sub_ops: &mut sub_ops,
        };
        registry
            .invoke_subtree_writer("vlan_member_sbt", &mut params, &composer, &mut result)
            .unwrap();

        assert_eq!(
            result[&DbNum::ConfigDb]["VLAN"]["Vlan10"].get("vlanid"),
            Some("10")
        );
        assert!(sub_ops[&Operation::Delete][&DbNum::ConfigDb]["VLAN_MEMBER"]
            .contains_key("Vlan10|Ethernet0"));
    }

    #[test]
    fn test_subtree_reader_builds_response() {
        let mut registry = XfmrRegistry::new();
        registry.register_subtree_reader("intf_counters_sbt", |p| {
            let mut out = serde_json::Map::new();
            if let Some(entry) = p
                .db_data
                .get(&p.db)
                .and_then(|tables| tables.get(p.table))
                .and_then(|entries| entries.get(p.key))
            {
                for (field, value) in &entry.fields {
                    out.insert(field.to_lowercase(), serde_json::json!(value));
                }
            }
            Ok(out)
        });

        let mut db_data = WriteSet::new();
        db_data
            .entry(DbNum::CountersDb)
            .or_default()
            .entry("COUNTERS".to_string())
            .or_default()
            .insert(
                "oid:0x1000000000002".to_string(),
                Value::from_pairs([("SAI_PORT_STAT_IF_IN_OCTETS", "42")]),
            );

        let mut cache = TxCache::new();
        let mut params = SubtreeReadParams {
            uri: "/interfaces/interface[name=Eth1/1]/state/counters",
            request_uri: "/interfaces/interface[name=Eth1/1]/state",
            db: DbNum::CountersDb,
            table: "COUNTERS",
            key: "oid:0x1000000000002",
            db_data: &db_data,
            store: None,
            tx_cache: &mut cache,
        };
        let out = registry
            .call_subtree_reader("intf_counters_sbt", &mut params)
            .unwrap();
        assert_eq!(out["sai_port_stat_if_in_octets"], serde_json::json!("42"));
    }

    #[test]
    fn test_registry_debug_lists_names() {
        let mut registry = XfmrRegistry::new();
        registry
            .register_table_xfmr("t", |_| Ok(vec![]))
            .register_key_reader("r", |_| Ok(HashMap::new()));
        assert_eq!(registry.len(), 2);
        assert!(registry.contains("t"));
        let dbg = format!("{:?}", registry);
        assert!(dbg.contains("table-resolver"));
        assert!(dbg.contains("key-reader"));
    }
}
