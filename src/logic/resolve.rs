use itertools::Itertools;
use log::{debug, warn};

use crate::error::{Result, XlateError};
use crate::logic::path::{parent_xpath, remove_predicates, segment_predicates, split_path};
use crate::logic::registry::{KeyXfmrParams, TableXfmrParams, XfmrRegistry};
use crate::model::{
    DbLayout, NodeSpec, Operation, ResolveRequest, ResolvedTarget, SchemaTable, SubOpMap,
    YangType, WILDCARD_KEY,
};
use crate::store::{DbHandle, TxCache};

/// Resolves request paths to a store table and key.
///
/// Holds only shared read-only state. Everything that lives for one request
/// (the [`TxCache`] and the sub-operation slot) is passed into each call.
pub struct ResolutionEngine<'a> {
    schema: &'a SchemaTable,
    registry: &'a XfmrRegistry,
    layout: &'a DbLayout,
    store: Option<&'a dyn DbHandle>,
}

/// Outcome of a callback call during resolution
enum Step<T> {
    Done(T),
    /// Read operation hit a callback failure; stop with a partial result
    Tolerated,
}

impl<'a> ResolutionEngine<'a> {
    pub fn new(schema: &'a SchemaTable, registry: &'a XfmrRegistry, layout: &'a DbLayout) -> Self {
        Self {
            schema,
            registry,
            layout,
            store: None,
        }
    }

    /// Store handle passed on to callbacks
    pub fn with_store(mut self, store: &'a dyn DbHandle) -> Self {
        self.store = Some(store);
        self
    }

    fn separator<'s>(&'s self, spec: &'s NodeSpec) -> &'s str {
        match spec.delim.as_deref() {
            Some(delim) if !delim.is_empty() => delim,
            _ => self.layout.separator(spec.db),
        }
    }

    /// Walk a request path and produce its table and store key.
    ///
    /// `sub_ops` is handed to callbacks for write operations only. Callback
    /// failures abort the call, except for GET where the schema path is
    /// returned with no table or key.
    pub fn resolve(
        &self,
        req: &ResolveRequest<'_>,
        cache: &mut TxCache,
        mut sub_ops: Option<&mut SubOpMap>,
    ) -> Result<ResolvedTarget> {
        let (xpath, _) = remove_predicates(req.uri);
        let Some(spec) = self.schema.node(&xpath) else {
            debug!("no schema metadata for {}, nothing to resolve", xpath);
            return Ok(ResolvedTarget::unresolved(xpath));
        };

        let key = match self.resolve_key(req, cache, sub_ops.as_deref_mut())? {
            Step::Done(key) => key,
            Step::Tolerated => return Ok(ResolvedTarget::unresolved(xpath)),
        };

        // Unkeyed list under SUBSCRIBE means every instance
        let key = if key.is_empty()
            && req.oper == Operation::Subscribe
            && spec.yang_type == YangType::List
            && !req.uri.ends_with(']')
        {
            WILDCARD_KEY.to_string()
        } else {
            key
        };

        let (table_name, is_virtual_tbl) =
            match self.resolve_table(req, &xpath, &key, cache, sub_ops)? {
                Step::Done(table) => table,
                Step::Tolerated => return Ok(ResolvedTarget::unresolved(xpath)),
            };

        debug!(
            "resolved {} -> table '{}' key '{}' (virtual: {})",
            req.uri, table_name, key, is_virtual_tbl
        );

        Ok(ResolvedTarget {
            xpath,
            table_name,
            db_key: key,
            is_virtual_tbl,
        })
    }

    /// Table of the requested node only, without walking keys.
    pub fn table_for_uri(
        &self,
        req: &ResolveRequest<'_>,
        cache: &mut TxCache,
        sub_ops: Option<&mut SubOpMap>,
    ) -> Result<ResolvedTarget> {
        let (xpath, _) = remove_predicates(req.uri);
        match self.resolve_table(req, &xpath, "", cache, sub_ops)? {
            Step::Done((table_name, is_virtual_tbl)) => Ok(ResolvedTarget {
                xpath,
                table_name,
                db_key: String::new(),
                is_virtual_tbl,
            }),
            Step::Tolerated => Ok(ResolvedTarget::unresolved(xpath)),
        }
    }

    /// Resolve a path that addresses a store table directly:
    /// `/<module>/<TABLE>/<TABLE_LIST>[k=v]...[/field]`.
    pub fn resolve_native_path(&self, uri: &str) -> ResolvedTarget {
        let (xpath, _) = remove_predicates(uri);
        let segments = split_path(uri);
        if segments.len() < 2 {
            return ResolvedTarget::unresolved(xpath);
        }

        let table_name = segments[1].clone();
        let Some(table) = self.schema.table(&table_name) else {
            debug!("no table metadata for {}", table_name);
            return ResolvedTarget {
                xpath,
                table_name,
                ..Default::default()
            };
        };

        let sep = self.layout.separator(table.db);
        let db_key = if let Some(key_name) = &table.key_name {
            key_name.clone()
        } else if let Some(segment) = segments.get(2) {
            let list_name = segment.split('[').next().unwrap_or(segment);
            let predicates = segment_predicates(segment);

            if predicates.is_empty() {
                // Singleton container
                if table.containers.iter().any(|c| c == list_name) {
                    list_name.to_string()
                } else {
                    String::new()
                }
            } else if let Some(list) = table.list(list_name) {
                // Key leaves in declared order
                list.key_components
                    .iter()
                    .filter_map(|component| {
                        predicates
                            .iter()
                            .find(|(name, _)| *name == component.name)
                            .map(|(_, value)| value.as_str())
                    })
                    .join(sep)
            } else {
                predicates.iter().map(|(_, value)| value.as_str()).join(sep)
            }
        } else {
            String::new()
        };

        ResolvedTarget {
            xpath,
            table_name,
            db_key,
            is_virtual_tbl: false,
        }
    }

    fn resolve_key(
        &self,
        req: &ResolveRequest<'_>,
        cache: &mut TxCache,
        mut sub_ops: Option<&mut SubOpMap>,
    ) -> Result<Step<String>> {
        let mut key = String::new();
        let mut cur_path = String::new();

        for segment in split_path(req.uri) {
            cur_path.push('/');
            cur_path.push_str(&segment);

            let (cur_xpath, _) = remove_predicates(&cur_path);
            let Some(spec) = self.schema.node(&cur_xpath) else {
                continue;
            };

            // Unkeyed segments contribute only through a callback or constant key
            match spec.yang_type {
                YangType::LeafList => break,
                _ if spec.key_xfmr.is_some() || spec.key_name.is_some() => {}
                YangType::List if segment.contains('[') => {}
                _ => continue,
            }

            if let Some(xfmr) = &spec.key_xfmr {
                // Callback keys replace the accumulated key; the callback sees it as input
                if let Some(cached) = cache.db_key(&cur_path) {
                    debug!("key for {} from cache: {}", cur_path, cached);
                    key = cached.to_string();
                    continue;
                }

                let mut params = KeyXfmrParams {
                    uri: &cur_path,
                    request_uri: req.request_uri,
                    oper: req.oper,
                    db: spec.db,
                    key: &key,
                    store: self.store,
                    tx_cache: &mut *cache,
                    sub_ops: if req.oper.is_write() {
                        sub_ops.as_deref_mut()
                    } else {
                        None
                    },
                };
                match self.registry.call_key_xfmr(xfmr, &mut params) {
                    Ok(resolved) => {
                        cache.put_db_key(&cur_path, &resolved);
                        key = resolved;
                    }
                    Err(err) => return self.tolerate(req.oper, err),
                }
                continue;
            }

            let component = match &spec.key_name {
                Some(key_name) => key_name.clone(),
                None => predicate_key(spec, &segment, self.separator(spec)),
            };

            if component.is_empty() {
                warn!("no key values found in segment '{}' of {}", segment, req.uri);
                continue;
            }
            if !key.is_empty() {
                key.push_str(self.separator(spec));
            }
            key.push_str(&component);
        }

        Ok(Step::Done(key))
    }

    fn resolve_table(
        &self,
        req: &ResolveRequest<'_>,
        xpath: &str,
        key: &str,
        cache: &mut TxCache,
        sub_ops: Option<&mut SubOpMap>,
    ) -> Result<Step<(String, bool)>> {
        let Some(spec) = self.table_owner(xpath) else {
            debug!("no table mapping for {}", xpath);
            return Ok(Step::Done((String::new(), false)));
        };

        if let Some(table) = spec.static_table() {
            return Ok(Step::Done((table.to_string(), false)));
        }
        let Some(xfmr) = &spec.table_xfmr else {
            return Ok(Step::Done((String::new(), false)));
        };

        if req.oper.is_read() {
            if let Some(tables) = cache.tables(req.uri) {
                debug!("tables for {} from cache: {:?}", req.uri, tables);
                return Ok(Step::Done((single_table(req.uri, tables), false)));
            }
        }

        let mut params = TableXfmrParams {
            uri: req.uri,
            request_uri: req.request_uri,
            oper: req.oper,
            db: spec.db,
            key,
            store: self.store,
            db_data: req.db_data,
            tx_cache: &mut *cache,
            sub_ops: if req.oper.is_write() { sub_ops } else { None },
            is_virtual_tbl: false,
        };
        let tables = match self.registry.call_table_xfmr(xfmr, &mut params) {
            Ok(tables) => tables,
            Err(err) => return self.tolerate(req.oper, err),
        };
        let is_virtual_tbl = params.is_virtual_tbl;

        let table = single_table(req.uri, &tables);
        if req.oper.is_read() {
            cache.put_tables(req.uri, tables);
        }
        Ok(Step::Done((table, is_virtual_tbl)))
    }

    /// Nearest node at or above `xpath` that maps to a table
    fn table_owner(&self, xpath: &str) -> Option<&NodeSpec> {
        let mut cur = xpath.to_string();
        while !cur.is_empty() {
            if let Some(spec) = self.schema.node(&cur) {
                if spec.static_table().is_some() || spec.table_xfmr.is_some() {
                    return Some(spec);
                }
            }
            cur = parent_xpath(&cur);
        }
        None
    }

    fn tolerate<T>(&self, oper: Operation, err: XlateError) -> Result<Step<T>> {
        if oper.is_read() {
            debug!("ignoring callback failure for {}: {}", oper, err);
            Ok(Step::Tolerated)
        } else {
            Err(err)
        }
    }
}

/// Predicate values of a list segment joined into one key component.
/// Values follow the node's declared key leaves when it has them.
fn predicate_key(spec: &NodeSpec, segment: &str, sep: &str) -> String {
    let predicates = segment_predicates(segment);
    if spec.key_leaves.is_empty() {
        return predicates.into_iter().map(|(_, value)| value).join(sep);
    }

    spec.key_leaves
        .iter()
        .filter_map(|leaf| {
            let value = predicates
                .iter()
                .find(|(name, _)| name == leaf)
                .map(|(_, value)| value.as_str());
            if value.is_none() {
                debug!("segment '{}' has no value for key leaf '{}'", segment, leaf);
            }
            value
        })
        .join(sep)
}

fn single_table(uri: &str, tables: &[String]) -> String {
    match tables {
        [table] => table.clone(),
        _ => {
            debug!(
                "table callback returned {} tables for {}, leaving table unresolved",
                tables.len(),
                uri
            );
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DbNum, KeyComponent, ListSpec, TableSpec};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn schema() -> SchemaTable {
        let mut schema = SchemaTable::new();
        schema.insert_node("/vlans", NodeSpec::new(YangType::Container, DbNum::ConfigDb));
        schema.insert_node(
            "/vlans/vlan",
            NodeSpec::new(YangType::List, DbNum::ConfigDb)
                .with_table("VLAN")
                .with_key_leaves(&["id"]),
        );
        schema.insert_node(
            "/vlans/vlan/config",
            NodeSpec::new(YangType::Container, DbNum::ConfigDb),
        );
        schema.insert_node(
            "/vlans/vlan/members/member",
            NodeSpec::new(YangType::List, DbNum::ConfigDb).with_table("VLAN_MEMBER"),
        );
        schema.insert_node(
            "/vlans/vlan/config/tags",
            NodeSpec::new(YangType::LeafList, DbNum::ConfigDb),
        );
        schema.insert_node(
            "/acl/acl-sets/acl-set",
            NodeSpec::new(YangType::List, DbNum::ConfigDb)
                .with_table("ACL_TABLE")
                .with_key_leaves(&["name", "type"]),
        );
        schema.insert_node(
            "/system/global",
            NodeSpec::new(YangType::List, DbNum::ConfigDb)
                .with_table("DEVICE_METADATA")
                .with_key_name("localhost"),
        );
        schema.insert_node(
            "/nat/pools/pool",
            NodeSpec::new(YangType::List, DbNum::ConfigDb)
                .with_table("NAT_POOL")
                .with_delim("_"),
        );
        schema.insert_node(
            "/system/config",
            NodeSpec::new(YangType::Container, DbNum::ConfigDb)
                .with_table("DEVICE_METADATA")
                .with_key_name("localhost"),
        );
        schema.insert_node(
            "/system/config/hostname",
            NodeSpec::new(YangType::Leaf, DbNum::ConfigDb),
        );
        schema.insert_node(
            "/interfaces/interface",
            NodeSpec::new(YangType::List, DbNum::ConfigDb)
                .with_table_xfmr("intf_table_xfmr")
                .with_key_xfmr("intf_key_xfmr"),
        );
        schema.insert_node(
            "/interfaces/interface/counters",
            NodeSpec::new(YangType::Container, DbNum::CountersDb)
                .with_table_xfmr("intf_counters_xfmr"),
        );
        schema.insert_node(
            "/routes/route",
            NodeSpec::new(YangType::List, DbNum::ApplDb).with_table("ROUTE_TABLE"),
        );

        let mut port = TableSpec::new("PORT", DbNum::ConfigDb);
        port.lists.push(ListSpec {
            name: "PORT_LIST".to_string(),
            key_components: vec![KeyComponent::plain("ifname")],
            key_reader: None,
        });
        schema.insert_table(port);

        let mut vlan_member = TableSpec::new("VLAN_MEMBER", DbNum::ConfigDb);
        vlan_member.lists.push(ListSpec {
            name: "VLAN_MEMBER_LIST".to_string(),
            key_components: vec![KeyComponent::plain("name"), KeyComponent::plain("ifname")],
            key_reader: None,
        });
        schema.insert_table(vlan_member);

        let mut metadata = TableSpec::new("DEVICE_METADATA", DbNum::ConfigDb);
        metadata.containers.push("localhost".to_string());
        schema.insert_table(metadata);

        schema
    }

    fn registry(key_calls: Arc<AtomicUsize>) -> XfmrRegistry {
        let mut registry = XfmrRegistry::new();
        registry
            .register_key_xfmr("intf_key_xfmr", move |p| {
                key_calls.fetch_add(1, Ordering::SeqCst);
                let info = crate::logic::PathInfo::new(p.uri);
                match info.var("name") {
                    "bad" => Err(anyhow::anyhow!("unknown interface")),
                    name => Ok(name.replace("Eth1/", "Ethernet")),
                }
            })
            .register_table_xfmr("intf_table_xfmr", |p| {
                let info = crate::logic::PathInfo::new(p.uri);
                if info.var("name") == "orphan" {
                    Err(anyhow::anyhow!("no table for {}", p.key))
                } else if info.var("name").starts_with("PortChannel") {
                    Ok(vec!["PORTCHANNEL".to_string()])
                } else if info.var("name") == "all" {
                    Ok(vec!["PORT".to_string(), "PORTCHANNEL".to_string()])
                } else {
                    Ok(vec!["PORT".to_string()])
                }
            })
            .register_table_xfmr("intf_counters_xfmr", |p| {
                p.is_virtual_tbl = true;
                Ok(vec!["COUNTERS".to_string()])
            });
        registry
    }

    fn resolve(uri: &str, oper: Operation) -> Result<ResolvedTarget> {
        let schema = schema();
        let registry = registry(Arc::new(AtomicUsize::new(0)));
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);
        let mut cache = TxCache::new();
        engine.resolve(&ResolveRequest::new(uri, oper), &mut cache, None)
    }

    #[test]
    fn test_static_table_and_predicate_key() {
        let target = resolve("/vlans/vlan[id=10]/config", Operation::Update).unwrap();
        assert_eq!(target.xpath, "/vlans/vlan/config");
        assert_eq!(target.table_name, "VLAN");
        assert_eq!(target.db_key, "10");
        assert!(!target.is_virtual_tbl);
    }

    #[test]
    fn test_multiple_predicates_and_nested_lists() {
        let target = resolve(
            "/acl/acl-sets/acl-set[name=ACL1][type=ACL_IPV4]",
            Operation::Create,
        )
        .unwrap();
        assert_eq!(target.db_key, "ACL1|ACL_IPV4");

        let target = resolve(
            "/vlans/vlan[id=Vlan10]/members/member[ifname=Ethernet0]",
            Operation::Create,
        )
        .unwrap();
        assert_eq!(target.table_name, "VLAN_MEMBER");
        assert_eq!(target.db_key, "Vlan10|Ethernet0");
    }

    #[test]
    fn test_predicates_follow_declared_key_leaves() {
        let target = resolve(
            "/acl/acl-sets/acl-set[type=ACL_IPV4][name=ACL1]",
            Operation::Update,
        )
        .unwrap();
        assert_eq!(target.table_name, "ACL_TABLE");
        assert_eq!(target.db_key, "ACL1|ACL_IPV4");
    }

    #[test]
    fn test_separator_follows_database() {
        let target = resolve(
            "/routes/route[vrf=default][prefix=10.0.0.0/24]",
            Operation::Update,
        )
        .unwrap();
        assert_eq!(target.db_key, "default:10.0.0.0/24");
    }

    #[test]
    fn test_node_delimiter_overrides_database_separator() {
        let target = resolve("/nat/pools/pool[name=p1][id=2]", Operation::Update).unwrap();
        assert_eq!(target.table_name, "NAT_POOL");
        assert_eq!(target.db_key, "p1_2");
    }

    #[test]
    fn test_constant_key_name() {
        let target = resolve("/system/global[name=x]", Operation::Update).unwrap();
        assert_eq!(target.table_name, "DEVICE_METADATA");
        assert_eq!(target.db_key, "localhost");
    }

    #[test]
    fn test_container_constant_key_name() {
        let target = resolve("/system/config/hostname", Operation::Update).unwrap();
        assert_eq!(target.xpath, "/system/config/hostname");
        assert_eq!(target.table_name, "DEVICE_METADATA");
        assert_eq!(target.db_key, "localhost");

        let target = resolve("/system/config", Operation::Get).unwrap();
        assert_eq!(target.db_key, "localhost");
    }

    #[test]
    fn test_unkeyed_list_delete_calls_key_callback() {
        let schema = schema();
        let mut registry = XfmrRegistry::new();
        registry
            .register_key_xfmr("intf_key_xfmr", |p| {
                assert_eq!(p.uri, "/interfaces/interface");
                if let Some(sub_ops) = p.sub_ops.as_deref_mut() {
                    let ports = sub_ops
                        .entry(Operation::Delete)
                        .or_default()
                        .entry(DbNum::ConfigDb)
                        .or_default()
                        .entry("PORT".to_string())
                        .or_default();
                    for name in ["Ethernet0", "Ethernet4"] {
                        ports.insert(name.to_string(), crate::model::Value::new());
                    }
                }
                Ok(String::new())
            })
            .register_table_xfmr("intf_table_xfmr", |_| Ok(vec!["PORT".to_string()]));
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);

        let mut cache = TxCache::new();
        let mut sub_ops = SubOpMap::new();
        let target = engine
            .resolve(
                &ResolveRequest::new("/interfaces/interface", Operation::Delete),
                &mut cache,
                Some(&mut sub_ops),
            )
            .unwrap();
        assert_eq!(target.table_name, "PORT");
        assert!(target.db_key.is_empty());
        assert_eq!(sub_ops[&Operation::Delete][&DbNum::ConfigDb]["PORT"].len(), 2);
    }

    #[test]
    fn test_leaf_list_stops_key_walk() {
        let target = resolve("/vlans/vlan[id=10]/config/tags[tag=1]", Operation::Get).unwrap();
        assert_eq!(target.db_key, "10");
        assert_eq!(target.table_name, "VLAN");
    }

    #[test]
    fn test_subscribe_unkeyed_list_is_wildcard() {
        let target = resolve("/vlans/vlan", Operation::Subscribe).unwrap();
        assert_eq!(target.db_key, "*");
        assert_eq!(target.table_name, "VLAN");

        let target = resolve("/vlans/vlan", Operation::Delete).unwrap();
        assert_eq!(target.db_key, "");
    }

    #[test]
    fn test_key_and_table_callbacks() {
        let target = resolve("/interfaces/interface[name=Eth1/4]", Operation::Update).unwrap();
        assert_eq!(target.table_name, "PORT");
        assert_eq!(target.db_key, "Ethernet4");

        let target =
            resolve("/interfaces/interface[name=PortChannel1]", Operation::Update).unwrap();
        assert_eq!(target.table_name, "PORTCHANNEL");
        assert_eq!(target.db_key, "PortChannel1");
    }

    #[test]
    fn test_key_callback_result_is_cached() {
        let calls = Arc::new(AtomicUsize::new(0));
        let schema = schema();
        let registry = registry(calls.clone());
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);
        let mut cache = TxCache::new();

        let uri = "/interfaces/interface[name=Eth1/1]";
        let first = engine
            .resolve(&ResolveRequest::new(uri, Operation::Get), &mut cache, None)
            .unwrap();
        let child = format!("{}/counters", uri);
        let second = engine
            .resolve(&ResolveRequest::new(&child, Operation::Get), &mut cache, None)
            .unwrap();

        assert_eq!(first.db_key, "Ethernet1");
        assert_eq!(second.db_key, "Ethernet1");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.db_key(uri), Some("Ethernet1"));
        assert_eq!(cache.tables(uri).unwrap(), &["PORT".to_string()]);

        // A fresh cache recomputes
        let mut cache = TxCache::new();
        engine
            .resolve(&ResolveRequest::new(uri, Operation::Get), &mut cache, None)
            .unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_read_tolerates_callback_failure() {
        let target = resolve("/interfaces/interface[name=bad]", Operation::Get).unwrap();
        assert_eq!(target.xpath, "/interfaces/interface");
        assert!(!target.has_table());
        assert!(target.db_key.is_empty());

        let err = resolve("/interfaces/interface[name=bad]", Operation::Update).unwrap_err();
        assert!(matches!(err, XlateError::Callback { ref name, .. } if name == "intf_key_xfmr"));
    }

    #[test]
    fn test_table_callback_failure() {
        let target = resolve("/interfaces/interface[name=orphan]", Operation::Get).unwrap();
        assert_eq!(target.xpath, "/interfaces/interface");
        assert!(!target.has_table());
        assert!(target.db_key.is_empty());

        let err = resolve("/interfaces/interface[name=orphan]", Operation::Replace).unwrap_err();
        assert!(matches!(err, XlateError::Callback { ref name, .. } if name == "intf_table_xfmr"));
    }

    #[test]
    fn test_virtual_table_flag() {
        let target =
            resolve("/interfaces/interface[name=Eth1/2]/counters", Operation::Get).unwrap();
        assert_eq!(target.table_name, "COUNTERS");
        assert!(target.is_virtual_tbl);
        assert_eq!(target.db_key, "Ethernet2");
    }

    #[test]
    fn test_multiple_tables_leave_table_unresolved() {
        let target = resolve("/interfaces/interface[name=all]", Operation::Get).unwrap();
        assert!(!target.has_table());
        assert_eq!(target.db_key, "all");
    }

    #[test]
    fn test_table_callback_sees_read_data() {
        let schema = schema();
        let mut registry = XfmrRegistry::new();
        registry
            .register_key_xfmr("intf_key_xfmr", |_| Ok("PortChannel1".to_string()))
            .register_table_xfmr("intf_table_xfmr", |p| {
                let known = p
                    .db_data
                    .and_then(|data| data.get(&DbNum::ConfigDb))
                    .map(|tables| tables.contains_key("PORTCHANNEL"))
                    .unwrap_or(false);
                Ok(if known { vec!["PORTCHANNEL".to_string()] } else { vec![] })
            });
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);

        let mut db_data = crate::model::WriteSet::new();
        db_data
            .entry(DbNum::ConfigDb)
            .or_default()
            .entry("PORTCHANNEL".to_string())
            .or_default();

        let uri = "/interfaces/interface[name=PortChannel1]";
        let mut cache = TxCache::new();
        let target = engine
            .resolve(
                &ResolveRequest::new(uri, Operation::Get).with_db_data(&db_data),
                &mut cache,
                None,
            )
            .unwrap();
        assert_eq!(target.table_name, "PORTCHANNEL");
        assert_eq!(target.db_key, "PortChannel1");

        let mut cache = TxCache::new();
        let target = engine
            .resolve(&ResolveRequest::new(uri, Operation::Get), &mut cache, None)
            .unwrap();
        assert!(!target.has_table());
    }

    #[test]
    fn test_unknown_path_is_unresolved() {
        let target = resolve("/nothing/here[k=1]", Operation::Update).unwrap();
        assert_eq!(target.xpath, "/nothing/here");
        assert!(!target.has_table());
    }

    #[test]
    fn test_table_for_uri_skips_key_walk() {
        let calls = Arc::new(AtomicUsize::new(0));
        let schema = schema();
        let registry = registry(calls.clone());
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);
        let mut cache = TxCache::new();

        let target = engine
            .table_for_uri(
                &ResolveRequest::new("/interfaces/interface[name=Eth1/1]", Operation::Update),
                &mut cache,
                None,
            )
            .unwrap();
        assert_eq!(target.table_name, "PORT");
        assert!(target.db_key.is_empty());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_native_table_paths() {
        let schema = schema();
        let registry = XfmrRegistry::new();
        let layout = DbLayout::new();
        let engine = ResolutionEngine::new(&schema, &registry, &layout);

        let target =
            engine.resolve_native_path("/sonic-port:sonic-port/PORT/PORT_LIST[ifname=Ethernet0]/mtu");
        assert_eq!(target.table_name, "PORT");
        assert_eq!(target.db_key, "Ethernet0");

        // Key leaves follow declaration order, not path order
        let target = engine.resolve_native_path(
            "/sonic-vlan:sonic-vlan/VLAN_MEMBER/VLAN_MEMBER_LIST[ifname=Ethernet0][name=Vlan10]",
        );
        assert_eq!(target.db_key, "Vlan10|Ethernet0");

        let target = engine
            .resolve_native_path("/sonic-device-metadata:sonic-device-metadata/DEVICE_METADATA/localhost/hostname");
        assert_eq!(target.table_name, "DEVICE_METADATA");
        assert_eq!(target.db_key, "localhost");
    }
}
