use itertools::Itertools;
use log::{debug, warn};
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::{Result, ScopeFailure, XlateError};
use crate::logic::registry::{KeyReadParams, ValueXfmrParams, XfmrRegistry};
use crate::model::{
    base_field_name, DbLayout, DbNum, KeyComponent, Operation, SchemaTable, SubOpMap, TableData,
    TableSpec, WriteSet,
};

fn ipv6_pattern() -> &'static Regex {
    static IPV6: OnceLock<Regex> = OnceLock::new();
    IPV6.get_or_init(|| {
        Regex::new(
            r"(([^:]+:){6}(([^:]+:[^:]+)|(.*\..*)))|((([^:]+:)*[^:]+)?::(([^:]+:)*[^:]+)?)(%.+)?",
        )
        .expect("ipv6 pattern is valid")
    })
}

fn mac_pattern() -> &'static Regex {
    static MAC: OnceLock<Regex> = OnceLock::new();
    MAC.get_or_init(|| {
        Regex::new(r"([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})").expect("mac pattern is valid")
    })
}

/// True if the whole string is a MAC address
pub fn is_mac(value: &str) -> bool {
    static MAC_EXACT: OnceLock<Regex> = OnceLock::new();
    MAC_EXACT
        .get_or_init(|| {
            Regex::new(r"^([0-9A-Fa-f]{2}[:-]){5}([0-9A-Fa-f]{2})$").expect("mac pattern is valid")
        })
        .is_match(value)
}

/// True if the string contains something shaped like an IPv6 or MAC address
pub fn has_address(value: &str) -> bool {
    ipv6_pattern().is_match(value) || mac_pattern().is_match(value)
}

/// Split a raw store key into one value per key component.
///
/// When the separator also occurs inside a component (IPv6 literals and MAC
/// addresses under `:`), the single address-shaped component absorbs the
/// surplus parts. Returns `None` when the key cannot be matched to the
/// components.
pub fn split_db_key(components: &[KeyComponent], key: &str, sep: &str) -> Option<Vec<String>> {
    let parts = try_split(components, key, sep);
    if parts.is_none() {
        warn!(
            "key '{}' does not match components [{}] with separator '{}'",
            key,
            components.iter().map(|c| &c.name).join(", "),
            sep
        );
    }
    parts
}

fn try_split(components: &[KeyComponent], key: &str, sep: &str) -> Option<Vec<String>> {
    let n = components.len();
    if n == 0 || sep.is_empty() {
        return None;
    }

    let separators = key.matches(sep).count();
    if separators == n - 1 {
        return Some(key.splitn(n, sep).map(str::to_string).collect());
    }

    let addresses: Vec<usize> = components
        .iter()
        .positions(|c| c.kind.is_address())
        .collect();
    let parts: Vec<&str> = key.split(sep).collect();

    match addresses.as_slice() {
        [idx] if parts.len() > n && has_address(key) => {
            let idx = *idx;
            let tail = n - 1 - idx;
            let mut values: Vec<String> = parts[..idx].iter().map(|p| p.to_string()).collect();
            values.push(parts[idx..parts.len() - tail].join(sep));
            values.extend(parts[parts.len() - tail..].iter().map(|p| p.to_string()));
            Some(values)
        }
        _ => None,
    }
}

/// Applies field and key value transforms to composed write sets.
pub struct ValueTransformer<'a> {
    schema: &'a SchemaTable,
    registry: &'a XfmrRegistry,
    layout: &'a DbLayout,
}

impl<'a> ValueTransformer<'a> {
    pub fn new(schema: &'a SchemaTable, registry: &'a XfmrRegistry, layout: &'a DbLayout) -> Self {
        Self {
            schema,
            registry,
            layout,
        }
    }

    /// Transform every table of `write_set` that declares value transforms.
    ///
    /// A failing table is left untouched and reported; the other tables are
    /// still transformed.
    pub fn apply(&self, oper: Operation, write_set: &mut WriteSet) -> Result<()> {
        let mut failures = Vec::new();
        self.apply_collecting(oper, write_set, &mut failures);
        finish(failures)
    }

    /// [`apply`](Self::apply) over every operation of a sub-operation map
    pub fn apply_sub_ops(&self, sub_ops: &mut SubOpMap) -> Result<()> {
        let mut failures = Vec::new();
        for (oper, write_set) in sub_ops.iter_mut() {
            self.apply_collecting(*oper, write_set, &mut failures);
        }
        finish(failures)
    }

    fn apply_collecting(
        &self,
        oper: Operation,
        write_set: &mut WriteSet,
        failures: &mut Vec<ScopeFailure>,
    ) {
        for (db, tables) in write_set.iter_mut() {
            for (table_name, entries) in tables.iter_mut() {
                let Some(spec) = self.schema.table(table_name) else {
                    continue;
                };
                if !spec.has_xfmr_fn() {
                    continue;
                }

                match self.transform_table(oper, *db, spec, entries) {
                    Ok(transformed) => *entries = transformed,
                    Err(err) => {
                        warn!("value transform failed for {}/{}: {}", db, table_name, err);
                        failures.push(ScopeFailure {
                            db: *db,
                            table: table_name.clone(),
                            error: err.into(),
                        });
                    }
                }
            }
        }
    }

    fn transform_table(
        &self,
        oper: Operation,
        db: DbNum,
        spec: &TableSpec,
        entries: &TableData,
    ) -> Result<TableData> {
        let mut out = TableData::new();

        for (key, value) in entries {
            // Fields first, against the untransformed key
            let mut value = value.clone();
            for (field, data) in value.fields.iter_mut() {
                let Some(xfmr) = spec.field_xfmrs.get(base_field_name(field)) else {
                    continue;
                };
                let params = ValueXfmrParams {
                    oper,
                    db,
                    table: &spec.name,
                    key,
                    field,
                    value: data,
                };
                *data = self.registry.call_value_xfmr(xfmr, &params)?;
            }

            let key = if spec.has_key_value_xfmr() {
                self.transform_db_key(oper, db, spec, key)?
            } else {
                key.clone()
            };
            match out.entry(key) {
                Entry::Occupied(mut existing) => {
                    warn!(
                        "{} keys collide on '{}' after transform, merging fields",
                        spec.name,
                        existing.key()
                    );
                    existing.get_mut().fields.extend(value.fields);
                }
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
            }
        }

        Ok(out)
    }

    /// Apply the key components' value transforms to one store key.
    ///
    /// The key is matched against the table's lists in order; the first list
    /// whose components split it exactly is used. Keys no list matches are
    /// returned unchanged.
    pub fn transform_db_key(
        &self,
        oper: Operation,
        db: DbNum,
        spec: &TableSpec,
        key: &str,
    ) -> Result<String> {
        let sep = self.layout.separator(db);
        let matched = spec.lists.iter().find_map(|list| {
            try_split(&list.key_components, key, sep).map(|parts| (list, parts))
        });
        let Some((list, parts)) = matched else {
            warn!("{} key '{}' matches none of the table's lists", spec.name, key);
            return Ok(key.to_string());
        };

        let mut values = Vec::with_capacity(parts.len());
        for (component, part) in list.key_components.iter().zip(&parts) {
            match &component.value_xfmr {
                Some(xfmr) => {
                    let params = ValueXfmrParams {
                        oper,
                        db,
                        table: &spec.name,
                        key,
                        field: &component.name,
                        value: part,
                    };
                    values.push(self.registry.call_value_xfmr(xfmr, &params)?);
                }
                None => values.push(part.clone()),
            }
        }

        let transformed = values.join(sep);
        debug!("{} key '{}' -> '{}'", spec.name, key, transformed);
        Ok(transformed)
    }

    /// Convert a store key of `table`/`list` back into key leaf values.
    pub fn yang_keys_from_db_key(
        &self,
        table: &str,
        list: &str,
        key: &str,
    ) -> Result<HashMap<String, String>> {
        let Some(spec) = self.schema.table(table) else {
            debug!("no table metadata for {}", table);
            return Ok(HashMap::new());
        };
        let Some(list_spec) = spec.list(list) else {
            debug!("table {} has no list {}", table, list);
            return Ok(HashMap::new());
        };

        if let Some(reader) = &list_spec.key_reader {
            let params = KeyReadParams {
                db: spec.db,
                table,
                list,
                key,
            };
            return self.registry.call_key_reader(reader, &params);
        }

        let sep = self.layout.separator(spec.db);
        Ok(split_db_key(&list_spec.key_components, key, sep)
            .map(|parts| {
                list_spec
                    .key_components
                    .iter()
                    .map(|c| c.name.clone())
                    .zip(parts)
                    .collect()
            })
            .unwrap_or_default())
    }
}

fn finish(failures: Vec<ScopeFailure>) -> Result<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(XlateError::ValueTransform { failures })
    }
}
