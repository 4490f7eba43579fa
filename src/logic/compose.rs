use log::debug;
use parking_lot::Mutex;

use crate::model::{is_list_field, Operation, SubOpMap, Value, WriteSet, LIST_ITEM_SEPARATOR};

/// Composes write sets produced while handling one request.
///
/// A single instance is shared by all request threads; copy and merge hold
/// its lock for the whole operation.
#[derive(Debug, Default)]
pub struct ResultComposer {
    lock: Mutex<()>,
}

impl ResultComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every record of `src` into `dest`, overwriting fields on conflict.
    pub fn copy(&self, dest: &mut WriteSet, src: &WriteSet) {
        let _guard = self.lock.lock();

        for (db, tables) in src {
            let dest_tables = dest.entry(*db).or_default();
            for (table, entries) in tables {
                let dest_entries = dest_tables.entry(table.clone()).or_default();
                for (key, value) in entries {
                    let dest_value = dest_entries.entry(key.clone()).or_default();
                    for (field, data) in &value.fields {
                        dest_value.set(field.clone(), data.clone());
                    }
                }
            }
        }
    }

    /// Merge `src` into `dest` following the semantics of `oper`.
    ///
    /// Under DELETE an empty record is a whole-key delete: it replaces a
    /// partial delete in `dest` and is never narrowed back to one. Fields
    /// ending in `@` accumulate: source items missing from the destination
    /// list are appended in order.
    pub fn merge(&self, dest: &mut WriteSet, src: &WriteSet, oper: Operation) {
        let _guard = self.lock.lock();

        for (db, tables) in src {
            let dest_tables = dest.entry(*db).or_default();
            for (table, entries) in tables {
                let dest_entries = dest_tables.entry(table.clone()).or_default();
                for (key, value) in entries {
                    let Some(dest_value) = dest_entries.get_mut(key) else {
                        dest_entries.insert(key.clone(), value.clone());
                        continue;
                    };

                    if oper == Operation::Delete {
                        if !dest_value.is_populated() && value.is_populated() {
                            debug!("{}/{}|{} already deleted whole, ignoring fields", db, table, key);
                            continue;
                        }
                        if dest_value.is_populated() && !value.is_populated() {
                            dest_value.fields.clear();
                            continue;
                        }
                    }

                    merge_fields(dest_value, value);
                }
            }
        }
    }

    /// Merge a callback's sub-operations into the request-level map,
    /// each operation with its own merge semantics.
    pub fn merge_sub_ops(&self, dest: &mut SubOpMap, src: &SubOpMap) {
        for (oper, write_set) in src {
            self.merge(dest.entry(*oper).or_default(), write_set, *oper);
        }
    }
}

fn merge_fields(dest: &mut Value, src: &Value) {
    for (field, data) in &src.fields {
        match dest.fields.get_mut(field) {
            Some(existing) if is_list_field(field) && !existing.is_empty() => {
                for item in data.split(LIST_ITEM_SEPARATOR).filter(|i| !i.is_empty()) {
                    if !existing.split(LIST_ITEM_SEPARATOR).any(|cur| cur == item) {
                        existing.push_str(LIST_ITEM_SEPARATOR);
                        existing.push_str(item);
                    }
                }
            }
            _ => dest.set(field.clone(), data.clone()),
        }
    }
}
