//! Table dependency ordering.
//!
//! Tables are declared as (table, parent) pairs. Every table gets the
//! flattened list of tables that depend on it, ordered by a
//! [`TableOrderService`] so that writes go parent-first.

use log::{debug, info};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{Result, XlateError};
use crate::model::{Operation, TableList, TableRelation};

/// Produces the safe commit order of a set of tables.
///
/// Implemented by the schema validation service of the embedding system;
/// [`TopoOrderService`] is a standalone implementation.
pub trait TableOrderService {
    fn sort_dep_tables(&self, tables: &[String]) -> anyhow::Result<Vec<String>>;
}

#[derive(Debug, Clone)]
struct GraphNode {
    name: String,
    children: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Open,
    Closed,
}

/// Parent/child graph of tables stored as an arena.
/// Read-only once built; traversal state lives in each flattening pass.
#[derive(Debug, Clone, Default)]
pub struct TableGraph {
    nodes: Vec<GraphNode>,
    index: HashMap<String, usize>,
}

impl TableGraph {
    pub fn from_relations(relations: &[TableRelation]) -> Self {
        let mut graph = Self::default();
        for relation in relations {
            let child = graph.node_id(&relation.table);
            if relation.is_root() {
                continue;
            }
            let parent = graph.node_id(&relation.parent);
            if !graph.nodes[parent].children.contains(&child) {
                graph.nodes[parent].children.push(child);
            }
        }
        graph
    }

    fn node_id(&mut self, name: &str) -> usize {
        if let Some(&id) = self.index.get(name) {
            return id;
        }
        let id = self.nodes.len();
        self.nodes.push(GraphNode {
            name: name.to_string(),
            children: Vec::new(),
        });
        self.index.insert(name.to_string(), id);
        id
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every table with the tables transitively depending on it, each
    /// listed once. Fails on a cycle.
    pub fn flatten(&self) -> Result<BTreeMap<String, Vec<String>>> {
        let mut state = vec![Visit::New; self.nodes.len()];
        let mut memo: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for id in 0..self.nodes.len() {
            self.visit(id, &mut state, &mut memo)?;
        }

        Ok(self
            .nodes
            .iter()
            .zip(memo)
            .map(|(node, deps)| {
                let names = deps.into_iter().map(|d| self.nodes[d].name.clone()).collect();
                (node.name.clone(), names)
            })
            .collect())
    }

    fn visit(&self, id: usize, state: &mut [Visit], memo: &mut [Vec<usize>]) -> Result<()> {
        match state[id] {
            Visit::Closed => return Ok(()),
            Visit::Open => {
                return Err(XlateError::DependencyCycle {
                    table: self.nodes[id].name.clone(),
                })
            }
            Visit::New => {}
        }
        state[id] = Visit::Open;

        let mut deps: Vec<usize> = Vec::new();
        for &child in &self.nodes[id].children {
            self.visit(child, state, memo)?;
            for dep in std::iter::once(child).chain(memo[child].iter().copied()) {
                if !deps.contains(&dep) {
                    deps.push(dep);
                }
            }
        }

        memo[id] = deps;
        state[id] = Visit::Closed;
        Ok(())
    }
}

/// Orders tables by the declared relationships alone: parents before
/// children, ties kept in input order.
#[derive(Debug, Clone, Default)]
pub struct TopoOrderService {
    parents: HashMap<String, Vec<String>>,
}

impl TopoOrderService {
    pub fn new(relations: &[TableRelation]) -> Self {
        let mut parents: HashMap<String, Vec<String>> = HashMap::new();
        for relation in relations.iter().filter(|r| !r.is_root()) {
            parents
                .entry(relation.table.clone())
                .or_default()
                .push(relation.parent.clone());
        }
        Self { parents }
    }

    /// Parents of `table` that are contained in `set`
    fn parents_in<'a>(&'a self, table: &str, set: &'a [String]) -> impl Iterator<Item = &'a String> {
        self.parents
            .get(table)
            .into_iter()
            .flatten()
            .filter(move |p| set.contains(*p))
    }
}

impl TableOrderService for TopoOrderService {
    fn sort_dep_tables(&self, tables: &[String]) -> anyhow::Result<Vec<String>> {
        let mut sorted: Vec<String> = Vec::with_capacity(tables.len());
        let mut pending: Vec<&String> = tables.iter().collect();

        while !pending.is_empty() {
            let ready = pending.iter().position(|table| {
                self.parents_in(table, tables)
                    .all(|parent| sorted.contains(parent))
            });
            match ready {
                Some(pos) => sorted.push(pending.remove(pos).clone()),
                None => anyhow::bail!("cyclic dependency among tables {:?}", pending),
            }
        }

        Ok(sorted)
    }
}

/// Commit order of every known table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOrder {
    orders: BTreeMap<String, Vec<String>>,
}

impl TableOrder {
    /// Ordered list for `table`: the table itself and all of its dependents
    pub fn order_for(&self, table: &str) -> Option<&[String]> {
        self.orders.get(table).map(|o| o.as_slice())
    }

    pub fn tables(&self) -> impl Iterator<Item = &String> {
        self.orders.keys()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    fn depends_on(&self, table: &str, parent: &str) -> bool {
        table != parent
            && self
                .order_for(parent)
                .map(|order| order.iter().any(|t| t == table))
                .unwrap_or(false)
    }

    /// Order the tables of one transaction for commit.
    ///
    /// Parents come before the tables that depend on them; DELETE reverses
    /// that so dependents are removed first. Tables without a known order go
    /// last in their input order.
    pub fn commit_sequence<'t, I>(&self, tables: I, oper: Operation) -> Vec<String>
    where
        I: IntoIterator<Item = &'t String>,
    {
        let mut pending: Vec<&String> = Vec::new();
        let mut unknown: Vec<String> = Vec::new();
        for table in tables {
            if self.orders.contains_key(table.as_str()) {
                if !pending.contains(&table) {
                    pending.push(table);
                }
            } else if !unknown.contains(table) {
                unknown.push(table.clone());
            }
        }

        let mut sequence: Vec<String> = Vec::with_capacity(pending.len() + unknown.len());
        while !pending.is_empty() {
            let pos = pending
                .iter()
                .position(|t| !pending.iter().any(|p| self.depends_on(t, p)))
                .unwrap_or(0);
            sequence.push(pending.remove(pos).clone());
        }

        if oper == Operation::Delete {
            sequence.reverse();
        }
        sequence.extend(unknown);
        sequence
    }
}

/// Build the commit order of every table from declared relationships.
///
/// Any failure of the ordering service aborts the whole load.
pub fn load_table_order(
    relations: &[TableRelation],
    service: &dyn TableOrderService,
) -> Result<TableOrder> {
    let graph = TableGraph::from_relations(relations);
    let flattened = graph.flatten()?;
    debug!("flattened dependencies of {} tables", flattened.len());

    let mut orders = BTreeMap::new();
    for (table, deps) in flattened {
        let mut list = Vec::with_capacity(deps.len() + 1);
        list.push(table.clone());
        list.extend(deps);

        let sorted = service
            .sort_dep_tables(&list)
            .map_err(|e| XlateError::DependencyOrdering(format!("{}: {}", table, e)))?;
        debug!("table {} commit order {:?}", table, sorted);
        orders.insert(table, sorted);
    }

    info!("loaded commit order for {} tables", orders.len());
    Ok(TableOrder { orders })
}

/// Load `{"tablelist": [{"tablename": .., "parent": ..}]}` from a file
pub fn load_table_order_file(
    path: impl AsRef<Path>,
    service: &dyn TableOrderService,
) -> Result<TableOrder> {
    let relations = read_table_list(path)?;
    load_table_order(&relations, service)
}

pub fn read_table_list(path: impl AsRef<Path>) -> Result<Vec<TableRelation>> {
    let content = std::fs::read_to_string(path.as_ref())?;
    let list: TableList = serde_json::from_str(&content)?;
    Ok(list.relations)
}
