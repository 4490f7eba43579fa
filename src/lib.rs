//! Translation core between schema-addressed request paths and a
//! multi-database key-value configuration store.

pub mod config;
pub mod error;
pub mod logic;
pub mod model;
pub mod store;

pub use error::{Result, ScopeFailure, XlateError};

pub use logic::{
    load_table_order, load_table_order_file, split_db_key, PathInfo, ResolutionEngine,
    ResultComposer, TableOrder, TableOrderService, TopoOrderService, ValueTransformer,
    XfmrRegistry,
};

// Export all model types
pub use model::*;

pub use store::{DbHandle, MemoryDb, TxCache};
