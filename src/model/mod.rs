pub mod common;
pub mod layout;
pub mod resolution_context;
pub mod schema;
pub mod tables;
pub mod value;

pub use common::*;
pub use layout::*;
pub use resolution_context::*;
pub use schema::*;
pub use tables::*;
pub use value::*;
