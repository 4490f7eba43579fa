pub mod compose;
pub mod dependency;
pub mod key_xfmr;
pub mod path;
pub mod registry;
pub mod resolve;

pub use compose::*;
pub use dependency::*;
pub use key_xfmr::*;
pub use path::*;
pub use registry::*;
pub use resolve::*;
