pub mod memory;
pub mod traits;
pub mod tx_cache;

pub use memory::*;
pub use traits::*;
pub use tx_cache::*;
