pub mod error;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use traits::{CategoryStore, Store, TaxonomyStore, VarietyStore};
