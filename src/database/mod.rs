pub mod manager;
pub mod query_builder;
pub mod registry;

pub use manager::{DatabaseError, DatabaseManager};
pub use query_builder::{Condition, SqlParam};
pub use registry::{MemoryRegistry, PgRegistry, ProtectedPathRegistry};
