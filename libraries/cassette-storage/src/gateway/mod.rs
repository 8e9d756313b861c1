//! Persistence gateways
//!
//! Byte-level key-value stores behind `PersistenceGateway`:
//! - `InMemoryGateway`: process-local map
//! - `FileGateway`: one JSON file per key
//! - `ResilientGateway`: in-memory cache with a dirty set over a fallible store
//! - `WriteBehindGateway`: background tokio writer for fire-and-forget writes

mod file;
mod memory;
mod resilient;
mod write_behind;

pub use file::FileGateway;
pub use memory::InMemoryGateway;
pub use resilient::ResilientGateway;
pub use write_behind::WriteBehindGateway;
