//! Cassette Deck Storage
//!
//! Key-value persistence for the cassette deck, plus the two documents the
//! deck keeps in it: the cassette library and the saved session.
//!
//! # Architecture
//!
//! - **Gateways**: `FileGateway` (one JSON file per key), `InMemoryGateway`,
//!   `ResilientGateway` (keeps working in memory when the disk fails) and
//!   `WriteBehindGateway` (moves writes off the command path)
//! - **Library**: `MemoryStore` implements `PlaybackMemory` (cassettes,
//!   resume bookmarks, mounted cassette)
//! - **Session**: `SessionRepository` implements `SessionStore`
//!
//! Storage failures never stop playback: the resilient gateway logs and
//! degrades to memory, and corrupt documents load as empty.
//!
//! # Example
//!
//! ```rust,no_run
//! use cassette_core::{PersistenceGateway, SessionStore};
//! use cassette_storage::{MemoryStore, ResilientGateway, SessionRepository};
//! use std::sync::Arc;
//!
//! let gateway: Arc<dyn PersistenceGateway> =
//!     Arc::new(ResilientGateway::file_or_memory("/var/lib/cassette-deck"));
//!
//! let library = MemoryStore::open(gateway.clone());
//! let sessions = SessionRepository::new(gateway);
//!
//! println!("{} cassettes", library.len());
//! let _saved = sessions.load_session();
//! ```

mod error;

pub mod gateway;
pub mod library;
pub mod session;

pub use error::{Result, StorageError};
pub use gateway::{FileGateway, InMemoryGateway, ResilientGateway, WriteBehindGateway};
pub use library::{MemoryStore, LIBRARY_KEY};
pub use session::{SessionRepository, SESSION_KEY};
