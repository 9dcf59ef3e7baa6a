pub mod backend;
pub mod journal;
pub mod memory;
pub mod postgres;

pub use backend::{open, StorageConfig};
pub use journal::Journal;
pub use linkstash_core::{LinkEntity, Repository, StorageError};
pub use memory::InMemoryRepository;
pub use postgres::{PostgresRepository, PostgresSettings};
