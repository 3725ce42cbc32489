//! Storage infrastructure - Key-value store backends

mod factory;
mod file;
mod in_memory;

pub use factory::{StoreConfig, StoreFactory, StoreType};
pub use file::FileStore;
pub use in_memory::{InMemoryStore, InMemoryStoreConfig};
