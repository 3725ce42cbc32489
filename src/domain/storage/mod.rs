//! Storage domain - Key-value abstraction behind each cache tier

mod repository;

pub use repository::{KeyValueStore, StoreExt};

#[cfg(test)]
pub use repository::mock;
