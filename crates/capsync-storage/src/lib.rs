//! Key-value persistence.
//!
//! This crate provides:
//! - The `KeyValueStore` trait used by the translation cache and session state
//! - An in-memory store for tests and ephemeral sessions
//! - A JSON file store that survives restarts

pub mod error;
pub mod file;
pub mod memory;
pub mod store;

pub use error::{StorageError, StorageResult};
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::KeyValueStore;
