//! Cache module for storing rank observations
//!
//! This module defines the `RankStore` storage contract and two
//! implementations: a durable `FileStore` that keeps one JSON document per
//! domain on disk, and an in-process `MemoryStore`.

mod manager;
mod store;

pub use manager::FileStore;
pub use store::{MemoryStore, RankStore, StorageError};
