//! Array stores.

mod memory_array_store;

pub use memory_array_store::MemoryArrayStore;
