//! Currency registry backends.

pub mod memory;

pub use memory::MemoryRegistry;
