//! Backend adapters that keep their data in process

pub mod memory;

pub use memory::{BackendOp, InMemoryBackend};
