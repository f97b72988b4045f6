//! Infrastructure layer - Technical implementations
//!
//! This layer contains:
//! - The REST backend adapter (`http` feature)
//! - An in-memory backend
//! - The loopback transport engine

#[cfg(feature = "http")]
pub mod http;
pub mod persistence;
pub mod transport;
