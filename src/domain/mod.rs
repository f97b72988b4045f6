//! Domain layer - Core business rules of the call session lifecycle
//!
//! This layer contains:
//! - Aggregates: the live `CallSession`
//! - Value Objects: targets, roles, credentials, connection states
//! - Domain Services: host rules
//! - Ports: meeting repository, call directory, credential issuer,
//!   transport engine and navigator
//! - Domain Events: call termination

pub mod call;
pub mod meeting;
pub mod navigation;
pub mod shared;
pub mod user;

// Re-export commonly used types
pub use shared::{InitializationError, Result, ServiceError};
