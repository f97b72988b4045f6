//! Shared kernel - Common types used across all bounded contexts

pub mod error;
pub mod result;
pub mod value_objects;

pub use error::{InitializationError, ServiceError};
pub use result::Result;
pub use value_objects::*;
