//! StaffCall - call session lifecycle coordinator
//!
//! Joins an operator to a real-time call, decides whether they host it,
//! watches for the call's end and cleans up afterwards, keeping the backend's
//! meeting record in sync. Laid out in Domain-Driven Design layers; the
//! transport engine and the backend are ports with in-process and REST
//! adapters.

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod interface;

// Re-export commonly used types
pub use application::{CallCoordinator, CallServices, CoordinatorOptions, ScreenPhase};
pub use domain::shared::error::{InitializationError, ServiceError};
pub use domain::shared::result::Result;
