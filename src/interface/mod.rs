//! Interface layer - what the surrounding UI layer talks to
//!
//! This layer handles:
//! - Route parameters of the call screens and their presets
//! - Navigator implementations that map destinations to routes

pub mod navigation;
pub mod screen;

pub use navigation::{RecordingNavigator, RouteNavigator};
pub use screen::{CallScreenKind, RouteParams};
