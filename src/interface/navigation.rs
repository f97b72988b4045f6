//! Navigator implementations

use crate::config::RoutesConfig;
use crate::domain::navigation::{Destination, Navigator};
use std::sync::{Mutex, MutexGuard};
use tracing::info;

/// Resolves destinations to the configured route paths and hands them to a
/// router callback
pub struct RouteNavigator {
    routes: RoutesConfig,
    router: Box<dyn Fn(&str) + Send + Sync>,
}

impl RouteNavigator {
    pub fn new<F>(routes: RoutesConfig, router: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        Self {
            routes,
            router: Box::new(router),
        }
    }

    /// Navigator that only logs the route
    pub fn logging(routes: RoutesConfig) -> Self {
        Self::new(routes, |path| info!("Navigating to {}", path))
    }

    pub fn path(&self, destination: Destination) -> &str {
        match destination {
            Destination::MeetingList => &self.routes.meeting_list,
            Destination::Landing => &self.routes.landing,
        }
    }
}

impl Navigator for RouteNavigator {
    fn navigate(&self, destination: Destination) {
        (self.router)(self.path(destination));
    }
}

/// Keeps every navigation for later inspection
#[derive(Default)]
pub struct RecordingNavigator {
    visited: Mutex<Vec<Destination>>,
}

impl RecordingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Destination>> {
        self.visited.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn visited(&self) -> Vec<Destination> {
        self.lock().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, destination: Destination) {
        self.lock().push(destination);
    }
}
