//! Application layer - the call session use cases
//!
//! Resolvers, session initialization, termination watching and teardown,
//! composed by the per-screen [`CallCoordinator`].

pub mod coordinator;
pub mod credential_resolver;
pub mod lifecycle;
pub mod role_resolver;
pub mod session_initializer;
pub mod target_resolver;
pub mod teardown;
pub mod termination_watcher;

pub use coordinator::{CallCoordinator, CallServices, CoordinatorOptions};
pub use credential_resolver::CredentialResolver;
pub use lifecycle::{LoadingGate, ScreenLifecycle, ScreenPhase};
pub use role_resolver::RoleResolver;
pub use session_initializer::{AlwaysMounted, MountGuard, SessionInitializer};
pub use target_resolver::CallTargetResolver;
pub use teardown::{TeardownController, TeardownReport, TeardownStep};
pub use termination_watcher::{TerminationLatch, TerminationSubscription, TerminationWatcher};
