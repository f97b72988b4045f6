//! Real-time transport engine interface
//!
//! Only the lifecycle contract of the engine is consumed here: creating a
//! client from a credential, getting (or creating) a call, joining, leaving,
//! ending for everyone and disconnecting. Media routing stays inside the engine.

use crate::domain::call::event::SessionEnded;
use crate::domain::call::value_object::{ConnectionState, SessionCredential};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::{ActorId, CallId};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Options for joining a call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOptions {
    /// Create the call on the engine if it does not exist yet
    pub create: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self { create: true }
    }
}

/// Factory for authenticated transport clients
#[async_trait]
pub trait TransportEngine: Send + Sync {
    async fn create_client(&self, credential: &SessionCredential)
        -> Result<Arc<dyn TransportClient>>;
}

/// A connected client identity on the engine
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Actor the client was created for
    fn identity(&self) -> ActorId;

    /// Handle to the call with the given id. Does not join it.
    async fn create_or_get_session(&self, call_id: &CallId) -> Result<Arc<dyn TransportCall>>;

    /// Release the client identity
    async fn disconnect(&self) -> Result<()>;
}

/// One client's handle on a call
#[async_trait]
pub trait TransportCall: Send + Sync {
    fn call_id(&self) -> CallId;

    async fn join(&self, options: JoinOptions) -> Result<()>;

    /// Hard termination for every participant
    async fn end_for_all(&self) -> Result<()>;

    /// Leave without affecting other participants
    async fn leave(&self) -> Result<()>;

    /// Stream of this client's connection state. The current value is
    /// available immediately.
    fn connection_state(&self) -> watch::Receiver<ConnectionState>;

    /// Notifications that the call was ended for everyone
    fn session_ended(&self) -> broadcast::Receiver<SessionEnded>;
}
