//! Call session aggregate root

use crate::domain::call::event::SessionEnded;
use crate::domain::call::transport::{TransportCall, TransportClient};
use crate::domain::call::value_object::{CallTarget, ConnectionState, Role};
use crate::domain::shared::value_objects::MeetingId;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Live call session.
///
/// Built only by the session initializer once the target and the credential
/// have resolved and the join succeeded. Owned by exactly one screen
/// coordinator and consumed by teardown. Not `Clone`.
pub struct CallSession {
    /// Attempt that produced this session (tracing field)
    attempt_id: Uuid,
    target: CallTarget,
    /// Resolved before join, never re-evaluated
    role: Role,
    meeting_id: Option<MeetingId>,
    client: Arc<dyn TransportClient>,
    call: Arc<dyn TransportCall>,
    joined_at: DateTime<Utc>,
    /// "Session ended" receiver opened before the join
    ended_notices: Option<broadcast::Receiver<SessionEnded>>,
}

impl CallSession {
    pub fn new(
        attempt_id: Uuid,
        target: CallTarget,
        role: Role,
        meeting_id: Option<MeetingId>,
        client: Arc<dyn TransportClient>,
        call: Arc<dyn TransportCall>,
    ) -> Self {
        Self {
            attempt_id,
            target,
            role,
            meeting_id,
            client,
            call,
            joined_at: Utc::now(),
            ended_notices: None,
        }
    }

    /// Keep a notice receiver subscribed before the join, so a call ended
    /// between join and observation is still seen
    pub fn with_ended_notices(mut self, notices: broadcast::Receiver<SessionEnded>) -> Self {
        self.ended_notices = Some(notices);
        self
    }

    pub fn take_ended_notices(&mut self) -> Option<broadcast::Receiver<SessionEnded>> {
        self.ended_notices.take()
    }

    pub fn attempt_id(&self) -> Uuid {
        self.attempt_id
    }

    pub fn target(&self) -> &CallTarget {
        &self.target
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn meeting_id(&self) -> Option<&MeetingId> {
        self.meeting_id.as_ref()
    }

    pub fn client(&self) -> &Arc<dyn TransportClient> {
        &self.client
    }

    pub fn call(&self) -> &Arc<dyn TransportCall> {
        &self.call
    }

    pub fn joined_at(&self) -> DateTime<Utc> {
        self.joined_at
    }

    /// Connection state as currently reported by the transport
    pub fn transport_state(&self) -> ConnectionState {
        *self.call.connection_state().borrow()
    }

    /// Read-only view handed to the UI layer
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            attempt_id: self.attempt_id,
            target: self.target.clone(),
            role: self.role,
            transport_state: self.transport_state(),
            joined_at: self.joined_at,
        }
    }
}

impl fmt::Debug for CallSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSession")
            .field("attempt_id", &self.attempt_id)
            .field("target", &self.target)
            .field("role", &self.role)
            .field("meeting_id", &self.meeting_id)
            .field("transport_state", &self.transport_state())
            .field("joined_at", &self.joined_at)
            .finish()
    }
}

/// Snapshot of a live session for rendering
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub attempt_id: Uuid,
    pub target: CallTarget,
    pub role: Role,
    pub transport_state: ConnectionState,
    pub joined_at: DateTime<Utc>,
}
