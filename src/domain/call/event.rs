//! Call domain events

use crate::domain::call::value_object::ConnectionState;
use crate::domain::shared::value_objects::CallId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What revealed that a session was over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TerminationTrigger {
    /// The local connection state left `Joined`
    StateTransition {
        from: ConnectionState,
        to: ConnectionState,
    },
    /// The transport announced that the session was ended for everyone
    SessionEnded,
}

impl TerminationTrigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationTrigger::StateTransition { .. } => "state_transition",
            TerminationTrigger::SessionEnded => "session_ended",
        }
    }
}

/// Notification pushed by the transport when a session is ended for all
/// participants
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionEnded {
    pub call_id: CallId,
    pub ended_at: DateTime<Utc>,
}

impl SessionEnded {
    pub fn new(call_id: CallId) -> Self {
        Self {
            call_id,
            ended_at: Utc::now(),
        }
    }
}

/// Call terminated event, delivered once per session to the termination callback
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTerminated {
    pub event_id: Uuid,
    pub call_id: CallId,
    pub trigger: TerminationTrigger,
    pub occurred_at: DateTime<Utc>,
}

impl CallTerminated {
    pub fn new(call_id: CallId, trigger: TerminationTrigger) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            call_id,
            trigger,
            occurred_at: Utc::now(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        "call.terminated"
    }
}
