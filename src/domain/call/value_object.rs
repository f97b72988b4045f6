//! Call value objects

use crate::domain::shared::value_objects::{ActorId, CallId, DepartmentId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The call a session attempt joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallTarget {
    pub call_id: CallId,
    pub department_id: DepartmentId,
    pub department_name: Option<String>,
}

impl CallTarget {
    /// Target given verbatim by the caller context; department is unknown
    pub fn explicit(call_id: CallId) -> Self {
        Self {
            call_id,
            department_id: DepartmentId::UNKNOWN,
            department_name: None,
        }
    }

    /// Default call of an organizational unit
    pub fn department(
        call_id: CallId,
        department_id: DepartmentId,
        department_name: impl Into<String>,
    ) -> Self {
        Self {
            call_id,
            department_id,
            department_name: Some(department_name.into()),
        }
    }
}

/// Authority of the actor within a session. Fixed once resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can end the call for everyone and completes the meeting
    Host,
    Participant,
}

impl Role {
    pub fn is_host(&self) -> bool {
        matches!(self, Role::Host)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Host => "host",
            Role::Participant => "participant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection state reported by the transport engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Idle,
    Joining,
    Joined,
    Leaving,
    Left,
}

impl ConnectionState {
    /// Client is out of the call. Once a session has joined, reaching one of
    /// these states ends it, whatever states came in between.
    pub fn is_out_of_call(&self) -> bool {
        matches!(self, ConnectionState::Left | ConnectionState::Idle)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Joining => "joining",
            ConnectionState::Joined => "joined",
            ConnectionState::Leaving => "leaving",
            ConnectionState::Left => "left",
        }
    }
}

/// Short-lived credential used once to create a transport client.
///
/// Never persisted. `Debug` redacts the secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionCredential {
    pub token: String,
    pub client_api_key: String,
    pub actor_id: ActorId,
    pub actor_display_name: String,
    pub actor_image: Option<String>,
}

impl SessionCredential {
    /// Token and API key must both be present for the engine to accept it
    pub fn is_complete(&self) -> bool {
        !self.token.trim().is_empty() && !self.client_api_key.trim().is_empty()
    }
}

impl fmt::Debug for SessionCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCredential")
            .field("token", &"<redacted>")
            .field("client_api_key", &"<redacted>")
            .field("actor_id", &self.actor_id)
            .field("actor_display_name", &self.actor_display_name)
            .field("actor_image", &self.actor_image)
            .finish()
    }
}
