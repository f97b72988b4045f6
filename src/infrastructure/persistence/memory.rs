//! In-memory backend
//!
//! Implements the meeting repository, the call directory and the credential
//! issuer over shared maps. Clones share the data; each clone carries its own
//! signed-in identity, the way a bearer token scopes the REST backend.

use crate::domain::call::{CallDirectory, CallTarget, CredentialIssuer, SessionCredential};
use crate::domain::meeting::{MeetingRecord, MeetingRepository, MeetingStatus};
use crate::domain::shared::{ActorId, CallId, MeetingId, Result, ServiceError};
use crate::domain::user::Actor;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Backend operations, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendOp {
    GetMeeting,
    SetMeetingStatus,
    DefaultCallTarget,
    IssueCredential,
}

#[derive(Default)]
struct OpLedger {
    faults: HashMap<BackendOp, ServiceError>,
    calls: HashMap<BackendOp, usize>,
}

#[derive(Default)]
struct Store {
    meetings: RwLock<HashMap<MeetingId, MeetingRecord>>,
    default_calls: RwLock<HashMap<ActorId, CallTarget>>,
    ledger: Mutex<OpLedger>,
}

impl Store {
    fn ledger(&self) -> MutexGuard<'_, OpLedger> {
        self.ledger.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, op: BackendOp) -> Result<()> {
        let mut ledger = self.ledger();
        *ledger.calls.entry(op).or_insert(0) += 1;
        match ledger.faults.get(&op) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[derive(Clone, Default)]
pub struct InMemoryBackend {
    store: Arc<Store>,
    identity: Option<Actor>,
    api_key: String,
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            api_key: "loopback".to_string(),
            ..Default::default()
        }
    }

    /// View of the same data on behalf of `actor`
    pub fn signed_in_as(&self, actor: &Actor) -> Self {
        Self {
            store: self.store.clone(),
            identity: Some(actor.clone()),
            api_key: self.api_key.clone(),
        }
    }

    pub async fn insert_meeting(&self, record: MeetingRecord) {
        self.store
            .meetings
            .write()
            .await
            .insert(record.id.clone(), record);
    }

    pub async fn meeting(&self, id: &MeetingId) -> Option<MeetingRecord> {
        self.store.meetings.read().await.get(id).cloned()
    }

    pub async fn set_default_call(&self, actor_id: ActorId, target: CallTarget) {
        self.store
            .default_calls
            .write()
            .await
            .insert(actor_id, target);
    }

    /// Every following `op` fails with `error`
    pub fn fail(&self, op: BackendOp, error: ServiceError) {
        self.store.ledger().faults.insert(op, error);
    }

    pub fn heal(&self, op: BackendOp) {
        self.store.ledger().faults.remove(&op);
    }

    /// Number of `op` requests received, failed ones included
    pub fn calls(&self, op: BackendOp) -> usize {
        self.store.ledger().calls.get(&op).copied().unwrap_or(0)
    }
}

#[async_trait]
impl MeetingRepository for InMemoryBackend {
    async fn get(&self, id: &MeetingId) -> Result<MeetingRecord> {
        self.store.enter(BackendOp::GetMeeting)?;
        self.meeting(id)
            .await
            .ok_or_else(|| ServiceError::NotFound(format!("meeting {}", id)))
    }

    async fn set_status(&self, id: &MeetingId, status: MeetingStatus) -> Result<()> {
        self.store.enter(BackendOp::SetMeetingStatus)?;
        let mut meetings = self.store.meetings.write().await;
        let record = meetings
            .get_mut(id)
            .ok_or_else(|| ServiceError::NotFound(format!("meeting {}", id)))?;
        debug!("Meeting {} status {} -> {}", id, record.status.as_str(), status.as_str());
        record.status = status;
        Ok(())
    }
}

#[async_trait]
impl CallDirectory for InMemoryBackend {
    async fn default_call_target(&self, actor: &Actor) -> Result<CallTarget> {
        self.store.enter(BackendOp::DefaultCallTarget)?;
        self.store
            .default_calls
            .read()
            .await
            .get(&actor.id)
            .cloned()
            .ok_or_else(|| ServiceError::Http {
                status: 404,
                message: Some("No call is configured for your department".to_string()),
            })
    }
}

#[async_trait]
impl CredentialIssuer for InMemoryBackend {
    async fn issue(&self, call_id: &CallId) -> Result<SessionCredential> {
        self.store.enter(BackendOp::IssueCredential)?;
        let actor = self.identity.as_ref().ok_or_else(|| ServiceError::Http {
            status: 401,
            message: Some("Not signed in".to_string()),
        })?;

        Ok(SessionCredential {
            token: format!("{}.{}", call_id, Uuid::new_v4().simple()),
            client_api_key: self.api_key.clone(),
            actor_id: actor.id,
            actor_display_name: actor.display_name.clone(),
            actor_image: actor.avatar_url.clone(),
        })
    }
}
