//! Host / participant role resolution

use crate::domain::call::{CallDomainService, Role};
use crate::domain::meeting::MeetingRepository;
use crate::domain::shared::MeetingId;
use crate::domain::user::Actor;
use std::sync::Arc;
use tracing::{debug, warn};

/// Decides whether the actor hosts the session.
///
/// Never fails: a meeting lookup error resolves to `Participant` so a broken
/// backend can not hand out host authority.
#[derive(Clone)]
pub struct RoleResolver {
    meetings: Arc<dyn MeetingRepository>,
    always_host: bool,
}

impl RoleResolver {
    pub fn new(meetings: Arc<dyn MeetingRepository>) -> Self {
        Self {
            meetings,
            always_host: false,
        }
    }

    /// Screens that always host (management variant)
    pub fn with_always_host(mut self, always_host: bool) -> Self {
        self.always_host = always_host;
        self
    }

    pub async fn resolve(&self, actor: &Actor, meeting_id: Option<&MeetingId>) -> Role {
        if CallDomainService::host_by_override(actor, self.always_host) {
            debug!("Actor {} hosts by class override", actor.id);
            return Role::Host;
        }

        let Some(meeting_id) = meeting_id else {
            return Role::Participant;
        };

        match self.meetings.get(meeting_id).await {
            Ok(record) => {
                let role = CallDomainService::role_for_meeting(actor, &record);
                debug!(
                    "Actor {} resolved as {} for meeting {} (creator {})",
                    actor.id, role, meeting_id, record.created_by_id
                );
                role
            }
            Err(e) => {
                warn!(
                    "Role lookup for meeting {} failed, defaulting to participant: {}",
                    meeting_id, e
                );
                metrics::counter!("call_role_resolution_failures_total").increment(1);
                Role::Participant
            }
        }
    }
}
