//! Call domain service

use crate::domain::call::value_object::Role;
use crate::domain::meeting::MeetingRecord;
use crate::domain::user::Actor;

/// Host rules that don't belong to a single entity
pub struct CallDomainService;

impl CallDomainService {
    /// Host by class: management actors, or screens configured to always host.
    /// Decided without any lookup.
    pub fn host_by_override(actor: &Actor, always_host: bool) -> bool {
        always_host || actor.is_management_class
    }

    /// Role derived from the meeting record: the creator hosts
    pub fn role_for_meeting(actor: &Actor, record: &MeetingRecord) -> Role {
        if record.is_created_by(actor.id) {
            Role::Host
        } else {
            Role::Participant
        }
    }
}
