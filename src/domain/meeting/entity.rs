//! Meeting record entity

use crate::domain::shared::error::ServiceError;
use crate::domain::shared::value_objects::{ActorId, MeetingId};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Meeting status as stored by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeetingStatus {
    Scheduled,
    Ongoing,
    Completed,
    Cancelled,
}

impl MeetingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeetingStatus::Scheduled => "SCHEDULED",
            MeetingStatus::Ongoing => "ONGOING",
            MeetingStatus::Completed => "COMPLETED",
            MeetingStatus::Cancelled => "CANCELLED",
        }
    }
}

impl FromStr for MeetingStatus {
    type Err = ServiceError;

    /// Upper-case wire names only
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SCHEDULED" => Ok(MeetingStatus::Scheduled),
            "ONGOING" => Ok(MeetingStatus::Ongoing),
            "COMPLETED" => Ok(MeetingStatus::Completed),
            "CANCELLED" => Ok(MeetingStatus::Cancelled),
            other => Err(ServiceError::Malformed(format!(
                "unknown meeting status {}",
                other
            ))),
        }
    }
}

/// Meeting record.
///
/// Only `created_by_id` and `status` matter to the call coordinator; the rest
/// of the record stays on the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingRecord {
    pub id: MeetingId,
    pub created_by_id: ActorId,
    pub status: MeetingStatus,
}

impl MeetingRecord {
    pub fn new(id: MeetingId, created_by_id: ActorId, status: MeetingStatus) -> Self {
        Self {
            id,
            created_by_id,
            status,
        }
    }

    /// Whether the given actor created this meeting
    pub fn is_created_by(&self, actor_id: ActorId) -> bool {
        self.created_by_id == actor_id
    }
}
