//! Meeting repository interface

use crate::domain::meeting::entity::{MeetingRecord, MeetingStatus};
use crate::domain::shared::result::Result;
use crate::domain::shared::value_objects::MeetingId;
use async_trait::async_trait;

/// Access to the backend's meeting records.
///
/// Defined in the domain layer as a port; the REST adapter and the in-memory
/// store implement it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetingRepository: Send + Sync {
    /// Fetch a meeting record. Missing records are `ServiceError::NotFound`.
    async fn get(&self, id: &MeetingId) -> Result<MeetingRecord>;

    /// Overwrite the meeting status (last write wins)
    async fn set_status(&self, id: &MeetingId, status: MeetingStatus) -> Result<()>;
}
