//! Session teardown

use crate::domain::call::{CallSession, Role};
use crate::domain::meeting::{MeetingRepository, MeetingStatus};
use crate::domain::shared::{MeetingId, ServiceError};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Individual teardown steps. A failing step is logged and skipped, never raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownStep {
    EndForAll,
    Leave,
    Disconnect,
    StatusSync,
}

impl TeardownStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeardownStep::EndForAll => "end_for_all",
            TeardownStep::Leave => "leave",
            TeardownStep::Disconnect => "disconnect",
            TeardownStep::StatusSync => "status_sync",
        }
    }
}

/// What a teardown run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TeardownReport {
    /// False when there was no session to tear down
    pub performed: bool,
    pub ended_for_all: bool,
    pub left: bool,
    pub status_synced: bool,
    pub disconnected: bool,
    pub failures: Vec<TeardownStep>,
}

impl TeardownReport {
    fn record_failure(&mut self, step: TeardownStep, error: &ServiceError) {
        warn!("Teardown step {} failed: {}", step.as_str(), error);
        metrics::counter!("call_teardown_step_failures_total", "step" => step.as_str())
            .increment(1);
        self.failures.push(step);
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Role-dependent cleanup of a call session
#[derive(Clone)]
pub struct TeardownController {
    meetings: Arc<dyn MeetingRepository>,
}

impl TeardownController {
    pub fn new(meetings: Arc<dyn MeetingRepository>) -> Self {
        Self { meetings }
    }

    /// Tear a session down.
    ///
    /// Taking the session by value makes a second run on the same instance
    /// impossible; callers keep it in an `Option` slot and pass `slot.take()`,
    /// so repeated calls see `None` and do nothing.
    ///
    /// Hosts end the call for everyone (falling back to a plain leave) and
    /// complete the meeting; participants just leave. The client is always
    /// disconnected afterwards. Never fails.
    pub async fn teardown(
        &self,
        session: Option<CallSession>,
        meeting_id: Option<&MeetingId>,
    ) -> TeardownReport {
        let Some(session) = session else {
            debug!("No live session, nothing to tear down");
            return TeardownReport::default();
        };

        let mut report = TeardownReport {
            performed: true,
            ..Default::default()
        };
        let call = session.call();

        info!(
            attempt_id = %session.attempt_id(),
            "Tearing down call {} as {}",
            session.target().call_id,
            session.role()
        );

        match session.role() {
            Role::Host => {
                match call.end_for_all().await {
                    Ok(()) => report.ended_for_all = true,
                    Err(e) => {
                        report.record_failure(TeardownStep::EndForAll, &e);
                        match call.leave().await {
                            Ok(()) => report.left = true,
                            Err(e) => report.record_failure(TeardownStep::Leave, &e),
                        }
                    }
                }

                if let Some(meeting_id) = meeting_id {
                    match self.complete_meeting(meeting_id).await {
                        Ok(()) => report.status_synced = true,
                        Err(e) => report.record_failure(TeardownStep::StatusSync, &e),
                    }
                }
            }
            Role::Participant => match call.leave().await {
                Ok(()) => report.left = true,
                Err(e) => report.record_failure(TeardownStep::Leave, &e),
            },
        }

        match session.client().disconnect().await {
            Ok(()) => report.disconnected = true,
            Err(e) => report.record_failure(TeardownStep::Disconnect, &e),
        }

        debug!("Teardown of call {} finished: {:?}", session.target().call_id, report);
        report
    }

    /// Status-sync step on its own, used when the call ended remotely.
    /// Only hosts write, and only when the call is bound to a meeting.
    pub async fn sync_meeting_status(&self, role: Role, meeting_id: Option<&MeetingId>) -> bool {
        let Some(meeting_id) = meeting_id else {
            return false;
        };
        if !role.is_host() {
            return false;
        }

        match self.complete_meeting(meeting_id).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to sync status of meeting {}: {}", meeting_id, e);
                metrics::counter!(
                    "call_teardown_step_failures_total",
                    "step" => TeardownStep::StatusSync.as_str()
                )
                .increment(1);
                false
            }
        }
    }

    async fn complete_meeting(&self, meeting_id: &MeetingId) -> Result<(), ServiceError> {
        self.meetings
            .set_status(meeting_id, MeetingStatus::Completed)
            .await?;
        info!("Meeting {} marked as completed", meeting_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::{CallTarget, JoinOptions, SessionCredential, TransportEngine};
    use crate::domain::meeting::repository::MockMeetingRepository;
    use crate::domain::shared::{ActorId, CallId};
    use crate::infrastructure::transport::{LoopbackTransport, OpKind};
    use uuid::Uuid;

    async fn live_session(
        transport: &LoopbackTransport,
        role: Role,
        meeting_id: Option<MeetingId>,
    ) -> CallSession {
        let credential = SessionCredential {
            token: "tok".to_string(),
            client_api_key: "key".to_string(),
            actor_id: ActorId::new(7),
            actor_display_name: "Ana".to_string(),
            actor_image: None,
        };
        let client = transport.create_client(&credential).await.unwrap();
        let call_id = CallId::new("room-1");
        let call = client.create_or_get_session(&call_id).await.unwrap();
        call.join(JoinOptions::default()).await.unwrap();

        CallSession::new(
            Uuid::new_v4(),
            CallTarget::explicit(call_id),
            role,
            meeting_id,
            client,
            call,
        )
    }

    #[tokio::test]
    async fn test_host_teardown_completes_meeting_once() {
        let transport = LoopbackTransport::new();
        let mut meetings = MockMeetingRepository::new();
        meetings
            .expect_set_status()
            .withf(|id, status| id.as_str() == "m1" && *status == MeetingStatus::Completed)
            .times(1)
            .returning(|_, _| Ok(()));

        let controller = TeardownController::new(Arc::new(meetings));
        let meeting_id = MeetingId::new("m1");
        let mut slot = Some(live_session(&transport, Role::Host, Some(meeting_id.clone())).await);

        let report = controller.teardown(slot.take(), Some(&meeting_id)).await;
        assert!(report.performed);
        assert!(report.ended_for_all);
        assert!(report.status_synced);
        assert!(report.disconnected);
        assert!(report.is_clean());

        // second run is a no-op
        let again = controller.teardown(slot.take(), Some(&meeting_id)).await;
        assert_eq!(again, TeardownReport::default());
        assert_eq!(transport.count(OpKind::EndForAll), 1);
        assert_eq!(transport.count(OpKind::Disconnect), 1);
    }

    #[tokio::test]
    async fn test_host_end_failure_falls_back_to_leave() {
        let transport = LoopbackTransport::new();
        transport.fail(OpKind::EndForAll);

        let mut meetings = MockMeetingRepository::new();
        meetings
            .expect_set_status()
            .times(1)
            .returning(|_, _| Ok(()));

        let controller = TeardownController::new(Arc::new(meetings));
        let meeting_id = MeetingId::new("m1");
        let session = live_session(&transport, Role::Host, Some(meeting_id.clone())).await;

        let report = controller.teardown(Some(session), Some(&meeting_id)).await;
        assert!(!report.ended_for_all);
        assert!(report.left);
        assert!(report.status_synced);
        assert!(report.disconnected);
        assert_eq!(report.failures, vec![TeardownStep::EndForAll]);
        assert_eq!(transport.count(OpKind::Leave), 1);
    }

    #[tokio::test]
    async fn test_status_sync_failure_does_not_block_disconnect() {
        let transport = LoopbackTransport::new();
        let mut meetings = MockMeetingRepository::new();
        meetings
            .expect_set_status()
            .times(1)
            .returning(|_, _| Err(ServiceError::Network("reset".to_string())));

        let controller = TeardownController::new(Arc::new(meetings));
        let meeting_id = MeetingId::new("m1");
        let session = live_session(&transport, Role::Host, Some(meeting_id.clone())).await;

        let report = controller.teardown(Some(session), Some(&meeting_id)).await;
        assert!(report.ended_for_all);
        assert!(!report.status_synced);
        assert!(report.disconnected);
        assert_eq!(report.failures, vec![TeardownStep::StatusSync]);
    }

    #[tokio::test]
    async fn test_participant_only_leaves() {
        let transport = LoopbackTransport::new();
        let mut meetings = MockMeetingRepository::new();
        meetings.expect_set_status().never();
        meetings.expect_get().never();

        let controller = TeardownController::new(Arc::new(meetings));
        let meeting_id = MeetingId::new("m1");
        let session = live_session(&transport, Role::Participant, Some(meeting_id.clone())).await;

        let report = controller.teardown(Some(session), Some(&meeting_id)).await;
        assert!(report.left);
        assert!(!report.ended_for_all);
        assert!(report.disconnected);
        assert_eq!(transport.count(OpKind::EndForAll), 0);
    }

    #[tokio::test]
    async fn test_host_without_meeting_touches_no_record() {
        let transport = LoopbackTransport::new();
        let mut meetings = MockMeetingRepository::new();
        meetings.expect_set_status().never();
        meetings.expect_get().never();

        let controller = TeardownController::new(Arc::new(meetings));
        let session = live_session(&transport, Role::Host, None).await;

        let report = controller.teardown(Some(session), None).await;
        assert!(report.ended_for_all);
        assert!(!report.status_synced);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn test_every_failure_is_swallowed() {
        let transport = LoopbackTransport::new();
        let mut meetings = MockMeetingRepository::new();
        meetings.expect_set_status().never();

        let controller = TeardownController::new(Arc::new(meetings));
        let session = live_session(&transport, Role::Participant, None).await;
        transport.fail(OpKind::Leave);
        transport.fail(OpKind::Disconnect);

        let report = controller.teardown(Some(session), None).await;
        assert!(report.performed);
        assert_eq!(
            report.failures,
            vec![TeardownStep::Leave, TeardownStep::Disconnect]
        );
    }

    #[tokio::test]
    async fn test_sync_meeting_status_only_for_hosts() {
        let mut meetings = MockMeetingRepository::new();
        meetings
            .expect_set_status()
            .times(1)
            .returning(|_, _| Ok(()));

        let controller = TeardownController::new(Arc::new(meetings));
        let meeting_id = MeetingId::new("m1");

        assert!(!controller
            .sync_meeting_status(Role::Participant, Some(&meeting_id))
            .await);
        assert!(!controller.sync_meeting_status(Role::Host, None).await);
        assert!(controller
            .sync_meeting_status(Role::Host, Some(&meeting_id))
            .await);
    }
}
