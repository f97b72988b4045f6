//! Session initialization

use crate::application::credential_resolver::CredentialResolver;
use crate::application::role_resolver::RoleResolver;
use crate::application::target_resolver::CallTargetResolver;
use crate::application::teardown::TeardownController;
use crate::domain::call::{CallSession, JoinOptions, TransportClient, TransportEngine};
use crate::domain::shared::{CallId, InitializationError, MeetingId};
use crate::domain::user::Actor;
use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// "Is the screen still there?" check consulted between initialization steps
pub trait MountGuard: Send + Sync {
    fn is_mounted(&self) -> bool;
}

/// Guard for callers without a disposable screen
pub struct AlwaysMounted;

impl MountGuard for AlwaysMounted {
    fn is_mounted(&self) -> bool {
        true
    }
}

/// Target → credential → client → join, producing a live [`CallSession`]
#[derive(Clone)]
pub struct SessionInitializer {
    targets: CallTargetResolver,
    credentials: CredentialResolver,
    roles: RoleResolver,
    engine: Arc<dyn TransportEngine>,
    teardown: TeardownController,
}

impl SessionInitializer {
    pub fn new(
        targets: CallTargetResolver,
        credentials: CredentialResolver,
        roles: RoleResolver,
        engine: Arc<dyn TransportEngine>,
        teardown: TeardownController,
    ) -> Self {
        Self {
            targets,
            credentials,
            roles,
            engine,
            teardown,
        }
    }

    /// Run one session attempt.
    ///
    /// Fatal failures abort the remaining steps. If `guard` reports the screen
    /// gone after a step, the attempt stops with `Cancelled`; anything already
    /// acquired on the transport is released first.
    pub async fn initialize(
        &self,
        explicit_call_id: Option<&CallId>,
        meeting_id: Option<&MeetingId>,
        actor: &Actor,
        guard: &dyn MountGuard,
    ) -> Result<CallSession, InitializationError> {
        let attempt_id = Uuid::new_v4();
        let span = info_span!(
            "call_session",
            %attempt_id,
            meeting_id = meeting_id.map(MeetingId::as_str).unwrap_or("-"),
            actor_id = actor.id.value()
        );

        let result = self
            .run(attempt_id, explicit_call_id, meeting_id, actor, guard)
            .instrument(span)
            .await;

        match &result {
            Ok(session) => {
                metrics::counter!(
                    "call_sessions_initialized_total",
                    "role" => session.role().as_str()
                )
                .increment(1);
            }
            Err(e) => {
                metrics::counter!("call_initialization_failures_total", "kind" => e.kind())
                    .increment(1);
            }
        }

        result
    }

    async fn run(
        &self,
        attempt_id: Uuid,
        explicit_call_id: Option<&CallId>,
        meeting_id: Option<&MeetingId>,
        actor: &Actor,
        guard: &dyn MountGuard,
    ) -> Result<CallSession, InitializationError> {
        // Role lookup never fails, so it can run alongside target resolution
        let (role, target) = tokio::join!(
            self.roles.resolve(actor, meeting_id),
            self.targets.resolve(explicit_call_id, actor)
        );
        let target = target?;
        ensure_mounted(guard)?;

        let credential = self.credentials.resolve(&target.call_id).await?;
        ensure_mounted(guard)?;

        let client = self
            .engine
            .create_client(&credential)
            .await
            .map_err(|e| {
                warn!("Transport client creation failed: {}", e);
                InitializationError::transport_join(e)
            })?;
        drop(credential);

        if !guard.is_mounted() {
            self.release_client(&client).await;
            return Err(InitializationError::Cancelled);
        }

        let call = match client.create_or_get_session(&target.call_id).await {
            Ok(call) => call,
            Err(e) => {
                warn!("Could not create call {}: {}", target.call_id, e);
                self.release_client(&client).await;
                return Err(InitializationError::transport_join(e));
            }
        };

        if !guard.is_mounted() {
            self.release_client(&client).await;
            return Err(InitializationError::Cancelled);
        }

        let ended_notices = call.session_ended();
        if let Err(e) = call.join(JoinOptions::default()).await {
            warn!("Joining call {} failed: {}", target.call_id, e);
            self.release_client(&client).await;
            return Err(InitializationError::transport_join(e));
        }

        let session = CallSession::new(
            attempt_id,
            target,
            role,
            meeting_id.cloned(),
            client,
            call,
        )
        .with_ended_notices(ended_notices);

        if !guard.is_mounted() {
            info!(
                "Screen disposed while joining call {}, releasing session",
                session.target().call_id
            );
            self.teardown.teardown(Some(session), meeting_id).await;
            return Err(InitializationError::Cancelled);
        }

        info!(
            "Joined call {} as {} (department {})",
            session.target().call_id,
            session.role(),
            session.target().department_id
        );
        Ok(session)
    }

    async fn release_client(&self, client: &Arc<dyn TransportClient>) {
        if let Err(e) = client.disconnect().await {
            warn!("Failed to release transport client: {}", e);
        }
    }
}

fn ensure_mounted(guard: &dyn MountGuard) -> Result<(), InitializationError> {
    if guard.is_mounted() {
        Ok(())
    } else {
        Err(InitializationError::Cancelled)
    }
}
