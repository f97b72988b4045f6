//! Call coordinator
//!
//! One coordinator per call screen instance. Wires the resolvers, the session
//! initializer, the termination watcher and the teardown controller together,
//! and is driven by the UI layer through `initialize`, `exit` and `dispose`.

use crate::application::credential_resolver::CredentialResolver;
use crate::application::lifecycle::{LoadingGate, ScreenLifecycle, ScreenPhase};
use crate::application::role_resolver::RoleResolver;
use crate::application::session_initializer::SessionInitializer;
use crate::application::target_resolver::CallTargetResolver;
use crate::application::teardown::{TeardownController, TeardownReport};
use crate::application::termination_watcher::{TerminationLatch, TerminationWatcher};
use crate::domain::call::{
    CallDirectory, CallTerminated, CredentialIssuer, Role, SessionSnapshot, TransportEngine,
};
use crate::domain::meeting::MeetingRepository;
use crate::domain::navigation::{Destination, Navigator};
use crate::domain::shared::{CallId, InitializationError, MeetingId};
use crate::domain::user::Actor;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Screen configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoordinatorOptions {
    /// Host regardless of the meeting record
    pub always_host: bool,
    /// Join this call instead of the actor's department default
    pub explicit_call_id: Option<CallId>,
    pub meeting_id: Option<MeetingId>,
}

impl CoordinatorOptions {
    /// General call screen: optional call id and meeting
    pub fn generic(explicit_call_id: Option<CallId>, meeting_id: Option<MeetingId>) -> Self {
        Self {
            always_host: false,
            explicit_call_id,
            meeting_id,
        }
    }

    /// Employee screen: always the department's default call
    pub fn employee(meeting_id: Option<MeetingId>) -> Self {
        Self {
            always_host: false,
            explicit_call_id: None,
            meeting_id,
        }
    }

    /// Management screen: the operator always hosts
    pub fn management(explicit_call_id: Option<CallId>, meeting_id: Option<MeetingId>) -> Self {
        Self {
            always_host: true,
            explicit_call_id,
            meeting_id,
        }
    }
}

/// External collaborators of a coordinator
#[derive(Clone)]
pub struct CallServices {
    pub meetings: Arc<dyn MeetingRepository>,
    pub directory: Arc<dyn CallDirectory>,
    pub credentials: Arc<dyn CredentialIssuer>,
    pub engine: Arc<dyn TransportEngine>,
    pub navigator: Arc<dyn Navigator>,
}

pub struct CallCoordinator {
    options: CoordinatorOptions,
    actor: Actor,
    initializer: SessionInitializer,
    teardown: TeardownController,
    navigator: Arc<dyn Navigator>,
    screen: Arc<ScreenLifecycle>,
    latch: Arc<TerminationLatch>,
    /// Claimed by whichever path writes the meeting status first
    status_claimed: Arc<AtomicBool>,
}

impl CallCoordinator {
    pub fn new(services: CallServices, options: CoordinatorOptions, actor: Actor) -> Self {
        let teardown = TeardownController::new(services.meetings.clone());
        let initializer = SessionInitializer::new(
            CallTargetResolver::new(services.directory),
            CredentialResolver::new(services.credentials),
            RoleResolver::new(services.meetings).with_always_host(options.always_host),
            services.engine,
            teardown.clone(),
        );

        Self {
            options,
            actor,
            initializer,
            teardown,
            navigator: services.navigator,
            screen: Arc::new(ScreenLifecycle::new()),
            latch: Arc::new(TerminationLatch::new()),
            status_claimed: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn options(&self) -> &CoordinatorOptions {
        &self.options
    }

    pub fn phase(&self) -> ScreenPhase {
        self.screen.phase()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.screen.snapshot()
    }

    /// Join the call and start watching for its end.
    ///
    /// A screen that is already live returns its snapshot. A disposed,
    /// failed or closed screen, or one with an attempt in flight, reports
    /// `Cancelled` without starting anything.
    pub async fn initialize(&self) -> Result<SessionSnapshot, InitializationError> {
        match self.screen.begin_loading() {
            LoadingGate::Proceed => {}
            LoadingGate::Live(snapshot) => return Ok(snapshot),
            gate => {
                debug!("Initialization skipped: {:?}", gate);
                return Err(InitializationError::Cancelled);
            }
        }

        let meeting_id = self.options.meeting_id.as_ref();
        let session = match self
            .initializer
            .initialize(
                self.options.explicit_call_id.as_ref(),
                meeting_id,
                &self.actor,
                self.screen.as_ref(),
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                if !matches!(e, InitializationError::Cancelled) {
                    error!("Call initialization failed: {} ({:?})", e, e);
                    self.screen.fail(e.user_message());
                }
                return Err(e);
            }
        };

        let role = session.role();
        let committed = self.screen.commit(session, |session| {
            TerminationWatcher::on_terminated(
                session,
                self.latch.clone(),
                self.termination_reaction(role),
            )
        });

        match committed {
            Ok(snapshot) => Ok(snapshot),
            Err(session) => {
                info!("Screen disposed before commit, releasing session");
                let meeting = self.claim_status_sync(meeting_id);
                self.teardown.teardown(Some(session), meeting).await;
                Err(InitializationError::Cancelled)
            }
        }
    }

    /// Reaction to a detected termination: complete the meeting (hosts only),
    /// close the screen and navigate away
    fn termination_reaction(&self, role: Role) -> impl FnOnce(CallTerminated) + Send + 'static {
        let screen = self.screen.clone();
        let navigator = self.navigator.clone();
        let teardown = self.teardown.clone();
        let status_claimed = self.status_claimed.clone();
        let meeting_id = self.options.meeting_id.clone();

        move |event| {
            info!(
                "Call {} terminated by {}",
                event.call_id,
                event.trigger.as_str()
            );

            if role.is_host() && meeting_id.is_some() && !status_claimed.swap(true, Ordering::SeqCst)
            {
                let meeting_id = meeting_id.clone();
                tokio::spawn(async move {
                    teardown
                        .sync_meeting_status(role, meeting_id.as_ref())
                        .await;
                });
            }

            screen.mark_closed();
            navigator.navigate(Destination::after_call(meeting_id.is_some()));
        }
    }

    /// User leaves the call
    pub async fn exit(&self) -> TeardownReport {
        let navigate = self.latch.try_fire();
        let report = self.teardown().await;
        self.screen.mark_closed();

        if navigate {
            self.navigator
                .navigate(Destination::after_call(self.options.meeting_id.is_some()));
        }
        report
    }

    /// Screen unmounted: no state updates or navigation afterwards
    pub async fn dispose(&self) -> TeardownReport {
        let session = self.screen.dispose();
        let meeting = if session.is_some() {
            self.claim_status_sync(self.options.meeting_id.as_ref())
        } else {
            None
        };
        self.teardown.teardown(session, meeting).await
    }

    /// Release the live session, if any. Repeated calls are no-ops.
    pub async fn teardown(&self) -> TeardownReport {
        let session = self.screen.take_session();
        let meeting = if session.is_some() {
            self.claim_status_sync(self.options.meeting_id.as_ref())
        } else {
            None
        };
        self.teardown.teardown(session, meeting).await
    }

    fn claim_status_sync<'a>(&self, meeting_id: Option<&'a MeetingId>) -> Option<&'a MeetingId> {
        let meeting_id = meeting_id?;
        if self.status_claimed.swap(true, Ordering::SeqCst) {
            debug!("Status of meeting {} already synced", meeting_id);
            None
        } else {
            Some(meeting_id)
        }
    }
}
