//! Screen lifecycle state owned by a call coordinator

use crate::application::session_initializer::MountGuard;
use crate::application::termination_watcher::TerminationSubscription;
use crate::domain::call::{CallSession, SessionSnapshot};
use serde::Serialize;
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

/// What the call screen currently shows
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum ScreenPhase {
    Idle,
    Loading,
    Live,
    Failed { message: String },
    Closed,
}

impl ScreenPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScreenPhase::Failed { .. } | ScreenPhase::Closed)
    }
}

/// Outcome of asking to start an initialization attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadingGate {
    /// Phase moved to `Loading`; the caller owns the attempt
    Proceed,
    Disposed,
    /// Another attempt is running
    InFlight,
    /// A session is already live
    Live(SessionSnapshot),
    /// The screen already failed or closed; no retry
    Settled(ScreenPhase),
}

struct LiveSession {
    session: CallSession,
    subscription: TerminationSubscription,
}

struct ScreenState {
    disposed: bool,
    phase: ScreenPhase,
    live: Option<LiveSession>,
}

/// Disposal flag, phase and live-session slot behind one lock.
///
/// The disposed check and the session commit happen under the same lock, so a
/// disposal can never land between them.
pub struct ScreenLifecycle {
    state: Mutex<ScreenState>,
}

impl ScreenLifecycle {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ScreenState {
                disposed: false,
                phase: ScreenPhase::Idle,
                live: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ScreenState> {
        // State stays consistent across a panicking holder: every write is a
        // single field assignment
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin_loading(&self) -> LoadingGate {
        let mut state = self.lock();
        if state.disposed {
            return LoadingGate::Disposed;
        }
        if let Some(live) = &state.live {
            return LoadingGate::Live(live.session.snapshot());
        }
        match &state.phase {
            ScreenPhase::Idle => {
                state.phase = ScreenPhase::Loading;
                LoadingGate::Proceed
            }
            ScreenPhase::Loading => LoadingGate::InFlight,
            phase => LoadingGate::Settled(phase.clone()),
        }
    }

    /// Store a freshly joined session and start observing it.
    ///
    /// `subscribe` runs under the lock, only when the screen is still mounted.
    /// A disposed screen hands the session back for release.
    pub fn commit<F>(
        &self,
        mut session: CallSession,
        subscribe: F,
    ) -> Result<SessionSnapshot, CallSession>
    where
        F: FnOnce(&mut CallSession) -> TerminationSubscription,
    {
        let mut state = self.lock();
        if state.disposed {
            debug!("Screen disposed before commit of call {}", session.target().call_id);
            return Err(session);
        }

        let subscription = subscribe(&mut session);
        let snapshot = session.snapshot();
        state.live = Some(LiveSession {
            session,
            subscription,
        });
        state.phase = ScreenPhase::Live;
        Ok(snapshot)
    }

    /// Record a failed attempt. Ignored once disposed.
    pub fn fail(&self, message: impl Into<String>) -> bool {
        let mut state = self.lock();
        if state.disposed {
            return false;
        }
        state.phase = ScreenPhase::Failed {
            message: message.into(),
        };
        true
    }

    pub fn mark_closed(&self) {
        let mut state = self.lock();
        if !state.disposed {
            state.phase = ScreenPhase::Closed;
        }
    }

    /// Take the live session out of its slot, ending its observation.
    /// Later calls return `None`.
    pub fn take_session(&self) -> Option<CallSession> {
        let live = self.lock().live.take()?;
        live.subscription.unsubscribe();
        Some(live.session)
    }

    /// Mark the screen disposed and take whatever session it held
    pub fn dispose(&self) -> Option<CallSession> {
        let live = {
            let mut state = self.lock();
            state.disposed = true;
            state.phase = ScreenPhase::Closed;
            state.live.take()
        }?;
        live.subscription.unsubscribe();
        Some(live.session)
    }

    pub fn is_disposed(&self) -> bool {
        self.lock().disposed
    }

    pub fn phase(&self) -> ScreenPhase {
        self.lock().phase.clone()
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.lock().live.as_ref().map(|live| live.session.snapshot())
    }
}

impl Default for ScreenLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl MountGuard for ScreenLifecycle {
    fn is_mounted(&self) -> bool {
        !self.is_disposed()
    }
}
