//! Termination detection for live sessions

use crate::domain::call::{CallSession, CallTerminated, ConnectionState, TerminationTrigger};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Terminate-once latch.
///
/// Shared by every path that can end a session (both watcher triggers and the
/// user's own exit); only the first to fire gets to react.
#[derive(Debug, Default)]
pub struct TerminationLatch {
    fired: AtomicBool,
}

impl TerminationLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True for the first caller only
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// Handle of a running watcher. Observation stops on `unsubscribe` or drop.
pub struct TerminationSubscription {
    handle: Option<JoinHandle<()>>,
    latch: Arc<TerminationLatch>,
}

impl TerminationSubscription {
    pub fn latch(&self) -> &Arc<TerminationLatch> {
        &self.latch
    }

    pub fn is_active(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn unsubscribe(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for TerminationSubscription {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Watches a joined session for termination through two triggers:
/// - the connection state dropping out of the call (`Left` or `Idle`),
///   with or without `Leaving` in between
/// - an explicit "session ended" notification
///
/// Whichever comes first fires the callback, at most once per latch.
pub struct TerminationWatcher;

impl TerminationWatcher {
    pub fn on_terminated<F>(
        session: &mut CallSession,
        latch: Arc<TerminationLatch>,
        callback: F,
    ) -> TerminationSubscription
    where
        F: FnOnce(CallTerminated) + Send + 'static,
    {
        let call = Arc::clone(session.call());
        let call_id = call.call_id();
        let mut states = call.connection_state();
        let mut ended = session
            .take_ended_notices()
            .unwrap_or_else(|| call.session_ended());
        let task_latch = Arc::clone(&latch);

        let handle = tokio::spawn(async move {
            let seeded = *states.borrow_and_update();
            // The session joined before it was handed over, so being out of
            // the call already means it ended in between
            let trigger = if seeded.is_out_of_call() {
                TerminationTrigger::StateTransition {
                    from: ConnectionState::Joined,
                    to: seeded,
                }
            } else {
                let mut previous = seeded;
                let mut states_open = true;
                let mut ended_open = true;

                loop {
                    if !states_open && !ended_open {
                        debug!("Both termination sources closed for call {}", call_id);
                        return;
                    }

                    tokio::select! {
                        changed = states.changed(), if states_open => {
                            if changed.is_err() {
                                states_open = false;
                                continue;
                            }
                            let current = *states.borrow_and_update();
                            if current.is_out_of_call() {
                                break TerminationTrigger::StateTransition {
                                    from: previous,
                                    to: current,
                                };
                            }
                            previous = current;
                        }
                        notice = ended.recv(), if ended_open => {
                            match notice {
                                Ok(_) | Err(RecvError::Lagged(_)) => {
                                    break TerminationTrigger::SessionEnded;
                                }
                                Err(RecvError::Closed) => ended_open = false,
                            }
                        }
                    }
                }
            };

            if !task_latch.try_fire() {
                debug!(
                    "Call {} termination ({}) already handled",
                    call_id,
                    trigger.as_str()
                );
                return;
            }

            info!("Call {} terminated ({})", call_id, trigger.as_str());
            metrics::counter!("call_terminations_total", "trigger" => trigger.as_str())
                .increment(1);
            callback(CallTerminated::new(call_id, trigger));
        });

        TerminationSubscription {
            handle: Some(handle),
            latch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::call::{
        CallTarget, JoinOptions, Role, SessionCredential, SessionEnded, TransportCall,
        TransportEngine,
    };
    use crate::domain::shared::{ActorId, CallId, Result};
    use crate::infrastructure::transport::LoopbackTransport;
    use async_trait::async_trait;
    use std::time::Duration;
    use tokio::sync::{broadcast, mpsc, watch};
    use uuid::Uuid;

    /// Call whose state and notices are driven by the test
    struct ScriptedCall {
        state: watch::Sender<ConnectionState>,
        ended: broadcast::Sender<SessionEnded>,
    }

    impl ScriptedCall {
        fn joined() -> Arc<Self> {
            let (state, _) = watch::channel(ConnectionState::Joined);
            let (ended, _) = broadcast::channel(4);
            Arc::new(Self { state, ended })
        }

        fn set(&self, state: ConnectionState) {
            self.state.send_replace(state);
        }
    }

    #[async_trait]
    impl TransportCall for ScriptedCall {
        fn call_id(&self) -> CallId {
            CallId::new("room-1")
        }

        async fn join(&self, _options: JoinOptions) -> Result<()> {
            Ok(())
        }

        async fn end_for_all(&self) -> Result<()> {
            Ok(())
        }

        async fn leave(&self) -> Result<()> {
            Ok(())
        }

        fn connection_state(&self) -> watch::Receiver<ConnectionState> {
            self.state.subscribe()
        }

        fn session_ended(&self) -> broadcast::Receiver<SessionEnded> {
            self.ended.subscribe()
        }
    }

    fn credential(actor: i64) -> SessionCredential {
        SessionCredential {
            token: "tok".to_string(),
            client_api_key: "key".to_string(),
            actor_id: ActorId::new(actor),
            actor_display_name: format!("actor-{}", actor),
            actor_image: None,
        }
    }

    async fn session_on(
        transport: &LoopbackTransport,
        actor: i64,
        call: Option<Arc<dyn TransportCall>>,
    ) -> CallSession {
        let client = transport.create_client(&credential(actor)).await.unwrap();
        let call = match call {
            Some(call) => call,
            None => {
                let call = client
                    .create_or_get_session(&CallId::new("room-1"))
                    .await
                    .unwrap();
                call.join(JoinOptions::default()).await.unwrap();
                call
            }
        };
        CallSession::new(
            Uuid::new_v4(),
            CallTarget::explicit(CallId::new("room-1")),
            Role::Participant,
            None,
            client,
            call,
        )
    }

    async fn joined_session(transport: &LoopbackTransport, actor: i64) -> CallSession {
        session_on(transport, actor, None).await
    }

    fn watch(
        session: &mut CallSession,
        latch: Arc<TerminationLatch>,
    ) -> (TerminationSubscription, mpsc::UnboundedReceiver<CallTerminated>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let subscription = TerminationWatcher::on_terminated(session, latch, move |event| {
            let _ = tx.send(event);
        });
        (subscription, rx)
    }

    async fn next_event(rx: &mut mpsc::UnboundedReceiver<CallTerminated>) -> CallTerminated {
        tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap()
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[test]
    fn test_latch_fires_once() {
        let latch = TerminationLatch::new();
        assert!(!latch.is_fired());
        assert!(latch.try_fire());
        assert!(!latch.try_fire());
        assert!(latch.is_fired());
    }

    #[tokio::test]
    async fn test_local_leave_fires_state_trigger() {
        let transport = LoopbackTransport::new();
        let mut session = joined_session(&transport, 7).await;
        let (_subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));
        settle().await;

        session.call().leave().await.unwrap();

        assert_eq!(
            next_event(&mut rx).await.trigger,
            TerminationTrigger::StateTransition {
                from: ConnectionState::Joined,
                to: ConnectionState::Left,
            }
        );
    }

    #[tokio::test]
    async fn test_leaving_then_left_fires() {
        let transport = LoopbackTransport::new();
        let call = ScriptedCall::joined();
        let mut session = session_on(&transport, 7, Some(call.clone())).await;
        let (_subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));
        settle().await;

        call.set(ConnectionState::Leaving);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(rx.try_recv().is_err());
        call.set(ConnectionState::Left);

        assert_eq!(
            next_event(&mut rx).await.trigger,
            TerminationTrigger::StateTransition {
                from: ConnectionState::Leaving,
                to: ConnectionState::Left,
            }
        );
    }

    #[tokio::test]
    async fn test_already_left_at_subscription_fires() {
        let transport = LoopbackTransport::new();
        let call = ScriptedCall::joined();
        let mut session = session_on(&transport, 7, Some(call.clone())).await;
        call.set(ConnectionState::Left);
        let _ = call.ended.send(SessionEnded::new(CallId::new("room-1")));

        let (_subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));

        assert_eq!(
            next_event(&mut rx).await.trigger,
            TerminationTrigger::StateTransition {
                from: ConnectionState::Joined,
                to: ConnectionState::Left,
            }
        );
    }

    #[tokio::test]
    async fn test_notice_sent_before_subscription_is_delivered() {
        let transport = LoopbackTransport::new();
        let call = ScriptedCall::joined();
        let notices = call.session_ended();
        let mut session = session_on(&transport, 7, Some(call.clone()))
            .await
            .with_ended_notices(notices);

        // Ended for everyone while the state still reads Joined
        call.ended
            .send(SessionEnded::new(CallId::new("room-1")))
            .unwrap();
        let (_subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));

        assert_eq!(next_event(&mut rx).await.trigger, TerminationTrigger::SessionEnded);
    }

    #[tokio::test]
    async fn test_leaving_alone_does_not_fire() {
        let transport = LoopbackTransport::new();
        let call = ScriptedCall::joined();
        let mut session = session_on(&transport, 7, Some(call.clone())).await;
        let (subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));
        settle().await;

        call.set(ConnectionState::Leaving);
        settle().await;

        assert!(rx.try_recv().is_err());
        assert!(subscription.is_active());
    }

    #[tokio::test]
    async fn test_end_for_all_fires_exactly_once() {
        let transport = LoopbackTransport::new();
        let mut session = joined_session(&transport, 7).await;
        let (_subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));
        settle().await;

        // emits "session ended" and moves the state to Left in the same tick
        session.call().end_for_all().await.unwrap();

        next_event(&mut rx).await;
        settle().await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_remote_end_reaches_other_participant() {
        let transport = LoopbackTransport::new();
        let host = joined_session(&transport, 1).await;
        let mut guest = joined_session(&transport, 2).await;
        let (_subscription, mut rx) = watch(&mut guest, Arc::new(TerminationLatch::new()));
        settle().await;

        host.call().end_for_all().await.unwrap();

        assert_eq!(next_event(&mut rx).await.call_id, CallId::new("room-1"));
    }

    #[tokio::test]
    async fn test_claimed_latch_suppresses_callback() {
        let transport = LoopbackTransport::new();
        let mut session = joined_session(&transport, 7).await;
        let latch = Arc::new(TerminationLatch::new());
        let (subscription, mut rx) = watch(&mut session, Arc::clone(&latch));
        settle().await;

        assert!(latch.try_fire());
        session.call().leave().await.unwrap();
        settle().await;

        assert!(rx.try_recv().is_err());
        assert!(!subscription.is_active());
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_observation() {
        let transport = LoopbackTransport::new();
        let mut session = joined_session(&transport, 7).await;
        let (subscription, mut rx) = watch(&mut session, Arc::new(TerminationLatch::new()));
        settle().await;
        assert!(subscription.is_active());

        subscription.unsubscribe();
        session.call().leave().await.unwrap();
        settle().await;

        assert!(rx.try_recv().is_err());
    }
}
