//! In-process transport engine
//!
//! Calls are rooms keyed by call id; every client handle on the same id shares
//! the room's "session ended" channel. Used by the demo binary and the tests,
//! with per-operation failure injection and an operation log.

use crate::domain::call::{
    ConnectionState, JoinOptions, SessionCredential, SessionEnded, TransportCall, TransportClient,
    TransportEngine,
};
use crate::domain::shared::{ActorId, CallId, Result, ServiceError};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{broadcast, watch, Notify, Semaphore};
use tracing::debug;

const ENDED_CHANNEL_CAPACITY: usize = 16;

/// Operation kinds recorded in the log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpKind {
    CreateClient,
    CreateSession,
    Join,
    EndForAll,
    Leave,
    Disconnect,
}

impl fmt::Display for OpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OpKind::CreateClient => "create_client",
            OpKind::CreateSession => "create_session",
            OpKind::Join => "join",
            OpKind::EndForAll => "end_for_all",
            OpKind::Leave => "leave",
            OpKind::Disconnect => "disconnect",
        };
        f.write_str(name)
    }
}

/// One attempted operation, failed ones included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportOp {
    pub kind: OpKind,
    pub actor: ActorId,
    pub call_id: Option<CallId>,
}

struct Room {
    ended: broadcast::Sender<SessionEnded>,
    /// Joined handles by handle id
    members: HashMap<u64, Arc<watch::Sender<ConnectionState>>>,
}

impl Room {
    fn new() -> Self {
        let (ended, _) = broadcast::channel(ENDED_CHANNEL_CAPACITY);
        Self {
            ended,
            members: HashMap::new(),
        }
    }
}

#[derive(Default)]
struct State {
    rooms: HashMap<CallId, Room>,
    ops: Vec<TransportOp>,
    faults: HashSet<OpKind>,
    connected: HashSet<u64>,
    join_gate: Option<Arc<Semaphore>>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    next_id: AtomicU64,
    op_recorded: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Log the attempt and apply injected faults
    fn record(&self, kind: OpKind, actor: ActorId, call_id: Option<&CallId>) -> Result<()> {
        let failing = {
            let mut state = self.lock();
            state.ops.push(TransportOp {
                kind,
                actor,
                call_id: call_id.cloned(),
            });
            state.faults.contains(&kind)
        };
        self.op_recorded.notify_waiters();

        if failing {
            debug!("Injected {} failure for actor {}", kind, actor);
            Err(ServiceError::Transport(format!("{} failed", kind)))
        } else {
            Ok(())
        }
    }
}

/// Loopback engine. Clones share the same rooms and log.
#[derive(Clone, Default)]
pub struct LoopbackTransport {
    shared: Arc<Shared>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following `kind` operation fail
    pub fn fail(&self, kind: OpKind) {
        self.shared.lock().faults.insert(kind);
    }

    pub fn heal(&self, kind: OpKind) {
        self.shared.lock().faults.remove(&kind);
    }

    /// Number of attempted `kind` operations
    pub fn count(&self, kind: OpKind) -> usize {
        self.shared
            .lock()
            .ops
            .iter()
            .filter(|op| op.kind == kind)
            .count()
    }

    pub fn ops(&self) -> Vec<TransportOp> {
        self.shared.lock().ops.clone()
    }

    /// Park joins in `Joining` until [`release_joins`](Self::release_joins)
    pub fn hold_joins(&self) {
        self.shared.lock().join_gate = Some(Arc::new(Semaphore::new(0)));
    }

    pub fn release_joins(&self) {
        if let Some(gate) = self.shared.lock().join_gate.take() {
            gate.close();
        }
    }

    /// Wait until at least `n` operations of `kind` were attempted
    pub async fn wait_for_op(&self, kind: OpKind, n: usize) {
        loop {
            let recorded = self.shared.op_recorded.notified();
            if self.count(kind) >= n {
                return;
            }
            recorded.await;
        }
    }

    /// Handles currently joined to `call_id`
    pub fn member_count(&self, call_id: &CallId) -> usize {
        self.shared
            .lock()
            .rooms
            .get(call_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    /// Clients created and not yet disconnected
    pub fn connected_clients(&self) -> usize {
        self.shared.lock().connected.len()
    }
}

#[async_trait]
impl TransportEngine for LoopbackTransport {
    async fn create_client(
        &self,
        credential: &SessionCredential,
    ) -> Result<Arc<dyn TransportClient>> {
        self.shared
            .record(OpKind::CreateClient, credential.actor_id, None)?;
        if !credential.is_complete() {
            return Err(ServiceError::Transport(
                "credential is missing token or API key".to_string(),
            ));
        }

        let id = self.shared.next_id();
        self.shared.lock().connected.insert(id);
        debug!("Loopback client {} created for actor {}", id, credential.actor_id);

        Ok(Arc::new(LoopbackClient {
            id,
            actor: credential.actor_id,
            shared: self.shared.clone(),
        }))
    }
}

struct LoopbackClient {
    id: u64,
    actor: ActorId,
    shared: Arc<Shared>,
}

#[async_trait]
impl TransportClient for LoopbackClient {
    fn identity(&self) -> ActorId {
        self.actor
    }

    async fn create_or_get_session(&self, call_id: &CallId) -> Result<Arc<dyn TransportCall>> {
        self.shared
            .record(OpKind::CreateSession, self.actor, Some(call_id))?;

        let ended = {
            let mut state = self.shared.lock();
            state
                .rooms
                .entry(call_id.clone())
                .or_insert_with(Room::new)
                .ended
                .clone()
        };
        let (state, _) = watch::channel(ConnectionState::Idle);

        Ok(Arc::new(LoopbackCall {
            handle_id: self.shared.next_id(),
            actor: self.actor,
            call_id: call_id.clone(),
            state: Arc::new(state),
            ended,
            shared: self.shared.clone(),
        }))
    }

    async fn disconnect(&self) -> Result<()> {
        self.shared.record(OpKind::Disconnect, self.actor, None)?;
        self.shared.lock().connected.remove(&self.id);
        debug!("Loopback client {} disconnected", self.id);
        Ok(())
    }
}

struct LoopbackCall {
    handle_id: u64,
    actor: ActorId,
    call_id: CallId,
    state: Arc<watch::Sender<ConnectionState>>,
    ended: broadcast::Sender<SessionEnded>,
    shared: Arc<Shared>,
}

#[async_trait]
impl TransportCall for LoopbackCall {
    fn call_id(&self) -> CallId {
        self.call_id.clone()
    }

    async fn join(&self, options: JoinOptions) -> Result<()> {
        self.shared
            .record(OpKind::Join, self.actor, Some(&self.call_id))?;
        self.state.send_replace(ConnectionState::Joining);

        let gate = self.shared.lock().join_gate.clone();
        if let Some(gate) = gate {
            // Closed on release; either outcome lets the join through
            let _ = gate.acquire().await;
        }

        {
            let mut state = self.shared.lock();
            if !options.create && !state.rooms.contains_key(&self.call_id) {
                drop(state);
                self.state.send_replace(ConnectionState::Idle);
                return Err(ServiceError::NotFound(format!("call {}", self.call_id)));
            }
            state
                .rooms
                .entry(self.call_id.clone())
                .or_insert_with(Room::new)
                .members
                .insert(self.handle_id, self.state.clone());
        }

        self.state.send_replace(ConnectionState::Joined);
        Ok(())
    }

    async fn end_for_all(&self) -> Result<()> {
        self.shared
            .record(OpKind::EndForAll, self.actor, Some(&self.call_id))?;

        let members = {
            let mut state = self.shared.lock();
            state
                .rooms
                .get_mut(&self.call_id)
                .map(|room| std::mem::take(&mut room.members))
                .unwrap_or_default()
        };
        for member in members.values() {
            member.send_replace(ConnectionState::Left);
        }
        self.state.send_replace(ConnectionState::Left);

        // No receivers just means nobody is watching
        let _ = self.ended.send(SessionEnded::new(self.call_id.clone()));
        debug!("Call {} ended for {} members", self.call_id, members.len());
        Ok(())
    }

    async fn leave(&self) -> Result<()> {
        self.shared
            .record(OpKind::Leave, self.actor, Some(&self.call_id))?;

        if let Some(room) = self.shared.lock().rooms.get_mut(&self.call_id) {
            room.members.remove(&self.handle_id);
        }
        self.state.send_replace(ConnectionState::Left);
        Ok(())
    }

    fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.state.subscribe()
    }

    fn session_ended(&self) -> broadcast::Receiver<SessionEnded> {
        self.ended.subscribe()
    }
}
