//! Shared application state: the matchmaking registries, the session
//! registry, and the slots for the optional storage and analytics
//! collaborators.

/// Per-game session state and its handle type.
pub mod session;

use std::{
    collections::{HashMap, VecDeque},
    sync::Arc,
};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::{Mutex, RwLock, mpsc, watch};
use uuid::Uuid;

use crate::{
    config::AppConfig, dao::game_store::GameStore, events::EventSink, state::session::SessionHandle,
};

/// Cheaply clonable handle to the whole application state.
pub type SharedState = Arc<AppState>;

/// A queued participant awaiting an opponent.
pub struct WaitingPlayer {
    /// Identity the participant joined under.
    pub username: String,
    /// Channel to the participant's socket writer.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Waiting queue plus the participant-to-session index.
///
/// Both live under one lock ([`AppState::matchmaker`]) so pairing, rejoin
/// lookup, and fallback-timer checks see a consistent view. Critical sections
/// must stay short: no I/O while holding it.
#[derive(Default)]
pub struct MatchmakerState {
    /// FIFO queue of participants awaiting pairing; an identity appears at
    /// most once.
    pub waiting: VecDeque<WaitingPlayer>,
    /// Identity of each seated participant mapped to their current session.
    /// Entries are removed when the session reaches a terminal result.
    pub by_player: HashMap<String, Uuid>,
}

impl MatchmakerState {
    /// Whether `username` is currently queued.
    pub fn is_waiting(&self, username: &str) -> bool {
        self.waiting.iter().any(|p| p.username == username)
    }

    /// Remove and return `username` from the queue, wherever it sits.
    pub fn remove_waiting(&mut self, username: &str) -> Option<WaitingPlayer> {
        let position = self.waiting.iter().position(|p| p.username == username)?;
        self.waiting.remove(position)
    }

    /// Remove `username` only if `tx` is the transport that owns the entry.
    ///
    /// A queued identity can swap transports by joining again; the replaced
    /// socket closing afterwards must not evict the live entry.
    pub fn remove_waiting_transport(
        &mut self,
        username: &str,
        tx: &mpsc::UnboundedSender<Message>,
    ) -> Option<WaitingPlayer> {
        let position = self
            .waiting
            .iter()
            .position(|p| p.username == username && p.tx.same_channel(tx))?;
        self.waiting.remove(position)
    }
}

/// Central application state shared by the gateway, matchmaker, and timers.
///
/// Lock order: the matchmaker lock may be taken before a session lock, never
/// the other way around.
pub struct AppState {
    config: AppConfig,
    matchmaker: Mutex<MatchmakerState>,
    sessions: DashMap<Uuid, SessionHandle>,
    game_store: RwLock<Option<Arc<dyn GameStore>>>,
    event_sink: RwLock<Option<Arc<dyn EventSink>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is
    /// installed; games run either way.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            config,
            matchmaker: Mutex::new(MatchmakerState::default()),
            sessions: DashMap::new(),
            game_store: RwLock::new(None),
            event_sink: RwLock::new(None),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The matchmaking queue and participant index, behind their shared lock.
    pub fn matchmaker(&self) -> &Mutex<MatchmakerState> {
        &self.matchmaker
    }

    /// Registry of in-progress sessions keyed by game id.
    pub fn sessions(&self) -> &DashMap<Uuid, SessionHandle> {
        &self.sessions
    }

    /// Handle to a registered session, if still active.
    pub fn session(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Drop a finished session from the registry and the participant index.
    ///
    /// Takes the matchmaker lock; callers must not hold any session lock.
    pub async fn deregister_session(&self, id: Uuid) {
        {
            let mut mm = self.matchmaker.lock().await;
            mm.by_player.retain(|_, game_id| *game_id != id);
        }
        self.sessions.remove(&id);
    }

    /// Obtain a handle to the current game store, if one is installed.
    pub async fn game_store(&self) -> Option<Arc<dyn GameStore>> {
        let guard = self.game_store.read().await;
        guard.as_ref().cloned()
    }

    /// Install a new game store implementation and leave degraded mode.
    pub async fn set_game_store(&self, store: Arc<dyn GameStore>) {
        {
            let mut guard = self.game_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current game store and enter degraded mode.
    pub async fn clear_game_store(&self) {
        {
            let mut guard = self.game_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            let changed = *current != value;
            *current = value;
            changed
        });
    }

    /// Obtain a handle to the analytics sink, if one is installed.
    pub async fn event_sink(&self) -> Option<Arc<dyn EventSink>> {
        let guard = self.event_sink.read().await;
        guard.as_ref().cloned()
    }

    /// Install the analytics sink once its startup probe succeeded.
    pub async fn set_event_sink(&self, sink: Arc<dyn EventSink>) {
        let mut guard = self.event_sink.write().await;
        *guard = Some(sink);
    }

    /// Number of sessions currently registered.
    pub fn active_games(&self) -> usize {
        self.sessions.len()
    }

    /// Number of queued participants.
    pub async fn waiting_players(&self) -> usize {
        self.matchmaker.lock().await.waiting.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn waiting_queue_tracks_membership() {
        let mut mm = MatchmakerState::default();
        let (tx, _rx) = mpsc::unbounded_channel();
        mm.waiting.push_back(WaitingPlayer {
            username: "alice".into(),
            tx,
        });

        assert!(mm.is_waiting("alice"));
        assert!(!mm.is_waiting("bob"));
        assert!(mm.remove_waiting("alice").is_some());
        assert!(mm.remove_waiting("alice").is_none());
        assert!(!mm.is_waiting("alice"));
    }

    #[tokio::test]
    async fn only_the_owning_transport_can_remove_a_queue_entry() {
        let mut mm = MatchmakerState::default();
        let (live_tx, _live_rx) = mpsc::unbounded_channel();
        let (stale_tx, _stale_rx) = mpsc::unbounded_channel();
        mm.waiting.push_back(WaitingPlayer {
            username: "alice".into(),
            tx: live_tx.clone(),
        });

        assert!(mm.remove_waiting_transport("alice", &stale_tx).is_none());
        assert!(mm.is_waiting("alice"));
        assert!(mm.remove_waiting_transport("alice", &live_tx).is_some());
        assert!(!mm.is_waiting("alice"));
    }

    #[tokio::test]
    async fn starts_degraded_until_a_store_is_installed() {
        let state = AppState::new(AppConfig::default());
        assert!(state.is_degraded());
        assert!(state.game_store().await.is_none());
        assert_eq!(state.active_games(), 0);
        assert_eq!(state.waiting_players().await, 0);
    }

    #[tokio::test]
    async fn degraded_watchers_see_flag_changes() {
        let state = AppState::new(AppConfig::default());
        let watcher = state.degraded_watcher();
        assert!(*watcher.borrow());

        state.update_degraded(false);
        assert!(!*watcher.borrow());
        assert!(!state.is_degraded());

        state.update_degraded(true);
        assert!(*watcher.borrow());
    }
}
