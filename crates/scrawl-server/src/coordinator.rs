//! Room session coordinator.
//!
//! Owns the authoritative [`RoomState`] for every live room and executes
//! the effects those state machines emit: broadcasts go through the
//! [`BroadcastBus`], timer requests through the [`TurnScheduler`], and a
//! coarse snapshot is mirrored to the [`RoomStore`] after each mutation.
//!
//! Locking: rooms live behind one async mutex each, inside a map guarded
//! by a read-write lock that is only written when a room is first created.
//! Operations on different rooms never contend; operations on the same
//! room serialize, which is what gives each room a single consistent
//! event order.

use std::{
    collections::HashMap,
    sync::Arc,
    time::Duration,
};

use scrawl_core::{
    ConnectionId,
    Environment,
    GameError,
    Phase,
    RoomEffect,
    RoomState,
    WordBank,
};
use tokio::sync::{Mutex, RwLock, mpsc};

use crate::{
    bus::BroadcastBus,
    error::ServerError,
    scheduler::TurnScheduler,
    store::{MemberRecord, RoomRecord, RoomStore},
};

/// Coordinator tuning knobs.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// How long each drawing turn lasts before the drawer rotates.
    pub turn_duration: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { turn_duration: Duration::from_secs(60) }
    }
}

/// Shared handle to a room's state machine.
type SharedRoom = Arc<Mutex<RoomState>>;

/// Drives every room's lifecycle and wires state-machine effects to the
/// bus, the scheduler, and the store.
pub struct Coordinator<E: Environment, B, S> {
    rooms: RwLock<HashMap<String, SharedRoom>>,
    bus: BroadcastBus,
    scheduler: TurnScheduler<E>,
    word_bank: B,
    store: S,
    config: ServerConfig,
}

impl<E, B, S> Coordinator<E, B, S>
where
    E: Environment,
    B: WordBank,
    S: RoomStore,
{
    /// Build a coordinator and spawn its timer-expiry loop.
    ///
    /// The loop holds only a weak handle, so dropping the last external
    /// reference tears the coordinator down.
    pub fn spawn(env: E, word_bank: B, store: S, config: ServerConfig) -> Arc<Self> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let coordinator = Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            bus: BroadcastBus::new(),
            scheduler: TurnScheduler::new(env, tx),
            word_bank,
            store,
            config,
        });

        let weak = Arc::downgrade(&coordinator);
        tokio::spawn(async move {
            while let Some(expired) = rx.recv().await {
                let Some(coordinator) = weak.upgrade() else {
                    break;
                };
                coordinator.advance_turn(&expired.room, expired.generation).await;
            }
        });

        coordinator
    }

    /// The broadcast bus connections register against.
    pub fn bus(&self) -> &BroadcastBus {
        &self.bus
    }

    /// Current phase of a room, if it exists.
    pub async fn room_phase(&self, room: &str) -> Option<Phase> {
        let shared = self.lookup(room).await?;
        let state = shared.lock().await;
        Some(state.phase())
    }

    /// Current member count of a room, if it exists.
    pub async fn member_count(&self, room: &str) -> Option<u32> {
        let shared = self.lookup(room).await?;
        let state = shared.lock().await;
        Some(state.member_count())
    }

    /// Add a participant to `room`, creating the room on first join.
    ///
    /// Returns the member count after the join.
    pub async fn join(
        &self,
        room: &str,
        user_id: &str,
        username: &str,
        conn: ConnectionId,
    ) -> Result<u32, ServerError> {
        let shared = self.get_or_create(room).await?;
        let mut state = shared.lock().await;
        let (count, effects) = state.join(user_id, username, conn)?;
        self.apply(&state, effects);

        if let Err(error) = self.store.add_member(
            room,
            &MemberRecord { user_id: user_id.to_string(), username: username.to_string() },
        ) {
            tracing::warn!(room, %error, "failed to mirror membership to store");
        }
        self.mirror(&state);
        Ok(count)
    }

    /// Remove a participant from `room`. Unknown rooms and unknown
    /// participants are silent no-ops.
    pub async fn leave(&self, room: &str, user_id: &str) -> Result<(), ServerError> {
        let Some(shared) = self.lookup(room).await else {
            return Ok(());
        };
        let mut state = shared.lock().await;
        let effects = state.leave(user_id, &self.word_bank);
        self.apply(&state, effects);
        self.disarm_if_idle(&state);

        if let Err(error) = self.store.remove_member(room, user_id) {
            tracing::warn!(room, %error, "failed to mirror removal to store");
        }
        self.mirror(&state);
        Ok(())
    }

    /// Start a game in `room`.
    pub async fn start_game(&self, room: &str) -> Result<(), ServerError> {
        let shared = self.require(room).await?;
        let mut state = shared.lock().await;
        let effects = state.start_game(&self.word_bank)?;
        self.apply(&state, effects);
        self.mirror(&state);
        Ok(())
    }

    /// Relay a drawing stroke from the current drawer.
    pub async fn submit_drawing(
        &self,
        room: &str,
        drawing: String,
        drawer_id: &str,
    ) -> Result<(), ServerError> {
        let shared = self.require(room).await?;
        let mut state = shared.lock().await;
        let effects = state.submit_drawing(drawing, drawer_id)?;
        self.apply(&state, effects);
        Ok(())
    }

    /// Evaluate a participant's guess.
    pub async fn submit_guess(
        &self,
        room: &str,
        user_id: &str,
        guess: &str,
    ) -> Result<(), ServerError> {
        let shared = self.require(room).await?;
        let mut state = shared.lock().await;
        let effects = state.submit_guess(user_id, guess)?;
        self.apply(&state, effects);
        Ok(())
    }

    /// Explicitly end the current turn and rotate the drawer.
    pub async fn next_turn(&self, room: &str) -> Result<(), ServerError> {
        let shared = self.require(room).await?;
        let mut state = shared.lock().await;
        let effects = state.next_turn(&self.word_bank)?;
        self.apply(&state, effects);
        self.disarm_if_idle(&state);
        self.mirror(&state);
        Ok(())
    }

    /// Handle a turn-timer expiry.
    ///
    /// Stale fires (generation mismatch, room gone, game over) are dropped
    /// by the state machine; this never fails.
    pub async fn advance_turn(&self, room: &str, generation: u64) {
        let Some(shared) = self.lookup(room).await else {
            tracing::debug!(room, generation, "timer fired for unknown room");
            return;
        };
        let mut state = shared.lock().await;
        let effects = state.advance_turn(generation, &self.word_bank);
        self.apply(&state, effects);
        self.disarm_if_idle(&state);
        self.mirror(&state);
    }

    async fn lookup(&self, room: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room).cloned()
    }

    async fn require(&self, room: &str) -> Result<SharedRoom, ServerError> {
        self.lookup(room)
            .await
            .ok_or_else(|| ServerError::Game(GameError::RoomNotFound(room.to_string())))
    }

    async fn get_or_create(&self, room: &str) -> Result<SharedRoom, ServerError> {
        if let Some(shared) = self.lookup(room).await {
            return Ok(shared);
        }
        let mut rooms = self.rooms.write().await;
        // Raced creation resolves to whichever entry landed first.
        if let Some(shared) = rooms.get(room) {
            return Ok(shared.clone());
        }
        self.store.get_or_create(room)?;
        let shared = Arc::new(Mutex::new(RoomState::new(room)));
        rooms.insert(room.to_string(), shared.clone());
        tracing::info!(room, "room created");
        Ok(shared)
    }

    /// Execute effects emitted by the state machine, in order, while the
    /// room lock is still held. Bus and scheduler calls never block.
    fn apply(&self, state: &RoomState, effects: Vec<RoomEffect>) {
        for effect in effects {
            match effect {
                RoomEffect::Broadcast(event) => {
                    self.bus.broadcast(&state.member_conns(), &event);
                },
                RoomEffect::SendTo { conn, event } => self.bus.send_to(conn, &event),
                RoomEffect::ScheduleTurnTimer { generation } => {
                    self.scheduler.schedule(state.name(), generation, self.config.turn_duration);
                },
            }
        }
    }

    /// Disarm the room's timer once no turn is active. Purely an
    /// optimization; a late fire is rejected by the generation check.
    fn disarm_if_idle(&self, state: &RoomState) {
        if state.phase() != Phase::TurnActive {
            self.scheduler.cancel(state.name());
        }
    }

    fn mirror(&self, state: &RoomState) {
        let record = RoomRecord {
            name: state.name().to_string(),
            users: state.member_count(),
            current_drawer: state.drawer().map(|p| p.id.clone()),
            current_word: state.current_word().map(str::to_string),
        };
        if let Err(error) = self.store.save(&record) {
            tracing::warn!(room = state.name(), %error, "failed to mirror room snapshot");
        }
    }
}

impl<E: Environment, B, S> std::fmt::Debug for Coordinator<E, B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator").finish_non_exhaustive()
    }
}
