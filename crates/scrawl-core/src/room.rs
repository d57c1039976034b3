//! Room turn state machine.
//!
//! Owns per-room membership, turn order, the current secret word, and the
//! turn generation counter. Uses the action pattern: methods mutate state
//! and return [`RoomEffect`] values for the runtime to execute (deliveries,
//! timer scheduling). This keeps the state machine pure - no I/O, no clock -
//! and makes the turn-rotation logic directly testable.
//!
//! # Invariants
//!
//! - `0 <= drawer_index < members.len()` whenever the phase is `TurnActive`.
//! - `members` never contains duplicate participant ids (join is idempotent).
//! - `current_word` is present exactly when the phase is `TurnActive`.
//! - `generation` increases on every turn start and never decreases; a timer
//!   fire whose captured generation differs from the live one is discarded.
//! - An empty room is always in `Lobby`.

use scrawl_proto::ServerEvent;

use crate::{
    error::GameError,
    guess,
    word_bank::WordBank,
};

/// Opaque addressable reference to one participant's connection.
///
/// Owned by the gateway; the room holds a non-owning copy used only for
/// direct addressing (secret-word delivery).
pub type ConnectionId = u64;

/// A connected member of a room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Client-supplied opaque identifier, unique within the room.
    pub id: String,
    /// Human-readable label, shown in chat messages.
    pub display_name: String,
    /// Connection handle for direct addressing.
    pub conn: ConnectionId,
}

/// Room lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No game in progress. The phase of every freshly created or emptied
    /// room.
    Lobby,
    /// A turn is active: one member holds the secret word.
    TurnActive,
    /// The drawer rotation completed a full lap.
    Ended,
}

/// Actions returned by the state machine for the runtime to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomEffect {
    /// Deliver this event to every current member of the room.
    Broadcast(ServerEvent),

    /// Deliver this event to exactly one participant, bypassing the room.
    ///
    /// Used exclusively for secret-word delivery to the drawer.
    SendTo {
        /// Target connection.
        conn: ConnectionId,
        /// Event to deliver.
        event: ServerEvent,
    },

    /// Schedule a turn-expiry timer tagged with the current generation.
    ///
    /// When the timer fires, the runtime feeds the generation back through
    /// [`RoomState::advance_turn`]; a mismatch means the turn already ended
    /// and the fire is dropped.
    ScheduleTurnTimer {
        /// Generation captured at schedule time.
        generation: u64,
    },
}

/// Per-room membership and turn state.
///
/// All mutating methods must be called with exclusive access to the room
/// (the coordinator holds one lock per room). Rotation order is member
/// insertion order.
#[derive(Debug, Clone)]
pub struct RoomState {
    /// Room name, immutable once created.
    name: String,
    /// Members in join order. Order defines drawer rotation.
    members: Vec<Participant>,
    /// Current lifecycle phase.
    phase: Phase,
    /// Offset into `members` of the current drawer. Meaningful only while
    /// `TurnActive`.
    drawer_index: usize,
    /// Secret word for the active turn.
    current_word: Option<String>,
    /// Monotonic counter, incremented on every turn start. Invalidates
    /// stale timers.
    generation: u64,
    /// Participant id of the game's starting drawer. The rotation lap
    /// closes when advancement lands on this member again.
    lap_anchor: Option<String>,
}

impl RoomState {
    /// Create an empty room in `Lobby`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            phase: Phase::Lobby,
            drawer_index: 0,
            current_word: None,
            generation: 0,
            lap_anchor: None,
        }
    }

    /// Room name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Live turn generation.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of members.
    pub fn member_count(&self) -> u32 {
        self.members.len() as u32
    }

    /// Members in rotation order.
    pub fn members(&self) -> &[Participant] {
        &self.members
    }

    /// Connection handles of all current members, for broadcast fan-out.
    pub fn member_conns(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.conn).collect()
    }

    /// The current drawer. `None` unless a turn is active.
    pub fn drawer(&self) -> Option<&Participant> {
        match self.phase {
            Phase::TurnActive => self.members.get(self.drawer_index),
            _ => None,
        }
    }

    /// The active secret word. `None` unless a turn is active.
    pub fn current_word(&self) -> Option<&str> {
        self.current_word.as_deref()
    }

    /// Add a participant. Idempotent per `user_id`: a duplicate join
    /// re-binds the display name and connection handle without creating a
    /// second membership.
    ///
    /// Returns the member count after the join, alongside the `user_count`
    /// broadcast.
    pub fn join(
        &mut self,
        user_id: &str,
        display_name: &str,
        conn: ConnectionId,
    ) -> Result<(u32, Vec<RoomEffect>), GameError> {
        if user_id.trim().is_empty() {
            return Err(GameError::Malformed("join requires a user_id".to_string()));
        }
        if display_name.trim().is_empty() {
            return Err(GameError::Malformed("join requires a username".to_string()));
        }

        match self.members.iter_mut().find(|m| m.id == user_id) {
            Some(existing) => {
                // Reconnect: same identity, fresh handle
                existing.display_name = display_name.to_string();
                existing.conn = conn;
            },
            None => {
                self.members.push(Participant {
                    id: user_id.to_string(),
                    display_name: display_name.to_string(),
                    conn,
                });
            },
        }

        let count = self.member_count();
        tracing::debug!(room = %self.name, user_id, count, "participant joined");
        Ok((count, vec![RoomEffect::Broadcast(ServerEvent::UserCount { user_count: count })]))
    }

    /// Remove a participant. Unknown ids are a silent no-op.
    ///
    /// If the removed participant was the active drawer, the turn advances
    /// to the rotation successor exactly once. An emptied room returns to
    /// `Lobby`.
    pub fn leave(&mut self, user_id: &str, bank: &dyn WordBank) -> Vec<RoomEffect> {
        let Some(removed_at) = self.members.iter().position(|m| m.id == user_id) else {
            tracing::debug!(room = %self.name, user_id, "leave for unknown participant ignored");
            return Vec::new();
        };
        let leaver = self.members.remove(removed_at);

        let mut effects = vec![RoomEffect::Broadcast(ServerEvent::UserCount {
            user_count: self.member_count(),
        })];

        if self.members.is_empty() {
            tracing::debug!(room = %self.name, "room emptied, returning to lobby");
            self.reset_to_lobby();
            return effects;
        }

        // If the lap anchor leaves, its rotation successor inherits the
        // start-of-lap position so the lap still closes.
        let was_anchor = self.lap_anchor.as_deref() == Some(leaver.id.as_str());
        if was_anchor {
            let successor = self.members[removed_at % self.members.len()].id.clone();
            self.lap_anchor = Some(successor);
        }

        if self.phase == Phase::TurnActive {
            if removed_at == self.drawer_index {
                // Removal shifted the successor into the leaver's slot.
                let next = removed_at % self.members.len();
                effects.extend(self.advance_to(next, was_anchor, bank));
            } else if removed_at < self.drawer_index {
                self.drawer_index -= 1;
            }
        }

        effects
    }

    /// Start a game: the first member in join order becomes the drawer.
    ///
    /// Fails with `InvalidState` on an empty room. Starting over an active
    /// game restarts from the first member with a fresh generation, which
    /// invalidates the superseded turn timer.
    pub fn start_game(&mut self, bank: &dyn WordBank) -> Result<Vec<RoomEffect>, GameError> {
        if self.members.is_empty() {
            return Err(GameError::InvalidState {
                phase: self.phase,
                operation: "start a game in an empty room",
            });
        }

        self.drawer_index = 0;
        self.lap_anchor = Some(self.members[0].id.clone());
        self.phase = Phase::TurnActive;
        Ok(self.begin_turn(bank))
    }

    /// Relay a drawing stroke from the current drawer.
    ///
    /// The payload is broadcast verbatim - the server never interprets
    /// stroke content.
    pub fn submit_drawing(
        &mut self,
        drawing: String,
        drawer_id: &str,
    ) -> Result<Vec<RoomEffect>, GameError> {
        let Some(drawer) = self.drawer() else {
            return Err(GameError::InvalidState {
                phase: self.phase,
                operation: "draw outside an active turn",
            });
        };
        if drawer.id != drawer_id {
            return Err(GameError::InvalidState {
                phase: self.phase,
                operation: "draw as a non-drawer",
            });
        }

        Ok(vec![RoomEffect::Broadcast(ServerEvent::Draw {
            drawing,
            drawer: drawer_id.to_string(),
        })])
    }

    /// Evaluate a guess against the current secret word.
    ///
    /// Every guess is echoed to the room as a chat message; a correct one
    /// additionally broadcasts `correct_guess`. A correct guess does NOT
    /// end the turn - turns end only by timeout or explicit advance.
    /// Guesses from already-departed participants are a silent no-op.
    pub fn submit_guess(
        &mut self,
        user_id: &str,
        guess_text: &str,
    ) -> Result<Vec<RoomEffect>, GameError> {
        if self.phase != Phase::TurnActive {
            return Err(GameError::InvalidState {
                phase: self.phase,
                operation: "guess outside an active turn",
            });
        }

        let Some(member) = self.members.iter().find(|m| m.id == user_id) else {
            tracing::debug!(room = %self.name, user_id, "guess from unknown participant ignored");
            return Ok(Vec::new());
        };

        let mut effects = vec![RoomEffect::Broadcast(ServerEvent::ChatMessage {
            username: member.display_name.clone(),
            message: guess_text.to_string(),
        })];

        if guess::is_correct(self.current_word.as_deref(), guess_text) {
            tracing::debug!(room = %self.name, user_id, "correct guess");
            effects.push(RoomEffect::Broadcast(ServerEvent::CorrectGuess {
                username: member.display_name.clone(),
                guess: guess_text.to_string(),
            }));
        }

        Ok(effects)
    }

    /// Explicitly end the current turn and rotate the drawer.
    pub fn next_turn(&mut self, bank: &dyn WordBank) -> Result<Vec<RoomEffect>, GameError> {
        if self.phase != Phase::TurnActive {
            return Err(GameError::InvalidState {
                phase: self.phase,
                operation: "advance a turn outside an active game",
            });
        }

        debug_assert!(!self.members.is_empty());
        let next = (self.drawer_index + 1) % self.members.len();
        Ok(self.advance_to(next, false, bank))
    }

    /// Turn-expiry entry point, honored only when `generation` still
    /// matches the live one.
    ///
    /// A stale fire - the turn already ended via leave, explicit advance,
    /// or game restart - is discarded silently. This generation check is
    /// the sole cancellation mechanism required for correctness; aborting
    /// the timer task is merely an optimization.
    pub fn advance_turn(&mut self, generation: u64, bank: &dyn WordBank) -> Vec<RoomEffect> {
        if self.phase != Phase::TurnActive || generation != self.generation {
            tracing::debug!(
                room = %self.name,
                captured = generation,
                live = self.generation,
                "stale turn timer discarded"
            );
            return Vec::new();
        }

        let next = (self.drawer_index + 1) % self.members.len();
        self.advance_to(next, false, bank)
    }

    /// Move the drawer role to `next`, or end the game if the rotation lap
    /// closed.
    ///
    /// `fresh_anchor` marks the one advancement where the lap anchor was
    /// just re-assigned to the member being advanced to (the starting
    /// drawer left mid-turn); that member's inherited first turn must not
    /// count as a completed lap.
    fn advance_to(
        &mut self,
        next: usize,
        fresh_anchor: bool,
        bank: &dyn WordBank,
    ) -> Vec<RoomEffect> {
        debug_assert!(next < self.members.len());

        let lap_complete = !fresh_anchor
            && self.lap_anchor.as_deref() == Some(self.members[next].id.as_str());
        if lap_complete {
            tracing::debug!(room = %self.name, "rotation lap complete, game over");
            self.phase = Phase::Ended;
            self.current_word = None;
            self.lap_anchor = None;
            return vec![RoomEffect::Broadcast(ServerEvent::GameEnd)];
        }

        self.drawer_index = next;
        self.begin_turn(bank)
    }

    /// Start a turn for the member at `drawer_index`: pick a word, bump the
    /// generation, deliver the word privately to the drawer, and announce
    /// the turn to the room.
    fn begin_turn(&mut self, bank: &dyn WordBank) -> Vec<RoomEffect> {
        debug_assert!(self.drawer_index < self.members.len());

        let choice = bank.choose_word();
        self.generation += 1;
        self.current_word = Some(choice.word.clone());

        let drawer = &self.members[self.drawer_index];
        tracing::debug!(
            room = %self.name,
            drawer = %drawer.id,
            generation = self.generation,
            "turn started"
        );

        vec![
            RoomEffect::SendTo {
                conn: drawer.conn,
                event: ServerEvent::NewWord { word: choice.word, steps: choice.steps },
            },
            RoomEffect::Broadcast(ServerEvent::Turn { drawer: drawer.id.clone() }),
            RoomEffect::Broadcast(ServerEvent::ClearCanvas),
            RoomEffect::ScheduleTurnTimer { generation: self.generation },
        ]
    }

    fn reset_to_lobby(&mut self) {
        self.phase = Phase::Lobby;
        self.drawer_index = 0;
        self.current_word = None;
        self.lap_anchor = None;
    }

    /// Panics if a structural invariant is violated. Test hook.
    #[doc(hidden)]
    pub fn assert_invariants(&self) {
        let mut seen = std::collections::HashSet::new();
        for m in &self.members {
            assert!(seen.insert(m.id.as_str()), "duplicate member id {}", m.id);
        }
        match self.phase {
            Phase::TurnActive => {
                assert!(!self.members.is_empty(), "active turn in empty room");
                assert!(self.drawer_index < self.members.len(), "drawer index out of range");
                assert!(self.current_word.is_some(), "active turn without a word");
            },
            Phase::Lobby | Phase::Ended => {
                assert!(self.current_word.is_none(), "word present outside an active turn");
            },
        }
        if self.members.is_empty() {
            assert_eq!(self.phase, Phase::Lobby, "empty room must be in lobby");
        }
    }
}
