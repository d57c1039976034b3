//! Room persistence contract and in-memory reference store.
//!
//! The store is a passive mirror of authoritative in-memory state: the
//! coordinator writes snapshots through it after mutations, and nothing in
//! the live game path reads it back. A durable backend can be swapped in
//! behind [`RoomStore`] without touching game semantics.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use serde::{Deserialize, Serialize};

/// Store-level failure.
///
/// The in-memory store is infallible; the variants exist for durable
/// implementations of the same contract.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Backend rejected or lost the write.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Snapshot of a room's coarse state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRecord {
    /// Room identifier.
    pub name: String,
    /// Member count at snapshot time.
    pub users: u32,
    /// Current drawer's participant id, if a turn is active.
    pub current_drawer: Option<String>,
    /// Current secret word, if a turn is active.
    pub current_word: Option<String>,
}

impl RoomRecord {
    /// An empty room with no active turn.
    pub fn empty(name: &str) -> Self {
        Self { name: name.to_string(), users: 0, current_drawer: None, current_word: None }
    }
}

/// One room member as mirrored to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRecord {
    /// Stable participant identity.
    pub user_id: String,
    /// Display name at join time.
    pub username: String,
}

/// Persistence contract for room snapshots and memberships.
///
/// Implementations are lenient last-writer-wins: a `save` for an unknown
/// room creates it, removing an absent member is a no-op. Callers never
/// gate game progress on store results beyond logging failures.
pub trait RoomStore: Send + Sync + 'static {
    /// Fetch the room's snapshot, creating an empty one if absent.
    fn get_or_create(&self, name: &str) -> Result<RoomRecord, StoreError>;

    /// Overwrite the room's snapshot.
    fn save(&self, record: &RoomRecord) -> Result<(), StoreError>;

    /// Record a member. Re-adding an existing `user_id` updates the name.
    fn add_member(&self, room: &str, member: &MemberRecord) -> Result<(), StoreError>;

    /// Remove a member and return how many entries were removed (0 or 1).
    fn remove_member(&self, room: &str, user_id: &str) -> Result<usize, StoreError>;

    /// Number of members currently recorded for the room.
    fn count_members(&self, room: &str) -> Result<usize, StoreError>;
}

#[derive(Debug, Default)]
struct Inner {
    rooms: HashMap<String, RoomRecord>,
    members: HashMap<String, Vec<MemberRecord>>,
}

/// In-memory [`RoomStore`] for standalone deployments and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryRoomStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryRoomStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::expect_used)]
    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("Mutex poisoned")
    }
}

impl RoomStore for MemoryRoomStore {
    fn get_or_create(&self, name: &str) -> Result<RoomRecord, StoreError> {
        let mut inner = self.lock();
        let record =
            inner.rooms.entry(name.to_string()).or_insert_with(|| RoomRecord::empty(name));
        Ok(record.clone())
    }

    fn save(&self, record: &RoomRecord) -> Result<(), StoreError> {
        self.lock().rooms.insert(record.name.clone(), record.clone());
        Ok(())
    }

    fn add_member(&self, room: &str, member: &MemberRecord) -> Result<(), StoreError> {
        let mut inner = self.lock();
        let members = inner.members.entry(room.to_string()).or_default();
        match members.iter_mut().find(|m| m.user_id == member.user_id) {
            Some(existing) => existing.username = member.username.clone(),
            None => members.push(member.clone()),
        }
        Ok(())
    }

    fn remove_member(&self, room: &str, user_id: &str) -> Result<usize, StoreError> {
        let mut inner = self.lock();
        let Some(members) = inner.members.get_mut(room) else {
            return Ok(0);
        };
        let before = members.len();
        members.retain(|m| m.user_id != user_id);
        Ok(before - members.len())
    }

    fn count_members(&self, room: &str) -> Result<usize, StoreError> {
        Ok(self.lock().members.get(room).map_or(0, Vec::len))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member(id: &str, name: &str) -> MemberRecord {
        MemberRecord { user_id: id.to_string(), username: name.to_string() }
    }

    #[test]
    fn get_or_create_returns_empty_room() {
        let store = MemoryRoomStore::new();
        let record = store.get_or_create("lobby").unwrap();
        assert_eq!(record, RoomRecord::empty("lobby"));
    }

    #[test]
    fn save_overwrites_snapshot() {
        let store = MemoryRoomStore::new();
        let record = RoomRecord {
            name: "lobby".to_string(),
            users: 2,
            current_drawer: Some("u1".to_string()),
            current_word: Some("apple".to_string()),
        };
        store.save(&record).unwrap();
        assert_eq!(store.get_or_create("lobby").unwrap(), record);
    }

    #[test]
    fn add_member_is_idempotent_on_user_id() {
        let store = MemoryRoomStore::new();
        store.add_member("lobby", &member("u1", "Ada")).unwrap();
        store.add_member("lobby", &member("u1", "Ada L")).unwrap();
        assert_eq!(store.count_members("lobby").unwrap(), 1);
    }

    #[test]
    fn remove_member_reports_removed_count() {
        let store = MemoryRoomStore::new();
        store.add_member("lobby", &member("u1", "Ada")).unwrap();
        store.add_member("lobby", &member("u2", "Grace")).unwrap();
        assert_eq!(store.remove_member("lobby", "u1").unwrap(), 1);
        assert_eq!(store.remove_member("lobby", "u1").unwrap(), 0);
        assert_eq!(store.count_members("lobby").unwrap(), 1);
    }

    #[test]
    fn remove_from_unknown_room_is_noop() {
        let store = MemoryRoomStore::new();
        assert_eq!(store.remove_member("nowhere", "u1").unwrap(), 0);
    }

    #[test]
    fn clones_share_state() {
        let store = MemoryRoomStore::new();
        let clone = store.clone();
        store.add_member("lobby", &member("u1", "Ada")).unwrap();
        assert_eq!(clone.count_members("lobby").unwrap(), 1);
    }
}
