//! Turn timer scheduling.
//!
//! Arms one deadline per room and reports expirations over a channel to
//! whoever owns the room state. A fired timer is a *hint*, not a command:
//! the expiration carries the generation it was armed for, and the
//! consumer discards it if the room has moved on. Cancellation here is an
//! optimization that avoids useless wakeups; correctness never depends on
//! a cancel landing in time.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::Duration,
};

use scrawl_core::Environment;
use tokio::{
    sync::mpsc,
    task::AbortHandle,
};

/// A turn deadline that elapsed without the room advancing first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnExpired {
    /// Room whose turn deadline elapsed.
    pub room: String,
    /// Generation the timer was armed for. Stale if the room has since
    /// advanced.
    pub generation: u64,
}

/// One pending deadline per room, delivered as [`TurnExpired`] messages.
#[derive(Debug)]
pub struct TurnScheduler<E: Environment> {
    env: E,
    tx: mpsc::UnboundedSender<TurnExpired>,
    pending: Mutex<HashMap<String, AbortHandle>>,
}

impl<E: Environment> TurnScheduler<E> {
    /// Create a scheduler that reports expirations on `tx`.
    pub fn new(env: E, tx: mpsc::UnboundedSender<TurnExpired>) -> Self {
        Self { env, tx, pending: Mutex::new(HashMap::new()) }
    }

    /// Arm the deadline for `room`, replacing any previously armed one.
    #[allow(clippy::expect_used)]
    pub fn schedule(&self, room: &str, generation: u64, duration: Duration) {
        let env = self.env.clone();
        let tx = self.tx.clone();
        let expired = TurnExpired { room: room.to_string(), generation };
        let handle = tokio::spawn(async move {
            env.sleep(duration).await;
            // Receiver gone means the coordinator is shutting down.
            let _ = tx.send(expired);
        })
        .abort_handle();

        let mut pending = self.pending.lock().expect("lock poisoned");
        if let Some(previous) = pending.insert(room.to_string(), handle) {
            previous.abort();
        }
    }

    /// Disarm the deadline for `room`, if one is pending.
    #[allow(clippy::expect_used)]
    pub fn cancel(&self, room: &str) {
        if let Some(handle) = self.pending.lock().expect("lock poisoned").remove(room) {
            handle.abort();
        }
    }

    /// Number of rooms with an armed deadline.
    #[allow(clippy::expect_used)]
    pub fn pending_count(&self) -> usize {
        self.pending.lock().expect("lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SystemEnv;

    #[tokio::test]
    async fn fires_after_duration_with_generation() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(SystemEnv::new(), tx);

        scheduler.schedule("lobby", 7, Duration::from_millis(10));

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired, TurnExpired { room: "lobby".to_string(), generation: 7 });
    }

    #[tokio::test]
    async fn reschedule_replaces_pending_deadline() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(SystemEnv::new(), tx);

        scheduler.schedule("lobby", 1, Duration::from_secs(60));
        scheduler.schedule("lobby", 2, Duration::from_millis(10));
        assert_eq!(scheduler.pending_count(), 1);

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.generation, 2);
    }

    #[tokio::test]
    async fn cancel_suppresses_expiration() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(SystemEnv::new(), tx);

        scheduler.schedule("lobby", 1, Duration::from_millis(10));
        scheduler.cancel("lobby");
        assert_eq!(scheduler.pending_count(), 0);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn rooms_are_independent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let scheduler = TurnScheduler::new(SystemEnv::new(), tx);

        scheduler.schedule("a", 1, Duration::from_millis(10));
        scheduler.schedule("b", 1, Duration::from_secs(60));
        scheduler.cancel("b");

        let expired = rx.recv().await.unwrap();
        assert_eq!(expired.room, "a");
    }
}
