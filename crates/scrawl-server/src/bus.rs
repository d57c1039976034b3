//! Broadcast bus: per-room multicast and direct addressing.
//!
//! Maps connection handles to per-recipient unbounded queues. The gateway
//! registers a queue when a connection opens and drains it from a dedicated
//! writer task, so a slow or unreachable socket never blocks the room's
//! critical section or other members' delivery.
//!
//! Ordering: the coordinator publishes while holding the room's lock, and
//! each recipient's queue preserves send order, so all members observe a
//! room's events in the order they were published. No ordering is
//! guaranteed across rooms.

use std::{
    collections::HashMap,
    sync::RwLock,
};

use scrawl_core::ConnectionId;
use scrawl_proto::ServerEvent;
use tokio::sync::mpsc;

/// Per-recipient fan-out of encoded server events.
///
/// Delivery is best-effort: a recipient whose queue is gone (connection
/// closed mid-broadcast) is skipped without failing delivery to the rest.
#[derive(Debug, Default)]
pub struct BroadcastBus {
    senders: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
}

impl BroadcastBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connection's outbound queue.
    ///
    /// A re-register for the same handle replaces the previous queue.
    #[allow(clippy::expect_used)]
    pub fn register(&self, conn: ConnectionId, sender: mpsc::UnboundedSender<String>) {
        self.senders.write().expect("lock poisoned").insert(conn, sender);
    }

    /// Drop a connection's outbound queue.
    #[allow(clippy::expect_used)]
    pub fn unregister(&self, conn: ConnectionId) {
        self.senders.write().expect("lock poisoned").remove(&conn);
    }

    /// Number of registered connections.
    #[allow(clippy::expect_used)]
    pub fn connection_count(&self) -> usize {
        self.senders.read().expect("lock poisoned").len()
    }

    /// Deliver an event to exactly one connection, bypassing the room.
    ///
    /// Used for secret-word delivery and per-participant error responses.
    #[allow(clippy::expect_used)]
    pub fn send_to(&self, conn: ConnectionId, event: &ServerEvent) {
        let Ok(text) = event.encode() else {
            tracing::error!(conn, "failed to encode direct event");
            return;
        };
        let senders = self.senders.read().expect("lock poisoned");
        match senders.get(&conn) {
            Some(sender) => {
                if sender.send(text).is_err() {
                    tracing::debug!(conn, "direct send to closed connection dropped");
                }
            },
            None => tracing::debug!(conn, "direct send to unknown connection dropped"),
        }
    }

    /// Report an error back to one participant only. Never broadcast.
    pub fn send_error(&self, conn: ConnectionId, message: &str) {
        self.send_to(conn, &ServerEvent::Error { message: message.to_string() });
    }

    /// Deliver an event to every listed member connection.
    ///
    /// The event is encoded once; per-recipient failures are isolated and
    /// never abort delivery to the remaining members.
    #[allow(clippy::expect_used)]
    pub fn broadcast(&self, conns: &[ConnectionId], event: &ServerEvent) {
        let Ok(text) = event.encode() else {
            tracing::error!("failed to encode broadcast event");
            return;
        };
        let senders = self.senders.read().expect("lock poisoned");
        for conn in conns {
            if let Some(sender) = senders.get(conn) {
                if sender.send(text.clone()).is_err() {
                    tracing::debug!(conn, "broadcast to closed connection dropped");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recv_all(rx: &mut mpsc::UnboundedReceiver<String>) -> Vec<ServerEvent> {
        let mut out = Vec::new();
        while let Ok(text) = rx.try_recv() {
            out.push(ServerEvent::decode(&text).unwrap());
        }
        out
    }

    #[test]
    fn broadcast_reaches_all_registered() {
        let bus = BroadcastBus::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        bus.register(1, tx1);
        bus.register(2, tx2);

        bus.broadcast(&[1, 2], &ServerEvent::ClearCanvas);

        assert_eq!(recv_all(&mut rx1), vec![ServerEvent::ClearCanvas]);
        assert_eq!(recv_all(&mut rx2), vec![ServerEvent::ClearCanvas]);
    }

    #[test]
    fn send_to_targets_one_connection() {
        let bus = BroadcastBus::new();
        let (tx1, mut rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        bus.register(1, tx1);
        bus.register(2, tx2);

        bus.send_to(1, &ServerEvent::GameEnd);

        assert_eq!(recv_all(&mut rx1).len(), 1);
        assert!(recv_all(&mut rx2).is_empty());
    }

    #[test]
    fn closed_recipient_does_not_poison_broadcast() {
        let bus = BroadcastBus::new();
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, mut rx2) = mpsc::unbounded_channel();
        bus.register(1, tx1);
        bus.register(2, tx2);
        drop(rx1); // receiver gone, sender still registered

        bus.broadcast(&[1, 2], &ServerEvent::GameEnd);

        assert_eq!(recv_all(&mut rx2), vec![ServerEvent::GameEnd]);
    }

    #[test]
    fn unregister_stops_delivery() {
        let bus = BroadcastBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.register(1, tx);
        bus.unregister(1);

        bus.broadcast(&[1], &ServerEvent::GameEnd);
        assert!(recv_all(&mut rx).is_empty());
        assert_eq!(bus.connection_count(), 0);
    }

    #[test]
    fn per_recipient_order_preserved() {
        let bus = BroadcastBus::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        bus.register(1, tx);

        bus.broadcast(&[1], &ServerEvent::Turn { drawer: "a".to_string() });
        bus.broadcast(&[1], &ServerEvent::ClearCanvas);
        bus.send_to(1, &ServerEvent::GameEnd);

        assert_eq!(
            recv_all(&mut rx),
            vec![
                ServerEvent::Turn { drawer: "a".to_string() },
                ServerEvent::ClearCanvas,
                ServerEvent::GameEnd,
            ]
        );
    }
}
