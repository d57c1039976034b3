//! WebSocket connection gateway.
//!
//! Accepts upgrades on `/ws/{room}`, binds each socket to a participant
//! identity, and bridges the socket to the coordinator: inbound frames
//! become client events, and a per-connection writer task pumps the bus
//! queue back out. Identity is fixed at connect time; frames cannot speak
//! for another participant.

use std::sync::Arc;

use axum::{
    Router,
    extract::{
        Path, Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use scrawl_core::{CatalogWordBank, ConnectionId, Environment};
use scrawl_proto::ClientEvent;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    coordinator::Coordinator,
    store::MemoryRoomStore,
    system_env::SystemEnv,
};

/// Coordinator wired to the production environment.
pub type ProductionCoordinator = Coordinator<SystemEnv, CatalogWordBank, MemoryRoomStore>;

/// Shared handles every connection needs.
#[derive(Clone)]
pub struct AppState {
    /// Room coordinator.
    pub coordinator: Arc<ProductionCoordinator>,
    /// Clock and randomness source.
    pub env: SystemEnv,
}

/// Optional identity supplied in the connect query string.
#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Display name. Defaults to `Anonymous`.
    pub username: Option<String>,
    /// Stable participant id. Defaults to a random guest id, which makes
    /// the connection a fresh participant rather than a reconnect.
    pub user_id: Option<String>,
}

/// Build the HTTP router exposing the WebSocket endpoint.
pub fn router(state: AppState) -> Router {
    Router::new().route("/ws/{room}", get(ws_handler)).with_state(state)
}

async fn ws_handler(
    State(state): State<AppState>,
    Path(room): Path<String>,
    Query(params): Query<ConnectParams>,
    upgrade: WebSocketUpgrade,
) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| handle_socket(state, socket, room, params))
}

fn resolve_identity(params: ConnectParams, env: &SystemEnv) -> (String, String) {
    let user_id = params
        .user_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| format!("guest-{:016x}", env.random_u64()));
    let username = params
        .username
        .filter(|name| !name.trim().is_empty())
        .unwrap_or_else(|| "Anonymous".to_string());
    (user_id, username)
}

async fn handle_socket(state: AppState, socket: WebSocket, room: String, params: ConnectParams) {
    let conn: ConnectionId = state.env.random_u64();
    let (user_id, username) = resolve_identity(params, &state.env);
    tracing::info!(room, user_id, conn, "connection opened");

    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    state.coordinator.bus().register(conn, tx);

    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    if let Err(error) = state.coordinator.join(&room, &user_id, &username, conn).await {
        tracing::warn!(room, user_id, %error, "join rejected");
        state.coordinator.bus().send_error(conn, &error.to_string());
    }

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                dispatch(&state, &room, &user_id, conn, text.as_str()).await;
            },
            Ok(Message::Close(_)) | Err(_) => break,
            // Pings are answered by the framework; binary frames are not
            // part of the protocol.
            Ok(_) => {},
        }
    }

    tracing::info!(room, user_id, conn, "connection closed");
    state.coordinator.bus().unregister(conn);
    if let Err(error) = state.coordinator.leave(&room, &user_id).await {
        tracing::warn!(room, user_id, %error, "leave on disconnect failed");
    }
    writer.abort();
}

/// Decode one inbound frame and route it. Failures are reported to the
/// sender only; the room never sees another participant's errors.
async fn dispatch(state: &AppState, room: &str, user_id: &str, conn: ConnectionId, text: &str) {
    let event = match ClientEvent::decode(text) {
        Ok(event) => event,
        Err(error) => {
            tracing::debug!(room, user_id, %error, "undecodable frame");
            state.coordinator.bus().send_error(conn, &error.to_string());
            return;
        },
    };

    // The identity bound at connect time wins over anything the payload
    // claims about who is acting.
    let result = match event {
        ClientEvent::Join { username, .. } => {
            state.coordinator.join(room, user_id, &username, conn).await.map(|_| ())
        },
        ClientEvent::StartGame => state.coordinator.start_game(room).await,
        ClientEvent::Drawing { drawing, .. } => {
            state.coordinator.submit_drawing(room, drawing, user_id).await
        },
        ClientEvent::Guess { guess, .. } => {
            state.coordinator.submit_guess(room, user_id, &guess).await
        },
        ClientEvent::NextTurn => state.coordinator.next_turn(room).await,
    };

    if let Err(error) = result {
        tracing::debug!(room, user_id, %error, "event rejected");
        state.coordinator.bus().send_error(conn, &error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_defaults_for_empty_params() {
        let env = SystemEnv::new();
        let (user_id, username) = resolve_identity(ConnectParams::default(), &env);
        assert!(user_id.starts_with("guest-"));
        assert_eq!(username, "Anonymous");
    }

    #[test]
    fn identity_keeps_supplied_values() {
        let env = SystemEnv::new();
        let params = ConnectParams {
            username: Some("Ada".to_string()),
            user_id: Some("u-1".to_string()),
        };
        assert_eq!(resolve_identity(params, &env), ("u-1".to_string(), "Ada".to_string()));
    }

    #[test]
    fn blank_params_fall_back_to_defaults() {
        let env = SystemEnv::new();
        let params =
            ConnectParams { username: Some("   ".to_string()), user_id: Some(String::new()) };
        let (user_id, username) = resolve_identity(params, &env);
        assert!(user_id.starts_with("guest-"));
        assert_eq!(username, "Anonymous");
    }

    #[test]
    fn guest_ids_are_distinct() {
        let env = SystemEnv::new();
        let (a, _) = resolve_identity(ConnectParams::default(), &env);
        let (b, _) = resolve_identity(ConnectParams::default(), &env);
        assert_ne!(a, b);
    }
}
