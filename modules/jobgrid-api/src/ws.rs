//! The realtime socket. One registry registration per connection; the
//! write half drains the registry's event channel, the read half handles
//! `room:join` / `room:leave` / `message:send`. Presence dies with the
//! socket — nothing here is durable.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message as WsMessage, WebSocket},
        Query, State, WebSocketUpgrade,
    },
    response::{IntoResponse, Response},
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use jobgrid_common::ClientEvent;

use crate::AppState;

#[derive(Deserialize)]
pub struct WsQuery {
    /// Authenticated user, resolved by the auth collaborator in front of
    /// this service (browsers cannot set custom headers on socket opens).
    pub user_id: Uuid,
}

pub async fn ws_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Response {
    // Unknown users don't get a socket.
    if state.reader.user(query.user_id).await.is_err() {
        return axum::http::StatusCode::UNAUTHORIZED.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(state, query.user_id, socket))
}

async fn handle_socket(state: Arc<AppState>, user: Uuid, socket: WebSocket) {
    let (conn, mut events) = state.registry.register(user).await;
    debug!(%user, %conn, "socket connected");

    let (mut sink, mut stream) = socket.split();

    // Push server events out as they arrive. The task ends when the
    // registry drops the sender (unregister) or the sink dies.
    let writer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    warn!(error = %e, "failed to serialize server event");
                    continue;
                }
            };
            if sink.send(WsMessage::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        let text = match message {
            WsMessage::Text(text) => text,
            WsMessage::Close(_) => break,
            _ => continue,
        };
        let event: ClientEvent = match serde_json::from_str(&text) {
            Ok(event) => event,
            Err(e) => {
                debug!(%user, error = %e, "ignoring malformed client event");
                continue;
            }
        };
        match event {
            ClientEvent::RoomJoin { room_id } => {
                // Only members may scope themselves into a room's broadcasts.
                match state.chat.room(room_id).await {
                    Ok(room) if room.members.contains(&user) => {
                        state.registry.join_room(conn, room_id).await;
                    }
                    Ok(_) => debug!(%user, %room_id, "join refused: not a member"),
                    Err(e) => debug!(%user, %room_id, error = %e, "join refused"),
                }
            }
            ClientEvent::RoomLeave { room_id } => {
                state.registry.leave_room(conn, room_id).await;
            }
            ClientEvent::MessageSend { room_id, body } => {
                // The sender's own connection already has the message;
                // exclude it from the broadcast.
                if let Err(e) = state
                    .chat
                    .post_message(room_id, user, body, Some(conn))
                    .await
                {
                    debug!(%user, %room_id, error = %e, "message rejected");
                }
            }
        }
    }

    state.registry.unregister(conn).await;
    writer.abort();
    debug!(%user, %conn, "socket disconnected");
}
