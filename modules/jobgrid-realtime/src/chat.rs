//! Chat delivery pipeline: rooms are looked up by exact member set and
//! created lazily; messages are persisted first (the store's insertion
//! sequence is the authoritative order) and then relayed to the room's
//! live connections.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use jobgrid_common::{JobGridError, Message, Result, Room, ServerEvent, User};
use jobgrid_store::{Collection, EntityStore, Filter, StoreError, Txn};

use crate::registry::{ConnId, ConnectionRegistry};

pub struct ChatService {
    store: Arc<dyn EntityStore>,
    registry: Arc<ConnectionRegistry>,
}

fn store_err(err: StoreError) -> JobGridError {
    match err {
        StoreError::Aborted(msg) => JobGridError::Aborted(msg),
        StoreError::Backend(e) => {
            warn!(error = %e, "store backend failure");
            JobGridError::aborted("store unavailable, please retry")
        }
    }
}

impl ChatService {
    pub fn new(store: Arc<dyn EntityStore>, registry: Arc<ConnectionRegistry>) -> Self {
        Self { store, registry }
    }

    /// Find the room whose member set equals `member_ids` (order
    /// independent), or create it. The linear scan over candidate rooms is
    /// deliberate: member sets are tiny and correctness is what matters.
    pub async fn find_or_create_room(
        &self,
        member_ids: &[Uuid],
        name: Option<String>,
    ) -> Result<Room> {
        let members: HashSet<Uuid> = member_ids.iter().copied().collect();
        if members.len() < 2 {
            return Err(JobGridError::invalid("a room needs at least two distinct members"));
        }

        let mut member_names = Vec::new();
        for id in &members {
            let doc = self
                .store
                .get(Collection::Users, *id)
                .await
                .map_err(store_err)?
                .ok_or_else(|| JobGridError::not_found(format!("user {id}")))?;
            let user: User = doc.decode().map_err(store_err)?;
            member_names.push(user.name);
        }

        // Any member's rooms are a superset of the candidates.
        let anchor = *members.iter().next().expect("non-empty member set");
        let candidates = self
            .store
            .scan(
                Collection::Rooms,
                &Filter::new().contains("members", json!(anchor)),
            )
            .await
            .map_err(store_err)?;
        for doc in &candidates {
            let room: Room = doc.decode().map_err(store_err)?;
            let existing: HashSet<Uuid> = room.members.iter().copied().collect();
            if existing == members {
                return Ok(room);
            }
        }

        member_names.sort();
        let room = Room {
            id: Uuid::new_v4(),
            name: name.unwrap_or_else(|| member_names.join(" & ")),
            members: {
                let mut sorted: Vec<Uuid> = members.into_iter().collect();
                sorted.sort();
                sorted
            },
            created_at: Utc::now(),
        };

        let body = serde_json::to_value(&room)
            .map_err(|_| JobGridError::aborted("could not encode room"))?;
        let mut txn = Txn::new();
        txn.insert(Collection::Rooms, room.id, body);
        self.store.apply(txn).await.map_err(store_err)?;
        Ok(room)
    }

    /// Persist a message and relay it to the room's live connections.
    /// `exclude` lets a socket handler skip echoing to the sender's own
    /// connection; REST callers pass `None`.
    pub async fn post_message(
        &self,
        room_id: Uuid,
        sender: Uuid,
        body: String,
        exclude: Option<ConnId>,
    ) -> Result<Message> {
        if body.trim().is_empty() {
            return Err(JobGridError::invalid("message body is required"));
        }
        let doc = self
            .store
            .get(Collection::Rooms, room_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| JobGridError::not_found(format!("room {room_id}")))?;
        let room: Room = doc.decode().map_err(store_err)?;
        if !room.members.contains(&sender) {
            return Err(JobGridError::forbidden("sender is not a member of this room"));
        }

        let message = Message {
            id: Uuid::new_v4(),
            room: room_id,
            sender,
            body,
            created_at: Utc::now(),
        };
        let body = serde_json::to_value(&message)
            .map_err(|_| JobGridError::aborted("could not encode message"))?;
        let mut txn = Txn::new();
        txn.insert(Collection::Messages, message.id, body);
        self.store.apply(txn).await.map_err(store_err)?;

        self.registry
            .broadcast(
                room_id,
                &ServerEvent::MessageNew {
                    message: message.clone(),
                },
                exclude,
            )
            .await;

        Ok(message)
    }

    /// The room's messages in exactly the order they were persisted.
    pub async fn history(&self, room_id: Uuid) -> Result<Vec<Message>> {
        if self
            .store
            .get(Collection::Rooms, room_id)
            .await
            .map_err(store_err)?
            .is_none()
        {
            return Err(JobGridError::not_found(format!("room {room_id}")));
        }
        let docs = self
            .store
            .scan(Collection::Messages, &Filter::new().eq("room", json!(room_id)))
            .await
            .map_err(store_err)?;
        docs.iter()
            .map(|doc| doc.decode().map_err(store_err))
            .collect()
    }

    /// Rooms the user belongs to, most recent first.
    pub async fn rooms_for_user(&self, user: Uuid) -> Result<Vec<Room>> {
        let docs = self
            .store
            .scan(
                Collection::Rooms,
                &Filter::new().contains("members", json!(user)),
            )
            .await
            .map_err(store_err)?;
        let mut rooms: Vec<Room> = docs
            .iter()
            .map(|doc| doc.decode().map_err(store_err))
            .collect::<Result<_>>()?;
        rooms.reverse();
        Ok(rooms)
    }

    pub async fn room(&self, room_id: Uuid) -> Result<Room> {
        let doc = self
            .store
            .get(Collection::Rooms, room_id)
            .await
            .map_err(store_err)?
            .ok_or_else(|| JobGridError::not_found(format!("room {room_id}")))?;
        doc.decode().map_err(store_err)
    }

    /// Whether the user has at least one live connection.
    pub async fn presence(&self, user: Uuid) -> bool {
        self.registry.is_online(user).await
    }
}
