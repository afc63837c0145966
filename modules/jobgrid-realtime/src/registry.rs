//! Process-local registry of live realtime connections. Ephemeral by
//! design: nothing here is persisted, and a restart loses all presence
//! state until clients reconnect.
//!
//! A user may hold several connections at once (multiple devices/tabs),
//! and a connection may sit in several rooms. Delivery is fire-and-forget
//! per connection; one dead connection never blocks the others.

use std::collections::{HashMap, HashSet};

use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use jobgrid_common::ServerEvent;

pub type ConnId = Uuid;

struct Connection {
    user: Uuid,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

#[derive(Default)]
struct RegistryState {
    connections: HashMap<ConnId, Connection>,
    by_user: HashMap<Uuid, HashSet<ConnId>>,
    rooms: HashMap<Uuid, HashSet<ConnId>>,
    rooms_by_conn: HashMap<ConnId, HashSet<Uuid>>,
}

pub struct ConnectionRegistry {
    inner: RwLock<RegistryState>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryState::default()),
        }
    }

    /// Register a new connection for a user. Returns the connection ID and
    /// the receiving end the socket task drains.
    pub async fn register(&self, user: Uuid) -> (ConnId, mpsc::UnboundedReceiver<ServerEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Uuid::new_v4();

        let mut state = self.inner.write().await;
        state.connections.insert(conn, Connection { user, sender: tx });
        state.by_user.entry(user).or_default().insert(conn);
        (conn, rx)
    }

    /// Drop a connection and all its room memberships. If it was the
    /// user's last connection, the user goes offline.
    pub async fn unregister(&self, conn: ConnId) {
        let mut state = self.inner.write().await;
        if let Some(connection) = state.connections.remove(&conn) {
            if let Some(conns) = state.by_user.get_mut(&connection.user) {
                conns.remove(&conn);
                if conns.is_empty() {
                    state.by_user.remove(&connection.user);
                }
            }
        }
        if let Some(rooms) = state.rooms_by_conn.remove(&conn) {
            for room in rooms {
                if let Some(members) = state.rooms.get_mut(&room) {
                    members.remove(&conn);
                    if members.is_empty() {
                        state.rooms.remove(&room);
                    }
                }
            }
        }
    }

    /// Scope a connection into a room's broadcast set. Unknown connections
    /// are ignored.
    pub async fn join_room(&self, conn: ConnId, room: Uuid) {
        let mut state = self.inner.write().await;
        if !state.connections.contains_key(&conn) {
            return;
        }
        state.rooms.entry(room).or_default().insert(conn);
        state.rooms_by_conn.entry(conn).or_default().insert(room);
    }

    pub async fn leave_room(&self, conn: ConnId, room: Uuid) {
        let mut state = self.inner.write().await;
        if let Some(members) = state.rooms.get_mut(&room) {
            members.remove(&conn);
            if members.is_empty() {
                state.rooms.remove(&room);
            }
        }
        if let Some(rooms) = state.rooms_by_conn.get_mut(&conn) {
            rooms.remove(&room);
        }
    }

    /// Deliver to every connection currently joined to the room, except the
    /// optional excluded one. Send errors are ignored. Returns the number
    /// of connections the event was handed to.
    pub async fn broadcast(&self, room: Uuid, event: &ServerEvent, exclude: Option<ConnId>) -> usize {
        let state = self.inner.read().await;
        let Some(members) = state.rooms.get(&room) else {
            return 0;
        };
        let mut delivered = 0;
        for conn in members {
            if Some(*conn) == exclude {
                continue;
            }
            if let Some(connection) = state.connections.get(conn) {
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    /// Deliver to every connection a user currently holds (all devices).
    pub async fn send_to_user(&self, user: Uuid, event: &ServerEvent) -> usize {
        let state = self.inner.read().await;
        let Some(conns) = state.by_user.get(&user) else {
            return 0;
        };
        let mut delivered = 0;
        for conn in conns {
            if let Some(connection) = state.connections.get(conn) {
                if connection.sender.send(event.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }
        delivered
    }

    pub async fn is_online(&self, user: Uuid) -> bool {
        self.inner.read().await.by_user.contains_key(&user)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
