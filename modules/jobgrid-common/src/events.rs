use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{Message, Notification};

/// Events pushed server → client over the realtime socket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    #[serde(rename = "notification:new")]
    NotificationNew { notification: Notification },

    #[serde(rename = "message:new")]
    MessageNew { message: Message },
}

/// Events received client → server over the realtime socket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientEvent {
    #[serde(rename = "room:join")]
    RoomJoin { room_id: Uuid },

    #[serde(rename = "room:leave")]
    RoomLeave { room_id: Uuid },

    #[serde(rename = "message:send")]
    MessageSend { room_id: Uuid, body: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_event_wire_format() {
        let json = r#"{"event":"room:join","data":{"room_id":"6f2c0fbb-6c80-4b4e-9eb2-9ec0025e2e1c"}}"#;
        let event: ClientEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, ClientEvent::RoomJoin { .. }));
    }

    #[test]
    fn server_event_carries_event_name() {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: crate::types::NotificationKind::Like,
            actor: Uuid::new_v4(),
            recipient: Uuid::new_v4(),
            subject: Uuid::new_v4(),
            read: false,
            created_at: chrono::Utc::now(),
        };
        let json =
            serde_json::to_value(ServerEvent::NotificationNew { notification }).unwrap();
        assert_eq!(json["event"], "notification:new");
    }
}
