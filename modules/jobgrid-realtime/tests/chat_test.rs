use std::sync::Arc;

use uuid::Uuid;

use jobgrid_common::{JobGridError, NewUser, ServerEvent};
use jobgrid_graph::GraphMaintainer;
use jobgrid_realtime::{ChatService, ConnectionRegistry};
use jobgrid_store::MemoryStore;

struct Harness {
    store: Arc<MemoryStore>,
    registry: Arc<ConnectionRegistry>,
    chat: ChatService,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let chat = ChatService::new(store.clone(), registry.clone());
    Harness {
        store,
        registry,
        chat,
    }
}

async fn seed_user(store: &Arc<MemoryStore>, name: &str) -> Uuid {
    GraphMaintainer::new(store.clone())
        .create_user(NewUser {
            name: name.to_string(),
            email: format!("{name}@example.com"),
            bio: None,
            avatar: None,
        })
        .await
        .expect("seed user")
        .id
}

#[tokio::test]
async fn room_lookup_is_order_independent() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;

    let first = h.chat.find_or_create_room(&[a, b], None).await.unwrap();
    let second = h.chat.find_or_create_room(&[b, a], None).await.unwrap();
    assert_eq!(first.id, second.id);
}

#[tokio::test]
async fn distinct_member_sets_get_distinct_rooms() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let c = seed_user(&h.store, "carol").await;

    let pair = h.chat.find_or_create_room(&[a, b], None).await.unwrap();
    let trio = h.chat.find_or_create_room(&[a, b, c], None).await.unwrap();
    assert_ne!(pair.id, trio.id);

    // The pair room is found again, not shadowed by the trio.
    let again = h.chat.find_or_create_room(&[a, b], None).await.unwrap();
    assert_eq!(pair.id, again.id);
}

#[tokio::test]
async fn room_needs_two_distinct_members() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;

    let err = h.chat.find_or_create_room(&[a, a], None).await.unwrap_err();
    assert!(matches!(err, JobGridError::Invalid(_)));
}

#[tokio::test]
async fn room_members_must_exist() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;

    let err = h
        .chat
        .find_or_create_room(&[a, Uuid::new_v4()], None)
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::NotFound(_)));
}

#[tokio::test]
async fn non_member_cannot_post() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let outsider = seed_user(&h.store, "mallory").await;
    let room = h.chat.find_or_create_room(&[a, b], None).await.unwrap();

    let err = h
        .chat
        .post_message(room.id, outsider, "hi".to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Forbidden(_)));
    assert!(h.chat.history(room.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn history_replays_exact_insertion_order() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let room = h.chat.find_or_create_room(&[a, b], None).await.unwrap();

    let mut sent = Vec::new();
    for i in 0..10 {
        let sender = if i % 2 == 0 { a } else { b };
        let message = h
            .chat
            .post_message(room.id, sender, format!("message {i}"), None)
            .await
            .unwrap();
        sent.push(message.id);
    }

    let history = h.chat.history(room.id).await.unwrap();
    let replayed: Vec<Uuid> = history.iter().map(|m| m.id).collect();
    assert_eq!(replayed, sent);
}

#[tokio::test]
async fn history_of_missing_room_is_not_found() {
    let h = harness();
    let err = h.chat.history(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, JobGridError::NotFound(_)));
}

#[tokio::test]
async fn posted_message_is_relayed_to_joined_connections() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let room = h.chat.find_or_create_room(&[a, b], None).await.unwrap();

    let (conn_a, mut rx_a) = h.registry.register(a).await;
    let (conn_b, mut rx_b) = h.registry.register(b).await;
    h.registry.join_room(conn_a, room.id).await;
    h.registry.join_room(conn_b, room.id).await;

    let message = h
        .chat
        .post_message(room.id, a, "hello".to_string(), Some(conn_a))
        .await
        .unwrap();

    // Sender's own connection is excluded; the peer gets the event.
    assert!(rx_a.try_recv().is_err());
    match rx_b.try_recv().unwrap() {
        ServerEvent::MessageNew { message: received } => {
            assert_eq!(received.id, message.id);
            assert_eq!(received.body, "hello");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn delivery_failure_does_not_lose_the_message() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let room = h.chat.find_or_create_room(&[a, b], None).await.unwrap();

    // Nobody is connected at all.
    let message = h
        .chat
        .post_message(room.id, a, "offline delivery".to_string(), None)
        .await
        .unwrap();

    let history = h.chat.history(room.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, message.id);
}

#[tokio::test]
async fn rooms_for_user_lists_memberships() {
    let h = harness();
    let a = seed_user(&h.store, "alice").await;
    let b = seed_user(&h.store, "bob").await;
    let c = seed_user(&h.store, "carol").await;

    let with_b = h.chat.find_or_create_room(&[a, b], None).await.unwrap();
    let with_c = h.chat.find_or_create_room(&[a, c], None).await.unwrap();

    let rooms = h.chat.rooms_for_user(a).await.unwrap();
    let ids: Vec<Uuid> = rooms.iter().map(|r| r.id).collect();
    assert!(ids.contains(&with_b.id));
    assert!(ids.contains(&with_c.id));
    assert_eq!(h.chat.rooms_for_user(b).await.unwrap().len(), 1);
}
