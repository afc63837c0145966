//! End-to-end flow across the maintainer, fan-out engine, and registry:
//! publish → tag → like → notify → delete, with every back-reference
//! cleaned up along the way.

use std::sync::Arc;

use jobgrid_common::{
    JobGridError, NewPost, NewUser, NotificationKind, PostKind, ServerEvent,
};
use jobgrid_graph::{GraphMaintainer, GraphReader, SetEdge, TagTarget};
use jobgrid_realtime::{ConnectionRegistry, Notifier};
use jobgrid_store::MemoryStore;

#[tokio::test]
async fn publish_tag_like_notify_delete_flow() {
    let store = Arc::new(MemoryStore::new());
    let registry = Arc::new(ConnectionRegistry::new());
    let maintainer = GraphMaintainer::new(store.clone());
    let reader = GraphReader::new(store.clone());
    let notifier = Notifier::new(store.clone(), registry.clone());

    let author = maintainer
        .create_user(NewUser {
            name: "u1".to_string(),
            email: "u1@example.com".to_string(),
            bio: None,
            avatar: None,
        })
        .await
        .unwrap();
    let fan = maintainer
        .create_user(NewUser {
            name: "u2".to_string(),
            email: "u2@example.com".to_string(),
            bio: None,
            avatar: None,
        })
        .await
        .unwrap();

    // U1 publishes a post with no tags, then reconciles the tag set.
    let post = maintainer
        .create_post(
            author.id,
            NewPost {
                title: "Hiring".to_string(),
                slug: "hiring".to_string(),
                body: "come work with us".to_string(),
                image: None,
                kind: PostKind::Post,
            },
        )
        .await
        .unwrap();
    maintainer
        .sync_tag_set(
            TagTarget::Post(post.id),
            &["Job".to_string(), "Remote".to_string()],
        )
        .await
        .unwrap();

    let job_tag = reader.tag_by_name("job").await.unwrap();
    let remote_tag = reader.tag_by_name("remote").await.unwrap();
    assert_eq!(
        reader.post(post.id).await.unwrap().tags,
        vec![job_tag.id, remote_tag.id]
    );
    assert!(job_tag.posts.contains(&post.id));
    assert!(remote_tag.posts.contains(&post.id));

    // U1 is connected; U2 likes the post.
    let (_conn, mut rx) = registry.register(author.id).await;
    maintainer
        .toggle_membership(SetEdge::PostLike, post.id, fan.id, true)
        .await
        .unwrap();
    let notification = notifier
        .emit(NotificationKind::Like, fan.id, author.id, post.id)
        .await
        .unwrap()
        .expect("cross-user like notifies");
    assert_eq!(notification.actor, fan.id);
    assert_eq!(notification.recipient, author.id);

    match rx.try_recv().unwrap() {
        ServerEvent::NotificationNew {
            notification: received,
        } => assert_eq!(received.id, notification.id),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(reader.notifications_for(author.id).await.unwrap().len(), 1);

    // U1 deletes the post; the graph is clean afterwards.
    maintainer.delete_post(post.id, author.id).await.unwrap();

    assert!(matches!(
        reader.post(post.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader.user(author.id).await.unwrap().posts.contains(&post.id));
    assert!(!reader.tag_by_name("job").await.unwrap().posts.contains(&post.id));
    assert!(!reader
        .tag_by_name("remote")
        .await
        .unwrap()
        .posts
        .contains(&post.id));
}
