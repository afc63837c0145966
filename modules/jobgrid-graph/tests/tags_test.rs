mod common;

use common::{graph, new_job, new_post, user};
use jobgrid_common::JobGridError;
use jobgrid_graph::{SetEdge, TagTarget};

#[tokio::test]
async fn sync_converges_to_exactly_the_desired_set() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let post = maintainer
        .create_post(author.id, new_post("Tagged"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["x".to_string(), "y".to_string()])
        .await
        .unwrap();
    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["y".to_string(), "z".to_string()])
        .await
        .unwrap();

    let stored = reader.post(post.id).await.unwrap();
    let y = reader.tag_by_name("y").await.unwrap();
    let z = reader.tag_by_name("z").await.unwrap();
    let x = reader.tag_by_name("x").await.unwrap();

    assert_eq!(stored.tags, vec![y.id, z.id]);
    assert!(!x.posts.contains(&post.id));
    assert!(y.posts.contains(&post.id));
    assert!(z.posts.contains(&post.id));
}

#[tokio::test]
async fn tags_are_reused_case_insensitively() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let first = maintainer
        .create_post(author.id, new_post("One"))
        .await
        .unwrap();
    let second = maintainer
        .create_post(author.id, new_post("Two"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(TagTarget::Post(first.id), &["Rust".to_string()])
        .await
        .unwrap();
    maintainer
        .sync_tag_set(TagTarget::Post(second.id), &["rUsT".to_string()])
        .await
        .unwrap();

    let tags = reader.tags().await.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].name, "rust");
    assert!(tags[0].posts.contains(&first.id));
    assert!(tags[0].posts.contains(&second.id));
}

#[tokio::test]
async fn sync_is_idempotent() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let post = maintainer
        .create_post(author.id, new_post("Same"))
        .await
        .unwrap();

    for _ in 0..2 {
        maintainer
            .sync_tag_set(TagTarget::Post(post.id), &["news".to_string()])
            .await
            .unwrap();
    }

    let tag = reader.tag_by_name("news").await.unwrap();
    assert_eq!(tag.posts, vec![post.id]);
    assert_eq!(reader.post(post.id).await.unwrap().tags, vec![tag.id]);
}

#[tokio::test]
async fn sync_to_empty_clears_all_links() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let post = maintainer
        .create_post(author.id, new_post("Clear"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["a".to_string(), "b".to_string()])
        .await
        .unwrap();
    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &[])
        .await
        .unwrap();

    assert!(reader.post(post.id).await.unwrap().tags.is_empty());
    assert!(reader.tag_by_name("a").await.unwrap().posts.is_empty());
    assert!(reader.tag_by_name("b").await.unwrap().posts.is_empty());
}

#[tokio::test]
async fn job_targets_link_through_the_jobs_side() {
    let (maintainer, reader) = graph();
    let recruiter = user(&maintainer, "rita").await;
    let job = maintainer
        .create_job(recruiter.id, new_job("Backend Engineer"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(TagTarget::Job(job.id), &["remote".to_string()])
        .await
        .unwrap();

    let tag = reader.tag_by_name("remote").await.unwrap();
    assert!(tag.jobs.contains(&job.id));
    assert!(tag.posts.is_empty());
    assert_eq!(reader.job(job.id).await.unwrap().tags, vec![tag.id]);
}

#[tokio::test]
async fn blank_tag_names_are_invalid() {
    let (maintainer, _) = graph();
    let author = user(&maintainer, "alice").await;
    let post = maintainer
        .create_post(author.id, new_post("Blank"))
        .await
        .unwrap();

    let err = maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["  ".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Invalid(_)));
}

#[tokio::test]
async fn duplicate_names_in_one_request_collapse() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let post = maintainer
        .create_post(author.id, new_post("Dupes"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(
            TagTarget::Post(post.id),
            &["rust".to_string(), "Rust".to_string(), "RUST".to_string()],
        )
        .await
        .unwrap();

    assert_eq!(reader.post(post.id).await.unwrap().tags.len(), 1);
}

#[tokio::test]
async fn delete_tag_unlinks_posts_jobs_and_followers() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let follower = user(&maintainer, "bob").await;
    let post = maintainer
        .create_post(author.id, new_post("Tagged"))
        .await
        .unwrap();
    let job = maintainer
        .create_job(author.id, new_job("Role"))
        .await
        .unwrap();

    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["shared".to_string()])
        .await
        .unwrap();
    maintainer
        .sync_tag_set(TagTarget::Job(job.id), &["shared".to_string()])
        .await
        .unwrap();
    let tag = reader.tag_by_name("shared").await.unwrap();
    maintainer
        .toggle_membership(SetEdge::TagFollow, tag.id, follower.id, true)
        .await
        .unwrap();

    maintainer.delete_tag(tag.id).await.unwrap();

    assert!(matches!(
        reader.tag(tag.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(reader.post(post.id).await.unwrap().tags.is_empty());
    assert!(reader.job(job.id).await.unwrap().tags.is_empty());
    assert!(!reader
        .user(follower.id)
        .await
        .unwrap()
        .followed_tags
        .contains(&tag.id));
}

#[tokio::test]
async fn tag_follow_is_mirrored() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let follower = user(&maintainer, "bob").await;
    let post = maintainer
        .create_post(author.id, new_post("Tagged"))
        .await
        .unwrap();
    maintainer
        .sync_tag_set(TagTarget::Post(post.id), &["golang".to_string()])
        .await
        .unwrap();
    let tag = reader.tag_by_name("golang").await.unwrap();

    maintainer
        .toggle_membership(SetEdge::TagFollow, tag.id, follower.id, true)
        .await
        .unwrap();
    assert!(reader.tag(tag.id).await.unwrap().followers.contains(&follower.id));
    assert!(reader
        .user(follower.id)
        .await
        .unwrap()
        .followed_tags
        .contains(&tag.id));

    maintainer
        .toggle_membership(SetEdge::TagFollow, tag.id, follower.id, false)
        .await
        .unwrap();
    assert!(!reader.tag(tag.id).await.unwrap().followers.contains(&follower.id));
    assert!(!reader
        .user(follower.id)
        .await
        .unwrap()
        .followed_tags
        .contains(&tag.id));
}
