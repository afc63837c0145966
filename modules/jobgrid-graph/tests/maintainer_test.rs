mod common;

use uuid::Uuid;

use common::{graph, new_job, new_post, user};
use jobgrid_common::{ApplicationStatus, JobGridError, NewApplication, NewCompany, NewCv};
use jobgrid_graph::SetEdge;

#[tokio::test]
async fn create_post_links_owner() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;

    let post = maintainer
        .create_post(author.id, new_post("Hello"))
        .await
        .unwrap();

    let owner = reader.user(author.id).await.unwrap();
    assert!(owner.posts.contains(&post.id));
    assert_eq!(reader.post(post.id).await.unwrap().author, author.id);
}

#[tokio::test]
async fn create_post_for_missing_owner_leaves_no_orphan() {
    let (maintainer, reader) = graph();

    let err = maintainer
        .create_post(Uuid::new_v4(), new_post("Orphan"))
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::NotFound(_)));

    assert!(reader.posts(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn delete_post_by_non_owner_is_forbidden_and_leaves_state() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let stranger = user(&maintainer, "mallory").await;
    let post = maintainer
        .create_post(author.id, new_post("Keep me"))
        .await
        .unwrap();

    let err = maintainer.delete_post(post.id, stranger.id).await.unwrap_err();
    assert!(matches!(err, JobGridError::Forbidden(_)));

    assert!(reader.post(post.id).await.is_ok());
    assert!(reader.user(author.id).await.unwrap().posts.contains(&post.id));
}

#[tokio::test]
async fn delete_post_unlinks_owner_tags_and_comments() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let commenter = user(&maintainer, "bob").await;
    let post = maintainer
        .create_post(author.id, new_post("Tagged"))
        .await
        .unwrap();
    maintainer
        .sync_tag_set(
            jobgrid_graph::TagTarget::Post(post.id),
            &["Job".to_string(), "Remote".to_string()],
        )
        .await
        .unwrap();
    let comment = maintainer
        .create_comment(commenter.id, post.id, "nice".to_string())
        .await
        .unwrap();

    maintainer.delete_post(post.id, author.id).await.unwrap();

    assert!(matches!(
        reader.post(post.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader.user(author.id).await.unwrap().posts.contains(&post.id));
    let job_tag = reader.tag_by_name("job").await.unwrap();
    let remote_tag = reader.tag_by_name("remote").await.unwrap();
    assert!(!job_tag.posts.contains(&post.id));
    assert!(!remote_tag.posts.contains(&post.id));
    assert!(matches!(
        reader.comment(comment.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader
        .user(commenter.id)
        .await
        .unwrap()
        .comments
        .contains(&comment.id));
}

#[tokio::test]
async fn follow_is_symmetric_both_ways() {
    let (maintainer, reader) = graph();
    let a = user(&maintainer, "alice").await;
    let b = user(&maintainer, "bob").await;

    maintainer
        .toggle_membership(SetEdge::Follow, a.id, b.id, true)
        .await
        .unwrap();
    assert!(reader.user(a.id).await.unwrap().following.contains(&b.id));
    assert!(reader.user(b.id).await.unwrap().followers.contains(&a.id));

    maintainer
        .toggle_membership(SetEdge::Follow, a.id, b.id, false)
        .await
        .unwrap();
    assert!(!reader.user(a.id).await.unwrap().following.contains(&b.id));
    assert!(!reader.user(b.id).await.unwrap().followers.contains(&a.id));
}

#[tokio::test]
async fn double_follow_is_idempotent() {
    let (maintainer, reader) = graph();
    let a = user(&maintainer, "alice").await;
    let b = user(&maintainer, "bob").await;

    for _ in 0..2 {
        maintainer
            .toggle_membership(SetEdge::Follow, a.id, b.id, true)
            .await
            .unwrap();
    }
    assert_eq!(reader.user(a.id).await.unwrap().following, vec![b.id]);
    assert_eq!(reader.user(b.id).await.unwrap().followers, vec![a.id]);
}

#[tokio::test]
async fn self_follow_is_invalid() {
    let (maintainer, _) = graph();
    let a = user(&maintainer, "alice").await;

    let err = maintainer
        .toggle_membership(SetEdge::Follow, a.id, a.id, true)
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Invalid(_)));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let (maintainer, _) = graph();
    user(&maintainer, "alice").await;

    let err = maintainer
        .create_user(jobgrid_common::NewUser {
            name: "Alice Again".to_string(),
            email: "alice@example.com".to_string(),
            bio: None,
            avatar: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Conflict(_)));
}

#[tokio::test]
async fn company_membership_is_mirrored_and_exclusive() {
    let (maintainer, reader) = graph();
    let founder = user(&maintainer, "alice").await;
    let joiner = user(&maintainer, "bob").await;

    let company = maintainer
        .create_company(
            founder.id,
            NewCompany {
                name: "Acme".to_string(),
                description: None,
                founded_year: None,
                scale: None,
                address: None,
                contact: None,
                avatar: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        reader.user(founder.id).await.unwrap().company,
        Some(company.id)
    );

    // Founder already belongs to a company.
    let err = maintainer
        .create_company(
            founder.id,
            NewCompany {
                name: "Second".to_string(),
                description: None,
                founded_year: None,
                scale: None,
                address: None,
                contact: None,
                avatar: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Conflict(_)));

    maintainer
        .toggle_membership(SetEdge::CompanyMember, company.id, joiner.id, true)
        .await
        .unwrap();
    assert!(reader
        .company(company.id)
        .await
        .unwrap()
        .members
        .contains(&joiner.id));
    assert_eq!(reader.user(joiner.id).await.unwrap().company, Some(company.id));

    maintainer
        .toggle_membership(SetEdge::CompanyMember, company.id, joiner.id, false)
        .await
        .unwrap();
    assert!(!reader
        .company(company.id)
        .await
        .unwrap()
        .members
        .contains(&joiner.id));
    assert_eq!(reader.user(joiner.id).await.unwrap().company, None);
}

#[tokio::test]
async fn delete_company_clears_every_member() {
    let (maintainer, reader) = graph();
    let founder = user(&maintainer, "alice").await;
    let member = user(&maintainer, "bob").await;
    let company = maintainer
        .create_company(
            founder.id,
            NewCompany {
                name: "Acme".to_string(),
                description: None,
                founded_year: None,
                scale: None,
                address: None,
                contact: None,
                avatar: None,
            },
        )
        .await
        .unwrap();
    maintainer
        .toggle_membership(SetEdge::CompanyMember, company.id, member.id, true)
        .await
        .unwrap();

    maintainer.delete_company(company.id, founder.id).await.unwrap();

    assert!(matches!(
        reader.company(company.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert_eq!(reader.user(founder.id).await.unwrap().company, None);
    assert_eq!(reader.user(member.id).await.unwrap().company, None);
}

#[tokio::test]
async fn application_lifecycle_and_status_transitions() {
    let (maintainer, reader) = graph();
    let recruiter = user(&maintainer, "rita").await;
    let applicant = user(&maintainer, "bob").await;
    let job = maintainer
        .create_job(recruiter.id, new_job("Backend Engineer"))
        .await
        .unwrap();
    let cv = maintainer
        .create_cv(
            applicant.id,
            NewCv {
                name: "Bob CV".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();

    let application = maintainer
        .create_application(
            applicant.id,
            NewApplication {
                job: job.id,
                cv: cv.id,
                body: Some("hire me".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(application.status, ApplicationStatus::Pending);
    assert!(reader
        .user(applicant.id)
        .await
        .unwrap()
        .applications
        .contains(&application.id));

    // Only the job author decides.
    let err = maintainer
        .set_application_status(application.id, applicant.id, ApplicationStatus::Approved)
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Forbidden(_)));

    let approved = maintainer
        .set_application_status(application.id, recruiter.id, ApplicationStatus::Approved)
        .await
        .unwrap();
    assert_eq!(approved.status, ApplicationStatus::Approved);

    // Re-asserting is a no-op; reversing a decision conflicts.
    maintainer
        .set_application_status(application.id, recruiter.id, ApplicationStatus::Approved)
        .await
        .unwrap();
    let err = maintainer
        .set_application_status(application.id, recruiter.id, ApplicationStatus::Rejected)
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Conflict(_)));
}

#[tokio::test]
async fn application_requires_applicants_own_cv() {
    let (maintainer, _) = graph();
    let recruiter = user(&maintainer, "rita").await;
    let applicant = user(&maintainer, "bob").await;
    let other = user(&maintainer, "carol").await;
    let job = maintainer
        .create_job(recruiter.id, new_job("Backend Engineer"))
        .await
        .unwrap();
    let foreign_cv = maintainer
        .create_cv(
            other.id,
            NewCv {
                name: "Carol CV".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();

    let err = maintainer
        .create_application(
            applicant.id,
            NewApplication {
                job: job.id,
                cv: foreign_cv.id,
                body: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, JobGridError::Forbidden(_)));
}

#[tokio::test]
async fn cv_delete_blocked_while_cited() {
    let (maintainer, reader) = graph();
    let recruiter = user(&maintainer, "rita").await;
    let applicant = user(&maintainer, "bob").await;
    let job = maintainer
        .create_job(recruiter.id, new_job("Backend Engineer"))
        .await
        .unwrap();
    let cv = maintainer
        .create_cv(
            applicant.id,
            NewCv {
                name: "Bob CV".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
    let application = maintainer
        .create_application(
            applicant.id,
            NewApplication {
                job: job.id,
                cv: cv.id,
                body: None,
            },
        )
        .await
        .unwrap();

    let err = maintainer.delete_cv(cv.id, applicant.id).await.unwrap_err();
    assert!(matches!(err, JobGridError::Conflict(_)));
    assert!(reader.cv(cv.id).await.is_ok());

    maintainer
        .delete_application(application.id, applicant.id)
        .await
        .unwrap();
    maintainer.delete_cv(cv.id, applicant.id).await.unwrap();
    assert!(matches!(
        reader.cv(cv.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader.user(applicant.id).await.unwrap().cvs.contains(&cv.id));
}

#[tokio::test]
async fn delete_job_withdraws_citing_applications() {
    let (maintainer, reader) = graph();
    let recruiter = user(&maintainer, "rita").await;
    let applicant = user(&maintainer, "bob").await;
    let job = maintainer
        .create_job(recruiter.id, new_job("Backend Engineer"))
        .await
        .unwrap();
    let cv = maintainer
        .create_cv(
            applicant.id,
            NewCv {
                name: "Bob CV".to_string(),
                image: None,
            },
        )
        .await
        .unwrap();
    let application = maintainer
        .create_application(
            applicant.id,
            NewApplication {
                job: job.id,
                cv: cv.id,
                body: None,
            },
        )
        .await
        .unwrap();

    maintainer.delete_job(job.id, recruiter.id).await.unwrap();

    assert!(matches!(
        reader.job(job.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader.user(recruiter.id).await.unwrap().jobs.contains(&job.id));
    assert!(matches!(
        reader.application(application.id).await.unwrap_err(),
        JobGridError::NotFound(_)
    ));
    assert!(!reader
        .user(applicant.id)
        .await
        .unwrap()
        .applications
        .contains(&application.id));
}

#[tokio::test]
async fn comment_links_author_and_post_both_ways() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let commenter = user(&maintainer, "bob").await;
    let post = maintainer
        .create_post(author.id, new_post("Discuss"))
        .await
        .unwrap();

    let comment = maintainer
        .create_comment(commenter.id, post.id, "first!".to_string())
        .await
        .unwrap();
    assert!(reader.post(post.id).await.unwrap().comments.contains(&comment.id));
    assert!(reader
        .user(commenter.id)
        .await
        .unwrap()
        .comments
        .contains(&comment.id));

    maintainer.delete_comment(comment.id, commenter.id).await.unwrap();
    assert!(!reader.post(post.id).await.unwrap().comments.contains(&comment.id));
    assert!(!reader
        .user(commenter.id)
        .await
        .unwrap()
        .comments
        .contains(&comment.id));
}

#[tokio::test]
async fn post_reactions_touch_one_side_only() {
    let (maintainer, reader) = graph();
    let author = user(&maintainer, "alice").await;
    let fan = user(&maintainer, "bob").await;
    let post = maintainer
        .create_post(author.id, new_post("React"))
        .await
        .unwrap();

    maintainer
        .toggle_membership(SetEdge::PostLike, post.id, fan.id, true)
        .await
        .unwrap();
    maintainer
        .toggle_membership(SetEdge::PostBookmark, post.id, fan.id, true)
        .await
        .unwrap();

    let stored = reader.post(post.id).await.unwrap();
    assert!(stored.likes.contains(&fan.id));
    assert!(stored.bookmarks.contains(&fan.id));

    let bookmarked = reader.posts_bookmarked_by(fan.id).await.unwrap();
    assert_eq!(bookmarked.len(), 1);

    maintainer
        .toggle_membership(SetEdge::PostLike, post.id, fan.id, false)
        .await
        .unwrap();
    assert!(!reader.post(post.id).await.unwrap().likes.contains(&fan.id));
}
