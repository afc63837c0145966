use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{JobGridError, NewPost, NotificationKind, Post, PostKind};
use jobgrid_graph::{PostPatch, SetEdge, TagTarget};

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::rest::PageQuery;
use crate::AppState;

#[derive(Deserialize)]
pub struct FeedQuery {
    pub kind: Option<PostKind>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

pub async fn list(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> ApiResult<impl IntoResponse> {
    let pagination = PageQuery {
        page: query.page,
        page_size: query.page_size,
    };
    let posts = state.reader.posts(query.kind).await?;
    let page = pagination.slice(posts);
    let views = state.projector.posts(page).await?;
    Ok(Json(json!({
        "posts": views,
        "meta": { "page": pagination.page(), "page_size": pagination.page_size() },
    })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let post = state.reader.post(id).await?;
    let view = state.projector.post(post).await?;
    Ok(Json(json!({ "post": view })))
}

pub async fn by_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.reader.posts_by_author(id).await?;
    let views = state.projector.posts(posts).await?;
    Ok(Json(json!({ "posts": views })))
}

#[derive(Deserialize)]
pub struct PostSearchQuery {
    pub q: String,
    pub kind: Option<PostKind>,
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PostSearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.reader.search_posts(&query.q, query.kind).await?;
    let views = state.projector.posts(posts).await?;
    Ok(Json(json!({ "posts": views })))
}

#[derive(Deserialize)]
pub struct CreatePostBody {
    #[serde(flatten)]
    pub post: NewPost,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<CreatePostBody>,
) -> ApiResult<impl IntoResponse> {
    let post = state.maintainer.create_post(actor, body.post).await?;
    if !body.tags.is_empty() {
        state
            .maintainer
            .sync_tag_set(TagTarget::Post(post.id), &body.tags)
            .await?;
    }
    let post = state.reader.post(post.id).await?;
    let view = state.projector.post(post).await?;
    Ok((StatusCode::CREATED, Json(json!({ "post": view }))))
}

#[derive(Deserialize)]
pub struct UpdatePostBody {
    #[serde(flatten)]
    pub patch: PostPatch,
    pub tags: Option<Vec<String>>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(body): Json<UpdatePostBody>,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.update_post(id, actor, body.patch).await?;
    if let Some(tags) = body.tags {
        state
            .maintainer
            .sync_tag_set(TagTarget::Post(id), &tags)
            .await?;
    }
    let post = state.reader.post(id).await?;
    let view = state.projector.post(post).await?;
    Ok(Json(json!({ "post": view })))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_post(id, actor).await?;
    Ok(Json(json!({ "message": "post deleted" })))
}

async fn toggle_reaction(
    state: &AppState,
    edge: SetEdge,
    post_id: Uuid,
    actor: Uuid,
    add: bool,
) -> ApiResult<Post> {
    let value = state
        .maintainer
        .toggle_membership(edge, post_id, actor, add)
        .await?;
    let post: Post = serde_json::from_value(value)
        .map_err(|_| JobGridError::aborted("could not decode post"))?;
    Ok(post)
}

pub async fn like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostLike, id, actor, true).await?;
    state
        .notifier
        .emit(NotificationKind::Like, actor, post.author, post.id)
        .await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn unlike(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostLike, id, actor, false).await?;
    state
        .notifier
        .retract(NotificationKind::Like, actor, post.author, post.id)
        .await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn unicorn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostUnicorn, id, actor, true).await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn ununicorn(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostUnicorn, id, actor, false).await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostBookmark, id, actor, true).await?;
    Ok(Json(json!({ "post": post })))
}

pub async fn unbookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let post = toggle_reaction(&state, SetEdge::PostBookmark, id, actor, false).await?;
    Ok(Json(json!({ "post": post })))
}

#[derive(Deserialize)]
pub struct SyncTagsBody {
    pub tags: Vec<String>,
}

pub async fn sync_tags(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(body): Json<SyncTagsBody>,
) -> ApiResult<impl IntoResponse> {
    let post = state.reader.post(id).await?;
    if post.author != actor {
        return Err(JobGridError::forbidden("you are not the author of this post").into());
    }
    state
        .maintainer
        .sync_tag_set(TagTarget::Post(id), &body.tags)
        .await?;
    let post = state.reader.post(id).await?;
    let view = state.projector.post(post).await?;
    Ok(Json(json!({ "post": view })))
}

// --- Comments ---

#[derive(Deserialize)]
pub struct CommentBody {
    pub body: String,
}

pub async fn comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(body): Json<CommentBody>,
) -> ApiResult<impl IntoResponse> {
    let comment = state.maintainer.create_comment(actor, id, body.body).await?;
    let post = state.reader.post(id).await?;
    state
        .notifier
        .emit(NotificationKind::Comment, actor, post.author, post.id)
        .await?;
    let views = state.projector.comments(vec![comment]).await?;
    Ok((StatusCode::CREATED, Json(json!({ "comment": views[0] }))))
}

pub async fn comments(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    // 404 for a missing post, empty list for a quiet one.
    state.reader.post(id).await?;
    let comments = state.reader.comments_by_post(id).await?;
    let views = state.projector.comments(comments).await?;
    Ok(Json(json!({ "comments": views })))
}

pub async fn remove_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_comment(id, actor).await?;
    Ok(Json(json!({ "message": "comment deleted" })))
}
