use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{JobGridError, NewUser, NotificationKind};
use jobgrid_graph::ProfilePatch;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state.maintainer.create_user(body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let users = state.reader.users().await?;
    Ok(Json(json!({ "users": users })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let user = state.reader.user(id).await?;
    let view = state.projector.user(user).await?;
    Ok(Json(json!({ "user": view })))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(patch): Json<ProfilePatch>,
) -> ApiResult<impl IntoResponse> {
    let user = state.maintainer.update_profile(id, actor, patch).await?;
    Ok(Json(json!({ "user": user })))
}

pub async fn register_recruiter(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let user = state.maintainer.register_recruiter(id, actor).await?;
    Ok(Json(json!({ "user": user })))
}

#[derive(Deserialize)]
pub struct FollowBody {
    pub follow_id: Uuid,
}

pub async fn follow(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<FollowBody>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .maintainer
        .follow_user(actor, body.follow_id, true)
        .await?;
    state
        .notifier
        .emit(NotificationKind::Follow, actor, body.follow_id, actor)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<FollowBody>,
) -> ApiResult<impl IntoResponse> {
    let user = state
        .maintainer
        .follow_user(actor, body.follow_id, false)
        .await?;
    state
        .notifier
        .retract(NotificationKind::Follow, actor, body.follow_id, actor)
        .await?;
    Ok(Json(json!({ "user": user })))
}

pub async fn notifications(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    if id != actor {
        return Err(JobGridError::forbidden("notifications are private").into());
    }
    let notifications = state.reader.notifications_for(id).await?;
    Ok(Json(json!({ "notifications": notifications })))
}

pub async fn bookmarks(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let posts = state.reader.posts_bookmarked_by(id).await?;
    let views = state.projector.posts(posts).await?;
    Ok(Json(json!({ "posts": views })))
}
