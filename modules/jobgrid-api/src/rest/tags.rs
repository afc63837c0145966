use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_graph::SetEdge;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let tags = state.reader.tags().await?;
    Ok(Json(json!({ "tags": tags })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let tag = state.reader.tag(id).await?;
    let view = state.projector.tag(tag).await?;
    Ok(Json(json!({ "tag": view })))
}

pub async fn by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let tag = state.reader.tag_by_name(&name).await?;
    let view = state.projector.tag(tag).await?;
    Ok(Json(json!({ "tag": view })))
}

#[derive(Deserialize)]
pub struct TagFollowBody {
    pub tag_id: Uuid,
}

pub async fn follow(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<TagFollowBody>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .maintainer
        .toggle_membership(SetEdge::TagFollow, body.tag_id, actor, true)
        .await?;
    let user = state.reader.user(actor).await?;
    Ok(Json(json!({ "tag": tag, "user": user })))
}

pub async fn unfollow(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<TagFollowBody>,
) -> ApiResult<impl IntoResponse> {
    let tag = state
        .maintainer
        .toggle_membership(SetEdge::TagFollow, body.tag_id, actor, false)
        .await?;
    let user = state.reader.user(actor).await?;
    Ok(Json(json!({ "tag": tag, "user": user })))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(_actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_tag(id).await?;
    Ok(Json(json!({ "message": "tag deleted" })))
}
