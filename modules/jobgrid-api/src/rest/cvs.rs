use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::NewCv;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let cvs = state.reader.cvs().await?;
    Ok(Json(json!({ "cvs": cvs })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let cv = state.reader.cv(id).await?;
    Ok(Json(json!({ "cv": cv })))
}

pub async fn by_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let cvs = state.reader.cvs_by_author(id).await?;
    Ok(Json(json!({ "cvs": cvs })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<NewCv>,
) -> ApiResult<impl IntoResponse> {
    let cv = state.maintainer.create_cv(actor, body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "cv": cv }))))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_cv(id, actor).await?;
    Ok(Json(json!({ "message": "cv deleted" })))
}
