use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{ApplicationStatus, NewApplication};

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let applications = state.reader.applications().await?;
    let views = state.projector.applications(applications).await?;
    Ok(Json(json!({ "applications": views })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let application = state.reader.application(id).await?;
    let view = state.projector.application(application).await?;
    Ok(Json(json!({ "application": view })))
}

pub async fn by_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let applications = state.reader.applications_by_applicant(id).await?;
    let views = state.projector.applications(applications).await?;
    Ok(Json(json!({ "applications": views })))
}

pub async fn by_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let applications = state.reader.applications_by_job(id).await?;
    let views = state.projector.applications(applications).await?;
    Ok(Json(json!({ "applications": views })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<NewApplication>,
) -> ApiResult<impl IntoResponse> {
    let application = state.maintainer.create_application(actor, body).await?;
    let view = state.projector.application(application).await?;
    Ok((StatusCode::CREATED, Json(json!({ "application": view }))))
}

#[derive(Deserialize)]
pub struct DecideBody {
    pub status: ApplicationStatus,
}

pub async fn decide(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(body): Json<DecideBody>,
) -> ApiResult<impl IntoResponse> {
    let application = state
        .maintainer
        .set_application_status(id, actor, body.status)
        .await?;
    Ok(Json(json!({ "application": application })))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_application(id, actor).await?;
    Ok(Json(json!({ "message": "application deleted" })))
}
