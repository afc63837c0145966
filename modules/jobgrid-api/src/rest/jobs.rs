use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{Job, JobGridError, NewJob};
use jobgrid_graph::{JobPatch, SetEdge, TagTarget};

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let jobs = state.reader.jobs().await?;
    let views = state.projector.jobs(jobs).await?;
    Ok(Json(json!({ "jobs": views })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let job = state.reader.job(id).await?;
    let view = state.projector.job(job).await?;
    Ok(Json(json!({ "job": view })))
}

pub async fn by_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let jobs = state.reader.jobs_by_author(id).await?;
    let views = state.projector.jobs(jobs).await?;
    Ok(Json(json!({ "jobs": views })))
}

pub async fn by_company(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let jobs = state.reader.jobs_by_company(id).await?;
    let views = state.projector.jobs(jobs).await?;
    Ok(Json(json!({ "jobs": views })))
}

#[derive(Deserialize)]
pub struct CreateJobBody {
    #[serde(flatten)]
    pub job: NewJob,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<CreateJobBody>,
) -> ApiResult<impl IntoResponse> {
    let job = state.maintainer.create_job(actor, body.job).await?;
    if !body.tags.is_empty() {
        state
            .maintainer
            .sync_tag_set(TagTarget::Job(job.id), &body.tags)
            .await?;
    }
    let job = state.reader.job(job.id).await?;
    let view = state.projector.job(job).await?;
    Ok((StatusCode::CREATED, Json(json!({ "job": view }))))
}

#[derive(Deserialize)]
pub struct UpdateJobBody {
    #[serde(flatten)]
    pub patch: JobPatch,
    pub tags: Option<Vec<String>>,
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(body): Json<UpdateJobBody>,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.update_job(id, actor, body.patch).await?;
    if let Some(tags) = body.tags {
        state
            .maintainer
            .sync_tag_set(TagTarget::Job(id), &tags)
            .await?;
    }
    let job = state.reader.job(id).await?;
    let view = state.projector.job(job).await?;
    Ok(Json(json!({ "job": view })))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_job(id, actor).await?;
    Ok(Json(json!({ "message": "job deleted" })))
}

async fn toggle_bookmark(
    state: &AppState,
    job_id: Uuid,
    actor: Uuid,
    add: bool,
) -> ApiResult<Job> {
    let value = state
        .maintainer
        .toggle_membership(SetEdge::JobBookmark, job_id, actor, add)
        .await?;
    let job: Job = serde_json::from_value(value)
        .map_err(|_| JobGridError::aborted("could not decode job"))?;
    Ok(job)
}

pub async fn bookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let job = toggle_bookmark(&state, id, actor, true).await?;
    Ok(Json(json!({ "job": job })))
}

pub async fn unbookmark(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let job = toggle_bookmark(&state, id, actor, false).await?;
    Ok(Json(json!({ "job": job })))
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
    let job = state.reader.job(id).await?;
    if job.author != actor {
        return Err(JobGridError::forbidden("you are not the author of this job").into());
    }
    state
        .maintainer
        .sync_tag_set(TagTarget::Job(id), &body.tags)
        .await?;
    let job = state.reader.job(id).await?;
    let view = state.projector.job(job).await?;
    Ok(Json(json!({ "job": view })))
}
