use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::{JobGridError, NewCompany};
use jobgrid_graph::{CompanyPatch, SetEdge};

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::rest::SearchQuery;
use crate::AppState;

pub async fn list(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let companies = state.reader.companies().await?;
    Ok(Json(json!({ "companies": companies })))
}

pub async fn detail(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let company = state.reader.company(id).await?;
    let view = state.projector.company(company).await?;
    Ok(Json(json!({ "company": view })))
}

pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<impl IntoResponse> {
    let companies = state.reader.search_companies(&query.q).await?;
    Ok(Json(json!({ "companies": companies })))
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<NewCompany>,
) -> ApiResult<impl IntoResponse> {
    let company = state.maintainer.create_company(actor, body).await?;
    let view = state.projector.company(company).await?;
    Ok((StatusCode::CREATED, Json(json!({ "company": view }))))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
    Json(patch): Json<CompanyPatch>,
) -> ApiResult<impl IntoResponse> {
    let company = state.maintainer.update_company(id, actor, patch).await?;
    Ok(Json(json!({ "company": company })))
}

pub async fn add_member(
    State(state): State<Arc<AppState>>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let company = state.reader.company(company_id).await?;
    if !company.members.contains(&actor) {
        return Err(JobGridError::forbidden("only members may add to a company").into());
    }
    let company = state
        .maintainer
        .toggle_membership(SetEdge::CompanyMember, company_id, user_id, true)
        .await?;
    Ok(Json(json!({ "company": company })))
}

pub async fn remove_member(
    State(state): State<Arc<AppState>>,
    Path((company_id, user_id)): Path<(Uuid, Uuid)>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let company = state.reader.company(company_id).await?;
    // Members may remove anyone; anyone may remove themselves.
    if !company.members.contains(&actor) && actor != user_id {
        return Err(JobGridError::forbidden("only members may change a company").into());
    }
    let company = state
        .maintainer
        .toggle_membership(SetEdge::CompanyMember, company_id, user_id, false)
        .await?;
    Ok(Json(json!({ "company": company })))
}

pub async fn remove(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    state.maintainer.delete_company(id, actor).await?;
    Ok(Json(json!({ "message": "company deleted" })))
}
