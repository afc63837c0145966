use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::JobGridError;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Deserialize)]
pub struct CreateRoomBody {
    pub members: Vec<Uuid>,
    #[serde(default)]
    pub name: Option<String>,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<CreateRoomBody>,
) -> ApiResult<impl IntoResponse> {
    if !body.members.contains(&actor) {
        return Err(JobGridError::forbidden("you must be a member of the room you open").into());
    }
    let room = state
        .chat
        .find_or_create_room(&body.members, body.name)
        .await?;
    let view = state.projector.room(room).await?;
    Ok((StatusCode::CREATED, Json(json!({ "room": view }))))
}

pub async fn by_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let rooms = state.chat.rooms_for_user(user_id).await?;
    let views = state.projector.rooms(rooms).await?;
    Ok(Json(json!({ "rooms": views })))
}
