use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

#[derive(Deserialize)]
pub struct SendMessageBody {
    pub room_id: Uuid,
    pub body: String,
}

pub async fn create(
    State(state): State<Arc<AppState>>,
    Actor(actor): Actor,
    Json(body): Json<SendMessageBody>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .chat
        .post_message(body.room_id, actor, body.body, None)
        .await?;
    let views = state.projector.messages(vec![message]).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": views[0] }))))
}

pub async fn by_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let messages = state.chat.history(room_id).await?;
    let views = state.projector.messages(messages).await?;
    Ok(Json(json!({ "messages": views })))
}
