use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json},
};
use serde_json::json;
use uuid::Uuid;

use jobgrid_common::JobGridError;

use crate::auth::Actor;
use crate::error::ApiResult;
use crate::AppState;

pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Actor(actor): Actor,
) -> ApiResult<impl IntoResponse> {
    let notification = state.reader.notification(id).await?;
    if notification.recipient != actor {
        return Err(JobGridError::forbidden("not your notification").into());
    }
    let notification = state.notifier.mark_read(id).await?;
    Ok(Json(json!({ "notification": notification })))
}
