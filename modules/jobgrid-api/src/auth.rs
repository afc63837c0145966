//! Actor resolution. Token issuance and verification live in the auth
//! collaborator in front of this service; by the time a request lands
//! here it carries the authenticated user's ID in `x-actor-id`.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use uuid::Uuid;

use crate::AppState;

const ACTOR_HEADER: &str = "x-actor-id";

/// The authenticated user behind the request. Extract this in every
/// handler that mutates state.
#[derive(Debug, Clone, Copy)]
pub struct Actor(pub Uuid);

impl FromRequestParts<Arc<AppState>> for Actor {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok());

        match header.and_then(|v| Uuid::parse_str(v).ok()) {
            Some(id) => Ok(Actor(id)),
            None => Err((
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": {
                        "kind": "unauthorized",
                        "message": "request is missing an authenticated actor",
                    }
                })),
            )
                .into_response()),
        }
    }
}
