use axum::{Json, http::StatusCode};

use crate::app::dto::WhoAmIResponse;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(principal: PrincipalContext) -> Json<WhoAmIResponse> {
    Json(WhoAmIResponse {
        user_id: principal.user_id().to_string(),
        expires_at: principal.expires_at(),
    })
}
