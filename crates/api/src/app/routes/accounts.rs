use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use notes_auth::{CredentialLocation, IssuedCredential};

use crate::app::dto::{LoginRequest, LoginResponse, RegisterRequest, UserCreatedResponse};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::middleware::extract_cookie;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout).post(logout))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(body) = body?;
    let user = services.register(body).await?;

    Ok((
        StatusCode::CREATED,
        Json(UserCreatedResponse {
            message: "User created successfully",
            id: user.id,
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    // An unreadable body is treated like any other bad login.
    let body = body.map_err(|_| ApiError::invalid_credentials())?.0;

    match services.login(body).await? {
        IssuedCredential::Bearer { token, .. } => Ok(Json(LoginResponse {
            message: "Login successful",
            token: Some(token),
        })
        .into_response()),
        IssuedCredential::Session { handle, .. } => {
            let cookie = services
                .session_cookie()
                .ok_or_else(|| ApiError::Internal("session issued without cookie settings".to_string()))?;
            Ok((
                [(header::SET_COOKIE, cookie.set_header(&handle))],
                Json(LoginResponse {
                    message: "Login successful",
                    token: None,
                }),
            )
                .into_response())
        }
    }
}

/// Always succeeds. Under the session strategy the server-side record is
/// dropped and the cookie expired.
pub async fn logout(Extension(services): Extension<Arc<AppServices>>, headers: HeaderMap) -> Response {
    let Some(cookie) = services.session_cookie() else {
        return (StatusCode::OK, "Logged out").into_response();
    };

    if let CredentialLocation::Cookie(name) = services.authenticator().location() {
        services.logout(extract_cookie(&headers, name));
    }

    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.clear_header())],
        "Logged out",
    )
        .into_response()
}
