use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use notes_auth::{AuthError, Authenticator, CredentialLocation};

use crate::app::errors::ApiError;
use crate::context::PrincipalContext;

#[derive(Clone)]
pub struct AuthState {
    pub authenticator: Arc<dyn Authenticator>,
}

/// Resolve the request credential to a principal or answer 401.
///
/// The handler behind this layer only runs once a `PrincipalContext` is in
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let artifact = match state.authenticator.location() {
        CredentialLocation::AuthorizationBearer => extract_bearer(req.headers()),
        CredentialLocation::Cookie(name) => extract_cookie(req.headers(), name),
    }
    .ok_or_else(|| {
        tracing::debug!(reason = "missing_credential", "authentication rejected");
        ApiError::unauthenticated()
    })?;

    let principal = state
        .authenticator
        .validate(artifact, Utc::now())
        .map_err(|e| {
            match &e {
                AuthError::Internal(detail) => {
                    tracing::warn!(reason = e.kind(), error = %detail, "authentication failed")
                }
                _ => tracing::debug!(reason = e.kind(), "authentication rejected"),
            }
            ApiError::from(e)
        })?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

/// `Authorization: Bearer <token>` (scheme matched case-insensitively); any
/// other scheme counts as absent.
pub(crate) fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Value of the first non-empty cookie called `name` across all `Cookie` headers.
pub(crate) fn extract_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value)
}
