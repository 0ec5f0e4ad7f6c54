use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};

use notes_auth::Principal;
use notes_core::UserId;

use crate::app::errors::ApiError;

/// Principal context for a request (authenticated identity).
///
/// Inserted by the auth middleware and taken by handlers as a typed argument.
/// A handler that asks for it on an unprotected route gets a 401, never a
/// default identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
}

impl PrincipalContext {
    pub fn new(principal: Principal) -> Self {
        Self { principal }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn user_id(&self) -> UserId {
        self.principal.user_id()
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.principal.expires_at()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for PrincipalContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PrincipalContext>()
            .copied()
            .ok_or(ApiError::unauthenticated())
    }
}
