//! The credential capabilities shared by both authentication strategies.
//!
//! A deployment picks exactly one [`Authenticator`] (bearer token or server-side
//! session) at startup. Request handling only ever sees the trait object, so a
//! single request can never be resolved by both strategies.

use chrono::{DateTime, Utc};
use thiserror::Error;

use notes_core::UserId;

use crate::Principal;

/// Why a credential failed to resolve to a principal.
///
/// All variants mean "unauthenticated" to the caller; they stay distinct so
/// logs can tell forgery apart from staleness.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid token signature")]
    InvalidSignature,

    #[error("credential has expired")]
    Expired,

    #[error("malformed credential")]
    Malformed,

    /// Session handle unknown, expired or evicted.
    #[error("session not found")]
    NotFound,

    /// Signing or storage failed while issuing a credential.
    #[error("credential issuing failed: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable snake_case label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "expired",
            AuthError::Malformed => "malformed",
            AuthError::NotFound => "session_not_found",
            AuthError::Internal(_) => "internal",
        }
    }
}

/// Where the middleware must look for the credential artifact.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CredentialLocation {
    /// `Authorization: Bearer <token>`
    AuthorizationBearer,
    /// A named cookie.
    Cookie(&'static str),
}

/// What login hands back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssuedCredential {
    Bearer {
        token: String,
        expires_at: DateTime<Utc>,
    },
    Session {
        handle: String,
        expires_at: DateTime<Utc>,
    },
}

/// Resolve an inbound credential artifact to a principal.
pub trait CredentialValidator: Send + Sync {
    fn location(&self) -> CredentialLocation;

    fn validate(&self, artifact: &str, now: DateTime<Utc>) -> Result<Principal, AuthError>;
}

/// Mint (and, where the strategy supports it, revoke) credentials.
pub trait CredentialIssuer: Send + Sync {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedCredential, AuthError>;

    /// Forget server-side state for `artifact`. Stateless strategies ignore this.
    fn revoke(&self, _artifact: &str) {}
}

/// One complete authentication strategy.
pub trait Authenticator: CredentialIssuer + CredentialValidator {}

impl<T> Authenticator for T where T: CredentialIssuer + CredentialValidator {}
