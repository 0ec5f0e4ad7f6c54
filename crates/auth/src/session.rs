//! Stateful sessions: opaque random handles mapped to server-side records.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, Duration, Utc};
use rand::{RngCore, rngs::OsRng};

use notes_core::UserId;

use crate::{
    AuthError, CredentialIssuer, CredentialLocation, CredentialValidator, IssuedCredential,
    Principal,
};

/// Name of the cookie carrying the session handle.
pub const SESSION_COOKIE_NAME: &str = "auth-session";

/// Bytes of OS randomness per handle (hex-encoded on the wire).
const HANDLE_BYTES: usize = 32;

/// Server-side state behind a session handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Session-store collaborator.
///
/// Implementations must make each individual `get`/`set`/`delete` atomic; the
/// auth core takes no locks of its own.
pub trait SessionStore: Send + Sync {
    fn get(&self, handle: &str) -> Option<SessionRecord>;
    fn set(&self, handle: String, record: SessionRecord);
    fn delete(&self, handle: &str);

    /// Drop every record that has expired at `now`.
    fn purge_expired(&self, now: DateTime<Utc>);
}

impl<S> SessionStore for Arc<S>
where
    S: SessionStore + ?Sized,
{
    fn get(&self, handle: &str) -> Option<SessionRecord> {
        (**self).get(handle)
    }

    fn set(&self, handle: String, record: SessionRecord) {
        (**self).set(handle, record)
    }

    fn delete(&self, handle: &str) {
        (**self).delete(handle)
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        (**self).purge_expired(now)
    }
}

/// In-memory session store for single-process deployments and tests.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    inner: RwLock<HashMap<String, SessionRecord>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for InMemorySessionStore {
    // Every write is a single map operation, so a poisoned lock is recovered.

    fn get(&self, handle: &str) -> Option<SessionRecord> {
        let map = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        map.get(handle).copied()
    }

    fn set(&self, handle: String, record: SessionRecord) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.insert(handle, record);
    }

    fn delete(&self, handle: &str) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        map.remove(handle);
    }

    fn purge_expired(&self, now: DateTime<Utc>) {
        let mut map = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let before = map.len();
        map.retain(|_, record| now < record.expires_at);
        let purged = before - map.len();
        if purged > 0 {
            tracing::debug!(purged, "expired sessions purged");
        }
    }
}

/// Cookie attributes for the session handle.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SessionCookie {
    pub max_age: Duration,
    pub secure: bool,
}

impl SessionCookie {
    /// `Set-Cookie` value delivering `handle`.
    ///
    /// Always `HttpOnly`, `Path=/` and `SameSite=Lax`.
    pub fn set_header(&self, handle: &str) -> String {
        self.render(handle, self.max_age.num_seconds())
    }

    /// `Set-Cookie` value that makes the browser drop the cookie.
    pub fn clear_header(&self) -> String {
        self.render("", 0)
    }

    fn render(&self, value: &str, max_age_secs: i64) -> String {
        let mut header = format!(
            "{SESSION_COOKIE_NAME}={value}; Path=/; Max-Age={max_age_secs}; HttpOnly; SameSite=Lax"
        );
        if self.secure {
            header.push_str("; Secure");
        }
        header
    }
}

/// Issues and validates session handles against a [`SessionStore`].
pub struct SessionAuthority<S> {
    store: S,
    cookie: SessionCookie,
}

impl<S: SessionStore> SessionAuthority<S> {
    pub fn new(store: S, cookie: SessionCookie) -> Self {
        Self { store, cookie }
    }

    fn new_handle() -> String {
        let mut bytes = [0u8; HANDLE_BYTES];
        OsRng.fill_bytes(&mut bytes);
        hex::encode(bytes)
    }
}

impl<S: SessionStore> CredentialValidator for SessionAuthority<S> {
    fn location(&self) -> CredentialLocation {
        CredentialLocation::Cookie(SESSION_COOKIE_NAME)
    }

    fn validate(&self, artifact: &str, now: DateTime<Utc>) -> Result<Principal, AuthError> {
        let record = self.store.get(artifact).ok_or(AuthError::NotFound)?;
        if now >= record.expires_at {
            self.store.delete(artifact);
            return Err(AuthError::NotFound);
        }
        Ok(Principal::new(record.user_id, record.issued_at, record.expires_at))
    }
}

impl<S: SessionStore> CredentialIssuer for SessionAuthority<S> {
    fn issue(&self, user_id: UserId, now: DateTime<Utc>) -> Result<IssuedCredential, AuthError> {
        self.store.purge_expired(now);

        let handle = Self::new_handle();
        let expires_at = now + self.cookie.max_age;
        self.store.set(
            handle.clone(),
            SessionRecord {
                user_id,
                issued_at: now,
                expires_at,
            },
        );
        tracing::debug!(user_id = %user_id, "session issued");
        Ok(IssuedCredential::Session { handle, expires_at })
    }

    fn revoke(&self, artifact: &str) {
        self.store.delete(artifact);
    }
}
