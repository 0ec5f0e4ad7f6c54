//! Service wiring plus the registration, login and note flows.

use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use notes_auth::{
    Authenticator, Hs256TokenAuthority, InMemorySessionStore, IssuedCredential, SessionAuthority,
    SessionCookie, authorize_owner, hash_password, owned_or_not_found, verify_password_or_decoy,
};
use notes_core::{NewUser, Note, NoteDraft, NoteId, User, require_non_empty};
use notes_infra::{
    InMemoryNoteStore, InMemoryUserStore, NoteStore, PostgresNoteStore, PostgresUserStore,
    StoreError, UserStore, db,
};

use crate::app::dto::{LoginRequest, NoteRequest, RegisterRequest};
use crate::app::errors::ApiError;
use crate::config::{AppConfig, AuthConfig};
use crate::context::PrincipalContext;

/// Everything a handler needs, shared behind one `Arc`.
pub struct AppServices {
    users: Arc<dyn UserStore>,
    notes: Arc<dyn NoteStore>,
    authenticator: Arc<dyn Authenticator>,
    /// Present only under the session strategy.
    session_cookie: Option<SessionCookie>,
}

/// Internal login failure. Both rejection variants surface as the same 401.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoginError {
    #[error("unknown user")]
    UnknownUser,

    #[error("bad password")]
    BadPassword,

    #[error("{0}")]
    Internal(String),
}

impl LoginError {
    fn kind(&self) -> &'static str {
        match self {
            LoginError::UnknownUser => "unknown_user",
            LoginError::BadPassword => "bad_password",
            LoginError::Internal(_) => "internal",
        }
    }
}

impl From<LoginError> for ApiError {
    fn from(err: LoginError) -> Self {
        match err {
            LoginError::Internal(msg) => ApiError::Internal(msg),
            other => {
                tracing::info!(reason = other.kind(), "login rejected");
                ApiError::invalid_credentials()
            }
        }
    }
}

impl AppServices {
    pub fn new(
        users: Arc<dyn UserStore>,
        notes: Arc<dyn NoteStore>,
        authenticator: Arc<dyn Authenticator>,
        session_cookie: Option<SessionCookie>,
    ) -> Self {
        Self {
            users,
            notes,
            authenticator,
            session_cookie,
        }
    }

    pub fn authenticator(&self) -> Arc<dyn Authenticator> {
        Arc::clone(&self.authenticator)
    }

    pub fn session_cookie(&self) -> Option<SessionCookie> {
        self.session_cookie
    }

    // -------------------------
    // Accounts
    // -------------------------

    pub async fn register(&self, req: RegisterRequest) -> Result<User, ApiError> {
        let username = require_non_empty("username", &req.username)?.to_string();
        let email = require_non_empty("email", &req.email)?.to_string();
        if req.password.trim().is_empty() {
            return Err(ApiError::Validation("password must be non-empty".to_string()));
        }

        if self.users.exists(&username, &email).await? {
            return Err(ApiError::Conflict("username or email already registered".to_string()));
        }

        let password = req.password;
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ApiError::Internal(format!("hashing task failed: {e}")))??;

        let user = self
            .users
            .insert(
                NewUser {
                    username,
                    email,
                    password_hash,
                },
                Utc::now(),
            )
            .await?;

        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    pub async fn login(&self, req: LoginRequest) -> Result<IssuedCredential, ApiError> {
        let user = self.check_credentials(&req.username, req.password).await?;

        let credential = self.authenticator.issue(user.id, Utc::now())?;
        tracing::info!(user_id = %user.id, "login succeeded");
        Ok(credential)
    }

    /// Resolve a username/password pair to its user, keeping the failure reason.
    ///
    /// Every attempt pays for exactly one Argon2 verification, whether or not
    /// the username exists.
    pub async fn check_credentials(&self, username: &str, password: String) -> Result<User, LoginError> {
        let username = username.trim();
        let user = if username.is_empty() || password.is_empty() {
            None
        } else {
            self.users
                .find_by_username(username)
                .await
                .map_err(|e| LoginError::Internal(e.to_string()))?
        };

        let stored_hash = user.as_ref().map(|u| u.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || {
            verify_password_or_decoy(&password, stored_hash.as_deref())
        })
        .await
        .map_err(|e| LoginError::Internal(format!("verification task failed: {e}")))?
        .map_err(|e| LoginError::Internal(e.to_string()))?;

        match user {
            None => Err(LoginError::UnknownUser),
            Some(_) if !matches => Err(LoginError::BadPassword),
            Some(user) => Ok(user),
        }
    }

    /// Forget the server-side state behind `artifact`, if the strategy keeps any.
    pub fn logout(&self, artifact: Option<&str>) {
        if let Some(artifact) = artifact {
            self.authenticator.revoke(artifact);
        }
    }

    // -------------------------
    // Notes
    // -------------------------

    pub async fn list_notes(&self, ctx: &PrincipalContext) -> Result<Vec<Note>, ApiError> {
        Ok(self.notes.list_by_owner(ctx.user_id()).await?)
    }

    pub async fn create_note(&self, ctx: &PrincipalContext, req: NoteRequest) -> Result<Note, ApiError> {
        let draft = NoteDraft::new(&req.title, &req.content)?;
        let note = Note::create(ctx.user_id(), draft, Utc::now());
        self.notes.insert(&note).await?;
        tracing::debug!(note_id = %note.id, user_id = %ctx.user_id(), "note created");
        Ok(note)
    }

    pub async fn get_note(&self, ctx: &PrincipalContext, id: &str) -> Result<Note, ApiError> {
        let note = self.load_note(id).await?;
        Ok(owned_or_not_found(ctx.principal(), note)?)
    }

    pub async fn update_note(
        &self,
        ctx: &PrincipalContext,
        id: &str,
        req: NoteRequest,
    ) -> Result<Note, ApiError> {
        let draft = NoteDraft::new(&req.title, &req.content)?;
        let mut note = self.load_note(id).await?.ok_or(ApiError::NotFound)?;
        authorize_owner(ctx.principal(), &note)?;

        note.revise(draft, Utc::now());
        if !self.notes.update(&note).await? {
            return Err(ApiError::NotFound);
        }
        Ok(note)
    }

    pub async fn delete_note(&self, ctx: &PrincipalContext, id: &str) -> Result<(), ApiError> {
        let note = self.load_note(id).await?.ok_or(ApiError::NotFound)?;
        authorize_owner(ctx.principal(), &note)?;

        if !self.notes.delete(note.id, ctx.user_id()).await? {
            return Err(ApiError::NotFound);
        }
        tracing::debug!(note_id = %note.id, user_id = %ctx.user_id(), "note deleted");
        Ok(())
    }

    /// Unowned lookup; callers must guard the result.
    async fn load_note(&self, id: &str) -> Result<Option<Note>, ApiError> {
        let id: NoteId = id.parse()?;
        Ok(self.notes.get(id).await?)
    }
}

/// Build stores and the configured authenticator.
///
/// With a database URL the PostgreSQL stores are used and the schema is
/// created if missing; otherwise everything lives in process memory.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    let (users, notes): (Arc<dyn UserStore>, Arc<dyn NoteStore>) = match &config.database_url {
        Some(url) => {
            let pool = db::connect(url).await?;
            db::ensure_schema(&pool).await?;
            tracing::info!("using postgres stores");
            (
                Arc::new(PostgresUserStore::new(pool.clone())),
                Arc::new(PostgresNoteStore::new(pool)),
            )
        }
        None => {
            tracing::warn!("no database configured; using in-memory stores");
            (Arc::new(InMemoryUserStore::new()), Arc::new(InMemoryNoteStore::new()))
        }
    };

    let (authenticator, session_cookie) = build_authenticator(&config.auth);
    Ok(AppServices::new(users, notes, authenticator, session_cookie))
}

pub fn build_authenticator(auth: &AuthConfig) -> (Arc<dyn Authenticator>, Option<SessionCookie>) {
    match auth {
        AuthConfig::Token { secret, ttl } => {
            tracing::info!(strategy = "token", "authentication configured");
            (Arc::new(Hs256TokenAuthority::new(secret.as_bytes(), *ttl)), None)
        }
        AuthConfig::Session { max_age, secure } => {
            tracing::info!(strategy = "session", "authentication configured");
            let cookie = SessionCookie {
                max_age: *max_age,
                secure: *secure,
            };
            let store = Arc::new(InMemorySessionStore::new());
            (Arc::new(SessionAuthority::new(store, cookie)), Some(cookie))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use notes_auth::Principal;
    use notes_core::UserId;

    fn services() -> AppServices {
        let (authenticator, cookie) = build_authenticator(&AuthConfig::Token {
            secret: "test-secret".to_string(),
            ttl: Duration::hours(24),
        });
        AppServices::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(InMemoryNoteStore::new()),
            authenticator,
            cookie,
        )
    }

    fn register_req(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn ctx_for(user_id: UserId) -> PrincipalContext {
        let now = Utc::now();
        PrincipalContext::new(Principal::new(user_id, now, now + Duration::hours(1)))
    }

    fn note_req(title: &str, content: &str) -> NoteRequest {
        NoteRequest {
            title: title.to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn unknown_user_and_bad_password_stay_distinct_internally() {
        let svc = services();
        svc.register(register_req("alice", "alice@x.com", "pw1")).await.unwrap();

        assert_eq!(
            svc.check_credentials("bob", "pw1".to_string()).await.unwrap_err(),
            LoginError::UnknownUser
        );
        assert_eq!(
            svc.check_credentials("alice", "wrong".to_string()).await.unwrap_err(),
            LoginError::BadPassword
        );
        assert!(svc.check_credentials(" alice ", "pw1".to_string()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_user_costs_as_much_as_a_bad_password() {
        let svc = services();
        svc.register(register_req("alice", "alice@x.com", "pw1")).await.unwrap();

        async fn time(svc: &AppServices, username: &str, password: &str) -> std::time::Duration {
            let start = std::time::Instant::now();
            let _ = svc.check_credentials(username, password.to_string()).await;
            start.elapsed()
        }

        let mut unknown = std::time::Duration::ZERO;
        let mut blank = std::time::Duration::ZERO;
        let mut bad_password = std::time::Duration::ZERO;
        for _ in 0..3 {
            unknown += time(&svc, "nobody", "pw1").await;
            blank += time(&svc, "", "pw1").await;
            bad_password += time(&svc, "alice", "wrong").await;
        }

        // Both sides run one Argon2 verification; only scheduling noise separates them.
        assert!(unknown * 4 >= bad_password, "unknown={unknown:?} bad_password={bad_password:?}");
        assert!(blank * 4 >= bad_password, "blank={blank:?} bad_password={bad_password:?}");
    }

    #[test]
    fn both_login_rejections_map_to_the_same_error() {
        let a = ApiError::from(LoginError::UnknownUser);
        let b = ApiError::from(LoginError::BadPassword);
        assert_eq!(a.status(), b.status());
        assert_eq!(a.to_string(), b.to_string());
    }

    #[tokio::test]
    async fn register_trims_and_rejects_duplicates() {
        let svc = services();
        let user = svc
            .register(register_req("  alice ", " alice@x.com ", "pw1"))
            .await
            .unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.email, "alice@x.com");
        assert_ne!(user.password_hash, "pw1");

        let err = svc
            .register(register_req("alice", "other@x.com", "pw2"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let err = svc.register(register_req("bob", "", "pw")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn foreign_note_is_not_found_for_every_operation() {
        let svc = services();
        let owner = ctx_for(UserId::new());
        let other = ctx_for(UserId::new());

        let note = svc.create_note(&owner, note_req("t", "c")).await.unwrap();
        let id = note.id.to_string();

        assert!(matches!(svc.get_note(&other, &id).await, Err(ApiError::NotFound)));
        assert!(matches!(
            svc.update_note(&other, &id, note_req("x", "y")).await,
            Err(ApiError::NotFound)
        ));
        assert!(matches!(svc.delete_note(&other, &id).await, Err(ApiError::NotFound)));
        assert!(svc.list_notes(&other).await.unwrap().is_empty());

        let unchanged = svc.get_note(&owner, &id).await.unwrap();
        assert_eq!(unchanged.title, "t");
    }

    #[tokio::test]
    async fn owner_can_update_and_delete() {
        let svc = services();
        let owner = ctx_for(UserId::new());
        let note = svc.create_note(&owner, note_req("t", "c")).await.unwrap();
        let id = note.id.to_string();

        let updated = svc.update_note(&owner, &id, note_req("t2", "c2")).await.unwrap();
        assert_eq!(updated.title, "t2");
        assert_eq!(updated.created_at, note.created_at);

        svc.delete_note(&owner, &id).await.unwrap();
        assert!(matches!(svc.get_note(&owner, &id).await, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let svc = services();
        let ctx = ctx_for(UserId::new());
        assert!(matches!(svc.get_note(&ctx, "not-a-uuid").await, Err(ApiError::NotFound)));
    }

    #[tokio::test]
    async fn update_validates_before_lookup() {
        let svc = services();
        let ctx = ctx_for(UserId::new());
        let err = svc
            .update_note(&ctx, "not-a-uuid", note_req("", "c"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }
}
