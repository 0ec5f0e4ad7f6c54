//! Storage boundary for the principal store and note persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use notes_core::{NewUser, Note, NoteId, User, UserId};

pub mod in_memory;
pub mod postgres;

pub use in_memory::{InMemoryNoteStore, InMemoryUserStore};
pub use postgres::{PostgresNoteStore, PostgresUserStore};

/// Storage failure.
///
/// `Conflict` is the only variant callers are expected to branch on; the rest
/// are opaque "storage unavailable" conditions.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A unique constraint (username/email) rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// Principal store: resolves usernames to stored credential records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Whether any user already holds `username` or `email`.
    async fn exists(&self, username: &str, email: &str) -> Result<bool, StoreError>;

    /// Persist a new user. Fails with [`StoreError::Conflict`] if the username
    /// or email is taken, even when a concurrent insert won the race after an
    /// `exists` check.
    async fn insert(&self, new_user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError>;
}

/// Note persistence.
///
/// Every mutating operation is scoped by owner id in addition to note id, so
/// a write can never land on another user's row even if a caller skipped the
/// ownership guard.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// All notes owned by `owner`, oldest first.
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Note>, StoreError>;

    async fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError>;

    async fn insert(&self, note: &Note) -> Result<(), StoreError>;

    /// Overwrite title/content/updated_at. Returns `false` if no row with this
    /// id and owner exists.
    async fn update(&self, note: &Note) -> Result<bool, StoreError>;

    /// Returns `false` if no row with this id and owner exists.
    async fn delete(&self, id: NoteId, owner: UserId) -> Result<bool, StoreError>;
}
