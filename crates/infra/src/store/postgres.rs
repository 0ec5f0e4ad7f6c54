//! Postgres-backed stores.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `Conflict` |
//! | Database (other) | Any other | `Storage` |
//! | PoolClosed / Io / other | N/A | `Storage` |
//!
//! ## Owner Scoping
//!
//! Every note query that reads a list or mutates a row includes `user_id` in
//! its `WHERE` clause.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::instrument;
use uuid::Uuid;

use notes_core::{NewUser, Note, NoteId, User, UserId};

use super::{NoteStore, StoreError, UserStore};

#[derive(Debug, Clone)]
pub struct PostgresUserStore {
    pool: Arc<PgPool>,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserStore for PostgresUserStore {
    #[instrument(skip(self), err)]
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, username, email, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_by_username", e))?;

        row.map(|r| user_from_row(&r)).transpose()
    }

    #[instrument(skip(self), err)]
    async fn exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT EXISTS(SELECT 1 FROM users WHERE username = $1 OR email = $2) AS taken
            "#,
        )
        .bind(username)
        .bind(email)
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("exists", e))?;

        row.try_get::<bool, _>("taken")
            .map_err(|e| StoreError::Storage(format!("failed to read exists flag: {e}")))
    }

    #[instrument(skip(self, new_user), fields(username = %new_user.username), err)]
    async fn insert(&self, new_user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError> {
        let user = new_user.into_user(created_at);

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(user.id.as_uuid())
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;

        Ok(user)
    }
}

#[derive(Debug, Clone)]
pub struct PostgresNoteStore {
    pool: Arc<PgPool>,
}

impl PostgresNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl NoteStore for PostgresNoteStore {
    #[instrument(skip(self), fields(owner = %owner), err)]
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Note>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(owner.as_uuid())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_notes", e))?;

        rows.iter().map(note_from_row).collect()
    }

    #[instrument(skip(self), fields(note_id = %id), err)]
    async fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, title, content, created_at, updated_at
            FROM notes
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_note", e))?;

        row.map(|r| note_from_row(&r)).transpose()
    }

    #[instrument(skip(self, note), fields(note_id = %note.id), err)]
    async fn insert(&self, note: &Note) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notes (id, user_id, title, content, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(note.id.as_uuid())
        .bind(note.owner_id.as_uuid())
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.created_at)
        .bind(note.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_note", e))?;

        Ok(())
    }

    #[instrument(skip(self, note), fields(note_id = %note.id), err)]
    async fn update(&self, note: &Note) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE notes
            SET title = $3, content = $4, updated_at = $5
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(note.id.as_uuid())
        .bind(note.owner_id.as_uuid())
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_note", e))?;

        Ok(result.rows_affected() == 1)
    }

    #[instrument(skip(self), fields(note_id = %id), err)]
    async fn delete(&self, id: NoteId, owner: UserId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_note", e))?;

        Ok(result.rows_affected() == 1)
    }
}

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("failed to decode user row: {e}"));
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        username: row.try_get("username").map_err(read)?,
        email: row.try_get("email").map_err(read)?,
        password_hash: row.try_get("password_hash").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
    })
}

fn note_from_row(row: &PgRow) -> Result<Note, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("failed to decode note row: {e}"));
    Ok(Note {
        id: NoteId::from_uuid(row.try_get::<Uuid, _>("id").map_err(read)?),
        owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").map_err(read)?),
        title: row.try_get("title").map_err(read)?,
        content: row.try_get("content").map_err(read)?,
        created_at: row.try_get("created_at").map_err(read)?,
        updated_at: row.try_get("updated_at").map_err(read)?,
    })
}

pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::Conflict(msg),
                _ => StoreError::Storage(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Storage(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Storage(format!("sqlx error in {}: {}", operation, err)),
    }
}
