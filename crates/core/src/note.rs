//! Notes: the single kind of user-owned resource.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{DomainResult, Entity, NoteId, Owned, UserId, require_non_empty};

/// A note owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub content: String,
    #[serde(rename = "user_id")]
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn create(owner_id: UserId, draft: NoteDraft, now: DateTime<Utc>) -> Self {
        Self {
            id: NoteId::new(),
            title: draft.title,
            content: draft.content,
            owner_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace title and content. Ownership and creation time are untouched.
    pub fn revise(&mut self, draft: NoteDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.content = draft.content;
        self.updated_at = now;
    }
}

impl Entity for Note {
    type Id = NoteId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Owned for Note {
    fn owner_id(&self) -> UserId {
        self.owner_id
    }
}

/// Validated title/content pair used for both creation and revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteDraft {
    title: String,
    content: String,
}

impl NoteDraft {
    /// Both fields are required; whitespace-only counts as empty.
    pub fn new(title: &str, content: &str) -> DomainResult<Self> {
        let title = require_non_empty("title", title)?;
        let content = require_non_empty("content", content)?;
        Ok(Self {
            title: title.to_string(),
            content: content.to_string(),
        })
    }
}
