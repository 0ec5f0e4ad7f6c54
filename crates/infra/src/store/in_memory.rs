//! In-memory stores for tests/dev.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use notes_core::{NewUser, Note, NoteId, User, UserId};

use super::{NoteStore, StoreError, UserStore};

fn poisoned() -> StoreError {
    StoreError::Storage("in-memory store lock poisoned".to_string())
}

#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    inner: RwLock<HashMap<UserId, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().find(|u| u.username == username).cloned())
    }

    async fn exists(&self, username: &str, email: &str) -> Result<bool, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.values().any(|u| u.username == username || u.email == email))
    }

    async fn insert(&self, new_user: NewUser, created_at: DateTime<Utc>) -> Result<User, StoreError> {
        // Check and insert under one write lock.
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(StoreError::Conflict("username or email already registered".to_string()));
        }

        let user = new_user.into_user(created_at);
        map.insert(user.id, user.clone());
        Ok(user)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryNoteStore {
    inner: RwLock<HashMap<NoteId, Note>>,
}

impl InMemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NoteStore for InMemoryNoteStore {
    async fn list_by_owner(&self, owner: UserId) -> Result<Vec<Note>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        let mut notes: Vec<Note> = map
            .values()
            .filter(|n| n.owner_id == owner)
            .cloned()
            .collect();
        notes.sort_by_key(|n| (n.created_at, *n.id.as_uuid()));
        Ok(notes)
    }

    async fn get(&self, id: NoteId) -> Result<Option<Note>, StoreError> {
        let map = self.inner.read().map_err(|_| poisoned())?;
        Ok(map.get(&id).cloned())
    }

    async fn insert(&self, note: &Note) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.contains_key(&note.id) {
            return Err(StoreError::Conflict(format!("note {} already exists", note.id)));
        }
        map.insert(note.id, note.clone());
        Ok(())
    }

    async fn update(&self, note: &Note) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        match map.get_mut(&note.id) {
            Some(stored) if stored.owner_id == note.owner_id => {
                stored.title = note.title.clone();
                stored.content = note.content.clone();
                stored.updated_at = note.updated_at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, id: NoteId, owner: UserId) -> Result<bool, StoreError> {
        let mut map = self.inner.write().map_err(|_| poisoned())?;
        if map.get(&id).is_some_and(|n| n.owner_id == owner) {
            map.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use notes_core::NoteDraft;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$placeholder".to_string(),
        }
    }

    #[tokio::test]
    async fn duplicate_username_or_email_conflicts() {
        let store = InMemoryUserStore::new();
        let now = Utc::now();
        store.insert(new_user("alice", "alice@x.com"), now).await.unwrap();

        let same_name = store.insert(new_user("alice", "other@x.com"), now).await;
        let same_email = store.insert(new_user("alicia", "alice@x.com"), now).await;

        assert!(matches!(same_name, Err(StoreError::Conflict(_))));
        assert!(matches!(same_email, Err(StoreError::Conflict(_))));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn find_by_username_is_exact() {
        let store = InMemoryUserStore::new();
        let alice = store.insert(new_user("alice", "alice@x.com"), Utc::now()).await.unwrap();

        assert_eq!(store.find_by_username("alice").await.unwrap().map(|u| u.id), Some(alice.id));
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert!(store.exists("bob", "alice@x.com").await.unwrap());
        assert!(!store.exists("bob", "bob@x.com").await.unwrap());
    }

    #[tokio::test]
    async fn listing_is_scoped_to_owner_and_ordered() {
        let store = InMemoryNoteStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let t0 = Utc::now();

        let second = Note::create(alice, NoteDraft::new("second", "c").unwrap(), t0 + Duration::seconds(1));
        let first = Note::create(alice, NoteDraft::new("first", "c").unwrap(), t0);
        let foreign = Note::create(bob, NoteDraft::new("bob's", "c").unwrap(), t0);
        for n in [&second, &first, &foreign] {
            store.insert(n).await.unwrap();
        }

        let titles: Vec<String> = store
            .list_by_owner(alice)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.title)
            .collect();
        assert_eq!(titles, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn writes_are_scoped_by_owner() {
        let store = InMemoryNoteStore::new();
        let alice = UserId::new();
        let bob = UserId::new();
        let note = Note::create(alice, NoteDraft::new("t", "c").unwrap(), Utc::now());
        store.insert(&note).await.unwrap();

        let mut hijack = note.clone();
        hijack.owner_id = bob;
        hijack.title = "pwned".to_string();
        assert!(!store.update(&hijack).await.unwrap());
        assert!(!store.delete(note.id, bob).await.unwrap());
        assert_eq!(store.get(note.id).await.unwrap().unwrap().title, "t");

        assert!(store.delete(note.id, alice).await.unwrap());
        assert!(store.get(note.id).await.unwrap().is_none());
    }
}
