//! User identity record.

use chrono::{DateTime, Utc};

use crate::{Entity, UserId};

/// A registered user.
///
/// `password_hash` is a salted one-way hash in PHC string format; the
/// plaintext password never reaches this type. The record is deliberately not
/// `Serialize` so it cannot leak into a response body.
#[derive(Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl core::fmt::Debug for User {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A user about to be persisted (already validated and hashed).
#[derive(Clone, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

impl NewUser {
    /// Materialize the stored record with a fresh id.
    pub fn into_user(self, created_at: DateTime<Utc>) -> User {
        User {
            id: UserId::new(),
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            created_at,
        }
    }
}

impl core::fmt::Debug for NewUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewUser")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_hash() {
        let user = NewUser {
            username: "alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
        }
        .into_user(Utc::now());

        let rendered = format!("{user:?}");
        assert!(rendered.contains("alice@x.com"));
        assert!(!rendered.contains("$argon2id$secret"));
    }
}
