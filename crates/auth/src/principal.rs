use chrono::{DateTime, Utc};

use notes_core::UserId;

/// The authenticated identity resolved for a single request.
///
/// Produced only by a [`CredentialValidator`](crate::CredentialValidator);
/// handlers receive it by value and drop it when the request ends.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Principal {
    user_id: UserId,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl Principal {
    pub fn new(user_id: UserId, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            issued_at,
            expires_at,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn issued_at(&self) -> DateTime<Utc> {
        self.issued_at
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}
