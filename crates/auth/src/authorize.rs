//! Ownership guard: single-owner scoping for user resources.

use thiserror::Error;

use notes_core::Owned;

use crate::Principal;

/// Denial is reported exactly like absence, so callers cannot test for
/// resources owned by someone else.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OwnershipError {
    #[error("not found")]
    NotFound,
}

/// Allow access only when `principal` owns `resource`.
///
/// - No IO
/// - No panics
/// - Apply before every read or mutation of a single owned resource
pub fn authorize_owner<R: Owned>(principal: &Principal, resource: &R) -> Result<(), OwnershipError> {
    if resource.owner_id() == principal.user_id() {
        Ok(())
    } else {
        tracing::debug!(
            principal = %principal.user_id(),
            "ownership check denied"
        );
        Err(OwnershipError::NotFound)
    }
}

/// Resolve an optional lookup result through the guard.
///
/// `None` and "owned by someone else" collapse into the same error.
pub fn owned_or_not_found<R: Owned>(principal: &Principal, resource: Option<R>) -> Result<R, OwnershipError> {
    let resource = resource.ok_or(OwnershipError::NotFound)?;
    authorize_owner(principal, &resource)?;
    Ok(resource)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use notes_core::{Note, NoteDraft, UserId};

    fn principal_for(user_id: UserId) -> Principal {
        let now = Utc::now();
        Principal::new(user_id, now, now + Duration::hours(1))
    }

    fn note_owned_by(owner: UserId) -> Note {
        Note::create(owner, NoteDraft::new("t", "c").unwrap(), Utc::now())
    }

    #[test]
    fn owner_is_allowed() {
        let alice = UserId::new();
        assert_eq!(authorize_owner(&principal_for(alice), &note_owned_by(alice)), Ok(()));
    }

    #[test]
    fn non_owner_gets_not_found() {
        let alice = UserId::new();
        let bob = UserId::new();
        assert_eq!(
            authorize_owner(&principal_for(bob), &note_owned_by(alice)),
            Err(OwnershipError::NotFound)
        );
    }

    #[test]
    fn foreign_and_missing_are_indistinguishable() {
        let alice = UserId::new();
        let bob = principal_for(UserId::new());

        let foreign = owned_or_not_found(&bob, Some(note_owned_by(alice))).unwrap_err();
        let missing = owned_or_not_found::<Note>(&bob, None).unwrap_err();
        assert_eq!(foreign, missing);
        assert_eq!(foreign.to_string(), missing.to_string());
    }
}
