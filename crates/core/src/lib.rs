//! `notes-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, the user/note records and the validation rules applied to
//! caller-supplied input.

pub mod entity;
pub mod error;
pub mod id;
pub mod note;
pub mod user;

pub use entity::{Entity, Owned};
pub use error::{DomainError, DomainResult};
pub use id::{NoteId, UserId};
pub use note::{Note, NoteDraft};
pub use user::{NewUser, User};

/// Reject empty (or whitespace-only) required input.
///
/// Returns the trimmed value on success.
pub fn require_non_empty<'a>(field: &'static str, value: &'a str) -> DomainResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DomainError::validation(format!("{field} must be non-empty")));
    }
    Ok(trimmed)
}
