//! Entity traits: identity, and single-owner scoping.

use crate::UserId;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// An entity that belongs to exactly one user.
///
/// Ownership never changes after creation; access checks compare this value
/// against the authenticated principal.
pub trait Owned: Entity {
    fn owner_id(&self) -> UserId;
}
