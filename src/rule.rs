//! Match policy deciding whether a neighbor tile connects to an object.
//!
//! The core calls the rule once per (object, direction) with the occupants of
//! that single neighbor tile. Rules must not assume any relationship between
//! the four results of one object, nor symmetry between two objects.

use crate::collab::{CollaboratorError, ObjectId, Registry};

/// Policy surface for a single direction of a single object.
pub trait MatchRule<R: Registry + ?Sized> {
    /// Whether `occupants` of one neighbor tile connect to an object whose
    /// group key is `subject`.
    fn matches(
        &self,
        registry: &R,
        subject: &R::Key,
        occupants: &[ObjectId],
    ) -> Result<bool, CollaboratorError>;
}

/// Connect when any valid, capable occupant shares the object's group key.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameGroup;

impl<R: Registry + ?Sized> MatchRule<R> for SameGroup {
    fn matches(
        &self,
        registry: &R,
        subject: &R::Key,
        occupants: &[ObjectId],
    ) -> Result<bool, CollaboratorError> {
        for &other in occupants {
            if !registry.is_valid(other) || !registry.has_capability(other) {
                continue;
            }
            if registry.group_key(other)? == *subject {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl<R, F> MatchRule<R> for F
where
    R: Registry + ?Sized,
    F: Fn(&R, &R::Key, &[ObjectId]) -> Result<bool, CollaboratorError>,
{
    fn matches(
        &self,
        registry: &R,
        subject: &R::Key,
        occupants: &[ObjectId],
    ) -> Result<bool, CollaboratorError> {
        self(registry, subject, occupants)
    }
}
