//! Circles are managed by their own subsystem; the content models only carry
//! typed references for audience scoping.

use crate::model::Id;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug, Default, Hash)]
pub struct CircleMarker;

/// Id of the built-in world circle, seeded by the initial migration. Posts
/// shared with it are visible to everyone.
pub const WORLD_CIRCLE_ID: u64 = 1;

#[must_use]
pub fn world_circle() -> Id<CircleMarker> {
    Id::new(WORLD_CIRCLE_ID)
}
