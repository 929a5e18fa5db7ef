//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Variations and options keep their id through renames; a price variant's
/// identity is its combination key, so relabelling never makes it a new row.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
