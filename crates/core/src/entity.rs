//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Two entities with the same identifier are the same record, even when the
/// rest of their fields differ (e.g. one copy is staler than the other).
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;

    /// True when `other` refers to the same record.
    fn same_identity_as(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}
