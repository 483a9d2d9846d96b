//! Entity trait: identity + continuity across state changes.

use crate::value_object::ValueObject;

/// Entity marker + minimal interface.
///
/// An entity keeps its identity while its attributes change. Inventory records,
/// for instance, are identified by their normalized name: a record observed with a
/// new quantity is still the same record and is persisted over its previous row.
pub trait Entity {
    /// Strongly-typed entity identifier, compared by value.
    type Id: ValueObject + Eq + core::hash::Hash;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
