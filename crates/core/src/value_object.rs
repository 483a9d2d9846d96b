//! Value object trait: equality by value, not identity.
//!
//! Value objects are domain objects that have **no identity**; they are defined entirely
//! by their attribute values. Two value objects with the same values are considered equal.

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a
/// new one. [`AliasKey`](crate::AliasKey) is the canonical example in this workspace:
/// `" Drill "` and `"drill"` normalize to the same key and are therefore equal.
///
/// ```ignore
/// let a = AliasKey::normalize(" Drill ").unwrap();
/// let b = AliasKey::normalize("drill").unwrap();
/// assert_eq!(a, b);
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
