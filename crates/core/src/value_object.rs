//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Two value objects with the same attribute values are the same value.
/// A combination key is the typical example here: two keys built from the
/// same ordered option ids are interchangeable, wherever they were built.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
