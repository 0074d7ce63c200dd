//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attribute values.
/// Construction goes through a validating constructor, so holding one means
/// its invariants already hold.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
