//! Records that carry a backend-issued identity.

/// A backend record addressable by its id.
///
/// Used wherever a record is referenced in logs or ownership checks without
/// caring about its concrete type.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Display;

    fn id(&self) -> &Self::Id;
}
