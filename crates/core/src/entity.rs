//! Entity trait: a domain object with a stable identity.

/// Entity marker + minimal interface.
///
/// The identity never changes once the entity exists; everything else
/// (e.g. a machine's stock level) may.
pub trait Entity {
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    fn id(&self) -> &Self::Id;
}
