/// The error returned when looking up a key that is not present.
///
/// Only keyed lookups such as [`AvlMap::at`](crate::AvlMap::at) return it. Inserting never fails,
/// and removing an absent key is a no-op.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, thiserror::Error)]
#[error("key not found")]
pub struct KeyError;
