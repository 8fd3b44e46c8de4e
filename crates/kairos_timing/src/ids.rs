//! Opaque ID newtypes for timing graph entities.
//!
//! [`NodeId`], [`EdgeId`], [`LevelId`] and [`DomainId`] are thin `u32`
//! wrappers used as arena indices. They are `Copy`, `Hash`, `Ord` and
//! `Serialize`/`Deserialize`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Common interface of the dense handles, used by generic arena helpers such
/// as [`Remap`](crate::layout::Remap).
pub trait ArenaId: Copy + Eq + fmt::Debug {
    /// Returns the handle as an arena index.
    fn index(self) -> usize;

    /// Builds a handle from an arena index.
    fn from_index(index: usize) -> Self;
}

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the ID as a `usize` suitable for indexing arenas.
            pub fn index(self) -> usize {
                self.0 as usize
            }

            pub(crate) fn from_index(index: usize) -> Self {
                Self(u32::try_from(index).expect(concat!(stringify!($name), " space exhausted")))
            }
        }

        impl ArenaId for $name {
            fn index(self) -> usize {
                self.0 as usize
            }

            fn from_index(index: usize) -> Self {
                $name::from_index(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a node in the timing graph.
    NodeId,
    "n"
);

define_id!(
    /// Opaque, copyable ID for an edge in the timing graph.
    EdgeId,
    "e"
);

define_id!(
    /// Opaque, copyable ID for a level (topological bucket) of the timing graph.
    LevelId,
    "l"
);

define_id!(
    /// Opaque, copyable ID for a clock domain.
    DomainId,
    "d"
);
