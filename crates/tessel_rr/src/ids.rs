//! Opaque ID newtypes for routing-resource graph entities.
//!
//! [`RrNodeId`], [`RrEdgeId`] and [`RcIndex`] are thin `u32` wrappers used as
//! arena indices into an [`RrGraph`](crate::RrGraph). Every structure outside
//! the graph (spatial index, switch block table, lookahead) stores these
//! indices, never references to nodes.

use serde::{Deserialize, Serialize};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        pub struct $name(u32);

        impl $name {
            /// Creates an ID from a raw `u32` index.
            pub const fn from_raw(index: u32) -> Self {
                Self(index)
            }

            /// Returns the raw `u32` index.
            pub fn as_raw(self) -> u32 {
                self.0
            }

            /// Returns the ID as an arena index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

define_id!(
    /// Opaque, copyable ID for a node in the routing-resource graph.
    RrNodeId
);

define_id!(
    /// Opaque, copyable ID for an edge in the routing-resource graph.
    RrEdgeId
);

define_id!(
    /// Index into the graph's deduplicated resistance/capacitance table.
    RcIndex
);
