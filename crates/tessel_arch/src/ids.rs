//! Opaque ID newtypes for architecture entities.
//!
//! Each ID is a thin `u32` wrapper that is `Copy`, `Hash`, and `Serialize`/`Deserialize`.
//! IDs index into the corresponding table of an [`Architecture`](crate::Architecture).

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

            /// Returns the ID as a table index.
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// Index of a physical tile type in [`Architecture::tile_types`](crate::Architecture::tile_types).
    TileTypeId
);

define_id!(
    /// Index of a wire segment type in the unified segment catalog.
    SegmentId
);

define_id!(
    /// Index of a routing switch type.
    SwitchId
);

impl TileTypeId {
    /// The empty tile type. Every architecture stores it at index 0.
    pub const EMPTY: TileTypeId = TileTypeId(0);

    /// Returns `true` for the empty tile type.
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl Default for TileTypeId {
    fn default() -> Self {
        TileTypeId::EMPTY
    }
}
