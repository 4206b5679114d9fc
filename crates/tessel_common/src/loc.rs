//! Grid coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A cell coordinate on one layer of the device grid.
///
/// `x` grows to the right and `y` grows upward; (0, 0) is the bottom-left
/// corner of the fabric.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct GridLoc {
    /// Column index.
    pub x: usize,
    /// Row index.
    pub y: usize,
    /// Die layer index.
    pub layer: usize,
}

impl GridLoc {
    /// Creates a coordinate on layer 0.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y, layer: 0 }
    }

    /// Creates a coordinate on the given layer.
    pub fn on_layer(x: usize, y: usize, layer: usize) -> Self {
        Self { x, y, layer }
    }

    /// Manhattan distance in the x/y plane, ignoring layers.
    pub fn manhattan(self, other: GridLoc) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl fmt::Display for GridLoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.layer == 0 {
            write!(f, "({}, {})", self.x, self.y)
        } else {
            write!(f, "({}, {}, L{})", self.x, self.y, self.layer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_distance() {
        let a = GridLoc::new(1, 5);
        let b = GridLoc::new(4, 2);
        assert_eq!(a.manhattan(b), 6);
        assert_eq!(b.manhattan(a), 6);
    }

    #[test]
    fn display() {
        assert_eq!(GridLoc::new(3, 4).to_string(), "(3, 4)");
        assert_eq!(GridLoc::on_layer(3, 4, 1).to_string(), "(3, 4, L1)");
    }
}
