//! Shrink-boundary channel annotation.
//!
//! With the shrink-boundary policy, routing channels are only built inside
//! the bounding box of the occupied tiles of a layer, and wires are cut at
//! that box's edges.

use tessel_arch::DeviceGrid;

/// Existence and forced start/end of one channel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelAnnotation {
    /// The channel is built at this position.
    pub exist: bool,
    /// Every wire starts here.
    pub start: bool,
    /// Every wire ends here.
    pub end: bool,
}

/// Channel annotations for one layer, derived from its occupied region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShrinkBoundary {
    region: Option<(usize, usize, usize, usize)>,
}

impl ShrinkBoundary {
    /// Computes the active region of `layer`.
    pub fn from_grid(grid: &DeviceGrid, layer: usize) -> Self {
        Self {
            region: grid.occupied_bbox(layer),
        }
    }

    /// The active region as `(xmin, ymin, xmax, ymax)`, if any tile is placed.
    pub fn region(&self) -> Option<(usize, usize, usize, usize)> {
        self.region
    }

    /// Annotation of the horizontal channel above `(x, y)`.
    pub fn chanx(&self, x: usize, y: usize) -> ChannelAnnotation {
        match self.region {
            Some((xmin, ymin, xmax, ymax)) if (xmin..=xmax).contains(&x) && (ymin..ymax).contains(&y) => {
                ChannelAnnotation {
                    exist: true,
                    start: x == xmin,
                    end: x == xmax,
                }
            }
            _ => ChannelAnnotation::default(),
        }
    }

    /// Annotation of the vertical channel right of `(x, y)`.
    pub fn chany(&self, x: usize, y: usize) -> ChannelAnnotation {
        match self.region {
            Some((xmin, ymin, xmax, ymax)) if (ymin..=ymax).contains(&y) && (xmin..xmax).contains(&x) => {
                ChannelAnnotation {
                    exist: true,
                    start: y == ymin,
                    end: y == ymax,
                }
            }
            _ => ChannelAnnotation::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_arch::TileTypeId;

    fn island() -> DeviceGrid {
        let mut grid = DeviceGrid::new("island", 8, 8, 1);
        for x in 2..=5 {
            for y in 3..=6 {
                grid.place_block(0, x, y, TileTypeId::from_raw(1), 1, 1);
            }
        }
        grid
    }

    #[test]
    fn chanx_inside_region() {
        let boundary = ShrinkBoundary::from_grid(&island(), 0);
        assert_eq!(boundary.region(), Some((2, 3, 5, 6)));
        assert_eq!(
            boundary.chanx(2, 3),
            ChannelAnnotation {
                exist: true,
                start: true,
                end: false
            }
        );
        assert!(boundary.chanx(5, 5).end);
        // The top row of the region has no channel above it.
        assert!(!boundary.chanx(3, 6).exist);
        assert!(!boundary.chanx(1, 4).exist);
    }

    #[test]
    fn chany_inside_region() {
        let boundary = ShrinkBoundary::from_grid(&island(), 0);
        let a = boundary.chany(4, 6);
        assert!(a.exist && a.end && !a.start);
        assert!(boundary.chany(2, 3).start);
        assert!(!boundary.chany(5, 4).exist);
        assert!(!boundary.chany(3, 2).exist);
    }

    #[test]
    fn empty_layer_has_no_channels() {
        let grid = DeviceGrid::new("blank", 4, 4, 1);
        let boundary = ShrinkBoundary::from_grid(&grid, 0);
        assert_eq!(boundary.region(), None);
        assert!(!boundary.chanx(1, 1).exist);
        assert!(!boundary.chany(1, 1).exist);
    }
}
