//! Stateless channel and tile geometry queries.
//!
//! Channel coordinates follow the usual island convention: the horizontal
//! channel `(x, y)` runs above cell `(x, y)`, the vertical channel `(x, y)`
//! runs to its right. Routable channels never touch the outermost ring of
//! cells, so valid horizontal channel columns are `1..=W-2` and valid
//! vertical channel rows are `1..=H-2`.

use crate::annotation::ShrinkBoundary;
use crate::options::ChannelOptions;
use tessel_arch::{Architecture, Axis, DeviceGrid, GridTile, PhysicalTileType, PinType, Side};

/// Start/end forcing of a built channel position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChanPosition {
    /// Every wire starts here.
    pub force_start: bool,
    /// Every wire ends here.
    pub force_end: bool,
}

/// Read-only view over an architecture and a grid built from it.
#[derive(Clone, Copy, Debug)]
pub struct Fabric<'a> {
    /// Tile types, segments and switches.
    pub arch: &'a Architecture,
    /// Placed tiles.
    pub grid: &'a DeviceGrid,
}

impl<'a> Fabric<'a> {
    /// Pairs an architecture with one of its grids.
    pub fn new(arch: &'a Architecture, grid: &'a DeviceGrid) -> Self {
        Self { arch, grid }
    }

    /// Grid width.
    pub fn width(&self) -> usize {
        self.grid.width()
    }

    /// Grid height.
    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// The grid cell at `(x, y)`.
    pub fn tile(&self, layer: usize, x: usize, y: usize) -> &'a GridTile {
        self.grid.tile(layer, x, y)
    }

    /// The type of the tile covering `(x, y)`.
    pub fn tile_type(&self, layer: usize, x: usize, y: usize) -> &'a PhysicalTileType {
        self.arch.tile_type(self.grid.tile_type(layer, x, y))
    }

    /// Whether a horizontal channel segment sits above `(x, y)`.
    ///
    /// Without through-channels a channel only exists above the topmost row of
    /// a tile; multi-height tiles block it elsewhere.
    pub fn is_chanx_exist(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        let (w, h) = (self.width(), self.height());
        if x < 1 || x + 2 > w || y + 2 > h {
            return false;
        }
        if through_channel {
            return true;
        }
        let tile = self.tile(layer, x, y);
        tile.height_offset + 1 == self.arch.tile_type(tile.tile_type).height
    }

    /// Whether a vertical channel segment sits right of `(x, y)`.
    pub fn is_chany_exist(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        let (w, h) = (self.width(), self.height());
        if x + 2 > w || y < 1 || y + 2 > h {
            return false;
        }
        if through_channel {
            return true;
        }
        let tile = self.tile(layer, x, y);
        tile.width_offset + 1 == self.arch.tile_type(tile.tile_type).width
    }

    /// The horizontal channel at `(x, y)` begins right of a blocked stretch
    /// (or the fabric's left edge), so tracks must start here.
    pub fn is_chanx_right_to_multi_height(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        x == 1 || (!through_channel && !self.is_chanx_exist(layer, x - 1, y, through_channel))
    }

    /// The horizontal channel at `(x, y)` is followed by a blocked stretch
    /// (or the fabric's right edge), so tracks must end here.
    pub fn is_chanx_left_to_multi_height(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        x + 2 == self.width() || (!through_channel && !self.is_chanx_exist(layer, x + 1, y, through_channel))
    }

    /// Vertical counterpart of [`Fabric::is_chanx_right_to_multi_height`].
    pub fn is_chany_top_to_multi_width(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        y == 1 || (!through_channel && !self.is_chany_exist(layer, x, y - 1, through_channel))
    }

    /// Vertical counterpart of [`Fabric::is_chanx_left_to_multi_height`].
    pub fn is_chany_bottom_to_multi_width(&self, layer: usize, x: usize, y: usize, through_channel: bool) -> bool {
        y + 2 == self.height() || (!through_channel && !self.is_chany_exist(layer, x, y + 1, through_channel))
    }

    /// Number of positions along one channel of `axis`.
    pub fn chan_length(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.width().saturating_sub(2),
            Axis::Y => self.height().saturating_sub(2),
        }
    }

    /// Candidate channel positions of `axis`, one run per channel line in
    /// ascending order. Horizontal runs are rows `0..H-1` walking `x` upward,
    /// vertical runs are columns `0..W-1` walking `y` upward.
    pub fn channel_runs(&self, axis: Axis) -> Vec<Vec<(usize, usize)>> {
        let (w, h) = (self.width(), self.height());
        match axis {
            Axis::X => (0..h.saturating_sub(1))
                .map(|y| (1..w.saturating_sub(1)).map(|x| (x, y)).collect())
                .collect(),
            Axis::Y => (0..w.saturating_sub(1))
                .map(|x| (1..h.saturating_sub(1)).map(|y| (x, y)).collect())
                .collect(),
        }
    }

    /// Whether a channel of `axis` is built at `(x, y)` and, if so, which
    /// boundaries force its wires to start or end there.
    pub fn channel_position(
        &self,
        layer: usize,
        axis: Axis,
        x: usize,
        y: usize,
        options: &ChannelOptions,
        boundary: &ShrinkBoundary,
    ) -> Option<ChanPosition> {
        let through = options.through_channel;
        let (exist, annotation, at_low_edge, at_high_edge) = match axis {
            Axis::X => (
                self.is_chanx_exist(layer, x, y, through),
                boundary.chanx(x, y),
                self.is_chanx_right_to_multi_height(layer, x, y, through),
                self.is_chanx_left_to_multi_height(layer, x, y, through),
            ),
            Axis::Y => (
                self.is_chany_exist(layer, x, y, through),
                boundary.chany(x, y),
                self.is_chany_top_to_multi_width(layer, x, y, through),
                self.is_chany_bottom_to_multi_width(layer, x, y, through),
            ),
        };
        if !exist {
            return None;
        }
        let shrink = options.shrink_boundary;
        if shrink && !annotation.exist {
            return None;
        }
        Some(ChanPosition {
            force_start: at_low_edge || (shrink && annotation.start),
            force_end: at_high_edge || (shrink && annotation.end),
        })
    }

    /// The sides whose pins are enumerated for the tile rooted at `(x, y)`.
    /// I/O tiles on the fabric border only expose the side facing inwards.
    pub fn pin_sides(&self, layer: usize, x: usize, y: usize) -> Vec<Side> {
        if self.tile_type(layer, x, y).is_io {
            if let Some(side) = io_side(self.width(), self.height(), x, y) {
                return vec![side];
            }
        }
        Side::ALL.to_vec()
    }

    /// Number of pins of `kind` the tile rooted at `(x, y)` exposes over all
    /// of its cells and enumerated sides.
    pub fn num_pins(&self, layer: usize, x: usize, y: usize, kind: PinType) -> usize {
        let tile_type = self.tile_type(layer, x, y);
        let sides = self.pin_sides(layer, x, y);
        let mut count = 0;
        for w in 0..tile_type.width {
            for h in 0..tile_type.height {
                for &side in &sides {
                    count += tile_type.side_pins(kind, side, w, h).len();
                }
            }
        }
        count
    }
}

/// The side of a border cell that faces the fabric interior, or `None` for
/// interior cells. The top row wins over the right column, then bottom, then left.
pub fn io_side(width: usize, height: usize, x: usize, y: usize) -> Option<Side> {
    if y + 1 == height {
        Some(Side::Bottom)
    } else if x + 1 == width {
        Some(Side::Left)
    } else if y == 0 {
        Some(Side::Top)
    } else if x == 0 {
        Some(Side::Right)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_arch::{builtin, create_device_grid};
    use tessel_diagnostics::DiagnosticSink;

    fn hetero_grid() -> (Architecture, DeviceGrid) {
        let arch = builtin::hetero();
        let grid = create_device_grid(&arch, "fixed_10x10", &DiagnosticSink::new()).unwrap();
        (arch, grid)
    }

    #[test]
    fn io_side_faces_inward() {
        assert_eq!(io_side(5, 5, 2, 4), Some(Side::Bottom));
        assert_eq!(io_side(5, 5, 4, 2), Some(Side::Left));
        assert_eq!(io_side(5, 5, 2, 0), Some(Side::Top));
        assert_eq!(io_side(5, 5, 0, 2), Some(Side::Right));
        assert_eq!(io_side(5, 5, 2, 2), None);
    }

    #[test]
    fn channel_ring_is_excluded() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let fabric = Fabric::new(&arch, &grid);
        assert!(!fabric.is_chanx_exist(0, 0, 1, false));
        assert!(fabric.is_chanx_exist(0, 1, 0, false));
        assert!(fabric.is_chanx_exist(0, 3, 3, false));
        assert!(!fabric.is_chanx_exist(0, 4, 1, false));
        assert!(!fabric.is_chanx_exist(0, 2, 4, false));
        assert!(fabric.is_chany_exist(0, 0, 1, false));
        assert!(!fabric.is_chany_exist(0, 1, 0, false));
        assert!(!fabric.is_chany_exist(0, 4, 2, false));
    }

    #[test]
    fn multi_height_tile_blocks_chanx() {
        let (arch, grid) = hetero_grid();
        let fabric = Fabric::new(&arch, &grid);
        // 1x2 multiplier rooted at (2, 2).
        assert_eq!(fabric.tile_type(0, 2, 2).name, "mult");
        assert_eq!(fabric.tile(0, 2, 2).height_offset, 0);
        assert!(!fabric.is_chanx_exist(0, 2, 2, false));
        assert!(fabric.is_chanx_exist(0, 2, 2, true));
        assert!(fabric.is_chanx_exist(0, 2, 3, false));
        assert!(fabric.is_chanx_left_to_multi_height(0, 1, 2, false));
        assert!(fabric.is_chanx_right_to_multi_height(0, 3, 2, false));
        assert!(!fabric.is_chanx_right_to_multi_height(0, 3, 2, true));
        assert!(!fabric.is_chanx_left_to_multi_height(0, 1, 3, false));
    }

    #[test]
    fn multi_width_tile_blocks_chany() {
        let (arch, grid) = hetero_grid();
        let fabric = Fabric::new(&arch, &grid);
        // 2x2 memory rooted at (4, 1); its left column has no vertical channel.
        assert_eq!(fabric.tile_type(0, 4, 1).name, "mem");
        for y in 1..=8 {
            assert!(!fabric.is_chany_exist(0, 4, y, false));
            assert!(fabric.is_chany_exist(0, 4, y, true));
            assert!(fabric.is_chany_exist(0, 5, y, false));
        }
        assert!(fabric.is_chany_top_to_multi_width(0, 5, 1, false));
        assert!(!fabric.is_chany_top_to_multi_width(0, 5, 2, false));
        assert!(fabric.is_chany_bottom_to_multi_width(0, 5, 8, false));
    }

    #[test]
    fn channel_runs_cover_interior() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let fabric = Fabric::new(&arch, &grid);
        let runs = fabric.channel_runs(Axis::X);
        assert_eq!(runs.len(), 4);
        assert_eq!(runs[0], vec![(1, 0), (2, 0), (3, 0)]);
        let runs = fabric.channel_runs(Axis::Y);
        assert_eq!(runs[3], vec![(3, 1), (3, 2), (3, 3)]);
        assert_eq!(fabric.chan_length(Axis::Y), 3);
    }

    #[test]
    fn channel_position_forcing() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let fabric = Fabric::new(&arch, &grid);
        let opts = ChannelOptions::uniform(4);
        let boundary = ShrinkBoundary::from_grid(&grid, 0);
        let first = fabric.channel_position(0, Axis::X, 1, 2, &opts, &boundary).unwrap();
        assert!(first.force_start && !first.force_end);
        let mid = fabric.channel_position(0, Axis::X, 2, 2, &opts, &boundary).unwrap();
        assert_eq!(mid, ChanPosition::default());
        let last = fabric.channel_position(0, Axis::Y, 2, 3, &opts, &boundary).unwrap();
        assert!(last.force_end);
        assert_eq!(fabric.channel_position(0, Axis::X, 2, 4, &opts, &boundary), None);
    }

    #[test]
    fn shrink_boundary_cuts_channels() {
        let arch = builtin::k4_n4();
        let mut grid = DeviceGrid::new("island", 7, 7, 1);
        let clb = arch.tile_type_by_name("clb").unwrap();
        for x in 2..=4 {
            for y in 2..=4 {
                grid.place_block(0, x, y, clb, 1, 1);
            }
        }
        let fabric = Fabric::new(&arch, &grid);
        let boundary = ShrinkBoundary::from_grid(&grid, 0);
        let mut opts = ChannelOptions::uniform(4);
        assert!(fabric.channel_position(0, Axis::X, 1, 1, &opts, &boundary).is_some());
        opts.shrink_boundary = true;
        assert_eq!(fabric.channel_position(0, Axis::X, 1, 1, &opts, &boundary), None);
        let edge = fabric.channel_position(0, Axis::X, 2, 2, &opts, &boundary).unwrap();
        assert!(edge.force_start && !edge.force_end);
        let edge = fabric.channel_position(0, Axis::X, 4, 3, &opts, &boundary).unwrap();
        assert!(edge.force_end);
    }

    #[test]
    fn io_pins_restricted_to_one_side() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let fabric = Fabric::new(&arch, &grid);
        assert_eq!(fabric.pin_sides(0, 2, 0), vec![Side::Top]);
        assert_eq!(fabric.num_pins(0, 2, 0, PinType::Driver), 1);
        assert_eq!(fabric.pin_sides(0, 2, 2).len(), 4);
        // clb: four single-sided inputs and one output on two sides.
        assert_eq!(fabric.num_pins(0, 2, 2, PinType::Receiver), 4);
        assert_eq!(fabric.num_pins(0, 2, 2, PinType::Driver), 2);
    }
}
