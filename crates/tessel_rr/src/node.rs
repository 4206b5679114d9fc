//! Routing-resource node data.

use crate::ids::RcIndex;
use serde::{Deserialize, Serialize};
use std::fmt;
use tessel_arch::{Axis, SegmentId, Side, SwitchId};
use tessel_common::GridLoc;

/// Fixed cost index of internal-source nodes.
pub const SOURCE_COST_INDEX: usize = 0;
/// Fixed cost index of internal-sink nodes.
pub const SINK_COST_INDEX: usize = 1;
/// Fixed cost index of output-pin nodes.
pub const OPIN_COST_INDEX: usize = 2;
/// Fixed cost index of input-pin nodes.
pub const IPIN_COST_INDEX: usize = 3;
/// First wire cost index. Horizontal wires use `CHANX_COST_INDEX_START + parallel segment`,
/// vertical wires continue after the horizontal segment catalog.
pub const CHANX_COST_INDEX_START: usize = 4;

/// The resource category of a node.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum RrNodeKind {
    /// Internal source of a driver pin class.
    Source,
    /// Internal sink of a receiver pin class.
    Sink,
    /// Block output pin.
    Opin,
    /// Block input pin.
    Ipin,
    /// Horizontal wire.
    ChanX,
    /// Vertical wire.
    ChanY,
}

impl RrNodeKind {
    /// All kinds in table order.
    pub const ALL: [RrNodeKind; 6] = [
        RrNodeKind::Source,
        RrNodeKind::Sink,
        RrNodeKind::Opin,
        RrNodeKind::Ipin,
        RrNodeKind::ChanX,
        RrNodeKind::ChanY,
    ];

    /// Position in [`RrNodeKind::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns `true` for wire kinds.
    pub fn is_chan(self) -> bool {
        matches!(self, RrNodeKind::ChanX | RrNodeKind::ChanY)
    }

    /// Returns `true` for pin kinds.
    pub fn is_pin(self) -> bool {
        matches!(self, RrNodeKind::Opin | RrNodeKind::Ipin)
    }

    /// Source and sink identities are shared by every cell of a multi-cell tile.
    pub fn is_mirrorable(self) -> bool {
        matches!(self, RrNodeKind::Source | RrNodeKind::Sink)
    }

    /// The wire kind running along `axis`.
    pub fn chan(axis: Axis) -> Self {
        match axis {
            Axis::X => RrNodeKind::ChanX,
            Axis::Y => RrNodeKind::ChanY,
        }
    }
}

impl fmt::Display for RrNodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RrNodeKind::Source => "SOURCE",
            RrNodeKind::Sink => "SINK",
            RrNodeKind::Opin => "OPIN",
            RrNodeKind::Ipin => "IPIN",
            RrNodeKind::ChanX => "CHANX",
            RrNodeKind::ChanY => "CHANY",
        };
        f.write_str(s)
    }
}

/// Travel direction of a unidirectional wire.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Direction {
    /// Towards larger coordinates.
    Inc,
    /// Towards smaller coordinates.
    Dec,
}

impl Direction {
    /// The reverse direction.
    pub fn opposite(self) -> Direction {
        match self {
            Direction::Inc => Direction::Dec,
            Direction::Dec => Direction::Inc,
        }
    }
}

/// Inclusive bounding box in grid coordinates.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Lowest column.
    pub xlow: usize,
    /// Lowest row.
    pub ylow: usize,
    /// Highest column.
    pub xhigh: usize,
    /// Highest row.
    pub yhigh: usize,
}

impl BoundingBox {
    /// A box covering the single cell `(x, y)`.
    pub fn unit(x: usize, y: usize) -> Self {
        Self {
            xlow: x,
            ylow: y,
            xhigh: x,
            yhigh: y,
        }
    }

    /// A box covering `width` x `height` cells from `(x, y)`.
    pub fn footprint(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self {
            xlow: x,
            ylow: y,
            xhigh: x + width - 1,
            yhigh: y + height - 1,
        }
    }

    /// Returns `true` if the box covers more than one cell.
    pub fn is_multi_cell(&self) -> bool {
        self.xhigh > self.xlow || self.yhigh > self.ylow
    }

    /// Returns `true` if `(x, y)` lies inside the box.
    pub fn contains(&self, x: usize, y: usize) -> bool {
        (self.xlow..=self.xhigh).contains(&x) && (self.ylow..=self.yhigh).contains(&y)
    }

    /// Number of cells covered.
    pub fn area(&self) -> usize {
        (self.xhigh - self.xlow + 1) * (self.yhigh - self.ylow + 1)
    }

    /// All covered cells, column by column.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (self.xlow..=self.xhigh).flat_map(move |x| (self.ylow..=self.yhigh).map(move |y| (x, y)))
    }
}

/// The track a wire occupies at one channel position.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TrackSlot {
    /// Coordinate along the channel (x for horizontal, y for vertical wires).
    pub coord: usize,
    /// Track number at that coordinate.
    pub track: usize,
}

/// A routing resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RrNode {
    /// Resource category.
    pub kind: RrNodeKind,
    /// Covered cells.
    pub bbox: BoundingBox,
    /// Die layer.
    pub layer: usize,
    /// Number of simultaneous users.
    pub capacity: usize,
    /// Index into the base-cost table.
    pub cost_index: usize,
    /// Pin number, class number or starting track number.
    pub ptc: usize,
    /// Tile sides the resource faces.
    pub sides: Vec<Side>,
    /// Travel direction, wires only.
    pub direction: Option<Direction>,
    /// Segment catalog entry, wires only.
    pub segment: Option<SegmentId>,
    /// Switch that drives this node.
    pub driver_switch: SwitchId,
    /// Resistance/capacitance record.
    pub rc_index: RcIndex,
    /// Occupied tracks. Loaded in ascending coordinate order; decreasing wires
    /// are reversed afterwards so the sequence follows the direction of travel.
    pub tracks: Vec<TrackSlot>,
}

impl RrNode {
    /// A node with no sides, direction or tracks.
    pub fn new(
        kind: RrNodeKind,
        bbox: BoundingBox,
        layer: usize,
        ptc: usize,
        driver_switch: SwitchId,
        rc_index: RcIndex,
    ) -> Self {
        Self {
            kind,
            bbox,
            layer,
            capacity: 1,
            cost_index: 0,
            ptc,
            sides: Vec::new(),
            direction: None,
            segment: None,
            driver_switch,
            rc_index,
            tracks: Vec::new(),
        }
    }

    /// The lowest covered cell.
    pub fn low(&self) -> GridLoc {
        GridLoc::on_layer(self.bbox.xlow, self.bbox.ylow, self.layer)
    }

    /// The highest covered cell.
    pub fn high(&self) -> GridLoc {
        GridLoc::on_layer(self.bbox.xhigh, self.bbox.yhigh, self.layer)
    }

    /// The cell where a wire is driven: its low end when increasing, its high end when decreasing.
    /// Non-wire nodes return their low corner.
    pub fn driving_end(&self) -> GridLoc {
        match self.direction {
            Some(Direction::Dec) => self.high(),
            _ => self.low(),
        }
    }

    /// The cell where a wire stops: the opposite of [`RrNode::driving_end`].
    pub fn far_end(&self) -> GridLoc {
        match self.direction {
            Some(Direction::Dec) => self.low(),
            Some(Direction::Inc) => self.high(),
            None => self.low(),
        }
    }

    /// Track numbers in stored order (direction of travel once loading is finished).
    pub fn track_ids(&self) -> Vec<usize> {
        self.tracks.iter().map(|s| s.track).collect()
    }

    /// Track slots sorted by ascending coordinate, regardless of direction.
    pub fn track_nums_by_coordinate(&self) -> Vec<TrackSlot> {
        let mut slots = self.tracks.clone();
        slots.sort_by_key(|s| s.coord);
        slots
    }

    /// The track this wire uses at `coord`, if it covers that position.
    pub fn track_at(&self, coord: usize) -> Option<usize> {
        self.tracks.iter().find(|s| s.coord == coord).map(|s| s.track)
    }

    /// Number of channel positions spanned by a wire.
    pub fn length(&self) -> usize {
        match self.kind {
            RrNodeKind::ChanX => self.bbox.xhigh - self.bbox.xlow + 1,
            RrNodeKind::ChanY => self.bbox.yhigh - self.bbox.ylow + 1,
            _ => 1,
        }
    }
}
