//! Architecture data types: tile types, pins, wire segments and switches.
//!
//! These describe a reconfigurable fabric independently of any particular
//! device size. A [`DeviceGrid`](crate::DeviceGrid) places tile types onto
//! cells; the routing-graph builder turns both into routing resources.

use crate::ids::SwitchId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A side of a tile (or of the whole fabric).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Side {
    /// The upper edge (larger `y`).
    Top,
    /// The right edge (larger `x`).
    Right,
    /// The lower edge (smaller `y`).
    Bottom,
    /// The left edge (smaller `x`).
    Left,
}

impl Side {
    /// All sides in canonical enumeration order.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bottom, Side::Left];

    /// The side facing this one.
    pub fn opposite(self) -> Side {
        match self {
            Side::Top => Side::Bottom,
            Side::Right => Side::Left,
            Side::Bottom => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Position of this side in [`Side::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Top => write!(f, "TOP"),
            Side::Right => write!(f, "RIGHT"),
            Side::Bottom => write!(f, "BOTTOM"),
            Side::Left => write!(f, "LEFT"),
        }
    }
}

/// Channel orientation.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal channels.
    X,
    /// Vertical channels.
    Y,
}

/// Electrical role of a pin class.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum PinType {
    /// Pins that drive the routing network (block outputs).
    Driver,
    /// Pins that are driven by the routing network (block inputs).
    Receiver,
    /// Pins that are not connected to routing.
    Open,
}

/// A group of logically equivalent pins.
///
/// Every driver class becomes one internal-source node, every receiver class
/// one internal-sink node whose capacity is the number of pins in the class.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PinClass {
    /// Whether the class drives or receives.
    pub kind: PinType,
    /// Pin numbers belonging to this class.
    pub pins: Vec<usize>,
}

/// Physical location of one pin on a tile's footprint.
///
/// A pin may be listed on several sides; each listing yields its own pin node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinLocation {
    /// Pin number.
    pub pin: usize,
    /// Column offset within the tile.
    pub width_offset: usize,
    /// Row offset within the tile.
    pub height_offset: usize,
    /// Tile edge the pin faces.
    pub side: Side,
}

/// A placeable block type with its pin structure.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalTileType {
    /// Unique type name.
    pub name: String,
    /// Footprint width in grid cells.
    pub width: usize,
    /// Footprint height in grid cells.
    pub height: usize,
    /// Whether this is an I/O type whose pins face a single fabric side.
    #[serde(default)]
    pub is_io: bool,
    /// Pin classes.
    #[serde(default)]
    pub classes: Vec<PinClass>,
    /// Pin placement on the footprint.
    #[serde(default)]
    pub pin_locations: Vec<PinLocation>,
    /// Fraction of adjacent tracks each input pin connects to.
    #[serde(default = "default_fc")]
    pub fc_in: f32,
    /// Fraction of adjacent tracks each output pin drives.
    #[serde(default = "default_fc")]
    pub fc_out: f32,
}

fn default_fc() -> f32 {
    1.0
}

impl PhysicalTileType {
    /// The 1x1 empty type stored at index 0 of every architecture.
    pub fn empty() -> Self {
        Self {
            name: "EMPTY".to_string(),
            width: 1,
            height: 1,
            is_io: false,
            classes: Vec::new(),
            pin_locations: Vec::new(),
            fc_in: 0.0,
            fc_out: 0.0,
        }
    }

    /// Total number of pins across all classes.
    pub fn num_pins(&self) -> usize {
        self.classes.iter().map(|c| c.pins.len()).sum()
    }

    /// The class a pin belongs to.
    pub fn pin_class(&self, pin: usize) -> Option<usize> {
        self.classes.iter().position(|c| c.pins.contains(&pin))
    }

    /// The electrical role of a pin. Unclassified pins are [`PinType::Open`].
    pub fn pin_type(&self, pin: usize) -> PinType {
        self.pin_class(pin)
            .map(|c| self.classes[c].kind)
            .unwrap_or(PinType::Open)
    }

    /// Number of classes of the given kind.
    pub fn num_classes(&self, kind: PinType) -> usize {
        self.classes.iter().filter(|c| c.kind == kind).count()
    }

    /// Pins of the given kind located at `(width_offset, height_offset)` facing `side`,
    /// in ascending pin order.
    pub fn side_pins(
        &self,
        kind: PinType,
        side: Side,
        width_offset: usize,
        height_offset: usize,
    ) -> Vec<usize> {
        let mut pins: Vec<usize> = self
            .pin_locations
            .iter()
            .filter(|loc| {
                loc.side == side
                    && loc.width_offset == width_offset
                    && loc.height_offset == height_offset
                    && self.pin_type(loc.pin) == kind
            })
            .map(|loc| loc.pin)
            .collect();
        pins.sort_unstable();
        pins.dedup();
        pins
    }

    /// Footprint area in cells.
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Which channel orientations a segment type may be used in.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub enum SegmentAxis {
    /// Both horizontal and vertical channels.
    #[default]
    Both,
    /// Horizontal channels only.
    X,
    /// Vertical channels only.
    Y,
}

impl SegmentAxis {
    /// Returns `true` if segments with this axis appear in channels along `axis`.
    pub fn is_parallel_to(self, axis: Axis) -> bool {
        matches!(
            (self, axis),
            (SegmentAxis::Both, _) | (SegmentAxis::X, Axis::X) | (SegmentAxis::Y, Axis::Y)
        )
    }
}

/// A wire segment type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// Segment name.
    pub name: String,
    /// Span in grid cells. Ignored for long lines.
    pub length: usize,
    /// Relative share of channel tracks using this segment.
    pub frequency: f32,
    /// Whether the segment spans the whole channel.
    #[serde(default)]
    pub longline: bool,
    /// Channel orientations this segment is used in.
    #[serde(default)]
    pub axis: SegmentAxis,
    /// Switch used when a track drives a track of this segment.
    pub wire_switch: SwitchId,
    /// Switch used when an output pin drives a track of this segment.
    pub opin_switch: SwitchId,
    /// Metal resistance per grid cell, in ohms.
    #[serde(default)]
    pub r_per_tile: f32,
    /// Metal capacitance per grid cell, in farads.
    #[serde(default)]
    pub c_per_tile: f32,
}

/// A routing switch type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Switch {
    /// Switch name.
    pub name: String,
    /// Intrinsic delay in nanoseconds.
    pub delay_ns: f32,
    /// Whether the switch is a buffer (as opposed to a pass transistor).
    #[serde(default = "default_buffered")]
    pub buffered: bool,
}

fn default_buffered() -> bool {
    true
}
