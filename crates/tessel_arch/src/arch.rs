//! The architecture container and its lookup queries.

use crate::error::ArchError;
use crate::ids::{SegmentId, SwitchId, TileTypeId};
use crate::layout::{GridLayout, LayoutKind};
use crate::types::{Axis, PhysicalTileType, Segment, Switch};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A complete fabric description: tile types, wire segments, switches and
/// the grid layouts the device may be built with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Architecture {
    /// Architecture name.
    pub name: String,
    /// Tile types; index 0 is always the empty type.
    pub tile_types: Vec<PhysicalTileType>,
    /// Unified segment catalog for both channel orientations.
    pub segments: Vec<Segment>,
    /// Switch types.
    pub switches: Vec<Switch>,
    /// Zero-delay switch used for source/sink connections.
    pub delayless_switch: SwitchId,
    /// Switch from a routing track into an input pin.
    pub wire_to_ipin_switch: SwitchId,
    /// Grid layouts, looked up by name.
    #[serde(default)]
    pub layouts: Vec<GridLayout>,
}

impl Architecture {
    /// The tile type with the given ID.
    pub fn tile_type(&self, id: TileTypeId) -> &PhysicalTileType {
        &self.tile_types[id.index()]
    }

    /// Looks up a tile type by name.
    pub fn tile_type_by_name(&self, name: &str) -> Option<TileTypeId> {
        self.tile_types
            .iter()
            .position(|t| t.name == name)
            .map(|i| TileTypeId::from_raw(i as u32))
    }

    /// The segment with the given unified ID.
    pub fn segment(&self, id: SegmentId) -> &Segment {
        &self.segments[id.index()]
    }

    /// The switch with the given ID.
    pub fn switch(&self, id: SwitchId) -> &Switch {
        &self.switches[id.index()]
    }

    /// Unified IDs of the segments used in channels along `axis`.
    ///
    /// The position of an ID in the returned list is its parallel index,
    /// which selects the wire's cost index.
    pub fn parallel_segments(&self, axis: Axis) -> Vec<SegmentId> {
        self.segments
            .iter()
            .enumerate()
            .filter(|(_, s)| s.axis.is_parallel_to(axis))
            .map(|(i, _)| SegmentId::from_raw(i as u32))
            .collect()
    }

    /// Looks up a grid layout by name.
    pub fn layout(&self, name: &str) -> Option<&GridLayout> {
        self.layouts.iter().find(|l| l.name == name)
    }

    /// Names of all grid layouts, quoted and comma separated.
    pub fn layout_names(&self) -> String {
        self.layouts
            .iter()
            .map(|l| format!("'{}'", l.name))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Checks internal consistency: the empty type at index 0, pin references,
    /// switch references and segment lengths.
    pub fn validate(&self) -> Result<(), ArchError> {
        let invalid = |reason: String| ArchError::Invalid {
            arch: self.name.clone(),
            reason,
        };
        match self.tile_types.first() {
            Some(t) if t.width == 1 && t.height == 1 && t.classes.is_empty() => {}
            _ => return Err(invalid("tile type 0 must be a 1x1 empty type".to_string())),
        }
        for tile in &self.tile_types {
            if tile.width == 0 || tile.height == 0 {
                return Err(invalid(format!("tile type '{}' has a zero dimension", tile.name)));
            }
            for loc in &tile.pin_locations {
                if loc.width_offset >= tile.width || loc.height_offset >= tile.height {
                    return Err(invalid(format!(
                        "pin {} of '{}' is placed outside the tile footprint",
                        loc.pin, tile.name
                    )));
                }
                if tile.pin_class(loc.pin).is_none() {
                    return Err(invalid(format!(
                        "pin {} of '{}' belongs to no pin class",
                        loc.pin, tile.name
                    )));
                }
            }
        }
        let num_switches = self.switches.len();
        let bad_switch = |id: SwitchId| id.index() >= num_switches;
        if bad_switch(self.delayless_switch) || bad_switch(self.wire_to_ipin_switch) {
            return Err(invalid("architecture switch refers to an unknown switch".to_string()));
        }
        for seg in &self.segments {
            if !seg.longline && seg.length == 0 {
                return Err(invalid(format!("segment '{}' has zero length", seg.name)));
            }
            if bad_switch(seg.wire_switch) || bad_switch(seg.opin_switch) {
                return Err(invalid(format!("segment '{}' refers to an unknown switch", seg.name)));
            }
        }
        for layout in &self.layouts {
            if let LayoutKind::Auto { aspect_ratio } = layout.kind {
                if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
                    return Err(invalid(format!(
                        "layout '{}' has invalid aspect ratio {aspect_ratio}",
                        layout.name
                    )));
                }
            }
        }
        for axis in [Axis::X, Axis::Y] {
            if self.parallel_segments(axis).is_empty() {
                return Err(invalid(format!("no segment is usable along the {axis:?} axis")));
            }
        }
        Ok(())
    }

    /// Loads an architecture from a `.toml` or `.json` file and validates it.
    pub fn from_file(path: &Path) -> Result<Self, ArchError> {
        let text = std::fs::read_to_string(path).map_err(|source| ArchError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let parse_err = |reason: String| ArchError::Parse {
            path: path.to_path_buf(),
            reason,
        };
        let arch: Architecture = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
            _ => toml::from_str(&text).map_err(|e| parse_err(e.to_string()))?,
        };
        arch.validate()?;
        Ok(arch)
    }
}
