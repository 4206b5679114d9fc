//! Built-in reference architectures.
//!
//! `k4_n4` is a homogeneous island fabric: an I/O ring around a core of
//! single-cell logic blocks. `hetero` adds a column of 1x2 multipliers and a
//! column of 2x2 memories, and mixes length-1 and length-4 wires.

use crate::ids::SwitchId;
use crate::layout::{GridLayout, GridLocDef, RegionSpec};
use crate::types::{
    PhysicalTileType, PinClass, PinLocation, PinType, Segment, SegmentAxis, Side, Switch,
};
use crate::Architecture;

const DELAYLESS: SwitchId = SwitchId::from_raw(0);
const MUX: SwitchId = SwitchId::from_raw(1);
const IPIN_CBLOCK: SwitchId = SwitchId::from_raw(2);

fn switches() -> Vec<Switch> {
    vec![
        Switch {
            name: "__delayless__".to_string(),
            delay_ns: 0.0,
            buffered: true,
        },
        Switch {
            name: "mux".to_string(),
            delay_ns: 0.12,
            buffered: true,
        },
        Switch {
            name: "ipin_cblock".to_string(),
            delay_ns: 0.08,
            buffered: true,
        },
    ]
}

fn segment(name: &str, length: usize, frequency: f32) -> Segment {
    Segment {
        name: name.to_string(),
        length,
        frequency,
        longline: false,
        axis: SegmentAxis::Both,
        wire_switch: MUX,
        opin_switch: MUX,
        r_per_tile: 100.0,
        c_per_tile: 1.5e-14,
    }
}

fn pin(pin: usize, width_offset: usize, height_offset: usize, side: Side) -> PinLocation {
    PinLocation {
        pin,
        width_offset,
        height_offset,
        side,
    }
}

fn io() -> PhysicalTileType {
    // Pad pins are listed on every side; the grid loader keeps only the side
    // facing the fabric interior.
    let pin_locations = Side::ALL
        .into_iter()
        .flat_map(|side| [pin(0, 0, 0, side), pin(1, 0, 0, side)])
        .collect();
    PhysicalTileType {
        name: "io".to_string(),
        width: 1,
        height: 1,
        is_io: true,
        classes: vec![
            PinClass {
                kind: PinType::Receiver,
                pins: vec![0],
            },
            PinClass {
                kind: PinType::Driver,
                pins: vec![1],
            },
        ],
        pin_locations,
        fc_in: 1.0,
        fc_out: 1.0,
    }
}

fn clb() -> PhysicalTileType {
    PhysicalTileType {
        name: "clb".to_string(),
        width: 1,
        height: 1,
        is_io: false,
        classes: vec![
            PinClass {
                kind: PinType::Receiver,
                pins: vec![0, 1, 2, 3],
            },
            PinClass {
                kind: PinType::Driver,
                pins: vec![4],
            },
        ],
        pin_locations: vec![
            pin(0, 0, 0, Side::Top),
            pin(1, 0, 0, Side::Right),
            pin(2, 0, 0, Side::Bottom),
            pin(3, 0, 0, Side::Left),
            pin(4, 0, 0, Side::Right),
            pin(4, 0, 0, Side::Bottom),
        ],
        fc_in: 0.5,
        fc_out: 0.5,
    }
}

fn mult() -> PhysicalTileType {
    PhysicalTileType {
        name: "mult".to_string(),
        width: 1,
        height: 2,
        is_io: false,
        classes: vec![
            PinClass {
                kind: PinType::Receiver,
                pins: vec![0, 1],
            },
            PinClass {
                kind: PinType::Receiver,
                pins: vec![2, 3],
            },
            PinClass {
                kind: PinType::Driver,
                pins: vec![4, 5],
            },
        ],
        pin_locations: vec![
            pin(0, 0, 0, Side::Left),
            pin(1, 0, 1, Side::Left),
            pin(2, 0, 0, Side::Bottom),
            pin(3, 0, 1, Side::Top),
            pin(4, 0, 0, Side::Right),
            pin(5, 0, 1, Side::Right),
        ],
        fc_in: 0.5,
        fc_out: 0.5,
    }
}

fn mem() -> PhysicalTileType {
    PhysicalTileType {
        name: "mem".to_string(),
        width: 2,
        height: 2,
        is_io: false,
        classes: vec![
            PinClass {
                kind: PinType::Receiver,
                pins: vec![0, 1, 2, 3],
            },
            PinClass {
                kind: PinType::Driver,
                pins: vec![4, 5],
            },
        ],
        pin_locations: vec![
            pin(0, 0, 0, Side::Bottom),
            pin(1, 1, 0, Side::Bottom),
            pin(2, 0, 1, Side::Top),
            pin(3, 1, 1, Side::Top),
            pin(4, 1, 0, Side::Right),
            pin(5, 1, 1, Side::Right),
        ],
        fc_in: 0.5,
        fc_out: 0.5,
    }
}

/// I/O ring with empty corners around a logic-filled core.
fn io_ring_defs() -> Vec<GridLocDef> {
    let mut defs = GridLocDef::perimeter("io", 100);
    defs.extend(GridLocDef::corners("EMPTY", 101));
    defs.push(GridLocDef::fill("clb", 10));
    defs
}

/// Homogeneous fabric: I/O ring, 1x1 logic blocks, length-4 wires.
pub fn k4_n4() -> Architecture {
    let defs = io_ring_defs();
    Architecture {
        name: "k4_n4".to_string(),
        tile_types: vec![PhysicalTileType::empty(), io(), clb()],
        segments: vec![segment("L4", 4, 1.0)],
        switches: switches(),
        delayless_switch: DELAYLESS,
        wire_to_ipin_switch: IPIN_CBLOCK,
        layouts: vec![
            GridLayout::fixed("fixed_5x5", 5, 5, defs.clone()),
            GridLayout::fixed("fixed_8x8", 8, 8, defs.clone()),
            GridLayout::auto("auto", 1.0, defs),
        ],
    }
}

/// Heterogeneous fabric with multiplier and memory columns and two wire lengths.
pub fn hetero() -> Architecture {
    let mut defs = io_ring_defs();
    defs.push(GridLocDef::col("mult", 20, "2", Some("5")));
    defs.push(GridLocDef::region(
        "mem",
        20,
        RegionSpec::new("4", "5", "w").repeat("8"),
        RegionSpec::new("1", "H - 2", "h"),
    ));
    Architecture {
        name: "hetero".to_string(),
        tile_types: vec![PhysicalTileType::empty(), io(), clb(), mult(), mem()],
        segments: vec![segment("L1", 1, 0.5), segment("L4", 4, 0.5)],
        switches: switches(),
        delayless_switch: DELAYLESS,
        wire_to_ipin_switch: IPIN_CBLOCK,
        layouts: vec![
            GridLayout::fixed("fixed_10x10", 10, 10, defs.clone()),
            GridLayout::auto("auto", 1.0, defs),
        ],
    }
}
