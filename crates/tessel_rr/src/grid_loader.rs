//! Pin, source and sink node creation.

use crate::error::RrGraphError;
use crate::geometry::Fabric;
use crate::graph::RrGraph;
use crate::node::{
    BoundingBox, RrNode, RrNodeKind, IPIN_COST_INDEX, OPIN_COST_INDEX, SINK_COST_INDEX,
    SOURCE_COST_INDEX,
};
use tessel_arch::{PinType, SwitchId};

/// Creates the block-side nodes of `layer` and files them in the graph's
/// spatial index.
///
/// Tiles are visited row by row through their root cells. Sources and sinks
/// cover the whole tile footprint; pins sit on the cell and side they are
/// placed on. Afterwards every other cell of a multi-cell tile is given the
/// root's source and sink entries.
pub fn load_grid_nodes(fabric: Fabric<'_>, layer: usize, graph: &mut RrGraph) -> Result<(), RrGraphError> {
    let arch = fabric.arch;
    let zero_rc = graph.find_or_create_rc(0.0, 0.0);

    for (x, y) in fabric.grid.block_origins(layer) {
        let tile_type = fabric.tile_type(layer, x, y);
        let sides = fabric.pin_sides(layer, x, y);
        let footprint = BoundingBox::footprint(x, y, tile_type.width, tile_type.height);

        for (w, h) in footprint.cells() {
            for &side in &sides {
                for (kind, pin_type) in [(RrNodeKind::Opin, PinType::Driver), (RrNodeKind::Ipin, PinType::Receiver)] {
                    let n = tile_type.side_pins(pin_type, side, w - x, h - y).len();
                    graph.index_mut().reserve(layer, w, h, kind, n, Some(side))?;
                }
            }
        }

        for (kind, pin_type, cost_index) in [
            (RrNodeKind::Source, PinType::Driver, SOURCE_COST_INDEX),
            (RrNodeKind::Sink, PinType::Receiver, SINK_COST_INDEX),
        ] {
            for (class_index, class) in tile_type.classes.iter().enumerate() {
                if class.kind != pin_type {
                    continue;
                }
                let mut node = RrNode::new(kind, footprint, layer, class_index, arch.delayless_switch, zero_rc);
                node.capacity = class.pins.len().max(1);
                node.cost_index = cost_index;
                let id = graph.add_node(node);
                graph.index_mut().insert(layer, x, y, kind, class_index, None, id)?;
            }
        }

        for (kind, pin_type, cost_index, switch) in [
            (RrNodeKind::Opin, PinType::Driver, OPIN_COST_INDEX, arch.delayless_switch),
            (RrNodeKind::Ipin, PinType::Receiver, IPIN_COST_INDEX, arch.wire_to_ipin_switch),
        ] {
            load_pins(fabric, layer, (x, y), kind, pin_type, cost_index, switch, graph)?;
        }
    }

    for x in 0..fabric.width() {
        for y in 0..fabric.height() {
            let tile = fabric.tile(layer, x, y);
            if tile.tile_type.is_empty() || tile.is_root() {
                continue;
            }
            let root = (x - tile.width_offset, y - tile.height_offset);
            for kind in [RrNodeKind::Source, RrNodeKind::Sink] {
                graph.index_mut().mirror(layer, root, (x, y), kind, None)?;
            }
        }
    }

    log::debug!(
        "layer {layer}: loaded {} block nodes",
        graph.nodes().filter(|(_, n)| n.layer == layer && !n.kind.is_chan()).count()
    );
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn load_pins(
    fabric: Fabric<'_>,
    layer: usize,
    (x, y): (usize, usize),
    kind: RrNodeKind,
    pin_type: PinType,
    cost_index: usize,
    switch: SwitchId,
    graph: &mut RrGraph,
) -> Result<(), RrGraphError> {
    let tile_type = fabric.tile_type(layer, x, y);
    let sides = fabric.pin_sides(layer, x, y);
    let zero_rc = graph.find_or_create_rc(0.0, 0.0);
    for w in 0..tile_type.width {
        for h in 0..tile_type.height {
            for &side in &sides {
                for pin in tile_type.side_pins(pin_type, side, w, h) {
                    let mut node = RrNode::new(kind, BoundingBox::unit(x + w, y + h), layer, pin, switch, zero_rc);
                    node.cost_index = cost_index;
                    node.sides = vec![side];
                    let id = graph.add_node(node);
                    graph.index_mut().insert(layer, x + w, y + h, kind, pin, Some(side), id)?;
                }
            }
        }
    }
    Ok(())
}
