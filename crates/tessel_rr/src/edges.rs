//! Edge materialization.
//!
//! Turns the finished node layout and the switch block table into graph
//! edges: sources drive their output pins, input pins drive their sinks,
//! output pins drive a fraction of the wires starting next to them, wires
//! passing an input pin drive it, and terminating wires drive the wires the
//! switch block table lists.

use crate::error::RrGraphError;
use crate::geometry::Fabric;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::node::RrNodeKind;
use crate::options::RrGraphOptions;
use crate::switchblock::{sb_side_channel, SwitchBlockTable};
use tessel_arch::{PinType, Side};
use tessel_common::InternalError;

/// The channel position a pin on `side` of cell `(x, y)` connects to.
pub fn pin_channel(width: usize, height: usize, x: usize, y: usize, side: Side) -> Option<(RrNodeKind, usize, usize)> {
    let (kind, cx, cy) = match side {
        Side::Top => (RrNodeKind::ChanX, x, y),
        Side::Bottom => (RrNodeKind::ChanX, x, y.checked_sub(1)?),
        Side::Right => (RrNodeKind::ChanY, x, y),
        Side::Left => (RrNodeKind::ChanY, x.checked_sub(1)?, y),
    };
    (cx < width && cy < height).then_some((kind, cx, cy))
}

/// `ceil(fraction * n)` distinct indices out of `0..n`, evenly spaced and
/// shifted by `offset`.
pub fn spread(n: usize, fraction: f32, offset: usize) -> Vec<usize> {
    if n == 0 || fraction <= 0.0 {
        return Vec::new();
    }
    let num = ((f64::from(fraction) * n as f64).ceil() as usize).clamp(1, n);
    (0..num).map(|i| (offset + i * n / num) % n).collect()
}

/// Creates every edge of `layer`.
pub fn build_edges(
    fabric: Fabric<'_>,
    layer: usize,
    options: &RrGraphOptions,
    table: &SwitchBlockTable,
    graph: &mut RrGraph,
) -> Result<(), RrGraphError> {
    let before = graph.num_edges();
    build_pin_edges(fabric, layer, options, graph)?;
    build_track_edges(layer, table, graph)?;
    log::debug!("layer {layer}: created {} edges", graph.num_edges() - before);
    Ok(())
}

fn build_pin_edges(
    fabric: Fabric<'_>,
    layer: usize,
    options: &RrGraphOptions,
    graph: &mut RrGraph,
) -> Result<(), RrGraphError> {
    let arch = fabric.arch;
    let (width, height) = (fabric.width(), fabric.height());

    for (x, y) in fabric.grid.block_origins(layer) {
        let tile_type = fabric.tile_type(layer, x, y);
        let fc_in = options.fc_in.unwrap_or(tile_type.fc_in);
        let fc_out = options.fc_out.unwrap_or(tile_type.fc_out);
        let sides = fabric.pin_sides(layer, x, y);

        for w in 0..tile_type.width {
            for h in 0..tile_type.height {
                let (px, py) = (x + w, y + h);
                for &side in &sides {
                    let channel = pin_channel(width, height, px, py, side);

                    for pin in tile_type.side_pins(PinType::Driver, side, w, h) {
                        let opin = find_pin(graph, layer, px, py, RrNodeKind::Opin, pin, side)?;
                        let source = find_class(graph, fabric, layer, (x, y), RrNodeKind::Source, pin)?;
                        graph.add_edge(source, opin, arch.delayless_switch);

                        let Some((kind, cx, cy)) = channel else { continue };
                        let driven: Vec<RrNodeId> = graph
                            .index()
                            .find_at(layer, cx, cy, kind, None)
                            .into_iter()
                            .filter(|&id| {
                                let end = graph.node(id).driving_end();
                                (end.x, end.y) == (cx, cy)
                            })
                            .collect();
                        for i in spread(driven.len(), fc_out, pin) {
                            let wire = driven[i];
                            let switch = match graph.node(wire).segment {
                                Some(seg) => arch.segment(seg).opin_switch,
                                None => graph.node(wire).driver_switch,
                            };
                            graph.add_edge(opin, wire, switch);
                        }
                    }

                    for pin in tile_type.side_pins(PinType::Receiver, side, w, h) {
                        let ipin = find_pin(graph, layer, px, py, RrNodeKind::Ipin, pin, side)?;
                        let sink = find_class(graph, fabric, layer, (x, y), RrNodeKind::Sink, pin)?;
                        graph.add_edge(ipin, sink, arch.delayless_switch);

                        let Some((kind, cx, cy)) = channel else { continue };
                        let passing = graph.index().find_at(layer, cx, cy, kind, None);
                        for i in spread(passing.len(), fc_in, pin) {
                            graph.add_edge(passing[i], ipin, arch.wire_to_ipin_switch);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn build_track_edges(layer: usize, table: &SwitchBlockTable, graph: &mut RrGraph) -> Result<(), RrGraphError> {
    let (width, height) = (graph.width(), graph.height());
    for (key, edges) in table.iter().filter(|(k, _)| k.layer == layer) {
        let (Some(from), Some(to)) = (
            sb_side_channel(width, height, key.x, key.y, key.from_side),
            sb_side_channel(width, height, key.x, key.y, key.to_side),
        ) else {
            continue;
        };
        for edge in edges {
            let src = graph.index().find(edge.from_layer, from.1, from.2, from.0, edge.from_track, None);
            let dst = graph.index().find(edge.to_layer, to.1, to.2, to.0, edge.to_track, None);
            match (src, dst) {
                (Some(src), Some(dst)) => {
                    graph.add_edge(src, dst, edge.switch);
                }
                _ => {
                    return Err(InternalError::new(format!(
                        "switch block ({},{}) {}->{} refers to a missing track",
                        key.x, key.y, key.from_side, key.to_side
                    ))
                    .into())
                }
            }
        }
    }
    Ok(())
}

fn find_pin(
    graph: &RrGraph,
    layer: usize,
    x: usize,
    y: usize,
    kind: RrNodeKind,
    pin: usize,
    side: Side,
) -> Result<RrNodeId, RrGraphError> {
    graph
        .index()
        .find(layer, x, y, kind, pin, Some(side))
        .ok_or_else(|| InternalError::new(format!("no {kind} node for pin {pin} at ({x},{y}) {side}")).into())
}

fn find_class(
    graph: &RrGraph,
    fabric: Fabric<'_>,
    layer: usize,
    (x, y): (usize, usize),
    kind: RrNodeKind,
    pin: usize,
) -> Result<RrNodeId, RrGraphError> {
    let class = fabric
        .tile_type(layer, x, y)
        .pin_class(pin)
        .ok_or_else(|| InternalError::new(format!("pin {pin} at ({x},{y}) belongs to no class")))?;
    graph
        .index()
        .find(layer, x, y, kind, class, None)
        .ok_or_else(|| InternalError::new(format!("no {kind} node for class {class} at ({x},{y})")).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chan_loader::load_chan_nodes;
    use crate::grid_loader::load_grid_nodes;
    use crate::options::ChannelOptions;
    use crate::switchblock::build_switch_blocks;
    use tessel_arch::{builtin, create_device_grid, Architecture, DeviceGrid};
    use tessel_common::GridLoc;
    use tessel_diagnostics::DiagnosticSink;

    fn built(arch: &Architecture, grid: &DeviceGrid, options: &RrGraphOptions) -> RrGraph {
        let fabric = Fabric::new(arch, grid);
        let mut graph = RrGraph::new(1, grid.width(), grid.height());
        load_grid_nodes(fabric, 0, &mut graph).unwrap();
        load_chan_nodes(fabric, 0, &options.channels, &mut graph).unwrap();
        let mut table = SwitchBlockTable::new();
        build_switch_blocks(arch, &graph, 0, options.switch_block, &mut table);
        build_edges(fabric, 0, options, &table, &mut graph).unwrap();
        graph
    }

    #[test]
    fn pin_channels() {
        assert_eq!(pin_channel(5, 5, 2, 2, Side::Top), Some((RrNodeKind::ChanX, 2, 2)));
        assert_eq!(pin_channel(5, 5, 2, 2, Side::Bottom), Some((RrNodeKind::ChanX, 2, 1)));
        assert_eq!(pin_channel(5, 5, 2, 2, Side::Left), Some((RrNodeKind::ChanY, 1, 2)));
        assert_eq!(pin_channel(5, 5, 0, 2, Side::Left), None);
        assert_eq!(pin_channel(5, 5, 2, 0, Side::Bottom), None);
    }

    #[test]
    fn spread_is_even_and_distinct() {
        assert_eq!(spread(8, 0.5, 0), vec![0, 2, 4, 6]);
        assert_eq!(spread(8, 0.5, 1), vec![1, 3, 5, 7]);
        assert_eq!(spread(3, 0.1, 0), vec![0]);
        assert_eq!(spread(4, 1.0, 2), vec![2, 3, 0, 1]);
        assert!(spread(0, 1.0, 0).is_empty());
        assert!(spread(4, 0.0, 0).is_empty());
    }

    #[test]
    fn clb_connectivity() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let options = RrGraphOptions {
            channels: ChannelOptions::uniform(4),
            ..RrGraphOptions::default()
        };
        let graph = built(&arch, &grid, &options);
        let index = graph.index();

        let source = index.find(0, 2, 2, RrNodeKind::Source, 1, None).unwrap();
        let opins: Vec<RrNodeId> = graph.successors(source).collect();
        assert_eq!(opins.len(), 2);
        for opin in opins {
            assert_eq!(graph.node(opin).kind, RrNodeKind::Opin);
            // Output pins only drive wires that start next to them.
            for wire in graph.successors(opin) {
                let node = graph.node(wire);
                assert!(node.kind.is_chan());
                let end = node.driving_end();
                assert!(end.manhattan(GridLoc::new(2, 2)) <= 1);
            }
        }

        let sink = index.find(0, 2, 2, RrNodeKind::Sink, 0, None).unwrap();
        assert_eq!(graph.fan_in(sink).len(), 4);
        for ipin in graph.predecessors(sink) {
            assert_eq!(graph.node(ipin).kind, RrNodeKind::Ipin);
            // Four tracks pass each pin, half of them connect.
            assert_eq!(graph.fan_in(ipin).len(), 2);
        }
    }

    #[test]
    fn wires_drive_wires() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_8x8", &DiagnosticSink::new()).unwrap();
        let options = RrGraphOptions {
            channels: ChannelOptions::uniform(8),
            ..RrGraphOptions::default()
        };
        let graph = built(&arch, &grid, &options);
        let wire_to_wire = graph
            .edges()
            .iter()
            .filter(|e| graph.node(e.src).kind.is_chan() && graph.node(e.sink).kind.is_chan())
            .count();
        assert!(wire_to_wire > 0);
        for e in graph.edges() {
            let (src, dst) = (graph.node(e.src), graph.node(e.sink));
            if src.kind.is_chan() && dst.kind.is_chan() {
                // The driving wire ends where the driven wire starts, one switch block apart.
                assert!(src.far_end().manhattan(dst.driving_end()) <= 2);
                assert_eq!(e.switch, arch.segments[0].wire_switch);
            }
        }
    }

    #[test]
    fn fc_override_applies() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
        let mut options = RrGraphOptions {
            channels: ChannelOptions::uniform(4),
            ..RrGraphOptions::default()
        };
        options.fc_in = Some(1.0);
        let graph = built(&arch, &grid, &options);
        let ipin = graph
            .index()
            .find(0, 2, 2, RrNodeKind::Ipin, 0, Some(Side::Top))
            .unwrap();
        assert_eq!(graph.fan_in(ipin).len(), 4);
    }
}
