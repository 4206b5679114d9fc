//! Wire node creation.
//!
//! Each channel run is walked in ascending coordinate order. At every built
//! position a [`ChannelDetail`] is laid out; identities of the wires that
//! continue from the previous position are carried over by rotating them one
//! track (increasing wires towards higher tracks, decreasing wires towards
//! lower ones), then each track either creates a node, closes one, or extends
//! one across this position.

use crate::annotation::ShrinkBoundary;
use crate::chan_detail::{ChannelDetail, SegmentCatalog};
use crate::error::RrGraphError;
use crate::geometry::Fabric;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::node::{BoundingBox, Direction, RrNode, RrNodeKind, TrackSlot, CHANX_COST_INDEX_START};
use crate::options::ChannelOptions;
use tessel_arch::Axis;
use tessel_common::InternalError;

/// Creates every wire node of `layer`, puts decreasing wires' track lists in
/// travel order and files all wires in the spatial index.
pub fn load_chan_nodes(
    fabric: Fabric<'_>,
    layer: usize,
    options: &ChannelOptions,
    graph: &mut RrGraph,
) -> Result<(), RrGraphError> {
    let boundary = ShrinkBoundary::from_grid(fabric.grid, layer);
    let first = graph.num_nodes();
    let num_x_segments = fabric.arch.parallel_segments(Axis::X).len();

    for axis in [Axis::X, Axis::Y] {
        let catalog = SegmentCatalog::parallel(fabric.arch, axis);
        if catalog.is_empty() && options.chan_width(axis) > 0 {
            return Err(RrGraphError::NoSegments { axis });
        }
        let cost_offset = match axis {
            Axis::X => CHANX_COST_INDEX_START,
            Axis::Y => CHANX_COST_INDEX_START + num_x_segments,
        };
        let loader = RunLoader {
            fabric,
            layer,
            axis,
            catalog: &catalog,
            options,
            boundary: &boundary,
            cost_offset,
        };
        for run in fabric.channel_runs(axis) {
            loader.load_run(&run, graph)?;
        }
    }

    let created: Vec<RrNodeId> = (first..graph.num_nodes())
        .map(|i| RrNodeId::from_raw(i as u32))
        .collect();
    for &id in &created {
        let node = graph.node_mut(id);
        if node.direction == Some(Direction::Dec) {
            node.tracks.reverse();
        }
    }
    register_chan_nodes(graph, &created)?;

    log::debug!("layer {layer}: loaded {} wire nodes", created.len());
    Ok(())
}

/// Files every track slot of the given wires in the spatial index.
fn register_chan_nodes(graph: &mut RrGraph, wires: &[RrNodeId]) -> Result<(), RrGraphError> {
    let (nodes, index) = graph.split_mut();
    for &id in wires {
        let node = &nodes[id.index()];
        for slot in &node.tracks {
            let (x, y) = match node.kind {
                RrNodeKind::ChanX => (slot.coord, node.bbox.ylow),
                _ => (node.bbox.xlow, slot.coord),
            };
            index.insert(node.layer, x, y, node.kind, slot.track, None, id)?;
        }
    }
    Ok(())
}

struct RunLoader<'a> {
    fabric: Fabric<'a>,
    layer: usize,
    axis: Axis,
    catalog: &'a SegmentCatalog<'a>,
    options: &'a ChannelOptions,
    boundary: &'a ShrinkBoundary,
    cost_offset: usize,
}

impl RunLoader<'_> {
    fn detail(&self, force_start: bool, force_end: bool) -> ChannelDetail {
        ChannelDetail::build_unidir(
            self.options.chan_width(self.axis),
            &self.catalog.segments,
            self.fabric.chan_length(self.axis),
            force_start,
            force_end,
        )
    }

    fn load_run(&self, run: &[(usize, usize)], graph: &mut RrGraph) -> Result<(), RrGraphError> {
        let mut prev_ids: Vec<Option<RrNodeId>> = Vec::new();
        for &(x, y) in run {
            let Some(pos) = self
                .fabric
                .channel_position(self.layer, self.axis, x, y, self.options, self.boundary)
            else {
                // A cut always forces a start at the next built position.
                prev_ids.clear();
                continue;
            };

            let mut detail = self.detail(pos.force_start, pos.force_end);
            if !prev_ids.is_empty() {
                let mut typical = self.detail(false, false);
                typical.set_node_ids(&prev_ids);
                typical.rotate_node_ids(1, Direction::Inc, true);
                typical.rotate_node_ids(1, Direction::Dec, false);
                detail.set_node_ids(&typical.node_ids());
            }

            self.load_position(&mut detail, x, y, graph)?;
            prev_ids = detail.node_ids();
        }
        Ok(())
    }

    fn load_position(
        &self,
        detail: &mut ChannelDetail,
        x: usize,
        y: usize,
        graph: &mut RrGraph,
    ) -> Result<(), RrGraphError> {
        let kind = RrNodeKind::chan(self.axis);
        let coord = match self.axis {
            Axis::X => x,
            Axis::Y => y,
        };

        for itrack in 0..detail.len() {
            let track = *detail.track(itrack);
            let slot = TrackSlot { coord, track: itrack };

            if track.creates_node() {
                let seg_index = track.segment;
                let seg = self.catalog.segments[seg_index];
                let rc = graph.find_or_create_rc(seg.r_per_tile, seg.c_per_tile);
                let mut node = RrNode::new(kind, BoundingBox::unit(x, y), self.layer, itrack, seg.opin_switch, rc);
                node.direction = Some(track.direction);
                node.segment = Some(self.catalog.ids[seg_index]);
                node.cost_index = self.cost_offset + seg_index;
                node.tracks.push(slot);
                let id = graph.add_node(node);
                detail.set_node(itrack, id);
            }

            let id = detail.track(itrack).node.ok_or_else(|| {
                InternalError::new(format!(
                    "{kind} track {itrack} at ({x},{y}) layer {} continues no wire",
                    self.layer
                ))
            })?;
            let node = graph.node_mut(id);

            if track.closes_node() {
                let low = match self.axis {
                    Axis::X => node.bbox.xlow,
                    Axis::Y => node.bbox.ylow,
                };
                self.set_high(node, coord);
                if coord > low {
                    node.tracks.push(slot);
                }
            }

            if track.start || track.end {
                continue;
            }
            self.set_high(node, coord);
            node.tracks.push(slot);
        }
        Ok(())
    }

    fn set_high(&self, node: &mut RrNode, coord: usize) {
        match self.axis {
            Axis::X => node.bbox.xhigh = coord,
            Axis::Y => node.bbox.yhigh = coord,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::estimate_rr_nodes;
    use tessel_arch::{builtin, create_device_grid, Architecture, DeviceGrid};
    use tessel_diagnostics::DiagnosticSink;

    fn load(arch: &Architecture, grid: &DeviceGrid, options: &ChannelOptions) -> RrGraph {
        let mut graph = RrGraph::new(grid.num_layers(), grid.width(), grid.height());
        load_chan_nodes(Fabric::new(arch, grid), 0, options, &mut graph).unwrap();
        graph
    }

    fn k4n4(layout: &str) -> (Architecture, DeviceGrid) {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, layout, &DiagnosticSink::new()).unwrap();
        (arch, grid)
    }

    #[test]
    fn counts_match_estimate() {
        for (arch, layout) in [(builtin::k4_n4(), "fixed_8x8"), (builtin::hetero(), "fixed_10x10")] {
            let grid = create_device_grid(&arch, layout, &DiagnosticSink::new()).unwrap();
            for through_channel in [false, true] {
                let mut opts = ChannelOptions::uniform(10);
                opts.through_channel = through_channel;
                let graph = load(&arch, &grid, &opts);
                let estimate = estimate_rr_nodes(Fabric::new(&arch, &grid), 0, &opts);
                let actual = graph.node_counts(0);
                assert_eq!(actual[RrNodeKind::ChanX], estimate[RrNodeKind::ChanX], "{layout}");
                assert_eq!(actual[RrNodeKind::ChanY], estimate[RrNodeKind::ChanY], "{layout}");
            }
        }
    }

    /// A 12x12 device whose blocks only cover columns and rows 3..=8, with
    /// a 2x2 memory and two multi-height multipliers among the logic blocks.
    fn island() -> (Architecture, DeviceGrid) {
        let arch = builtin::hetero();
        let mut grid = DeviceGrid::new("island", 12, 12, 1);
        let id = |name: &str| arch.tile_type_by_name(name).unwrap();
        grid.place_block(0, 3, 3, id("mem"), 2, 2);
        grid.place_block(0, 6, 3, id("mult"), 1, 2);
        grid.place_block(0, 8, 6, id("mult"), 1, 2);
        for x in 3..=8 {
            for y in 3..=8 {
                if grid.tile(0, x, y).tile_type.is_empty() {
                    grid.place_block(0, x, y, id("clb"), 1, 1);
                }
            }
        }
        (arch, grid)
    }

    #[test]
    fn island_counts_match_estimate() {
        let (arch, grid) = island();
        let mut full = 0;
        for shrink_boundary in [false, true] {
            for through_channel in [false, true] {
                let opts = ChannelOptions {
                    shrink_boundary,
                    through_channel,
                    ..ChannelOptions::uniform(8)
                };
                let graph = load(&arch, &grid, &opts);
                let estimate = estimate_rr_nodes(Fabric::new(&arch, &grid), 0, &opts);
                let actual = graph.node_counts(0);
                let label = format!("shrink={shrink_boundary} through={through_channel}");
                assert_eq!(actual[RrNodeKind::ChanX], estimate[RrNodeKind::ChanX], "{label}");
                assert_eq!(actual[RrNodeKind::ChanY], estimate[RrNodeKind::ChanY], "{label}");
                graph.check().unwrap();
                if !shrink_boundary && !through_channel {
                    full = actual.total();
                } else if shrink_boundary && !through_channel {
                    assert!(actual.total() < full, "{label}");
                }
            }
        }
    }

    #[test]
    fn shrunk_wires_stay_inside_the_island() {
        let (arch, grid) = island();
        let opts = ChannelOptions {
            shrink_boundary: true,
            ..ChannelOptions::uniform(8)
        };
        let graph = load(&arch, &grid, &opts);
        assert!(graph.num_nodes() > 0);
        for (_, node) in graph.nodes() {
            assert!(node.bbox.xlow >= 3 && node.bbox.xhigh <= 8, "{:?}", node.bbox);
            assert!(node.bbox.ylow >= 3 && node.bbox.yhigh <= 8, "{:?}", node.bbox);
        }
    }

    #[test]
    fn wires_cover_their_span_once() {
        let (arch, grid) = k4n4("fixed_8x8");
        let graph = load(&arch, &grid, &ChannelOptions::uniform(8));
        graph.check().unwrap();
        for (_, node) in graph.nodes() {
            assert_eq!(node.tracks.len(), node.length());
        }
    }

    #[test]
    fn length_four_wires_twist() {
        let (arch, grid) = k4n4("fixed_8x8");
        // Four pairs of a length-4 segment: full groups of four tracks.
        let graph = load(&arch, &grid, &ChannelOptions::uniform(8));
        let index = graph.index();
        // Row 2, starting at x = 2 on track 0 (the run starts at x = 1).
        let id = index.find(0, 2, 2, RrNodeKind::ChanX, 0, None).unwrap();
        let node = graph.node(id);
        assert_eq!(node.direction, Some(Direction::Inc));
        assert_eq!((node.bbox.xlow, node.bbox.xhigh), (2, 5));
        assert_eq!(node.track_ids(), vec![0, 2, 4, 6]);
        for slot in &node.tracks {
            assert_eq!(index.find(0, slot.coord, 2, RrNodeKind::ChanX, slot.track, None), Some(id));
        }
    }

    #[test]
    fn decreasing_wires_are_in_travel_order() {
        let (arch, grid) = k4n4("fixed_8x8");
        let graph = load(&arch, &grid, &ChannelOptions::uniform(8));
        let mut checked = 0;
        for (_, node) in graph.nodes() {
            if node.direction != Some(Direction::Dec) || node.length() < 2 {
                continue;
            }
            let coords: Vec<usize> = node.tracks.iter().map(|s| s.coord).collect();
            assert!(coords.windows(2).all(|w| w[0] > w[1]), "{coords:?}");
            let ascending: Vec<usize> = node.track_nums_by_coordinate().iter().map(|s| s.coord).collect();
            assert!(ascending.windows(2).all(|w| w[0] < w[1]));
            // Travelling downwards, a decreasing wire twists to higher tracks.
            let tracks = node.track_ids();
            assert!(tracks.windows(2).all(|w| w[1] == w[0] + 2), "{tracks:?}");
            checked += 1;
        }
        assert!(checked > 0);
    }

    #[test]
    fn adjacent_positions_share_identity() {
        let (arch, grid) = k4n4("fixed_8x8");
        let graph = load(&arch, &grid, &ChannelOptions::uniform(8));
        let index = graph.index();
        // An increasing wire on track t at x continues on track t + 2 at x + 1
        // unless it ends at x.
        for x in 1..5 {
            for t in [0usize, 2, 4] {
                let here = index.find(0, x, 3, RrNodeKind::ChanX, t, None).unwrap();
                let node = graph.node(here);
                if node.bbox.xhigh > x {
                    assert_eq!(index.find(0, x + 1, 3, RrNodeKind::ChanX, t + 2, None), Some(here));
                    assert!(node.bbox.xlow <= x && node.bbox.xhigh >= x + 1);
                }
            }
        }
    }

    #[test]
    fn through_channel_crosses_multi_height_tiles() {
        let arch = builtin::hetero();
        let grid = create_device_grid(&arch, "fixed_10x10", &DiagnosticSink::new()).unwrap();
        let blocked = load(&arch, &grid, &ChannelOptions::uniform(8));
        // The multiplier at (2, 2) covers rows 2-3: no horizontal channel between them.
        assert!(blocked.index().find_at(0, 2, 2, RrNodeKind::ChanX, None).is_empty());
        let mut opts = ChannelOptions::uniform(8);
        opts.through_channel = true;
        let through = load(&arch, &grid, &opts);
        assert_eq!(through.index().find_at(0, 2, 2, RrNodeKind::ChanX, None).len(), 8);
    }

    #[test]
    fn missing_segments_are_fatal() {
        let (mut arch, grid) = k4n4("fixed_5x5");
        arch.segments[0].axis = tessel_arch::SegmentAxis::X;
        let mut graph = RrGraph::new(1, 5, 5);
        let err = load_chan_nodes(Fabric::new(&arch, &grid), 0, &ChannelOptions::uniform(4), &mut graph)
            .unwrap_err();
        assert!(matches!(err, RrGraphError::NoSegments { axis: Axis::Y }));
    }

    #[test]
    fn vertical_cost_indices_follow_horizontal() {
        let arch = builtin::hetero();
        let grid = create_device_grid(&arch, "fixed_10x10", &DiagnosticSink::new()).unwrap();
        let graph = load(&arch, &grid, &ChannelOptions::uniform(8));
        let mut costs: Vec<(RrNodeKind, usize)> = graph.nodes().map(|(_, n)| (n.kind, n.cost_index)).collect();
        costs.sort();
        costs.dedup();
        assert_eq!(
            costs,
            vec![
                (RrNodeKind::ChanX, 4),
                (RrNodeKind::ChanX, 5),
                (RrNodeKind::ChanY, 6),
                (RrNodeKind::ChanY, 7)
            ]
        );
    }
}
