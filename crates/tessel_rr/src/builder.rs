//! Full routing-resource graph construction.

use crate::chan_loader::load_chan_nodes;
use crate::edges::build_edges;
use crate::error::RrGraphError;
use crate::estimate::{estimate_rr_nodes, NodeCounts};
use crate::geometry::Fabric;
use crate::graph::RrGraph;
use crate::grid_loader::load_grid_nodes;
use crate::node::RrNodeKind;
use crate::options::RrGraphOptions;
use crate::sink_compaction::{compact_sinks, CompactionStats};
use crate::switchblock::{build_switch_blocks, SwitchBlockTable};
use tessel_arch::{Architecture, Axis, DeviceGrid};
use tessel_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

const ODD_CHANNEL_WIDTH: DiagnosticCode = DiagnosticCode::new(Category::Routing, 1);

/// Smallest grid dimension that leaves room for a channel between the I/O ring and the core.
pub const MIN_DEVICE_SIZE: usize = 3;

/// The result of [`build_rr_graph`].
#[derive(Debug)]
pub struct RrGraphBuild {
    /// The finished graph with its spatial index.
    pub graph: RrGraph,
    /// Track-to-track connectivity of every layer's switch blocks.
    pub switch_blocks: SwitchBlockTable,
    /// Predicted node counts, summed over layers.
    pub estimate: NodeCounts,
    /// Sink relocation counters, summed over layers.
    pub compaction: CompactionStats,
}

/// Builds the routing-resource graph of `grid`.
///
/// Every layer is processed in phase order: estimate, node loading, count
/// verification, switch blocks, edges, sink compaction. A difference between
/// the estimate and the created nodes of any kind is fatal.
pub fn build_rr_graph(
    arch: &Architecture,
    grid: &DeviceGrid,
    options: &RrGraphOptions,
    sink: &DiagnosticSink,
) -> Result<RrGraphBuild, RrGraphError> {
    if grid.width() < MIN_DEVICE_SIZE || grid.height() < MIN_DEVICE_SIZE {
        return Err(RrGraphError::DeviceTooSmall {
            width: grid.width(),
            height: grid.height(),
        });
    }
    for axis in [Axis::X, Axis::Y] {
        let width = options.channels.chan_width(axis);
        if width % 2 == 1 {
            sink.emit(
                Diagnostic::warning(
                    ODD_CHANNEL_WIDTH,
                    format!("{axis:?} channel width {width} is odd; using {}", width + 1),
                )
                .with_note("unidirectional channels pair every increasing track with a decreasing one"),
            );
        }
    }

    let fabric = Fabric::new(arch, grid);
    let mut graph = RrGraph::new(grid.num_layers(), grid.width(), grid.height());
    let mut switch_blocks = SwitchBlockTable::new();
    let mut estimate = NodeCounts::default();
    let mut compaction = CompactionStats::default();

    for layer in 0..grid.num_layers() {
        let expected = estimate_rr_nodes(fabric, layer, &options.channels);
        log::debug!("layer {layer}: estimated {expected}");
        graph.reserve_nodes(expected.total());

        load_grid_nodes(fabric, layer, &mut graph)?;
        load_chan_nodes(fabric, layer, &options.channels, &mut graph)?;
        verify_counts(layer, &expected, &graph.node_counts(layer))?;
        estimate.merge(&expected);

        build_switch_blocks(arch, &graph, layer, options.switch_block, &mut switch_blocks);
        build_edges(fabric, layer, options, &switch_blocks, &mut graph)?;

        let stats = compact_sinks(fabric, layer, &mut graph);
        compaction.relocated += stats.relocated;
        compaction.memo_hits += stats.memo_hits;
        compaction.skipped += stats.skipped;
    }

    graph.check()?;
    log::info!(
        "built routing graph for {}x{}x{}: {} nodes, {} edges, {} switch block entries",
        grid.width(),
        grid.height(),
        grid.num_layers(),
        graph.num_nodes(),
        graph.num_edges(),
        switch_blocks.len()
    );

    Ok(RrGraphBuild {
        graph,
        switch_blocks,
        estimate,
        compaction,
    })
}

fn verify_counts(layer: usize, expected: &NodeCounts, actual: &NodeCounts) -> Result<(), RrGraphError> {
    for kind in RrNodeKind::ALL {
        if expected[kind] != actual[kind] {
            return Err(RrGraphError::EstimateMismatch {
                layer,
                kind,
                estimated: expected[kind],
                actual: actual[kind],
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::ChannelOptions;
    use tessel_arch::{builtin, create_device_grid};

    fn options(width: usize) -> RrGraphOptions {
        RrGraphOptions {
            channels: ChannelOptions::uniform(width),
            ..RrGraphOptions::default()
        }
    }

    #[test]
    fn five_by_five_matches_estimate() {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_5x5", &sink).unwrap();
        let build = build_rr_graph(&arch, &grid, &options(4), &sink).unwrap();
        assert_eq!(build.graph.node_counts(0), build.estimate);
        assert_eq!(build.graph.num_nodes(), build.estimate.total());
        // Nine logic blocks and twelve pads, one driver class each.
        let clb_sources = build
            .graph
            .nodes()
            .filter(|(_, n)| n.kind == RrNodeKind::Source && !n.bbox.is_multi_cell() && n.ptc == 1)
            .count();
        assert_eq!(clb_sources, 9 + 12);
        assert!(build.graph.num_edges() > 0);
        assert_eq!(sink.warning_count(), 0);
    }

    #[test]
    fn repeated_builds_agree() {
        let arch = builtin::hetero();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_10x10", &sink).unwrap();
        let first = build_rr_graph(&arch, &grid, &options(8), &sink).unwrap();
        let second = build_rr_graph(&arch, &grid, &options(8), &sink).unwrap();
        assert_eq!(first.graph.num_nodes(), second.graph.num_nodes());
        assert_eq!(first.graph.num_edges(), second.graph.num_edges());
        assert_eq!(first.switch_blocks.num_edges(), second.switch_blocks.num_edges());
    }

    #[test]
    fn multi_cell_sources_resolve_from_any_cell() {
        let arch = builtin::hetero();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_10x10", &sink).unwrap();
        let build = build_rr_graph(&arch, &grid, &options(8), &sink).unwrap();
        let index = build.graph.index();
        let source = index.find(0, 4, 1, RrNodeKind::Source, 1, None).unwrap();
        for (x, y) in [(5, 1), (4, 2), (5, 2)] {
            assert_eq!(index.find(0, x, y, RrNodeKind::Source, 1, None), Some(source));
        }
        // The memory sink is fed from all four corners and lands on the upper right.
        let mem_sink = index.find(0, 5, 2, RrNodeKind::Sink, 0, None).unwrap();
        assert!(!build.graph.node(mem_sink).bbox.is_multi_cell());
        assert_eq!(index.find(0, 4, 1, RrNodeKind::Sink, 0, None), None);
        assert!(build.compaction.relocated >= 4);
    }

    #[test]
    fn island_builds_under_every_channel_policy() {
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

        let mut wires = Vec::new();
        for shrink_boundary in [false, true] {
            for through_channel in [false, true] {
                let opts = RrGraphOptions {
                    channels: ChannelOptions {
                        shrink_boundary,
                        through_channel,
                        ..ChannelOptions::uniform(8)
                    },
                    ..RrGraphOptions::default()
                };
                let sink = DiagnosticSink::new();
                let build = build_rr_graph(&arch, &grid, &opts, &sink).unwrap();
                let label = format!("shrink={shrink_boundary} through={through_channel}");
                assert_eq!(build.graph.node_counts(0), build.estimate, "{label}");
                assert!(build.graph.num_edges() > 0, "{label}");
                build.graph.check().unwrap();
                let counts = build.graph.node_counts(0);
                wires.push(counts[RrNodeKind::ChanX] + counts[RrNodeKind::ChanY]);
            }
        }
        // Shrinking drops the channels around the island.
        assert!(wires[2] < wires[0]);
        assert!(wires[3] < wires[1]);
    }

    #[test]
    fn odd_width_warns() {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_5x5", &sink).unwrap();
        let build = build_rr_graph(&arch, &grid, &options(5), &sink).unwrap();
        assert_eq!(sink.warning_count(), 2);
        assert_eq!(build.graph.node_counts(0), build.estimate);
    }

    #[test]
    fn tiny_device_rejected() {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = DeviceGrid::new("tiny", 2, 2, 1);
        let err = build_rr_graph(&arch, &grid, &options(4), &sink).unwrap_err();
        assert!(matches!(err, RrGraphError::DeviceTooSmall { width: 2, height: 2 }));
    }
}
