//! Cost map computation by sampled shortest-path searches.
//!
//! For every (layer, orientation, segment type) a handful of start wires near
//! the device centre are expanded with Dijkstra's algorithm over the finished
//! graph. Each reached input pin or sink contributes the cost of its
//! displacement from the start. The per-slice searches are independent and
//! run in parallel; results are merged in slice order.

use crate::cost::{displacement, CostEntry, CostMap, PerTileEstimate};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use tessel_arch::{Architecture, SegmentId, SwitchId};
use tessel_common::{GridLoc, NdMatrix};
use tessel_rr::{RrGraph, RrNodeId, RrNodeKind};

/// Sampling parameters of [`compute_cost_map`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookaheadOptions {
    /// Start wires expanded per (layer, orientation, segment type).
    pub samples_per_segment: usize,
    /// Seed of the start-wire selection.
    pub seed: u64,
}

impl Default for LookaheadOptions {
    fn default() -> Self {
        Self {
            samples_per_segment: 4,
            seed: 1,
        }
    }
}

/// Congestion charged for every wire on a path.
const WIRE_CONGESTION: f32 = 1.0;

#[derive(Clone, Copy)]
struct Slice {
    layer: usize,
    chan: usize,
    seg: usize,
    segment: SegmentId,
}

#[derive(Clone, Copy, Debug)]
struct SearchState {
    node: RrNodeId,
    delay: f32,
    congestion: f32,
}

impl PartialEq for SearchState {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchState {}

impl Ord for SearchState {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default)
        other
            .delay
            .partial_cmp(&self.delay)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for SearchState {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Computes the lookahead cost map of `graph`.
pub fn compute_cost_map(arch: &Architecture, graph: &RrGraph, options: &LookaheadOptions) -> CostMap {
    let mut map = CostMap::empty(arch, graph);
    let delays = Delays::new(arch, graph);

    let mut slices = Vec::new();
    for layer in 0..graph.num_layers() {
        for chan in 0..2 {
            for (seg, &segment) in map.segments[chan].iter().enumerate() {
                slices.push(Slice {
                    layer,
                    chan,
                    seg,
                    segment,
                });
            }
        }
    }

    let results: Vec<NdMatrix<CostEntry, 3>> = slices
        .par_iter()
        .enumerate()
        .map(|(i, slice)| sample_slice(graph, &delays, *slice, options, i as u64))
        .collect();

    let (layers, w, h) = (graph.num_layers(), graph.width(), graph.height());
    for (slice, result) in slices.iter().zip(&results) {
        for to_layer in 0..layers {
            for dx in 0..w {
                for dy in 0..h {
                    map.wire[[slice.layer, slice.chan, slice.seg, to_layer, dx, dy]] = result[[to_layer, dx, dy]];
                }
            }
        }
    }

    map.per_tile = per_tile_estimate(&map);
    fill_holes(&mut map);
    fill_distance_map(&mut map);

    log::info!(
        "computed lookahead over {} slices: {} of {} wire entries populated",
        slices.len(),
        map.num_valid(),
        map.wire.len()
    );
    map
}

/// Delay of each switch type and of each node's own wire, in nanoseconds.
struct Delays {
    switch: Vec<f32>,
    node: Vec<f32>,
}

impl Delays {
    fn new(arch: &Architecture, graph: &RrGraph) -> Self {
        let node = graph
            .nodes()
            .map(|(_, node)| {
                if !node.kind.is_chan() {
                    return 0.0;
                }
                let rc = graph.rc(node.rc_index);
                let len = node.length() as f32;
                // Elmore delay of a distributed line.
                0.5 * rc.r * rc.c * len * len * 1.0e9
            })
            .collect();
        Self {
            switch: arch.switches.iter().map(|s| s.delay_ns).collect(),
            node,
        }
    }

    /// Cost of entering `node` through `switch`.
    fn enter(&self, switch: SwitchId, node: RrNodeId) -> f32 {
        self.switch.get(switch.index()).copied().unwrap_or(0.0) + self.node[node.index()]
    }
}

fn sample_slice(
    graph: &RrGraph,
    delays: &Delays,
    slice: Slice,
    options: &LookaheadOptions,
    salt: u64,
) -> NdMatrix<CostEntry, 3> {
    let mut result = NdMatrix::new([graph.num_layers(), graph.width(), graph.height()], CostEntry::default());
    let kind = if slice.chan == 0 {
        RrNodeKind::ChanX
    } else {
        RrNodeKind::ChanY
    };
    let centre = GridLoc::on_layer(graph.width() / 2, graph.height() / 2, slice.layer);

    let mut candidates: Vec<RrNodeId> = graph
        .nodes()
        .filter(|(_, n)| n.kind == kind && n.layer == slice.layer && n.segment == Some(slice.segment))
        .map(|(id, _)| id)
        .collect();
    candidates.sort_by_key(|&id| (graph.node(id).driving_end().manhattan(centre), id));
    candidates.truncate(options.samples_per_segment * 2);
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(salt));
    candidates.shuffle(&mut rng);
    candidates.truncate(options.samples_per_segment);

    for start in candidates {
        expand(graph, delays, start, &mut result);
    }
    result
}

/// Dijkstra from `start`, recording the cheapest cost per displacement of
/// every input pin and sink reached.
fn expand(graph: &RrGraph, delays: &Delays, start: RrNodeId, result: &mut NdMatrix<CostEntry, 3>) {
    let mut best = vec![f32::INFINITY; graph.num_nodes()];
    let mut heap = BinaryHeap::new();
    best[start.index()] = 0.0;
    heap.push(SearchState {
        node: start,
        delay: 0.0,
        congestion: WIRE_CONGESTION,
    });
    let origin = graph.node(start);

    while let Some(state) = heap.pop() {
        if state.delay > best[state.node.index()] {
            continue; // Stale entry
        }
        let node = graph.node(state.node);
        if matches!(node.kind, RrNodeKind::Ipin | RrNodeKind::Sink) {
            let (dx, dy) = displacement(origin, node);
            let slot = &mut result[[node.layer, dx, dy]];
            *slot = slot.min(CostEntry::new(state.delay, state.congestion));
        }
        for &edge_id in graph.out_edges(state.node) {
            let edge = graph.edge(edge_id);
            let delay = state.delay + delays.enter(edge.switch, edge.sink);
            if delay < best[edge.sink.index()] {
                best[edge.sink.index()] = delay;
                let wire = graph.node(edge.sink).kind.is_chan();
                heap.push(SearchState {
                    node: edge.sink,
                    delay,
                    congestion: state.congestion + if wire { WIRE_CONGESTION } else { 0.0 },
                });
            }
        }
    }
}

/// Copies the nearest populated displacement into every unpopulated one of
/// the same slice.
///
/// A breadth-first flood from all populated cells at once, so each slice
/// costs time linear in its area. On the open displacement grid the flood
/// order is Manhattan distance order.
fn fill_holes(map: &mut CostMap) {
    let dims: Vec<usize> = map.wire.dims().to_vec();
    let (w, h) = (dims[4], dims[5]);
    let mut queue = VecDeque::new();
    for fl in 0..dims[0] {
        for chan in 0..dims[1] {
            for seg in 0..dims[2] {
                for tl in 0..dims[3] {
                    queue.clear();
                    for dx in 0..w {
                        for dy in 0..h {
                            if map.wire[[fl, chan, seg, tl, dx, dy]].is_valid() {
                                queue.push_back((dx, dy));
                            }
                        }
                    }
                    while let Some((dx, dy)) = queue.pop_front() {
                        let entry = map.wire[[fl, chan, seg, tl, dx, dy]];
                        let neighbours = [
                            dx.checked_sub(1).map(|x| (x, dy)),
                            (dx + 1 < w).then_some((dx + 1, dy)),
                            dy.checked_sub(1).map(|y| (dx, y)),
                            (dy + 1 < h).then_some((dx, dy + 1)),
                        ];
                        for (nx, ny) in neighbours.into_iter().flatten() {
                            let slot = &mut map.wire[[fl, chan, seg, tl, nx, ny]];
                            if !slot.is_valid() {
                                *slot = entry;
                                queue.push_back((nx, ny));
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Mean cost per tile of distance over the sampled entries.
fn per_tile_estimate(map: &CostMap) -> PerTileEstimate {
    let dims = map.wire.dims();
    let (w, h) = (dims[4], dims[5]);
    let (mut delay, mut congestion, mut n) = (0.0f64, 0.0f64, 0usize);
    for (i, entry) in map.wire.iter().enumerate() {
        let (dx, dy) = ((i / h) % w, i % h);
        let dist = dx + dy;
        if dist == 0 || !entry.is_valid() {
            continue;
        }
        delay += f64::from(entry.delay) / dist as f64;
        congestion += f64::from(entry.congestion) / dist as f64;
        n += 1;
    }
    if n == 0 {
        return PerTileEstimate::default();
    }
    PerTileEstimate {
        delay: (delay / n as f64) as f32,
        congestion: (congestion / n as f64) as f32,
    }
}

/// The cheapest wire entry of each displacement.
fn fill_distance_map(map: &mut CostMap) {
    let dims: Vec<usize> = map.wire.dims().to_vec();
    for fl in 0..dims[0] {
        for tl in 0..dims[3] {
            for dx in 0..dims[4] {
                for dy in 0..dims[5] {
                    let mut best = CostEntry::default();
                    for chan in 0..dims[1] {
                        for seg in 0..dims[2] {
                            best = best.min(map.wire[[fl, chan, seg, tl, dx, dy]]);
                        }
                    }
                    map.distance[[fl, tl, dx, dy]] = best;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cost::SearchParams;
    use tessel_arch::{builtin, create_device_grid};
    use tessel_diagnostics::DiagnosticSink;
    use tessel_rr::{build_rr_graph, ChannelOptions, RrGraphOptions};

    fn hetero_graph() -> (Architecture, RrGraph) {
        let arch = builtin::hetero();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_10x10", &sink).unwrap();
        let options = RrGraphOptions {
            channels: ChannelOptions::uniform(8),
            ..RrGraphOptions::default()
        };
        let graph = build_rr_graph(&arch, &grid, &options, &sink).unwrap().graph;
        (arch, graph)
    }

    #[test]
    fn computed_map_is_populated() {
        let (arch, graph) = hetero_graph();
        let map = compute_cost_map(&arch, &graph, &LookaheadOptions::default());
        assert!(map.num_valid() > 0);
        // Both orientations and both segment types were sampled and hole-filled.
        for chan in 0..2 {
            for seg in 0..2 {
                for (dx, dy) in [(0, 0), (3, 2), (9, 9)] {
                    assert!(map.wire_cost(0, chan, seg, 0, dx, dy).is_valid(), "{chan}/{seg} ({dx},{dy})");
                }
            }
        }
        assert!(map.distance_min_cost(0, 0, 4, 4).is_valid());
        assert!(map.per_tile().delay > 0.0);
        assert!(map.per_tile().congestion > 0.0);
    }

    #[test]
    fn distance_map_is_minimum_over_wires() {
        let (arch, graph) = hetero_graph();
        let map = compute_cost_map(&arch, &graph, &LookaheadOptions::default());
        for (dx, dy) in [(1, 0), (2, 3), (5, 5)] {
            let min = map.distance_min_delay(0, 0, dx, dy);
            for chan in 0..2 {
                for seg in 0..2 {
                    assert!(min <= map.wire_cost(0, chan, seg, 0, dx, dy).delay);
                }
            }
        }
    }

    #[test]
    fn computation_is_deterministic() {
        let (arch, graph) = hetero_graph();
        let options = LookaheadOptions {
            samples_per_segment: 3,
            seed: 42,
        };
        let a = compute_cost_map(&arch, &graph, &options);
        let b = compute_cost_map(&arch, &graph, &options);
        assert!(a.bits_eq(&b));
    }

    #[test]
    fn options_from_json() {
        let opts: LookaheadOptions = serde_json::from_str(r#"{"samples_per_segment":2,"seed":9}"#).unwrap();
        assert_eq!(
            opts,
            LookaheadOptions {
                samples_per_segment: 2,
                seed: 9
            }
        );
    }

    #[test]
    fn wire_costs_are_finite() {
        let (arch, graph) = hetero_graph();
        let map = compute_cost_map(&arch, &graph, &LookaheadOptions::default());
        let target = graph.index().find(0, 3, 7, RrNodeKind::Sink, 0, None).unwrap();
        let params = SearchParams::default();
        for wire in graph.nodes_of_kind(RrNodeKind::ChanY).into_iter().take(20) {
            let cost = map.get_expected_cost(&graph, wire, target, &params, 0.0);
            assert!(cost.is_finite() && cost >= 0.0);
        }
    }

    #[test]
    fn holes_take_the_nearest_sample() {
        let (arch, graph) = hetero_graph();
        let mut map = CostMap::empty(&arch, &graph);
        map.wire[[0, 0, 0, 0, 0, 0]] = CostEntry::new(1.0, 1.0);
        map.wire[[0, 0, 0, 0, 9, 9]] = CostEntry::new(5.0, 3.0);
        fill_holes(&mut map);
        assert_eq!(map.wire_cost(0, 0, 0, 0, 2, 1).delay, 1.0);
        assert_eq!(map.wire_cost(0, 0, 0, 0, 8, 7).delay, 5.0);
        assert_eq!(map.wire_cost(0, 0, 0, 0, 9, 9).congestion, 3.0);
        // Slices without any sample stay unknown.
        assert!(!map.wire_cost(0, 1, 0, 0, 4, 4).is_valid());
        assert_eq!(map.num_valid(), 10 * 10);
    }
}
