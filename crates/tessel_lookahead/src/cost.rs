//! Cost tables and the expected-cost query.

use serde::{Deserialize, Serialize};
use tessel_arch::{Architecture, Axis, SegmentId};
use tessel_common::NdMatrix;
use tessel_rr::{RrGraph, RrNode, RrNodeId, RrNodeKind};

/// Estimated delay and congestion of reaching a displacement.
///
/// The default entry is NaN/NaN and means "not known".
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct CostEntry {
    /// Delay in nanoseconds.
    pub delay: f32,
    /// Congestion in base-cost units.
    pub congestion: f32,
}

impl CostEntry {
    /// An entry with known values.
    pub fn new(delay: f32, congestion: f32) -> Self {
        Self { delay, congestion }
    }

    /// Returns `true` if both values are numbers.
    pub fn is_valid(&self) -> bool {
        !self.delay.is_nan() && !self.congestion.is_nan()
    }

    /// Bit-level equality, so that NaN entries compare equal to themselves.
    pub fn bits_eq(&self, other: &CostEntry) -> bool {
        self.delay.to_bits() == other.delay.to_bits() && self.congestion.to_bits() == other.congestion.to_bits()
    }

    /// Keeps the lower-delay entry, breaking ties on congestion. Invalid
    /// entries always lose.
    pub fn min(self, other: CostEntry) -> CostEntry {
        match (self.is_valid(), other.is_valid()) {
            (false, _) => other,
            (_, false) => self,
            _ if (other.delay, other.congestion) < (self.delay, self.congestion) => other,
            _ => self,
        }
    }
}

impl Default for CostEntry {
    fn default() -> Self {
        Self {
            delay: f32::NAN,
            congestion: f32::NAN,
        }
    }
}

/// Weights of the expected-cost combination.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    /// Share of delay in the cost, in `[0, 1]`; congestion gets the rest.
    pub criticality: f32,
    /// Scale applied to the whole estimate.
    pub astar_fac: f32,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            criticality: 0.5,
            astar_fac: 1.2,
        }
    }
}

/// Fallback cost per tile of Manhattan distance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PerTileEstimate {
    /// Delay per tile.
    pub delay: f32,
    /// Congestion per tile.
    pub congestion: f32,
}

/// Channel slot of a wire kind in the wire map.
pub fn chan_index(kind: RrNodeKind) -> Option<usize> {
    match kind {
        RrNodeKind::ChanX => Some(0),
        RrNodeKind::ChanY => Some(1),
        _ => None,
    }
}

/// Displacement-bucketed costs of one device.
///
/// The wire map is indexed `[from_layer][chan][segment][to_layer][dx][dy]`
/// where `chan` is 0 for horizontal and 1 for vertical wires, `segment` is
/// the wire's position in that orientation's parallel segment catalog, and
/// `dx`/`dy` are absolute displacements. The distance map
/// `[from_layer][to_layer][dx][dy]` holds the cheapest wire entry of each
/// displacement.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CostMap {
    pub(crate) wire: NdMatrix<CostEntry, 6>,
    pub(crate) distance: NdMatrix<CostEntry, 4>,
    pub(crate) segments: [Vec<SegmentId>; 2],
    pub(crate) per_tile: PerTileEstimate,
}

impl CostMap {
    /// An all-NaN map sized for `graph` and the segment catalogs of `arch`.
    pub fn empty(arch: &Architecture, graph: &RrGraph) -> Self {
        let segments = [arch.parallel_segments(Axis::X), arch.parallel_segments(Axis::Y)];
        let max_segs = segments.iter().map(Vec::len).max().unwrap_or(0);
        let (layers, w, h) = (graph.num_layers(), graph.width(), graph.height());
        Self {
            wire: NdMatrix::new([layers, 2, max_segs, layers, w, h], CostEntry::default()),
            distance: NdMatrix::new([layers, layers, w, h], CostEntry::default()),
            segments,
            per_tile: PerTileEstimate::default(),
        }
    }

    /// Describes the first inconsistency between the tables and the
    /// segment catalogs, if any.
    pub(crate) fn shape_error(&self) -> Option<String> {
        if !self.wire.is_well_formed() || !self.distance.is_well_formed() {
            return Some("table length does not match its dimensions".to_string());
        }
        let (w, d) = (self.wire.dims(), self.distance.dims());
        if w[1] != 2 {
            return Some(format!("wire table has {} channel orientations", w[1]));
        }
        if w[0] != w[3] || d[0] != w[0] || d[1] != w[0] || d[2] != w[4] || d[3] != w[5] {
            return Some(format!("wire table {w:?} and distance table {d:?} disagree"));
        }
        if let Some(chan) = (0..2).find(|&c| self.segments[c].len() > w[2]) {
            return Some(format!(
                "{} segments in orientation {chan} but only {} table slots",
                self.segments[chan].len(),
                w[2]
            ));
        }
        None
    }

    /// Returns `true` if both maps have the same dimensions and segment catalogs.
    pub(crate) fn same_shape(&self, other: &CostMap) -> bool {
        self.wire.dims() == other.wire.dims()
            && self.distance.dims() == other.distance.dims()
            && self.segments == other.segments
    }

    /// Number of die layers covered.
    pub fn num_layers(&self) -> usize {
        self.distance.dim(0)
    }

    /// Largest displacement + 1 along x and y.
    pub fn extent(&self) -> (usize, usize) {
        (self.distance.dim(2), self.distance.dim(3))
    }

    /// The fallback per-tile estimate.
    pub fn per_tile(&self) -> PerTileEstimate {
        self.per_tile
    }

    /// Slot of `segment` in the catalog of `chan`.
    pub fn segment_slot(&self, chan: usize, segment: SegmentId) -> Option<usize> {
        self.segments[chan].iter().position(|&s| s == segment)
    }

    /// Wire map entry; NaN when out of range or never reached.
    pub fn wire_cost(&self, from_layer: usize, chan: usize, seg: usize, to_layer: usize, dx: usize, dy: usize) -> CostEntry {
        self.wire
            .get([from_layer, chan, seg, to_layer, dx, dy])
            .copied()
            .unwrap_or_default()
    }

    /// Cheapest entry over all wire types for a displacement; NaN when unknown.
    pub fn distance_min_cost(&self, from_layer: usize, to_layer: usize, dx: usize, dy: usize) -> CostEntry {
        self.distance.get([from_layer, to_layer, dx, dy]).copied().unwrap_or_default()
    }

    /// Delay part of [`CostMap::distance_min_cost`].
    pub fn distance_min_delay(&self, from_layer: usize, to_layer: usize, dx: usize, dy: usize) -> f32 {
        self.distance_min_cost(from_layer, to_layer, dx, dy).delay
    }

    /// Estimated (delay, congestion) from `from` to `to`.
    ///
    /// Input pins and sinks are already at their destination and cost
    /// nothing. Sources and output pins use the distance map. Wires are
    /// looked up from their driving end. Unknown entries are NaN.
    pub fn get_expected_delay_and_cong(&self, graph: &RrGraph, from: RrNodeId, to: RrNodeId, _params: &SearchParams) -> (f32, f32) {
        let (src, dst) = (graph.node(from), graph.node(to));
        let (dx, dy) = displacement(src, dst);
        let entry = match src.kind {
            RrNodeKind::Ipin | RrNodeKind::Sink => CostEntry::new(0.0, 0.0),
            RrNodeKind::Source | RrNodeKind::Opin => self.distance_min_cost(src.layer, dst.layer, dx, dy),
            kind => {
                let chan = chan_index(kind).unwrap_or(0);
                match src.segment.and_then(|s| self.segment_slot(chan, s)) {
                    Some(seg) => self.wire_cost(src.layer, chan, seg, dst.layer, dx, dy),
                    None => CostEntry::default(),
                }
            }
        };
        (entry.delay, entry.congestion)
    }

    /// Scalar cost of reaching `to` from `from` for the router's priority queue.
    ///
    /// Unknown entries fall back to the per-tile estimate times the
    /// Manhattan distance. `_r_upstream` is accepted for interface
    /// compatibility and does not affect the result.
    pub fn get_expected_cost(&self, graph: &RrGraph, from: RrNodeId, to: RrNodeId, params: &SearchParams, _r_upstream: f32) -> f32 {
        let src = graph.node(from);
        if matches!(src.kind, RrNodeKind::Ipin | RrNodeKind::Sink) {
            return 0.0;
        }
        let (mut delay, mut congestion) = self.get_expected_delay_and_cong(graph, from, to, params);
        if delay.is_nan() || congestion.is_nan() {
            let (dx, dy) = displacement(src, graph.node(to));
            let tiles = (dx + dy) as f32;
            delay = self.per_tile.delay * tiles;
            congestion = self.per_tile.congestion * tiles;
        }
        params.astar_fac * (params.criticality * delay + (1.0 - params.criticality) * congestion)
    }

    /// Returns `true` if both maps and the fallback match bit for bit.
    pub fn bits_eq(&self, other: &CostMap) -> bool {
        self.wire.dims() == other.wire.dims()
            && self.distance.dims() == other.distance.dims()
            && self.segments == other.segments
            && self.per_tile == other.per_tile
            && self.wire.iter().zip(other.wire.iter()).all(|(a, b)| a.bits_eq(b))
            && self.distance.iter().zip(other.distance.iter()).all(|(a, b)| a.bits_eq(b))
    }

    /// Number of populated wire map entries.
    pub fn num_valid(&self) -> usize {
        self.wire.iter().filter(|e| e.is_valid()).count()
    }
}

/// Absolute displacement from the driving end of `from` to the low corner of `to`.
pub(crate) fn displacement(from: &RrNode, to: &RrNode) -> (usize, usize) {
    let start = from.driving_end();
    let end = to.low();
    (start.x.abs_diff(end.x), start.y.abs_diff(end.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_arch::{builtin, create_device_grid};
    use tessel_diagnostics::DiagnosticSink;
    use tessel_rr::{build_rr_graph, ChannelOptions, RrGraphOptions};

    #[test]
    fn default_entry_is_nan() {
        let e = CostEntry::default();
        assert!(!e.is_valid());
        assert!(e.bits_eq(&CostEntry::default()));
        assert!(CostEntry::new(1.0, 2.0).is_valid());
    }

    #[test]
    fn min_prefers_valid_then_lower_delay() {
        let nan = CostEntry::default();
        let a = CostEntry::new(2.0, 1.0);
        let b = CostEntry::new(1.0, 5.0);
        assert!(nan.min(a).bits_eq(&a));
        assert!(a.min(nan).bits_eq(&a));
        assert!(a.min(b).bits_eq(&b));
        assert!(CostEntry::new(1.0, 2.0).min(CostEntry::new(1.0, 1.0)).bits_eq(&CostEntry::new(1.0, 1.0)));
    }

    #[test]
    fn empty_map_queries() {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_5x5", &sink).unwrap();
        let options = RrGraphOptions {
            channels: ChannelOptions::uniform(4),
            ..RrGraphOptions::default()
        };
        let graph = build_rr_graph(&arch, &grid, &options, &sink).unwrap().graph;
        let mut map = CostMap::empty(&arch, &graph);
        map.per_tile = PerTileEstimate {
            delay: 1.0,
            congestion: 2.0,
        };
        assert_eq!(map.extent(), (5, 5));
        assert_eq!(map.num_valid(), 0);

        let wire = graph.nodes_of_kind(RrNodeKind::ChanX)[0];
        let target = graph.index().find(0, 3, 3, RrNodeKind::Sink, 0, None).unwrap();
        let params = SearchParams {
            criticality: 1.0,
            astar_fac: 1.0,
        };
        let (delay, _) = map.get_expected_delay_and_cong(&graph, wire, target, &params);
        assert!(delay.is_nan());

        // Unknown entries fall back to distance times the per-tile delay.
        let (dx, dy) = displacement(graph.node(wire), graph.node(target));
        let cost = map.get_expected_cost(&graph, wire, target, &params, 0.0);
        assert_eq!(cost, (dx + dy) as f32);

        let ipin = graph.predecessors(target).next().unwrap();
        assert_eq!(map.get_expected_cost(&graph, ipin, target, &params, 0.0), 0.0);
        assert_eq!(map.get_expected_delay_and_cong(&graph, ipin, target, &params), (0.0, 0.0));
    }

    #[test]
    fn populated_entry_is_used() {
        let arch = builtin::k4_n4();
        let sink = DiagnosticSink::new();
        let grid = create_device_grid(&arch, "fixed_5x5", &sink).unwrap();
        let graph = build_rr_graph(&arch, &grid, &RrGraphOptions::default(), &sink).unwrap().graph;
        let mut map = CostMap::empty(&arch, &graph);
        let source = graph.index().find(0, 1, 1, RrNodeKind::Source, 1, None).unwrap();
        let target = graph.index().find(0, 3, 2, RrNodeKind::Sink, 0, None).unwrap();
        map.distance[[0, 0, 2, 1]] = CostEntry::new(4.0, 2.0);
        assert_eq!(map.distance_min_delay(0, 0, 2, 1), 4.0);
        let params = SearchParams {
            criticality: 0.25,
            astar_fac: 2.0,
        };
        // 2 * (0.25 * 4 + 0.75 * 2)
        assert_eq!(map.get_expected_cost(&graph, source, target, &params, 1.0e3), 5.0);
    }
}
