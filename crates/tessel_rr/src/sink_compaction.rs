//! Sink relocation for multi-cell tiles.
//!
//! A sink of a multi-cell tile starts out covering the whole footprint and is
//! filed at every cell. Compaction moves it to the rounded mean position of
//! the input pins feeding it and keeps a single index entry there. Offsets
//! are memoized per (tile type, sink class), so every instance of a type
//! lands on the same relative cell.

use crate::geometry::Fabric;
use crate::graph::RrGraph;
use crate::ids::RrNodeId;
use crate::node::{BoundingBox, RrNodeKind};
use std::collections::HashMap;
use tessel_arch::TileTypeId;

/// Outcome counters of [`compact_sinks`].
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct CompactionStats {
    /// Sinks collapsed to one cell.
    pub relocated: usize,
    /// Relocations that reused a memoized offset.
    pub memo_hits: usize,
    /// Multi-cell sinks left in place because no input pin of the tile feeds them.
    pub skipped: usize,
}

/// Collapses every multi-cell sink on `layer` onto the cell nearest its
/// feeding input pins.
pub fn compact_sinks(fabric: Fabric<'_>, layer: usize, graph: &mut RrGraph) -> CompactionStats {
    let mut memo: HashMap<(TileTypeId, usize), (usize, usize)> = HashMap::new();
    let mut stats = CompactionStats::default();

    let sinks: Vec<RrNodeId> = graph
        .nodes()
        .filter(|(_, n)| n.kind == RrNodeKind::Sink && n.layer == layer && n.bbox.is_multi_cell())
        .map(|(id, _)| id)
        .collect();

    for sink in sinks {
        let node = graph.node(sink);
        let (bbox, class) = (node.bbox, node.ptc);
        let key = (fabric.grid.tile_type(layer, bbox.xlow, bbox.ylow), class);

        let offset = match memo.get(&key) {
            Some(&offset) => {
                stats.memo_hits += 1;
                offset
            }
            None => match pin_centroid(graph, sink, bbox) {
                Some((x, y)) => {
                    let offset = (x - bbox.xlow, y - bbox.ylow);
                    memo.insert(key, offset);
                    offset
                }
                None => {
                    stats.skipped += 1;
                    continue;
                }
            },
        };

        let (tx, ty) = (bbox.xlow + offset.0, bbox.ylow + offset.1);
        for (x, y) in bbox.cells().filter(|&cell| cell != (tx, ty)) {
            graph.index_mut().remove(layer, x, y, RrNodeKind::Sink, class, None);
        }
        graph.node_mut(sink).bbox = BoundingBox::unit(tx, ty);
        stats.relocated += 1;
    }

    log::debug!(
        "layer {layer}: relocated {} sinks ({} from memo, {} without pins)",
        stats.relocated,
        stats.memo_hits,
        stats.skipped
    );
    stats
}

/// Rounded mean position of the input pins inside `bbox` that feed `sink`.
fn pin_centroid(graph: &RrGraph, sink: RrNodeId, bbox: BoundingBox) -> Option<(usize, usize)> {
    let pins: Vec<(usize, usize)> = graph
        .predecessors(sink)
        .map(|id| graph.node(id))
        .filter(|n| n.kind == RrNodeKind::Ipin && bbox.contains(n.bbox.xlow, n.bbox.ylow))
        .map(|n| (n.bbox.xlow, n.bbox.ylow))
        .collect();
    if pins.is_empty() {
        return None;
    }
    let n = pins.len() as f64;
    let mean_x = pins.iter().map(|p| p.0 as f64).sum::<f64>() / n;
    let mean_y = pins.iter().map(|p| p.1 as f64).sum::<f64>() / n;
    Some((mean_x.round() as usize, mean_y.round() as usize))
}
