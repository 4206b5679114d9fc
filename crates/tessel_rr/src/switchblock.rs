//! Switch block connectivity.
//!
//! A switch block sits at the top-right corner of every cell `(x, y)` and
//! joins four channel positions: horizontal `(x, y)` on its left, horizontal
//! `(x + 1, y)` on its right, vertical `(x, y)` below and vertical
//! `(x, y + 1)` above. Wires that terminate at the block may drive the wires
//! that begin there on any other side. The connections are recorded per
//! `(x, y, layer, from side, to side)` in a sparse table; absent keys mean
//! there is no connection.

use crate::graph::RrGraph;
use crate::node::{Direction, RrNodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tessel_arch::{Architecture, Side, SwitchId};

/// Track permutation applied inside switch blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwitchBlockPattern {
    /// Track `i` only connects to track `i`.
    Subset,
    /// Turning connections shift tracks so that different turns reach different tracks.
    #[default]
    Wilton,
    /// Turning connections mirror track order on the opposite turns.
    Universal,
}

impl SwitchBlockPattern {
    /// Names accepted by [`SwitchBlockPattern::from_name`].
    pub const NAMES: &'static [&'static str] = &["subset", "wilton", "universal"];

    /// Parses a pattern name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "subset" | "disjoint" => Some(SwitchBlockPattern::Subset),
            "wilton" => Some(SwitchBlockPattern::Wilton),
            "universal" => Some(SwitchBlockPattern::Universal),
            _ => None,
        }
    }

    /// Index among the `n` outgoing tracks reached by the incoming track with
    /// ordinal `f` when turning from `from` to `to`.
    pub fn target(self, from: Side, to: Side, f: usize, n: usize) -> usize {
        debug_assert!(n > 0);
        let f = f % n;
        let target = match self {
            SwitchBlockPattern::Subset => f,
            SwitchBlockPattern::Wilton => match (from, to) {
                (Side::Left, Side::Top) | (Side::Top, Side::Left) => (n - f) % n,
                (Side::Left, Side::Bottom) | (Side::Right, Side::Top) => (n + f - 1) % n,
                (Side::Right, Side::Bottom) | (Side::Bottom, Side::Right) => (2 * n - 2 - f) % n,
                (Side::Bottom, Side::Left) | (Side::Top, Side::Right) => (f + 1) % n,
                _ => f,
            },
            SwitchBlockPattern::Universal => match (from, to) {
                (Side::Left, Side::Top)
                | (Side::Top, Side::Left)
                | (Side::Right, Side::Bottom)
                | (Side::Bottom, Side::Right) => n - 1 - f,
                _ => f,
            },
        };
        target % n
    }
}

impl fmt::Display for SwitchBlockPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SwitchBlockPattern::Subset => "subset",
            SwitchBlockPattern::Wilton => "wilton",
            SwitchBlockPattern::Universal => "universal",
        })
    }
}

/// Location and side pair of a switch block connection list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SbKey {
    /// Column of the cell whose top-right corner holds the block.
    pub x: usize,
    /// Row of that cell.
    pub y: usize,
    /// Die layer.
    pub layer: usize,
    /// Side the driving wire arrives from.
    pub from_side: Side,
    /// Side the driven wire leaves on.
    pub to_side: Side,
}

/// One track-to-track connection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SbEdge {
    /// Track number of the driving wire in the `from_side` channel.
    pub from_track: usize,
    /// Track number of the driven wire in the `to_side` channel.
    pub to_track: usize,
    /// Switch implementing the connection.
    pub switch: SwitchId,
    /// Layer of the driving wire.
    pub from_layer: usize,
    /// Layer of the driven wire.
    pub to_layer: usize,
}

/// Sparse switch block connectivity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SwitchBlockTable {
    entries: BTreeMap<SbKey, Vec<SbEdge>>,
}

impl SwitchBlockTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Connections for `key`; empty if the block has none.
    pub fn get(&self, key: &SbKey) -> &[SbEdge] {
        self.entries.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of populated keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no block has any connection.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of connections.
    pub fn num_edges(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// All populated keys with their connections, in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&SbKey, &[SbEdge])> + '_ {
        self.entries.iter().map(|(k, v)| (k, v.as_slice()))
    }

    fn insert(&mut self, key: SbKey, edges: Vec<SbEdge>) {
        if !edges.is_empty() {
            self.entries.insert(key, edges);
        }
    }
}

/// The channel position on `side` of the switch block at `(x, y)`, if it is
/// inside the device.
pub fn sb_side_channel(width: usize, height: usize, x: usize, y: usize, side: Side) -> Option<(RrNodeKind, usize, usize)> {
    match side {
        Side::Left => Some((RrNodeKind::ChanX, x, y)),
        Side::Right => (x + 1 < width).then_some((RrNodeKind::ChanX, x + 1, y)),
        Side::Bottom => Some((RrNodeKind::ChanY, x, y)),
        Side::Top => (y + 1 < height).then_some((RrNodeKind::ChanY, x, y + 1)),
    }
}

/// Track numbers on `side` of the block at `(x, y)` of the wires arriving
/// from that side (`incoming`) or leaving on it.
fn side_tracks(graph: &RrGraph, layer: usize, x: usize, y: usize, side: Side, incoming: bool) -> Vec<usize> {
    let Some((kind, cx, cy)) = sb_side_channel(graph.width(), graph.height(), x, y, side) else {
        return Vec::new();
    };
    // Wires on the left/bottom channel travelling towards the block increase.
    let towards_block = match side {
        Side::Left | Side::Bottom => Direction::Inc,
        Side::Right | Side::Top => Direction::Dec,
    };
    let wanted = if incoming {
        towards_block
    } else {
        towards_block.opposite()
    };
    graph
        .index()
        .entries_at(layer, cx, cy, kind, None)
        .into_iter()
        .filter(|&(_, id)| {
            let node = graph.node(id);
            if node.direction != Some(wanted) {
                return false;
            }
            // Ends at the block when arriving, starts at it when leaving:
            // both mean the wire's end nearest the block is at this position.
            let bb = node.bbox;
            match (kind, side) {
                (RrNodeKind::ChanX, Side::Left) => bb.xhigh == cx,
                (RrNodeKind::ChanX, _) => bb.xlow == cx,
                (_, Side::Bottom) => bb.yhigh == cy,
                _ => bb.ylow == cy,
            }
        })
        .map(|(track, _)| track)
        .collect()
}

/// Computes the switch block connections of every block on `layer` and adds
/// them to `table`.
pub fn build_switch_blocks(
    arch: &Architecture,
    graph: &RrGraph,
    layer: usize,
    pattern: SwitchBlockPattern,
    table: &mut SwitchBlockTable,
) {
    let (w, h) = (graph.width(), graph.height());
    for x in 0..w.saturating_sub(1) {
        for y in 0..h.saturating_sub(1) {
            let incoming: Vec<Vec<usize>> = Side::ALL
                .iter()
                .map(|&side| side_tracks(graph, layer, x, y, side, true))
                .collect();
            let outgoing: Vec<Vec<usize>> = Side::ALL
                .iter()
                .map(|&side| side_tracks(graph, layer, x, y, side, false))
                .collect();

            for from_side in Side::ALL {
                let from_tracks = &incoming[from_side.index()];
                if from_tracks.is_empty() {
                    continue;
                }
                for to_side in Side::ALL {
                    let to_tracks = &outgoing[to_side.index()];
                    if to_side == from_side || to_tracks.is_empty() {
                        continue;
                    }
                    let Some((kind, cx, cy)) = sb_side_channel(w, h, x, y, to_side) else {
                        continue;
                    };
                    let n = to_tracks.len();
                    let edges = from_tracks
                        .iter()
                        .enumerate()
                        .filter_map(|(k, &from_track)| {
                            let to_track = to_tracks[pattern.target(from_side, to_side, k, n)];
                            let dest = graph.index().find(layer, cx, cy, kind, to_track, None)?;
                            let segment = graph.node(dest).segment?;
                            Some(SbEdge {
                                from_track,
                                to_track,
                                switch: arch.segment(segment).wire_switch,
                                from_layer: layer,
                                to_layer: layer,
                            })
                        })
                        .collect();
                    table.insert(
                        SbKey {
                            x,
                            y,
                            layer,
                            from_side,
                            to_side,
                        },
                        edges,
                    );
                }
            }
        }
    }
    log::debug!(
        "layer {layer}: {} switch block entries, {} connections",
        table.len(),
        table.num_edges()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chan_loader::load_chan_nodes;
    use crate::geometry::Fabric;
    use crate::options::ChannelOptions;
    use std::collections::HashSet;
    use tessel_arch::{builtin, create_device_grid};
    use tessel_diagnostics::DiagnosticSink;

    #[test]
    fn straight_connections_keep_ordinal() {
        for pattern in [SwitchBlockPattern::Subset, SwitchBlockPattern::Wilton, SwitchBlockPattern::Universal] {
            for f in 0..4 {
                assert_eq!(pattern.target(Side::Left, Side::Right, f, 4), f);
                assert_eq!(pattern.target(Side::Top, Side::Bottom, f, 4), f);
            }
        }
    }

    #[test]
    fn wilton_turns() {
        let p = SwitchBlockPattern::Wilton;
        assert_eq!(p.target(Side::Left, Side::Top, 0, 4), 0);
        assert_eq!(p.target(Side::Left, Side::Top, 1, 4), 3);
        assert_eq!(p.target(Side::Left, Side::Bottom, 0, 4), 3);
        assert_eq!(p.target(Side::Right, Side::Bottom, 0, 4), 2);
        assert_eq!(p.target(Side::Bottom, Side::Left, 3, 4), 0);
        assert_eq!(p.target(Side::Top, Side::Right, 2, 4), 3);
        // Every turn is a permutation of the outgoing tracks.
        for from in Side::ALL {
            for to in Side::ALL {
                let reached: HashSet<usize> = (0..5).map(|f| p.target(from, to, f, 5)).collect();
                assert_eq!(reached.len(), 5, "{from}->{to}");
            }
        }
    }

    #[test]
    fn universal_mirrors_opposite_turns() {
        let p = SwitchBlockPattern::Universal;
        assert_eq!(p.target(Side::Left, Side::Top, 0, 4), 3);
        assert_eq!(p.target(Side::Left, Side::Bottom, 0, 4), 0);
        assert_eq!(p.target(Side::Bottom, Side::Right, 1, 4), 2);
    }

    #[test]
    fn ordinal_wraps_when_fewer_outgoing() {
        assert_eq!(SwitchBlockPattern::Subset.target(Side::Left, Side::Right, 5, 2), 1);
    }

    #[test]
    fn pattern_names() {
        for name in SwitchBlockPattern::NAMES {
            let p = SwitchBlockPattern::from_name(name).unwrap();
            assert_eq!(p.to_string(), *name);
        }
        assert_eq!(SwitchBlockPattern::from_name("Wilton"), Some(SwitchBlockPattern::Wilton));
        assert_eq!(SwitchBlockPattern::from_name("crossbar"), None);
    }

    #[test]
    fn side_channels() {
        assert_eq!(sb_side_channel(5, 5, 2, 3, Side::Right), Some((RrNodeKind::ChanX, 3, 3)));
        assert_eq!(sb_side_channel(5, 5, 2, 3, Side::Top), Some((RrNodeKind::ChanY, 2, 4)));
        assert_eq!(sb_side_channel(5, 5, 4, 3, Side::Right), None);
    }

    #[test]
    fn table_on_small_fabric() {
        let arch = builtin::k4_n4();
        let grid = create_device_grid(&arch, "fixed_8x8", &DiagnosticSink::new()).unwrap();
        let mut graph = RrGraph::new(1, 8, 8);
        load_chan_nodes(Fabric::new(&arch, &grid), 0, &ChannelOptions::uniform(8), &mut graph).unwrap();
        let mut table = SwitchBlockTable::new();
        build_switch_blocks(&arch, &graph, 0, SwitchBlockPattern::Wilton, &mut table);
        assert!(!table.is_empty());

        for (key, edges) in table.iter() {
            assert_ne!(key.from_side, key.to_side);
            assert!(!edges.is_empty());
            let (kind, cx, cy) = sb_side_channel(8, 8, key.x, key.y, key.to_side).unwrap();
            for edge in edges {
                assert_eq!(edge.switch, arch.segments[0].wire_switch);
                assert_eq!((edge.from_layer, edge.to_layer), (0, 0));
                // Driven wires start right next to the block.
                let dest = graph.index().find(0, cx, cy, kind, edge.to_track, None).unwrap();
                let end = graph.node(dest).driving_end();
                assert_eq!((end.x, end.y), (cx, cy));
            }
        }

        // The block at (1, 1) sees wires ending on its left and starting on its right.
        let key = SbKey {
            x: 1,
            y: 1,
            layer: 0,
            from_side: Side::Left,
            to_side: Side::Right,
        };
        assert!(!table.get(&key).is_empty());
        // No switch block connections leave the device.
        let off = SbKey {
            x: 6,
            y: 1,
            layer: 0,
            from_side: Side::Left,
            to_side: Side::Right,
        };
        assert!(table.get(&off).is_empty());
    }
}
