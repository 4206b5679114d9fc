//! The routing-resource graph arena.
//!
//! [`RrGraph`] owns every node, edge and RC record in contiguous vectors and
//! hands out stable [`RrNodeId`]/[`RrEdgeId`] indices. The spatial index it
//! carries stores only those indices.

use crate::error::RrGraphError;
use crate::estimate::NodeCounts;
use crate::ids::{RcIndex, RrEdgeId, RrNodeId};
use crate::node::{RrNode, RrNodeKind};
use crate::spatial::SpatialIndex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tessel_arch::SwitchId;

/// A directed connection between two nodes through a switch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RrEdge {
    /// Driving node.
    pub src: RrNodeId,
    /// Driven node.
    pub sink: RrNodeId,
    /// Switch implementing the connection.
    pub switch: SwitchId,
}

/// Resistance and capacitance of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RcData {
    /// Resistance in ohms.
    pub r: f32,
    /// Capacitance in farads.
    pub c: f32,
}

/// Nodes, edges and lookup structures of one device.
#[derive(Clone, Debug)]
pub struct RrGraph {
    nodes: Vec<RrNode>,
    edges: Vec<RrEdge>,
    out_edges: Vec<Vec<RrEdgeId>>,
    in_edges: Vec<Vec<RrEdgeId>>,
    edge_set: HashSet<RrEdge>,
    rc_data: Vec<RcData>,
    rc_lookup: HashMap<(u32, u32), RcIndex>,
    index: SpatialIndex,
}

impl RrGraph {
    /// An empty graph for a device of the given size.
    pub fn new(num_layers: usize, width: usize, height: usize) -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            out_edges: Vec::new(),
            in_edges: Vec::new(),
            edge_set: HashSet::new(),
            rc_data: Vec::new(),
            rc_lookup: HashMap::new(),
            index: SpatialIndex::new(num_layers, width, height),
        }
    }

    /// Device width covered by the graph.
    pub fn width(&self) -> usize {
        self.index.width()
    }

    /// Device height covered by the graph.
    pub fn height(&self) -> usize {
        self.index.height()
    }

    /// Number of die layers.
    pub fn num_layers(&self) -> usize {
        self.index.num_layers()
    }

    /// Pre-sizes node storage for `additional` more nodes.
    pub fn reserve_nodes(&mut self, additional: usize) {
        self.nodes.reserve(additional);
        self.out_edges.reserve(additional);
        self.in_edges.reserve(additional);
    }

    /// Appends a node to the arena.
    pub fn add_node(&mut self, node: RrNode) -> RrNodeId {
        let id = RrNodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(node);
        self.out_edges.push(Vec::new());
        self.in_edges.push(Vec::new());
        id
    }

    /// Node data.
    pub fn node(&self, id: RrNodeId) -> &RrNode {
        &self.nodes[id.index()]
    }

    /// Mutable node data.
    pub fn node_mut(&mut self, id: RrNodeId) -> &mut RrNode {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// All nodes with their IDs.
    pub fn nodes(&self) -> impl Iterator<Item = (RrNodeId, &RrNode)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (RrNodeId::from_raw(i as u32), n))
    }

    /// IDs of every node of `kind`.
    pub fn nodes_of_kind(&self, kind: RrNodeKind) -> Vec<RrNodeId> {
        self.nodes()
            .filter(|(_, n)| n.kind == kind)
            .map(|(id, _)| id)
            .collect()
    }

    /// Node count per kind on `layer`.
    pub fn node_counts(&self, layer: usize) -> NodeCounts {
        let mut counts = NodeCounts::default();
        for node in self.nodes.iter().filter(|n| n.layer == layer) {
            counts[node.kind] += 1;
        }
        counts
    }

    /// Returns the RC record with exactly these values, creating it if needed.
    pub fn find_or_create_rc(&mut self, r: f32, c: f32) -> RcIndex {
        let key = (r.to_bits(), c.to_bits());
        if let Some(&idx) = self.rc_lookup.get(&key) {
            return idx;
        }
        let idx = RcIndex::from_raw(self.rc_data.len() as u32);
        self.rc_data.push(RcData { r, c });
        self.rc_lookup.insert(key, idx);
        idx
    }

    /// One RC record.
    pub fn rc(&self, idx: RcIndex) -> RcData {
        self.rc_data[idx.index()]
    }

    /// Number of distinct RC records.
    pub fn num_rc_records(&self) -> usize {
        self.rc_data.len()
    }

    /// Connects `src` to `sink`. Returns `None` if the same edge already exists.
    pub fn add_edge(&mut self, src: RrNodeId, sink: RrNodeId, switch: SwitchId) -> Option<RrEdgeId> {
        let edge = RrEdge { src, sink, switch };
        if !self.edge_set.insert(edge) {
            return None;
        }
        let id = RrEdgeId::from_raw(self.edges.len() as u32);
        self.edges.push(edge);
        self.out_edges[src.index()].push(id);
        self.in_edges[sink.index()].push(id);
        Some(id)
    }

    /// Edge data.
    pub fn edge(&self, id: RrEdgeId) -> &RrEdge {
        &self.edges[id.index()]
    }

    /// Number of edges.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// All edges in creation order.
    pub fn edges(&self) -> &[RrEdge] {
        &self.edges
    }

    /// Edges leaving `node`.
    pub fn out_edges(&self, node: RrNodeId) -> &[RrEdgeId] {
        &self.out_edges[node.index()]
    }

    /// Edges entering `node`.
    pub fn fan_in(&self, node: RrNodeId) -> &[RrEdgeId] {
        &self.in_edges[node.index()]
    }

    /// Nodes driven by `node`.
    pub fn successors(&self, node: RrNodeId) -> impl Iterator<Item = RrNodeId> + '_ {
        self.out_edges(node).iter().map(|&e| self.edges[e.index()].sink)
    }

    /// Nodes driving `node`.
    pub fn predecessors(&self, node: RrNodeId) -> impl Iterator<Item = RrNodeId> + '_ {
        self.fan_in(node).iter().map(|&e| self.edges[e.index()].src)
    }

    /// The coordinate lookup.
    pub fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Mutable coordinate lookup.
    pub fn index_mut(&mut self) -> &mut SpatialIndex {
        &mut self.index
    }

    /// Node arena and lookup, borrowed together.
    pub(crate) fn split_mut(&mut self) -> (&mut [RrNode], &mut SpatialIndex) {
        (&mut self.nodes, &mut self.index)
    }

    /// Validates structural invariants of every node and edge.
    pub fn check(&self) -> Result<(), RrGraphError> {
        for (id, node) in self.nodes() {
            let invalid = |reason: String| RrGraphError::InvalidNode { node: id, reason };
            let bb = node.bbox;
            if bb.xlow > bb.xhigh || bb.ylow > bb.yhigh {
                return Err(invalid(format!("inverted bounding box {bb:?}")));
            }
            if bb.xhigh >= self.width() || bb.yhigh >= self.height() || node.layer >= self.num_layers() {
                return Err(invalid(format!("bounding box {bb:?} layer {} is outside the device", node.layer)));
            }
            if node.capacity == 0 {
                return Err(invalid("zero capacity".to_string()));
            }
            if node.kind.is_chan() {
                if node.direction.is_none() {
                    return Err(invalid(format!("{} without a direction", node.kind)));
                }
                let slots = node.track_nums_by_coordinate();
                let (lo, hi) = match node.kind {
                    RrNodeKind::ChanX => (bb.xlow, bb.xhigh),
                    _ => (bb.ylow, bb.yhigh),
                };
                let coords: Vec<usize> = slots.iter().map(|s| s.coord).collect();
                if coords != (lo..=hi).collect::<Vec<_>>() {
                    return Err(invalid(format!(
                        "track slots at {coords:?} do not cover {lo}..={hi} once each"
                    )));
                }
            } else if node.direction.is_some() {
                return Err(invalid(format!("{} with a direction", node.kind)));
            }
        }
        for edge in &self.edges {
            for end in [edge.src, edge.sink] {
                if end.index() >= self.nodes.len() {
                    return Err(RrGraphError::InvalidNode {
                        node: end,
                        reason: "edge endpoint outside the node arena".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Summary statistics.
    pub fn stats(&self) -> RrGraphStats {
        let mut counts = NodeCounts::default();
        let mut wire_len = 0usize;
        let mut num_wires = 0usize;
        for node in &self.nodes {
            counts[node.kind] += 1;
            if node.kind.is_chan() {
                wire_len += node.length();
                num_wires += 1;
            }
        }
        RrGraphStats {
            counts,
            num_nodes: self.nodes.len(),
            num_edges: self.edges.len(),
            num_rc_records: self.rc_data.len(),
            avg_wire_length: if num_wires == 0 {
                0.0
            } else {
                wire_len as f64 / num_wires as f64
            },
        }
    }
}

/// Size summary of a built graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RrGraphStats {
    /// Nodes per kind over all layers.
    pub counts: NodeCounts,
    /// Total nodes.
    pub num_nodes: usize,
    /// Total edges.
    pub num_edges: usize,
    /// Distinct RC records.
    pub num_rc_records: usize,
    /// Mean number of positions spanned by a wire.
    pub avg_wire_length: f64,
}

impl fmt::Display for RrGraphStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "nodes: {}", self.num_nodes)?;
        for (kind, n) in self.counts.iter() {
            writeln!(f, "  {kind:<6} {n}")?;
        }
        writeln!(f, "edges: {}", self.num_edges)?;
        write!(f, "average wire length: {:.2}", self.avg_wire_length)
    }
}
