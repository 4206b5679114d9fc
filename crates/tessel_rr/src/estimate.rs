//! Node count estimation.
//!
//! Walks the grid once, without allocating nodes, to predict how many nodes
//! of each kind the loaders will create on a layer. The channel part applies
//! the same existence and start/end forcing rules as the channel loader, so
//! the estimate is exact; the builder treats any divergence as fatal.

use crate::annotation::ShrinkBoundary;
use crate::chan_detail::{ChannelDetail, SegmentCatalog};
use crate::geometry::Fabric;
use crate::node::RrNodeKind;
use crate::options::ChannelOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};
use tessel_arch::{Axis, PinType};

/// Node count per kind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeCounts {
    counts: [usize; 6],
}

impl NodeCounts {
    /// Sum over all kinds.
    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(kind, count)` pairs in kind order.
    pub fn iter(&self) -> impl Iterator<Item = (RrNodeKind, usize)> + '_ {
        RrNodeKind::ALL.iter().map(move |&k| (k, self.counts[k.index()]))
    }

    /// Adds another count kind by kind.
    pub fn merge(&mut self, other: &NodeCounts) {
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
    }
}

impl Index<RrNodeKind> for NodeCounts {
    type Output = usize;

    fn index(&self, kind: RrNodeKind) -> &usize {
        &self.counts[kind.index()]
    }
}

impl IndexMut<RrNodeKind> for NodeCounts {
    fn index_mut(&mut self, kind: RrNodeKind) -> &mut usize {
        &mut self.counts[kind.index()]
    }
}

impl fmt::Display for NodeCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(k, n)| format!("{k}={n}")).collect();
        write!(f, "{} (total {})", parts.join(" "), self.total())
    }
}

/// Predicts the node counts of `layer`.
pub fn estimate_rr_nodes(fabric: Fabric<'_>, layer: usize, options: &ChannelOptions) -> NodeCounts {
    let mut counts = estimate_grid_nodes(fabric, layer);
    let boundary = ShrinkBoundary::from_grid(fabric.grid, layer);
    for axis in [Axis::X, Axis::Y] {
        let catalog = SegmentCatalog::parallel(fabric.arch, axis);
        counts[RrNodeKind::chan(axis)] = estimate_chan_nodes(fabric, layer, axis, &catalog, options, &boundary);
    }
    counts
}

/// Pin, source and sink counts of `layer`.
fn estimate_grid_nodes(fabric: Fabric<'_>, layer: usize) -> NodeCounts {
    let mut counts = NodeCounts::default();
    for (x, y) in fabric.grid.block_origins(layer) {
        let tile_type = fabric.tile_type(layer, x, y);
        counts[RrNodeKind::Opin] += fabric.num_pins(layer, x, y, PinType::Driver);
        counts[RrNodeKind::Ipin] += fabric.num_pins(layer, x, y, PinType::Receiver);
        counts[RrNodeKind::Source] += tile_type.num_classes(PinType::Driver);
        counts[RrNodeKind::Sink] += tile_type.num_classes(PinType::Receiver);
    }
    counts
}

fn estimate_chan_nodes(
    fabric: Fabric<'_>,
    layer: usize,
    axis: Axis,
    catalog: &SegmentCatalog<'_>,
    options: &ChannelOptions,
    boundary: &ShrinkBoundary,
) -> usize {
    let chan_width = options.chan_width(axis);
    let max_len = fabric.chan_length(axis);
    let mut count = 0;
    for run in fabric.channel_runs(axis) {
        for (x, y) in run {
            let Some(pos) = fabric.channel_position(layer, axis, x, y, options, boundary) else {
                continue;
            };
            let detail = ChannelDetail::build_unidir(
                chan_width,
                &catalog.segments,
                max_len,
                pos.force_start,
                pos.force_end,
            );
            count += detail.num_new_nodes();
        }
    }
    count
}
