//! Spatial index from `(layer, x, y, kind, ptc, side)` to node identity.
//!
//! One dense `[layer][x][y][side]` matrix per node kind, each slot holding a
//! ptc-indexed vector of node IDs. Pins are filed under the side they face;
//! sources, sinks and wires use the side-less slot. The index stores only
//! [`RrNodeId`]s; the node data lives in the graph arena.

use crate::error::RrGraphError;
use crate::ids::RrNodeId;
use crate::node::RrNodeKind;
use serde::{Deserialize, Serialize};
use tessel_arch::Side;
use tessel_common::NdMatrix;

const NUM_SIDE_SLOTS: usize = 5;

fn side_slot(side: Option<Side>) -> usize {
    side.map_or(NUM_SIDE_SLOTS - 1, Side::index)
}

type Slots = NdMatrix<Vec<Option<RrNodeId>>, 4>;

/// Coordinate lookup for routing-resource nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpatialIndex {
    num_layers: usize,
    width: usize,
    height: usize,
    by_kind: Vec<Slots>,
}

impl SpatialIndex {
    /// An empty index for a device of the given size.
    pub fn new(num_layers: usize, width: usize, height: usize) -> Self {
        let empty = NdMatrix::new([num_layers, width, height, NUM_SIDE_SLOTS], Vec::new());
        Self {
            num_layers,
            width,
            height,
            by_kind: vec![empty; RrNodeKind::ALL.len()],
        }
    }

    /// Number of indexed layers.
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// Indexed width.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Indexed height.
    pub fn height(&self) -> usize {
        self.height
    }

    fn check(&self, layer: usize, x: usize, y: usize) -> Result<(), RrGraphError> {
        if layer < self.num_layers && x < self.width && y < self.height {
            Ok(())
        } else {
            Err(RrGraphError::OutOfBounds { layer, x, y })
        }
    }

    fn slot(&self, layer: usize, x: usize, y: usize, kind: RrNodeKind, side: Option<Side>) -> Option<&Vec<Option<RrNodeId>>> {
        self.by_kind[kind.index()].get([layer, x, y, side_slot(side)])
    }

    fn slot_mut(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        side: Option<Side>,
    ) -> &mut Vec<Option<RrNodeId>> {
        &mut self.by_kind[kind.index()][[layer, x, y, side_slot(side)]]
    }

    /// Pre-sizes the slot at `(x, y)` for `count` entries without creating any.
    pub fn reserve(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        count: usize,
        side: Option<Side>,
    ) -> Result<(), RrGraphError> {
        self.check(layer, x, y)?;
        let slot = self.slot_mut(layer, x, y, kind, side);
        slot.reserve(count.saturating_sub(slot.len()));
        Ok(())
    }

    /// Records `node` under `(layer, x, y, kind, ptc, side)`.
    ///
    /// Fails if the entry is already taken and `kind` is not mirrorable.
    #[allow(clippy::too_many_arguments)]
    pub fn insert(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        ptc: usize,
        side: Option<Side>,
        node: RrNodeId,
    ) -> Result<(), RrGraphError> {
        self.check(layer, x, y)?;
        let slot = self.slot_mut(layer, x, y, kind, side);
        if slot.len() <= ptc {
            slot.resize(ptc + 1, None);
        }
        match slot[ptc] {
            Some(existing) if existing != node && !kind.is_mirrorable() => {
                Err(RrGraphError::DuplicateIndexEntry {
                    kind,
                    layer,
                    x,
                    y,
                    ptc,
                    existing,
                })
            }
            _ => {
                slot[ptc] = Some(node);
                Ok(())
            }
        }
    }

    /// Looks up one node.
    pub fn find(
        &self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        ptc: usize,
        side: Option<Side>,
    ) -> Option<RrNodeId> {
        self.slot(layer, x, y, kind, side)?.get(ptc).copied().flatten()
    }

    /// All nodes of `kind` filed at `(x, y)` under `side`, in ptc order.
    pub fn find_at(
        &self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        side: Option<Side>,
    ) -> Vec<RrNodeId> {
        self.slot(layer, x, y, kind, side)
            .map(|slot| slot.iter().flatten().copied().collect())
            .unwrap_or_default()
    }

    /// `(ptc, node)` pairs of `kind` filed at `(x, y)` under `side`, in ptc order.
    pub fn entries_at(
        &self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        side: Option<Side>,
    ) -> Vec<(usize, RrNodeId)> {
        self.slot(layer, x, y, kind, side)
            .map(|slot| {
                slot.iter()
                    .enumerate()
                    .filter_map(|(ptc, id)| id.map(|id| (ptc, id)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Number of nodes of `kind` filed at `(x, y)` under `side`.
    pub fn count(&self, layer: usize, x: usize, y: usize, kind: RrNodeKind, side: Option<Side>) -> usize {
        self.slot(layer, x, y, kind, side)
            .map(|slot| slot.iter().flatten().count())
            .unwrap_or(0)
    }

    /// Copies every entry of `kind` at `from` to `to`. Only sources and sinks
    /// may be mirrored.
    pub fn mirror(
        &mut self,
        layer: usize,
        from: (usize, usize),
        to: (usize, usize),
        kind: RrNodeKind,
        side: Option<Side>,
    ) -> Result<(), RrGraphError> {
        if !kind.is_mirrorable() {
            return Err(RrGraphError::NotMirrorable(kind));
        }
        self.check(layer, from.0, from.1)?;
        self.check(layer, to.0, to.1)?;
        let entries = self.slot_mut(layer, from.0, from.1, kind, side).clone();
        *self.slot_mut(layer, to.0, to.1, kind, side) = entries;
        Ok(())
    }

    /// Deletes one entry and returns the node it held.
    pub fn remove(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        kind: RrNodeKind,
        ptc: usize,
        side: Option<Side>,
    ) -> Option<RrNodeId> {
        self.check(layer, x, y).ok()?;
        self.slot_mut(layer, x, y, kind, side).get_mut(ptc)?.take()
    }

    /// Total number of filled entries, counting mirrored copies.
    pub fn num_entries(&self) -> usize {
        self.by_kind
            .iter()
            .flat_map(|m| m.iter())
            .map(|slot| slot.iter().flatten().count())
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> RrNodeId {
        RrNodeId::from_raw(n)
    }

    #[test]
    fn insert_and_find() {
        let mut index = SpatialIndex::new(1, 4, 4);
        index.reserve(0, 1, 2, RrNodeKind::Opin, 8, Some(Side::Top)).unwrap();
        index.insert(0, 1, 2, RrNodeKind::Opin, 3, Some(Side::Top), id(7)).unwrap();
        assert_eq!(index.find(0, 1, 2, RrNodeKind::Opin, 3, Some(Side::Top)), Some(id(7)));
        assert_eq!(index.find(0, 1, 2, RrNodeKind::Opin, 3, Some(Side::Left)), None);
        assert_eq!(index.find(0, 1, 2, RrNodeKind::Ipin, 3, Some(Side::Top)), None);
        assert_eq!(index.find(0, 1, 2, RrNodeKind::Opin, 2, Some(Side::Top)), None);
        assert_eq!(index.count(0, 1, 2, RrNodeKind::Opin, Some(Side::Top)), 1);
    }

    #[test]
    fn reserve_creates_nothing() {
        let mut index = SpatialIndex::new(1, 2, 2);
        index.reserve(0, 0, 0, RrNodeKind::Ipin, 16, Some(Side::Right)).unwrap();
        assert_eq!(index.count(0, 0, 0, RrNodeKind::Ipin, Some(Side::Right)), 0);
        assert_eq!(index.num_entries(), 0);
    }

    #[test]
    fn duplicate_pin_entry_fails() {
        let mut index = SpatialIndex::new(1, 3, 3);
        index.insert(0, 1, 1, RrNodeKind::ChanX, 0, None, id(1)).unwrap();
        let err = index.insert(0, 1, 1, RrNodeKind::ChanX, 0, None, id(2)).unwrap_err();
        assert!(matches!(err, RrGraphError::DuplicateIndexEntry { existing, .. } if existing == id(1)));
        // Re-inserting the same node is harmless.
        index.insert(0, 1, 1, RrNodeKind::ChanX, 0, None, id(1)).unwrap();
    }

    #[test]
    fn mirror_copies_sources() {
        let mut index = SpatialIndex::new(1, 3, 3);
        index.insert(0, 0, 0, RrNodeKind::Source, 0, None, id(4)).unwrap();
        index.insert(0, 0, 0, RrNodeKind::Source, 2, None, id(5)).unwrap();
        index.mirror(0, (0, 0), (0, 1), RrNodeKind::Source, None).unwrap();
        assert_eq!(index.find(0, 0, 1, RrNodeKind::Source, 2, None), Some(id(5)));
        assert_eq!(index.find_at(0, 0, 1, RrNodeKind::Source, None), vec![id(4), id(5)]);
        assert_eq!(index.entries_at(0, 0, 1, RrNodeKind::Source, None), vec![(0, id(4)), (2, id(5))]);
    }

    #[test]
    fn mirror_rejects_pins() {
        let mut index = SpatialIndex::new(1, 3, 3);
        assert!(matches!(
            index.mirror(0, (0, 0), (1, 0), RrNodeKind::Ipin, Some(Side::Top)),
            Err(RrGraphError::NotMirrorable(RrNodeKind::Ipin))
        ));
    }

    #[test]
    fn remove_clears_one_entry() {
        let mut index = SpatialIndex::new(1, 3, 3);
        index.insert(0, 2, 2, RrNodeKind::Sink, 1, None, id(9)).unwrap();
        index.mirror(0, (2, 2), (2, 1), RrNodeKind::Sink, None).unwrap();
        assert_eq!(index.remove(0, 2, 1, RrNodeKind::Sink, 1, None), Some(id(9)));
        assert_eq!(index.remove(0, 2, 1, RrNodeKind::Sink, 1, None), None);
        assert_eq!(index.find(0, 2, 2, RrNodeKind::Sink, 1, None), Some(id(9)));
    }

    #[test]
    fn out_of_bounds() {
        let mut index = SpatialIndex::new(1, 3, 3);
        assert!(matches!(
            index.insert(0, 3, 0, RrNodeKind::Opin, 0, Some(Side::Top), id(0)),
            Err(RrGraphError::OutOfBounds { x: 3, .. })
        ));
        assert_eq!(index.find(1, 0, 0, RrNodeKind::Opin, 0, Some(Side::Top)), None);
        assert_eq!(index.remove(0, 9, 9, RrNodeKind::Sink, 0, None), None);
    }
}
