//! Per-position channel track layouts.
//!
//! A [`ChannelDetail`] describes the tracks of one channel position: the
//! segment and direction of each track, whether a wire starts or ends there,
//! and (while loading) the node that currently occupies the track. Tracks
//! alternate increasing/decreasing, so track `2k` is increasing and `2k + 1`
//! decreasing. Wires twist one track per position, which is what
//! [`ChannelDetail::rotate_node_ids`] models when identities are carried to
//! the next position.

use crate::ids::RrNodeId;
use crate::node::Direction;
use tessel_arch::{Architecture, Axis, Segment, SegmentId};

/// One track of a channel position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChanTrack {
    /// Index into the channel's parallel segment catalog.
    pub segment: usize,
    /// Travel direction.
    pub direction: Direction,
    /// A wire begins here (low end for increasing, high end for decreasing).
    pub start: bool,
    /// A wire stops here.
    pub end: bool,
    /// The wire occupying the track, once known.
    pub node: Option<RrNodeId>,
}

impl ChanTrack {
    /// Whether the loader creates a new node for this track: increasing wires
    /// are created where they start, decreasing wires where they end, since
    /// positions are always walked in ascending order.
    pub fn creates_node(&self) -> bool {
        match self.direction {
            Direction::Inc => self.start,
            Direction::Dec => self.end,
        }
    }

    /// Whether this position is the last one the wire covers in ascending order.
    pub fn closes_node(&self) -> bool {
        match self.direction {
            Direction::Inc => self.end,
            Direction::Dec => self.start,
        }
    }
}

/// The unidirectional width actually built for a requested channel width.
pub fn unidir_chan_width(chan_width: usize) -> usize {
    chan_width + chan_width % 2
}

/// Distributes `num_sets` track pairs over the segment catalog in proportion
/// to segment frequency.
///
/// Each round gives one pair to the segment with the largest outstanding
/// demand; ties go to the segment listed first.
pub fn tracks_per_segment(num_sets: usize, segments: &[&Segment]) -> Vec<usize> {
    let mut result = vec![0; segments.len()];
    if segments.is_empty() {
        return result;
    }
    let scale: f64 = segments.iter().map(|s| s.length.max(1) as f64).product();
    let freq_sum: f64 = segments.iter().map(|s| f64::from(s.frequency)).sum();
    let reduce = scale * freq_sum;
    let mut demand: Vec<f64> = segments
        .iter()
        .map(|s| scale * num_sets as f64 * f64::from(s.frequency))
        .collect();

    let mut imax = 0;
    for _ in 0..num_sets {
        let mut max = 0.0;
        for (i, &d) in demand.iter().enumerate() {
            if d > max {
                imax = i;
                max = d;
            }
        }
        demand[imax] -= reduce;
        result[imax] += 1;
    }
    result
}

/// The segments usable along one axis, in catalog order.
#[derive(Clone, Debug)]
pub struct SegmentCatalog<'a> {
    /// Architecture-level segment IDs.
    pub ids: Vec<SegmentId>,
    /// The segments themselves, parallel to `ids`.
    pub segments: Vec<&'a Segment>,
}

impl<'a> SegmentCatalog<'a> {
    /// The segments of `arch` parallel to `axis`.
    pub fn parallel(arch: &'a Architecture, axis: Axis) -> Self {
        let ids = arch.parallel_segments(axis);
        let segments = ids.iter().map(|&id| arch.segment(id)).collect();
        Self { ids, segments }
    }

    /// Number of usable segments.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns `true` if no segment runs along this axis.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// The track layout of one channel position.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelDetail {
    tracks: Vec<ChanTrack>,
}

impl ChannelDetail {
    /// Builds the unidirectional layout for a channel of `chan_width` tracks.
    ///
    /// Longline segments span the whole channel (`max_seg_length`
    /// positions). `force_start` makes every wire start here and
    /// `force_end` makes every wire stop here.
    pub fn build_unidir(
        chan_width: usize,
        segments: &[&Segment],
        max_seg_length: usize,
        force_start: bool,
        force_end: bool,
    ) -> Self {
        let num_sets = unidir_chan_width(chan_width) / 2;
        let per_segment = tracks_per_segment(num_sets, segments);

        let mut tracks = Vec::with_capacity(num_sets * 2);
        for (segment, (seg, &n)) in segments.iter().zip(&per_segment).enumerate() {
            let seg_len = if seg.longline {
                max_seg_length.max(1)
            } else {
                seg.length.max(1)
            };
            for itrack in 0..n {
                let start = itrack % seg_len == 0;
                let end = itrack % seg_len == seg_len - 1 || itrack + 1 == n;
                for direction in [Direction::Inc, Direction::Dec] {
                    tracks.push(ChanTrack {
                        segment,
                        direction,
                        start,
                        end,
                        node: None,
                    });
                }
            }
        }

        let mut detail = Self { tracks };
        if force_start {
            detail.set_force_start();
        }
        if force_end {
            detail.set_force_end();
        }
        detail
    }

    /// Every wire begins at this position.
    pub fn set_force_start(&mut self) {
        for t in &mut self.tracks {
            match t.direction {
                Direction::Inc => t.start = true,
                Direction::Dec => t.end = true,
            }
        }
    }

    /// Every wire stops at this position.
    pub fn set_force_end(&mut self) {
        for t in &mut self.tracks {
            match t.direction {
                Direction::Inc => t.end = true,
                Direction::Dec => t.start = true,
            }
        }
    }

    /// Number of tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    /// Returns `true` for a channel without tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// All tracks in track-number order.
    pub fn tracks(&self) -> &[ChanTrack] {
        &self.tracks
    }

    /// One track.
    pub fn track(&self, track: usize) -> &ChanTrack {
        &self.tracks[track]
    }

    /// Number of nodes the loader creates at this position.
    pub fn num_new_nodes(&self) -> usize {
        self.tracks.iter().filter(|t| t.creates_node()).count()
    }

    /// Number of tracks of `direction` flagged as starting.
    pub fn num_starting(&self, direction: Direction) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.direction == direction && t.start)
            .count()
    }

    /// Number of tracks of `direction` flagged as ending.
    pub fn num_ending(&self, direction: Direction) -> usize {
        self.tracks
            .iter()
            .filter(|t| t.direction == direction && t.end)
            .count()
    }

    /// Node occupying each track.
    pub fn node_ids(&self) -> Vec<Option<RrNodeId>> {
        self.tracks.iter().map(|t| t.node).collect()
    }

    /// Overwrites the node of every track. `ids` must have one entry per track.
    pub fn set_node_ids(&mut self, ids: &[Option<RrNodeId>]) {
        debug_assert_eq!(ids.len(), self.tracks.len());
        for (t, &id) in self.tracks.iter_mut().zip(ids) {
            t.node = id;
        }
    }

    /// Records the node occupying `track`.
    pub fn set_node(&mut self, track: usize, node: RrNodeId) {
        self.tracks[track].node = Some(node);
    }

    /// The tracks of `direction` grouped by wire run: each group begins at a
    /// starting track and collects the following non-starting tracks of the
    /// same segment.
    pub fn seg_groups(&self, direction: Direction) -> Vec<Vec<usize>> {
        let mut groups = Vec::new();
        for (i, first) in self.tracks.iter().enumerate() {
            if first.direction != direction || !first.start {
                continue;
            }
            let mut group = vec![i];
            for (j, t) in self.tracks.iter().enumerate().skip(i + 1) {
                if t.direction != direction || t.segment != first.segment {
                    continue;
                }
                if t.start {
                    break;
                }
                group.push(j);
            }
            groups.push(group);
        }
        groups
    }

    /// Moves node identities `offset` tracks within each wire group of
    /// `direction`: towards higher track numbers when `counter_rotate` is set,
    /// towards lower ones otherwise.
    pub fn rotate_node_ids(&mut self, offset: usize, direction: Direction, counter_rotate: bool) {
        for group in self.seg_groups(direction) {
            let mut ids: Vec<Option<RrNodeId>> = group.iter().map(|&i| self.tracks[i].node).collect();
            let shift = offset % ids.len();
            if counter_rotate {
                ids.rotate_right(shift);
            } else {
                ids.rotate_left(shift);
            }
            for (&i, id) in group.iter().zip(ids) {
                self.tracks[i].node = id;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessel_arch::{SegmentAxis, SwitchId};

    fn seg(length: usize, frequency: f32) -> Segment {
        Segment {
            name: format!("L{length}"),
            length,
            frequency,
            longline: false,
            axis: SegmentAxis::Both,
            wire_switch: SwitchId::from_raw(1),
            opin_switch: SwitchId::from_raw(1),
            r_per_tile: 0.0,
            c_per_tile: 0.0,
        }
    }

    fn id(n: u32) -> Option<RrNodeId> {
        Some(RrNodeId::from_raw(n))
    }

    #[test]
    fn odd_width_rounds_up() {
        assert_eq!(unidir_chan_width(4), 4);
        assert_eq!(unidir_chan_width(5), 6);
        assert_eq!(unidir_chan_width(0), 0);
    }

    #[test]
    fn tracks_follow_frequency() {
        let (l1, l4) = (seg(1, 0.5), seg(4, 0.5));
        assert_eq!(tracks_per_segment(4, &[&l1, &l4]), vec![2, 2]);
        assert_eq!(tracks_per_segment(3, &[&l1, &l4]), vec![2, 1]);
        let (a, b) = (seg(2, 0.75), seg(2, 0.25));
        assert_eq!(tracks_per_segment(4, &[&a, &b]), vec![3, 1]);
        assert!(tracks_per_segment(4, &[]).is_empty());
    }

    #[test]
    fn typical_layout_alternates_directions() {
        let l4 = seg(4, 1.0);
        let detail = ChannelDetail::build_unidir(4, &[&l4], 3, false, false);
        assert_eq!(detail.len(), 4);
        let dirs: Vec<Direction> = detail.tracks().iter().map(|t| t.direction).collect();
        assert_eq!(dirs, vec![Direction::Inc, Direction::Dec, Direction::Inc, Direction::Dec]);
        // Two pairs of a length-4 segment: the second pair is the last and ends.
        assert!(detail.track(0).start && !detail.track(0).end);
        assert!(!detail.track(2).start && detail.track(2).end);
        assert_eq!(detail.num_new_nodes(), 2);
    }

    #[test]
    fn forced_flags() {
        let l4 = seg(4, 1.0);
        let start = ChannelDetail::build_unidir(8, &[&l4], 3, true, false);
        assert_eq!(start.num_starting(Direction::Inc), 4);
        assert_eq!(start.num_ending(Direction::Dec), 4);
        assert_eq!(start.num_new_nodes(), 8);

        let end = ChannelDetail::build_unidir(8, &[&l4], 3, false, true);
        assert_eq!(end.num_ending(Direction::Inc), 4);
        assert_eq!(end.num_starting(Direction::Dec), 4);
        // Forcing an end creates nothing beyond the typical increasing start and decreasing end.
        assert_eq!(end.num_new_nodes(), 2);
    }

    #[test]
    fn longline_spans_channel() {
        let mut long = seg(1, 1.0);
        long.longline = true;
        let detail = ChannelDetail::build_unidir(6, &[&long], 5, false, false);
        assert_eq!(detail.num_starting(Direction::Inc), 1);
        assert_eq!(detail.num_ending(Direction::Inc), 1);
    }

    #[test]
    fn groups_and_rotation() {
        let l4 = seg(4, 1.0);
        let mut detail = ChannelDetail::build_unidir(8, &[&l4], 10, false, false);
        assert_eq!(detail.seg_groups(Direction::Inc), vec![vec![0, 2, 4, 6]]);
        assert_eq!(detail.seg_groups(Direction::Dec), vec![vec![1, 3, 5, 7]]);

        detail.set_node_ids(&[id(0), id(10), id(1), id(11), id(2), id(12), id(3), id(13)]);
        detail.rotate_node_ids(1, Direction::Inc, true);
        detail.rotate_node_ids(1, Direction::Dec, false);
        assert_eq!(
            detail.node_ids(),
            vec![id(3), id(11), id(0), id(12), id(1), id(13), id(2), id(10)]
        );
    }

    #[test]
    fn partial_group_rotates_alone() {
        let l4 = seg(4, 1.0);
        // Six pairs: one full group of four and a trailing group of two.
        let mut detail = ChannelDetail::build_unidir(12, &[&l4], 10, false, false);
        assert_eq!(detail.seg_groups(Direction::Inc), vec![vec![0, 2, 4, 6], vec![8, 10]]);
        let mut ids = vec![None; 12];
        ids[8] = id(8);
        detail.set_node_ids(&ids);
        detail.rotate_node_ids(1, Direction::Inc, true);
        assert_eq!(detail.track(10).node, id(8));
        assert_eq!(detail.track(8).node, None);
    }

    #[test]
    fn forced_start_has_singleton_groups() {
        let l4 = seg(4, 1.0);
        let detail = ChannelDetail::build_unidir(8, &[&l4], 10, true, false);
        assert_eq!(detail.seg_groups(Direction::Inc).len(), 4);
    }
}
