//! Build options for the routing-resource graph.

use crate::switchblock::SwitchBlockPattern;
use serde::{Deserialize, Serialize};
use tessel_arch::Axis;

/// Channel sizing and wire-cutting policy. Everything the node count
/// depends on besides the architecture and the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelOptions {
    /// Tracks per horizontal channel.
    pub chan_width_x: usize,
    /// Tracks per vertical channel.
    pub chan_width_y: usize,
    /// Let channels run through multi-cell tiles instead of stopping at them.
    pub through_channel: bool,
    /// Only build channels inside the occupied region of each layer.
    pub shrink_boundary: bool,
}

impl ChannelOptions {
    /// Equal widths in both directions, no through-channels, full boundary.
    pub fn uniform(chan_width: usize) -> Self {
        Self {
            chan_width_x: chan_width,
            chan_width_y: chan_width,
            through_channel: false,
            shrink_boundary: false,
        }
    }

    /// Requested width of channels running along `axis`.
    pub fn chan_width(&self, axis: Axis) -> usize {
        match axis {
            Axis::X => self.chan_width_x,
            Axis::Y => self.chan_width_y,
        }
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::uniform(20)
    }
}

/// Everything [`build_rr_graph`](crate::build_rr_graph) needs besides the fabric.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct RrGraphOptions {
    /// Channel sizing.
    pub channels: ChannelOptions,
    /// Track-to-track permutation used in switch blocks.
    pub switch_block: SwitchBlockPattern,
    /// Overrides every tile type's input connection fraction.
    pub fc_in: Option<f32>,
    /// Overrides every tile type's output connection fraction.
    pub fc_out: Option<f32>,
}
