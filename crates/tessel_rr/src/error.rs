//! Error type for routing-resource graph construction.

use crate::ids::RrNodeId;
use crate::node::RrNodeKind;
use tessel_arch::Axis;
use tessel_common::InternalError;

/// Fatal errors while building or checking a routing-resource graph.
#[derive(Debug, thiserror::Error)]
pub enum RrGraphError {
    /// The loaders created a different number of nodes than the estimator predicted.
    #[error(
        "node count mismatch on layer {layer} for {kind}: estimated {estimated}, created {actual}"
    )]
    EstimateMismatch {
        /// Die layer.
        layer: usize,
        /// Node kind whose count diverged.
        kind: RrNodeKind,
        /// Estimator output.
        estimated: usize,
        /// Nodes actually created.
        actual: usize,
    },

    /// A spatial index slot for a non-mirrorable kind was already taken.
    #[error("duplicate {kind} lookup entry at ({x},{y}) layer {layer} ptc {ptc}: already node {existing}")]
    DuplicateIndexEntry {
        /// Node kind.
        kind: RrNodeKind,
        /// Die layer.
        layer: usize,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// Pin, class or track number.
        ptc: usize,
        /// Node already stored in the slot.
        existing: RrNodeId,
    },

    /// Mirroring was requested for a kind that is not shared across tile cells.
    #[error("{0} lookup entries cannot be mirrored")]
    NotMirrorable(RrNodeKind),

    /// A lookup coordinate lies outside the indexed device.
    #[error("lookup coordinate ({x},{y}) layer {layer} is outside the device")]
    OutOfBounds {
        /// Die layer.
        layer: usize,
        /// Column.
        x: usize,
        /// Row.
        y: usize,
    },

    /// No segment type may be used along an axis.
    #[error("no wire segment is usable in {axis:?} channels")]
    NoSegments {
        /// Channel orientation.
        axis: Axis,
    },

    /// The device is too small to hold routing channels.
    #[error("device {width}x{height} is too small for routing channels (minimum 3x3)")]
    DeviceTooSmall {
        /// Grid width.
        width: usize,
        /// Grid height.
        height: usize,
    },

    /// A node violates a structural invariant.
    #[error("node {node}: {reason}")]
    InvalidNode {
        /// Offending node.
        node: RrNodeId,
        /// What is wrong.
        reason: String,
    },

    /// A bug in the builder.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
