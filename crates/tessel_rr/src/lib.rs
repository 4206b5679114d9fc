//! Routing-resource graph construction for tileable fabrics.
//!
//! Given an [`Architecture`](tessel_arch::Architecture) and a
//! [`DeviceGrid`](tessel_arch::DeviceGrid), [`build_rr_graph`] creates every
//! routing resource of the device as a node of one [`RrGraph`] arena:
//! sources, sinks and pins for each placed tile, and unidirectional wires
//! for each channel. Node counts are predicted up front by
//! [`estimate_rr_nodes`] and verified after loading. A [`SpatialIndex`] maps
//! `(layer, x, y, kind, ptc, side)` to node IDs. The switch block table
//! records which wires drive which at every channel crossing, edges are
//! materialized from it, and multi-cell sinks are finally compacted onto
//! the cell nearest their input pins.
//!
//! # Usage
//!
//! ```
//! use tessel_arch::{create_device_grid, load_architecture};
//! use tessel_diagnostics::DiagnosticSink;
//! use tessel_rr::{build_rr_graph, ChannelOptions, RrGraphOptions};
//!
//! let arch = load_architecture("k4_n4").unwrap();
//! let sink = DiagnosticSink::new();
//! let grid = create_device_grid(&arch, "fixed_5x5", &sink).unwrap();
//! let options = RrGraphOptions {
//!     channels: ChannelOptions::uniform(4),
//!     ..RrGraphOptions::default()
//! };
//! let build = build_rr_graph(&arch, &grid, &options, &sink).unwrap();
//! assert_eq!(build.graph.num_nodes(), build.estimate.total());
//! ```

#![warn(missing_docs)]

pub mod annotation;
pub mod builder;
pub mod chan_detail;
pub mod chan_loader;
pub mod edges;
pub mod error;
pub mod estimate;
pub mod geometry;
pub mod graph;
pub mod grid_loader;
pub mod ids;
pub mod node;
pub mod options;
pub mod sink_compaction;
pub mod spatial;
pub mod switchblock;

pub use annotation::{ChannelAnnotation, ShrinkBoundary};
pub use builder::{build_rr_graph, RrGraphBuild, MIN_DEVICE_SIZE};
pub use error::RrGraphError;
pub use estimate::{estimate_rr_nodes, NodeCounts};
pub use geometry::Fabric;
pub use graph::{RcData, RrEdge, RrGraph, RrGraphStats};
pub use ids::{RcIndex, RrEdgeId, RrNodeId};
pub use node::{BoundingBox, Direction, RrNode, RrNodeKind, TrackSlot};
pub use options::{ChannelOptions, RrGraphOptions};
pub use sink_compaction::{compact_sinks, CompactionStats};
pub use spatial::SpatialIndex;
pub use switchblock::{SbEdge, SbKey, SwitchBlockPattern, SwitchBlockTable};
