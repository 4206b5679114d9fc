//! Router lookahead: precomputed distance-to-cost estimates.
//!
//! A [`CostMap`] answers "how expensive is it to get from this node to that
//! sink" from displacement-bucketed tables filled by sampled shortest-path
//! searches over a finished [`RrGraph`](tessel_rr::RrGraph). The tables are
//! a heuristic: entries may be locally wrong, and unknown entries are NaN so
//! callers can fall back to a cheaper estimate. Maps persist to disk keyed by
//! an [`architecture_fingerprint`], so repeated runs on the same fabric skip
//! recomputation.

#![warn(missing_docs)]

pub mod compute;
pub mod cost;
pub mod error;
pub mod persist;

pub use compute::{compute_cost_map, LookaheadOptions};
pub use cost::{CostEntry, CostMap, PerTileEstimate, SearchParams};
pub use error::LookaheadError;
pub use persist::{architecture_fingerprint, LookaheadHeader};

use std::path::Path;
use tessel_arch::Architecture;
use tessel_common::ContentHash;
use tessel_rr::RrGraph;

/// Where a map returned by [`load_or_compute`] came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MapSource {
    /// Read from the cache file.
    Cached,
    /// Computed, and written to the cache file.
    Computed,
}

/// Reads the map at `path` if it matches `fingerprint` and is sized for
/// `graph`, otherwise computes it and writes it back.
pub fn load_or_compute(
    arch: &Architecture,
    graph: &RrGraph,
    options: &LookaheadOptions,
    path: &Path,
    fingerprint: ContentHash,
) -> Result<(CostMap, MapSource), LookaheadError> {
    if let Some(map) = CostMap::read(path, fingerprint) {
        if map.same_shape(&CostMap::empty(arch, graph)) {
            return Ok((map, MapSource::Cached));
        }
        log::warn!("discarding lookahead file {}: sized for another graph", path.display());
    }
    let map = compute_cost_map(arch, graph, options);
    map.write(path, fingerprint)?;
    Ok((map, MapSource::Computed))
}
