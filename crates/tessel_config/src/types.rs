//! Configuration types deserialized from `tessel.toml`.

use serde::Deserialize;
use std::collections::BTreeMap;

/// The top-level flow configuration parsed from `tessel.toml`.
///
/// Every section is optional; an empty file describes an auto-sized `k4_n4`
/// device with 20-track channels.
#[derive(Debug, Default, Deserialize)]
pub struct FlowConfig {
    /// Architecture and device grid selection.
    #[serde(default)]
    pub device: DeviceConfig,
    /// Channel sizing and switch block settings.
    #[serde(default)]
    pub routing: RoutingConfig,
    /// Router lookahead cache settings.
    #[serde(default)]
    pub lookahead: LookaheadConfig,
    /// Network-on-chip settings.
    #[serde(default)]
    pub noc: NocConfig,
}

/// Which fabric to build.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Built-in architecture name (e.g., "k4_n4", "hetero").
    pub architecture: String,
    /// Path to a `.toml` or `.json` architecture description. Takes
    /// precedence over `architecture` when set.
    pub architecture_file: Option<String>,
    /// Layout name, or "auto" to size the device to `resources`.
    pub layout: String,
    /// Minimum instance counts per tile type name for auto-sizing.
    pub resources: BTreeMap<String, usize>,
    /// Largest fraction of the grid area the resources may occupy.
    pub max_utilization: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            architecture: "k4_n4".to_string(),
            architecture_file: None,
            layout: "auto".to_string(),
            resources: BTreeMap::new(),
            max_utilization: 1.0,
        }
    }
}

/// Routing channel settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// Tracks per channel in both directions.
    pub channel_width: usize,
    /// Overrides `channel_width` for horizontal channels.
    pub channel_width_x: Option<usize>,
    /// Overrides `channel_width` for vertical channels.
    pub channel_width_y: Option<usize>,
    /// Let channels run through multi-cell tiles.
    pub through_channel: bool,
    /// Only build channels around the occupied region.
    pub shrink_boundary: bool,
    /// Switch block pattern name ("subset", "wilton" or "universal").
    pub switch_block: String,
    /// Overrides every tile type's input connection fraction.
    pub fc_in: Option<f32>,
    /// Overrides every tile type's output connection fraction.
    pub fc_out: Option<f32>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            channel_width: 20,
            channel_width_x: None,
            channel_width_y: None,
            through_channel: false,
            shrink_boundary: false,
            switch_block: "wilton".to_string(),
            fc_in: None,
            fc_out: None,
        }
    }
}

/// Router lookahead settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LookaheadConfig {
    /// Cache file, relative to the configuration directory. No caching when unset.
    pub cache: Option<String>,
    /// Start wires expanded per layer, orientation and segment type.
    pub samples_per_segment: usize,
    /// Seed of the start-wire selection.
    pub seed: u64,
    /// Share of delay in the expected cost, in `[0, 1]`.
    pub criticality: f32,
    /// Scale applied to the expected cost.
    pub astar_fac: f32,
}

impl Default for LookaheadConfig {
    fn default() -> Self {
        Self {
            cache: None,
            samples_per_segment: 4,
            seed: 1,
            criticality: 0.5,
            astar_fac: 1.2,
        }
    }
}

/// Network-on-chip settings.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NocConfig {
    /// Routing algorithm name (e.g., "xy_routing", "odd_even_routing").
    pub algorithm: String,
    /// Routers per mesh row.
    pub mesh_width: usize,
    /// Routers per mesh column.
    pub mesh_height: usize,
    /// Bandwidth of every mesh link in bits per second.
    pub link_bandwidth: f64,
}

impl Default for NocConfig {
    fn default() -> Self {
        Self {
            algorithm: "xy_routing".to_string(),
            mesh_width: 4,
            mesh_height: 4,
            link_bandwidth: 1.0e9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn empty_file_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.device.architecture, "k4_n4");
        assert_eq!(config.device.layout, "auto");
        assert_eq!(config.routing.channel_width, 20);
        assert_eq!(config.routing.switch_block, "wilton");
        assert!(config.lookahead.cache.is_none());
        assert_eq!(config.noc.algorithm, "xy_routing");
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml = r#"
[routing]
channel_width_y = 12

[lookahead]
criticality = 0.75
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.routing.channel_width, 20);
        assert_eq!(config.routing.channel_width_y, Some(12));
        assert_eq!(config.lookahead.criticality, 0.75);
        assert_eq!(config.lookahead.samples_per_segment, 4);
    }

    #[test]
    fn resources_table() {
        let toml = r#"
[device]
architecture = "hetero"
layout = "auto"
max_utilization = 0.75

[device.resources]
clb = 20
mult = 2
"#;
        let config = load_config_from_str(toml).unwrap();
        assert_eq!(config.device.resources["clb"], 20);
        assert_eq!(config.device.resources["mult"], 2);
        assert_eq!(config.device.max_utilization, 0.75);
    }
}
