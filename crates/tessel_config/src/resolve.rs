//! Resolution of a flow configuration into builder options.

use crate::error::ConfigError;
use crate::types::FlowConfig;
use std::path::{Path, PathBuf};
use tessel_arch::{
    auto_size_device_grid, create_device_grid, load_architecture, ArchError, Architecture,
    DeviceGrid, GridError, ResourceRequirements, AUTO_LAYOUT,
};
use tessel_diagnostics::DiagnosticSink;
use tessel_lookahead::{LookaheadOptions, SearchParams};
use tessel_noc::RoutingAlgorithm;
use tessel_rr::{ChannelOptions, RrGraphOptions, SwitchBlockPattern};

/// Where the architecture description comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchSource {
    /// A built-in architecture, by name.
    Builtin(String),
    /// A `.toml` or `.json` description on disk.
    File(PathBuf),
}

impl ArchSource {
    /// Loads the architecture.
    pub fn load(&self) -> Result<Architecture, ArchError> {
        match self {
            ArchSource::Builtin(name) => load_architecture(name),
            ArchSource::File(path) => Architecture::from_file(path),
        }
    }
}

/// A fully resolved flow configuration.
///
/// Relative paths have been joined onto the configuration directory and
/// names have been parsed into their enums.
#[derive(Debug, Clone)]
pub struct ResolvedBuild {
    /// Architecture to load.
    pub arch: ArchSource,
    /// Layout name, or [`AUTO_LAYOUT`].
    pub layout: String,
    /// Minimum instance counts for auto-sizing.
    pub resources: ResourceRequirements,
    /// Utilization ceiling for auto-sizing.
    pub max_utilization: f32,
    /// Graph builder options.
    pub rr_options: RrGraphOptions,
    /// Lookahead sampling options.
    pub lookahead: LookaheadOptions,
    /// Expected-cost weights.
    pub search: SearchParams,
    /// Lookahead cache file, if caching is enabled.
    pub cache_path: Option<PathBuf>,
    /// NoC routing algorithm.
    pub noc_algorithm: RoutingAlgorithm,
    /// NoC mesh size as (width, height).
    pub noc_mesh: (usize, usize),
    /// NoC link bandwidth in bits per second.
    pub noc_link_bandwidth: f64,
}

impl ResolvedBuild {
    /// Builds the device grid: auto-sized to the configured resources when
    /// the layout is [`AUTO_LAYOUT`], otherwise the named layout.
    pub fn device_grid(
        &self,
        arch: &Architecture,
        sink: &DiagnosticSink,
    ) -> Result<DeviceGrid, GridError> {
        if self.layout == AUTO_LAYOUT {
            auto_size_device_grid(arch, &self.resources, self.max_utilization, sink)
        } else {
            create_device_grid(arch, &self.layout, sink)
        }
    }
}

/// Resolves `config`, taking relative paths from `base_dir`.
pub fn resolve_build(config: &FlowConfig, base_dir: &Path) -> Result<ResolvedBuild, ConfigError> {
    let arch = match &config.device.architecture_file {
        Some(file) => ArchSource::File(base_dir.join(file)),
        None => ArchSource::Builtin(config.device.architecture.clone()),
    };

    let routing = &config.routing;
    let switch_block = SwitchBlockPattern::from_name(&routing.switch_block).ok_or_else(|| {
        ConfigError::ValidationError(format!(
            "unknown switch block pattern '{}'",
            routing.switch_block
        ))
    })?;
    let channels = ChannelOptions {
        chan_width_x: routing.channel_width_x.unwrap_or(routing.channel_width),
        chan_width_y: routing.channel_width_y.unwrap_or(routing.channel_width),
        through_channel: routing.through_channel,
        shrink_boundary: routing.shrink_boundary,
    };

    let noc_algorithm = RoutingAlgorithm::from_name(&config.noc.algorithm)
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

    Ok(ResolvedBuild {
        arch,
        layout: config.device.layout.clone(),
        resources: config.device.resources.clone(),
        max_utilization: config.device.max_utilization,
        rr_options: RrGraphOptions {
            channels,
            switch_block,
            fc_in: routing.fc_in,
            fc_out: routing.fc_out,
        },
        lookahead: LookaheadOptions {
            samples_per_segment: config.lookahead.samples_per_segment,
            seed: config.lookahead.seed,
        },
        search: SearchParams {
            criticality: config.lookahead.criticality,
            astar_fac: config.lookahead.astar_fac,
        },
        cache_path: config.lookahead.cache.as_ref().map(|c| base_dir.join(c)),
        noc_algorithm,
        noc_mesh: (config.noc.mesh_width, config.noc.mesh_height),
        noc_link_bandwidth: config.noc.link_bandwidth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_config_from_str;

    #[test]
    fn defaults_resolve() {
        let config = load_config_from_str("").unwrap();
        let resolved = resolve_build(&config, Path::new("/proj")).unwrap();
        assert_eq!(resolved.arch, ArchSource::Builtin("k4_n4".to_string()));
        assert_eq!(resolved.rr_options, RrGraphOptions::default());
        assert_eq!(resolved.lookahead, LookaheadOptions::default());
        assert_eq!(resolved.search, SearchParams::default());
        assert!(resolved.cache_path.is_none());
        assert_eq!(resolved.noc_algorithm, RoutingAlgorithm::Xy);
    }

    #[test]
    fn per_axis_widths_override() {
        let config = load_config_from_str(
            "[routing]\nchannel_width = 10\nchannel_width_x = 14\nswitch_block = \"subset\"\n",
        )
        .unwrap();
        let resolved = resolve_build(&config, Path::new(".")).unwrap();
        assert_eq!(resolved.rr_options.channels.chan_width_x, 14);
        assert_eq!(resolved.rr_options.channels.chan_width_y, 10);
        assert_eq!(resolved.rr_options.switch_block, SwitchBlockPattern::Subset);
    }

    #[test]
    fn paths_are_relative_to_config_dir() {
        let config = load_config_from_str(
            "[device]\narchitecture_file = \"arch/mine.toml\"\n\n[lookahead]\ncache = \"out/la.tlka\"\n",
        )
        .unwrap();
        let resolved = resolve_build(&config, Path::new("/proj")).unwrap();
        assert_eq!(resolved.arch, ArchSource::File(PathBuf::from("/proj/arch/mine.toml")));
        assert_eq!(resolved.cache_path, Some(PathBuf::from("/proj/out/la.tlka")));
    }

    #[test]
    fn named_layout_builds_grid() {
        let config = load_config_from_str("[device]\nlayout = \"fixed_5x5\"\n").unwrap();
        let resolved = resolve_build(&config, Path::new(".")).unwrap();
        let arch = resolved.arch.load().unwrap();
        let grid = resolved.device_grid(&arch, &DiagnosticSink::new()).unwrap();
        assert_eq!((grid.width(), grid.height()), (5, 5));
    }

    #[test]
    fn auto_layout_meets_resources() {
        let config = load_config_from_str("[device.resources]\nclb = 30\n").unwrap();
        let resolved = resolve_build(&config, Path::new(".")).unwrap();
        let arch = resolved.arch.load().unwrap();
        let grid = resolved.device_grid(&arch, &DiagnosticSink::new()).unwrap();
        let clb = arch.tile_type_by_name("clb").unwrap();
        assert!(grid.num_instances(clb) >= 30);
    }

    #[test]
    fn unknown_builtin_fails_on_load() {
        let config = load_config_from_str("[device]\narchitecture = \"stratix\"\n").unwrap();
        let resolved = resolve_build(&config, Path::new(".")).unwrap();
        assert!(resolved.arch.load().is_err());
    }
}
