//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::FlowConfig;
use std::path::Path;
use tessel_noc::RoutingAlgorithm;
use tessel_rr::SwitchBlockPattern;

/// Name of the configuration file inside a project directory.
pub const CONFIG_FILE_NAME: &str = "tessel.toml";

/// Loads and validates a `tessel.toml` configuration from a project directory.
///
/// Reads `<project_dir>/tessel.toml`, parses it, and validates its values.
pub fn load_config(project_dir: &Path) -> Result<FlowConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE_NAME))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<FlowConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_config_from_str(&content)
}

/// Parses and validates a `tessel.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<FlowConfig, ConfigError> {
    let config: FlowConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn invalid(message: String) -> ConfigError {
    ConfigError::ValidationError(message)
}

/// Validates that required fields are present and values are in range.
fn validate_config(config: &FlowConfig) -> Result<(), ConfigError> {
    let device = &config.device;
    if device.architecture.is_empty() && device.architecture_file.is_none() {
        return Err(ConfigError::MissingField("device.architecture".to_string()));
    }
    if device.layout.is_empty() {
        return Err(ConfigError::MissingField("device.layout".to_string()));
    }
    if !(device.max_utilization > 0.0 && device.max_utilization <= 1.0) {
        return Err(invalid(format!(
            "device.max_utilization must be in (0, 1], got {}",
            device.max_utilization
        )));
    }

    let routing = &config.routing;
    for (field, width) in [
        ("routing.channel_width", Some(routing.channel_width)),
        ("routing.channel_width_x", routing.channel_width_x),
        ("routing.channel_width_y", routing.channel_width_y),
    ] {
        if width == Some(0) {
            return Err(invalid(format!("{field} must be positive")));
        }
    }
    for (field, fc) in [("routing.fc_in", routing.fc_in), ("routing.fc_out", routing.fc_out)] {
        if let Some(fc) = fc {
            if !(fc > 0.0 && fc <= 1.0) {
                return Err(invalid(format!("{field} must be in (0, 1], got {fc}")));
            }
        }
    }
    if SwitchBlockPattern::from_name(&routing.switch_block).is_none() {
        return Err(invalid(format!(
            "unknown switch block pattern '{}'. Supported: {}",
            routing.switch_block,
            SwitchBlockPattern::NAMES.join(", ")
        )));
    }

    let lookahead = &config.lookahead;
    if lookahead.samples_per_segment == 0 {
        return Err(invalid("lookahead.samples_per_segment must be positive".to_string()));
    }
    if !(0.0..=1.0).contains(&lookahead.criticality) {
        return Err(invalid(format!(
            "lookahead.criticality must be in [0, 1], got {}",
            lookahead.criticality
        )));
    }
    if lookahead.astar_fac.is_nan() || lookahead.astar_fac <= 0.0 {
        return Err(invalid(format!(
            "lookahead.astar_fac must be positive, got {}",
            lookahead.astar_fac
        )));
    }

    let noc = &config.noc;
    RoutingAlgorithm::from_name(&noc.algorithm).map_err(|e| invalid(e.to_string()))?;
    if noc.mesh_width == 0 || noc.mesh_height == 0 {
        return Err(invalid("noc mesh dimensions must be positive".to_string()));
    }
    Ok(())
}
