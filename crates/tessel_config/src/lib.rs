//! Parsing and validation of `tessel.toml` flow configuration files.
//!
//! This crate reads the flow configuration and produces a strongly-typed
//! [`FlowConfig`], then resolves it into the option structs the graph
//! builder, the lookahead and the NoC router take.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod resolve;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_file, load_config_from_str, CONFIG_FILE_NAME};
pub use resolve::{resolve_build, ArchSource, ResolvedBuild};
pub use types::*;
