//! Reconfigurable fabric descriptions for the Tessel toolchain.
//!
//! An [`Architecture`] lists the tile types a device may contain (with their
//! pins and pin classes), the wire segment catalog, the switch types and the
//! named grid layouts. A layout is turned into a concrete [`DeviceGrid`] by
//! [`create_device_grid`], which resolves prioritized, formula-driven region
//! specifications and validates the result.
//!
//! # Usage
//!
//! ```
//! use tessel_arch::{create_device_grid, load_architecture};
//! use tessel_diagnostics::DiagnosticSink;
//!
//! let arch = load_architecture("k4_n4").unwrap();
//! let grid = create_device_grid(&arch, "fixed_5x5", &DiagnosticSink::new()).unwrap();
//! assert_eq!(grid.width(), 5);
//! ```

#![warn(missing_docs)]

pub mod arch;
pub mod builtin;
pub mod error;
pub mod formula;
pub mod grid;
pub mod ids;
pub mod layout;
pub mod types;

pub use arch::Architecture;
pub use error::{ArchError, FormulaError, GridError};
pub use grid::{DeviceGrid, GridTile};
pub use ids::{SegmentId, SwitchId, TileTypeId};
pub use layout::{
    auto_size_device_grid, build_device_grid, check_grid, create_device_grid, GridLayout,
    GridLocDef, LayoutKind, RegionSpec, ResourceRequirements, AUTO_LAYOUT,
};
pub use types::{
    Axis, PhysicalTileType, PinClass, PinLocation, PinType, Segment, SegmentAxis, Side, Switch,
};

/// Names accepted by [`load_architecture`].
pub const BUILTIN_ARCHITECTURES: &[&str] = &["k4_n4", "hetero"];

/// Returns the built-in architecture called `name`.
///
/// Matching is case-insensitive and accepts `-` in place of `_`.
pub fn load_architecture(name: &str) -> Result<Architecture, ArchError> {
    match name.to_ascii_lowercase().replace('-', "_").as_str() {
        "k4_n4" | "k4n4" => Ok(builtin::k4_n4()),
        "hetero" | "heterogeneous" => Ok(builtin::hetero()),
        _ => Err(ArchError::UnknownArchitecture {
            name: name.to_string(),
            supported: BUILTIN_ARCHITECTURES.join(", "),
        }),
    }
}
