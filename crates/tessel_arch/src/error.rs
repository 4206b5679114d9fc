//! Error types for architecture loading, formula evaluation and grid construction.

use std::path::PathBuf;

/// Errors that occur while loading or validating an architecture.
#[derive(Debug, thiserror::Error)]
pub enum ArchError {
    /// No built-in architecture has the requested name.
    #[error("unknown architecture {name:?}. Supported: {supported}")]
    UnknownArchitecture {
        /// The requested name.
        name: String,
        /// Comma-separated list of built-in names.
        supported: String,
    },

    /// An architecture file could not be read.
    #[error("failed to read architecture file {path}: {source}")]
    Io {
        /// The file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// An architecture file could not be parsed.
    #[error("failed to parse architecture file {path}: {reason}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// The architecture is internally inconsistent.
    #[error("invalid architecture '{arch}': {reason}")]
    Invalid {
        /// Architecture name.
        arch: String,
        /// What is wrong.
        reason: String,
    },
}

/// Errors from the layout formula evaluator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("invalid formula '{expr}': {reason}")]
pub struct FormulaError {
    /// The formula text.
    pub expr: String,
    /// What went wrong.
    pub reason: String,
}

/// Fatal errors while building a device grid from a layout.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    /// The requested layout name is not defined.
    #[error("Failed to find grid layout named '{name}' (valid grid layouts: {valid})")]
    UnknownLayout {
        /// The requested layout name.
        name: String,
        /// Quoted, comma-separated list of defined layouts.
        valid: String,
    },

    /// The architecture has no layouts at all.
    #[error("architecture '{0}' defines no grid layouts")]
    NoLayouts(String),

    /// A location definition refers to an unknown block type.
    #[error("Failed to find block type '{0}' for grid location specification")]
    UnknownBlockType(String),

    /// A region formula failed to evaluate.
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// A region ends before it starts.
    #[error(
        "Grid location specification end{axis} ({end_expr} = {end}) can not come before start{axis} ({start_expr} = {start}) for block type '{block}'"
    )]
    EndBeforeStart {
        /// `'x'` or `'y'`.
        axis: char,
        /// End formula.
        end_expr: String,
        /// Evaluated end.
        end: i64,
        /// Start formula.
        start_expr: String,
        /// Evaluated start.
        start: i64,
        /// Block type name.
        block: String,
    },

    /// The increment would make instances overlap.
    #[error(
        "Grid location specification incr{axis} for block type '{block}' must be at least block {dim_name} ({dim}) to avoid overlapping instances (was {expr} = {value})"
    )]
    IncrementTooSmall {
        /// `'x'` or `'y'`.
        axis: char,
        /// Block type name.
        block: String,
        /// `"width"` or `"height"`.
        dim_name: &'static str,
        /// Block dimension.
        dim: usize,
        /// Increment formula.
        expr: String,
        /// Evaluated increment.
        value: i64,
    },

    /// The repeat distance would make region copies overlap.
    #[error(
        "Grid location specification repeat{axis} for block type '{block}' must be at least the region {dim_name} ({region}) to avoid overlapping instances (was {expr} = {value})"
    )]
    RepeatTooSmall {
        /// `'x'` or `'y'`.
        axis: char,
        /// Block type name.
        block: String,
        /// `"width"` or `"height"`.
        dim_name: &'static str,
        /// Region dimension.
        region: usize,
        /// Repeat formula.
        expr: String,
        /// Evaluated repeat.
        value: i64,
    },

    /// A fixed layout was built at a size other than its own.
    #[error("Requested grid size ({width}x{height}) does not match fixed device size ({fixed_width}x{fixed_height})")]
    SizeMismatch {
        /// Requested width.
        width: usize,
        /// Requested height.
        height: usize,
        /// Layout width.
        fixed_width: usize,
        /// Layout height.
        fixed_height: usize,
    },

    /// Auto-sizing never found a grid that satisfies the resource requirements.
    #[error(
        "Device auto-fit aborted: device size already exceeds required resources count by {factor} times yet still cannot fit the design"
    )]
    AutoFitAborted {
        /// The size factor that was reached.
        factor: usize,
    },

    /// Auto-sizing was asked for but no layout can satisfy the requirements.
    #[error("no grid layout of '{arch}' satisfies the requested resources")]
    NoFittingLayout {
        /// Architecture name.
        arch: String,
    },

    /// An auto layout's aspect ratio is not a positive finite number.
    #[error("grid layout '{layout}' has invalid aspect ratio {value}")]
    InvalidAspectRatio {
        /// Layout name.
        layout: String,
        /// The offending ratio.
        value: f32,
    },

    /// The built grid failed validation.
    #[error("Grid Location ({x},{y}) {reason}")]
    InvalidGrid {
        /// Column.
        x: usize,
        /// Row.
        y: usize,
        /// What is wrong.
        reason: String,
    },
}
