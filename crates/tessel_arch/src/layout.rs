//! Grid layout definitions and the device grid builder.
//!
//! A [`GridLayout`] is a list of prioritized region specifications
//! ([`GridLocDef`]) whose coordinates are formulas over the device size.
//! [`build_device_grid`] evaluates them at a concrete size, resolves
//! overlaps by priority and validates the result. [`create_device_grid`]
//! picks a layout by name, and [`auto_size_device_grid`] searches for the
//! smallest device that satisfies a set of resource requirements.

use crate::arch::Architecture;
use crate::error::GridError;
use crate::formula::{evaluate, FormulaVars};
use crate::grid::{DeviceGrid, GridTile};
use crate::ids::TileTypeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tessel_common::{GridLoc, NdMatrix};
use tessel_diagnostics::{Category, Diagnostic, DiagnosticCode, DiagnosticSink};

/// Layout name that requests automatic sizing.
pub const AUTO_LAYOUT: &str = "auto";

/// Auto-sizing gives up once the grid area exceeds the total required
/// instance count by this factor.
pub const MAX_SIZE_FACTOR: usize = 10_000;

const START_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Layout, 101);
const END_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Layout, 102);
const AMBIGUOUS_PRIORITY: DiagnosticCode = DiagnosticCode::new(Category::Layout, 103);
const UNUSED_BLOCK_TYPE: DiagnosticCode = DiagnosticCode::new(Category::Layout, 104);
const LAYER_OUT_OF_RANGE: DiagnosticCode = DiagnosticCode::new(Category::Layout, 105);

/// Minimum instance counts per tile type name, used for auto-sizing.
pub type ResourceRequirements = BTreeMap<String, usize>;

/// How a layout determines its device size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// A fixed device size.
    Fixed {
        /// Number of columns.
        width: usize,
        /// Number of rows.
        height: usize,
    },
    /// Sized on demand, keeping `width / height` close to `aspect_ratio`.
    Auto {
        /// Target width-to-height ratio.
        aspect_ratio: f32,
    },
}

/// One axis of a region specification. All fields are formulas.
///
/// Blocks are placed from `start` to `end` (inclusive) every `incr` cells;
/// the whole region is copied every `repeat` cells when `repeat` is set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegionSpec {
    /// First origin coordinate.
    pub start: String,
    /// Last covered coordinate.
    pub end: String,
    /// Distance between consecutive block origins.
    pub incr: String,
    /// Distance between region copies.
    #[serde(default)]
    pub repeat: Option<String>,
}

impl RegionSpec {
    /// A region from `start` to `end` stepping by `incr`, not repeated.
    pub fn new(start: impl Into<String>, end: impl Into<String>, incr: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            incr: incr.into(),
            repeat: None,
        }
    }

    /// Repeats the region every `repeat` cells.
    pub fn repeat(mut self, repeat: impl Into<String>) -> Self {
        self.repeat = Some(repeat.into());
        self
    }

    /// A single coordinate.
    pub fn at(pos: impl Into<String>) -> Self {
        let pos = pos.into();
        Self::new(pos.clone(), pos, "1")
    }

    fn full_x() -> Self {
        Self::new("0", "W - 1", "w")
    }

    fn full_y() -> Self {
        Self::new("0", "H - 1", "h")
    }
}

/// A prioritized placement rule for one block type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLocDef {
    /// Name of the tile type to place.
    pub block_type: String,
    /// Higher priorities override lower ones where regions overlap.
    pub priority: i32,
    /// Horizontal region.
    pub x: RegionSpec,
    /// Vertical region.
    pub y: RegionSpec,
    /// Die layer the rule applies to.
    #[serde(default)]
    pub layer: usize,
}

impl GridLocDef {
    /// A rule with explicit regions.
    pub fn region(block_type: &str, priority: i32, x: RegionSpec, y: RegionSpec) -> Self {
        Self {
            block_type: block_type.to_string(),
            priority,
            x,
            y,
            layer: 0,
        }
    }

    /// Fills the whole device.
    pub fn fill(block_type: &str, priority: i32) -> Self {
        Self::region(block_type, priority, RegionSpec::full_x(), RegionSpec::full_y())
    }

    /// The outer ring of the device, corners excluded from the side columns.
    pub fn perimeter(block_type: &str, priority: i32) -> Vec<Self> {
        vec![
            Self::region(block_type, priority, RegionSpec::full_x(), RegionSpec::at("0")),
            Self::region(block_type, priority, RegionSpec::full_x(), RegionSpec::at("H - 1")),
            Self::region(block_type, priority, RegionSpec::at("0"), RegionSpec::new("1", "H - 2", "h")),
            Self::region(block_type, priority, RegionSpec::at("W - 1"), RegionSpec::new("1", "H - 2", "h")),
        ]
    }

    /// The four corner cells.
    pub fn corners(block_type: &str, priority: i32) -> Vec<Self> {
        [("0", "0"), ("0", "H - 1"), ("W - 1", "0"), ("W - 1", "H - 1")]
            .into_iter()
            .map(|(x, y)| Self::single(block_type, priority, x, y))
            .collect()
    }

    /// A single block with its origin at `(x, y)`.
    pub fn single(block_type: &str, priority: i32, x: &str, y: &str) -> Self {
        Self::region(block_type, priority, RegionSpec::at(x), RegionSpec::at(y))
    }

    /// A full-height column starting at `x`, optionally repeated every `repeat` columns.
    pub fn col(block_type: &str, priority: i32, x: &str, repeat: Option<&str>) -> Self {
        let mut xspec = RegionSpec::at(x);
        xspec.repeat = repeat.map(str::to_string);
        Self::region(block_type, priority, xspec, RegionSpec::full_y())
    }

    /// A full-width row starting at `y`, optionally repeated every `repeat` rows.
    pub fn row(block_type: &str, priority: i32, y: &str, repeat: Option<&str>) -> Self {
        let mut yspec = RegionSpec::at(y);
        yspec.repeat = repeat.map(str::to_string);
        Self::region(block_type, priority, RegionSpec::full_x(), yspec)
    }

    /// Moves the rule to another die layer.
    pub fn on_layer(mut self, layer: usize) -> Self {
        self.layer = layer;
        self
    }
}

/// A named grid layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridLayout {
    /// Layout name.
    pub name: String,
    /// Fixed or automatic sizing.
    pub kind: LayoutKind,
    /// Number of die layers.
    #[serde(default = "default_layers")]
    pub num_layers: usize,
    /// Placement rules, applied in order.
    pub loc_defs: Vec<GridLocDef>,
}

fn default_layers() -> usize {
    1
}

impl GridLayout {
    /// A fixed-size layout.
    pub fn fixed(name: &str, width: usize, height: usize, loc_defs: Vec<GridLocDef>) -> Self {
        Self {
            name: name.to_string(),
            kind: LayoutKind::Fixed { width, height },
            num_layers: 1,
            loc_defs,
        }
    }

    /// An auto-sized layout.
    pub fn auto(name: &str, aspect_ratio: f32, loc_defs: Vec<GridLocDef>) -> Self {
        Self {
            name: name.to_string(),
            kind: LayoutKind::Auto { aspect_ratio },
            num_layers: 1,
            loc_defs,
        }
    }
}

/// Builds the grid for the layout called `layout_name`.
///
/// The name [`AUTO_LAYOUT`] auto-sizes with no resource requirements, which
/// yields the smallest device the architecture allows. Fails if the layout
/// does not exist, listing the valid names.
pub fn create_device_grid(
    arch: &Architecture,
    layout_name: &str,
    sink: &DiagnosticSink,
) -> Result<DeviceGrid, GridError> {
    if layout_name == AUTO_LAYOUT {
        return auto_size_device_grid(arch, &ResourceRequirements::new(), 1.0, sink);
    }
    let layout = arch
        .layout(layout_name)
        .ok_or_else(|| GridError::UnknownLayout {
            name: layout_name.to_string(),
            valid: arch.layout_names(),
        })?;
    match layout.kind {
        LayoutKind::Fixed { width, height } => {
            build_device_grid(arch, layout, width, height, true, sink)
        }
        LayoutKind::Auto { aspect_ratio } => auto_size_layout(
            arch,
            layout,
            aspect_ratio,
            &ResourceRequirements::new(),
            1.0,
            sink,
        ),
    }
}

/// Builds the smallest grid whose instance counts meet `requirements` and
/// whose utilization does not exceed `max_utilization`.
///
/// Uses the architecture's auto layout when it has one, otherwise tries the
/// fixed layouts from smallest to largest area.
pub fn auto_size_device_grid(
    arch: &Architecture,
    requirements: &ResourceRequirements,
    max_utilization: f32,
    sink: &DiagnosticSink,
) -> Result<DeviceGrid, GridError> {
    if arch.layouts.is_empty() {
        return Err(GridError::NoLayouts(arch.name.clone()));
    }
    let required = resolve_requirements(arch, requirements)?;

    if let Some((layout, aspect_ratio)) = arch.layouts.iter().find_map(|l| match l.kind {
        LayoutKind::Auto { aspect_ratio } => Some((l, aspect_ratio)),
        LayoutKind::Fixed { .. } => None,
    }) {
        return auto_size_layout(arch, layout, aspect_ratio, requirements, max_utilization, sink);
    }

    let mut fixed: Vec<(&GridLayout, usize, usize)> = arch
        .layouts
        .iter()
        .filter_map(|l| match l.kind {
            LayoutKind::Fixed { width, height } => Some((l, width, height)),
            LayoutKind::Auto { .. } => None,
        })
        .collect();
    fixed.sort_by_key(|&(_, w, h)| w * h);
    for (layout, width, height) in fixed {
        let scratch = DiagnosticSink::new();
        let grid = build_device_grid(arch, layout, width, height, true, &scratch)?;
        if grid_satisfies(arch, &grid, &required, max_utilization) {
            for diag in scratch.take_all() {
                sink.emit(diag);
            }
            log::info!("selected fixed layout '{}' ({width}x{height})", layout.name);
            return Ok(grid);
        }
    }
    Err(GridError::NoFittingLayout {
        arch: arch.name.clone(),
    })
}

fn auto_size_layout(
    arch: &Architecture,
    layout: &GridLayout,
    aspect_ratio: f32,
    requirements: &ResourceRequirements,
    max_utilization: f32,
    sink: &DiagnosticSink,
) -> Result<DeviceGrid, GridError> {
    if !aspect_ratio.is_finite() || aspect_ratio <= 0.0 {
        return Err(GridError::InvalidAspectRatio {
            layout: layout.name.clone(),
            value: aspect_ratio,
        });
    }
    let required = resolve_requirements(arch, requirements)?;
    let total: usize = required.values().sum();
    let max_size = total * MAX_SIZE_FACTOR;

    // 3x3 is the smallest size where perimeter specifications do not start after they end.
    let mut width = 3usize;
    loop {
        let height = ((width as f32 / aspect_ratio).round() as usize).max(1);
        // Trial builds stay quiet; small sizes trigger harmless range warnings.
        let scratch = DiagnosticSink::new();
        let grid = build_device_grid(arch, layout, width, height, false, &scratch)?;
        if grid_satisfies(arch, &grid, &required, max_utilization) {
            log::info!("auto-sized device grid to {width}x{height}");
            return build_device_grid(arch, layout, width, height, false, sink);
        }
        if width * height >= max_size {
            return Err(GridError::AutoFitAborted {
                factor: MAX_SIZE_FACTOR,
            });
        }
        width += 1;
    }
}

fn resolve_requirements(
    arch: &Architecture,
    requirements: &ResourceRequirements,
) -> Result<BTreeMap<TileTypeId, usize>, GridError> {
    requirements
        .iter()
        .map(|(name, &count)| {
            arch.tile_type_by_name(name)
                .map(|id| (id, count))
                .ok_or_else(|| GridError::UnknownBlockType(name.clone()))
        })
        .collect()
}

/// Fraction of the grid area the required instances would occupy.
pub fn device_utilization(
    arch: &Architecture,
    grid: &DeviceGrid,
    required: &BTreeMap<TileTypeId, usize>,
) -> f32 {
    let grid_area = (grid.width() * grid.height() * grid.num_layers()) as f32;
    let instance_area: usize = required
        .iter()
        .filter(|(id, _)| !id.is_empty())
        .map(|(&id, &count)| arch.tile_type(id).area() * count)
        .sum();
    instance_area as f32 / grid_area
}

fn grid_satisfies(
    arch: &Architecture,
    grid: &DeviceGrid,
    required: &BTreeMap<TileTypeId, usize>,
    max_utilization: f32,
) -> bool {
    let overused = required
        .iter()
        .any(|(&id, &count)| grid.num_instances(id) < count);
    !overused && device_utilization(arch, grid, required) <= max_utilization
}

/// Evaluated region axis.
struct Region {
    start: i64,
    end: i64,
    incr: i64,
    repeat: Option<i64>,
}

fn eval_region(spec: &RegionSpec, vars: &FormulaVars) -> Result<Region, GridError> {
    Ok(Region {
        start: evaluate(&spec.start, vars)?,
        end: evaluate(&spec.end, vars)?,
        incr: evaluate(&spec.incr, vars)?,
        repeat: spec.repeat.as_deref().map(|r| evaluate(r, vars)).transpose()?,
    })
}

/// Checks one axis of a region against the device and block dimensions.
///
/// Returns `Ok(false)` when the region starts outside the device and
/// should be skipped.
#[allow(clippy::too_many_arguments)]
fn check_region_axis(
    axis: char,
    spec: &RegionSpec,
    region: &Region,
    device_dim: usize,
    block_dim: usize,
    block_name: &str,
    warn_out_of_range: bool,
    sink: &DiagnosticSink,
) -> Result<bool, GridError> {
    let (range_name, dim_name) = if axis == 'x' {
        ("horizontal", "width")
    } else {
        ("vertical", "height")
    };
    let last = device_dim as i64 - 1;
    if region.start < 0 || region.start > last {
        if warn_out_of_range {
            sink.emit(Diagnostic::warning(
                START_OUT_OF_RANGE,
                format!(
                    "Block type '{block_name}' grid location specification start{axis} ({} = {}) falls outside device {range_name} range [0,{last}]",
                    spec.start, region.start
                ),
            ));
        }
        return Ok(false);
    }
    if region.end > last && warn_out_of_range {
        sink.emit(Diagnostic::warning(
            END_OUT_OF_RANGE,
            format!(
                "Block type '{block_name}' grid location specification end{axis} ({} = {}) falls outside device {range_name} range [0,{last}]",
                spec.end, region.end
            ),
        ));
    }
    if region.end < region.start {
        return Err(GridError::EndBeforeStart {
            axis,
            end_expr: spec.end.clone(),
            end: region.end,
            start_expr: spec.start.clone(),
            start: region.start,
            block: block_name.to_string(),
        });
    }
    if region.incr < block_dim as i64 {
        return Err(GridError::IncrementTooSmall {
            axis,
            block: block_name.to_string(),
            dim_name,
            dim: block_dim,
            expr: spec.incr.clone(),
            value: region.incr,
        });
    }
    let region_dim = (region.end - region.start + 1) as usize;
    if let Some(repeat) = region.repeat {
        if repeat < region_dim as i64 {
            return Err(GridError::RepeatTooSmall {
                axis,
                block: block_name.to_string(),
                dim_name,
                region: region_dim,
                expr: spec.repeat.clone().unwrap_or_default(),
                value: repeat,
            });
        }
    }
    Ok(true)
}

/// Working state of a grid under construction.
struct GridBuilder<'a> {
    arch: &'a Architecture,
    grid: DeviceGrid,
    priorities: NdMatrix<i32, 3>,
    sink: &'a DiagnosticSink,
}

impl GridBuilder<'_> {
    /// Places one block, honouring priorities and ripping up any block it partially overwrites.
    fn set_block_type(&mut self, priority: i32, type_id: TileTypeId, layer: usize, x_root: usize, y_root: usize) {
        let tile = self.arch.tile_type(type_id);

        let mut max_priority = i32::MIN;
        let mut max_at = (x_root, y_root);
        for x in x_root..x_root + tile.width {
            for y in y_root..y_root + tile.height {
                let p = self.priorities[[layer, x, y]];
                if p > max_priority {
                    max_priority = p;
                    max_at = (x, y);
                }
            }
        }

        if priority < max_priority {
            return;
        }
        if priority == max_priority {
            let existing = self.grid.tile_type(layer, max_at.0, max_at.1);
            self.sink.emit(
                Diagnostic::warning(
                    AMBIGUOUS_PRIORITY,
                    format!(
                        "Ambiguous block type specification at grid location ({x_root},{y_root}). Existing block type '{}' at ({},{}) has the same priority ({priority}) as new overlapping type '{}'. The last specification will apply.",
                        self.arch.tile_type(existing).name,
                        max_at.0,
                        max_at.1,
                        tile.name
                    ),
                )
                .at(GridLoc::on_layer(x_root, y_root, layer)),
            );
        }

        let mut rip_up: BTreeSet<(usize, usize, TileTypeId)> = BTreeSet::new();
        for x in x_root..x_root + tile.width {
            for y in y_root..y_root + tile.height {
                let old = *self.grid.tile(layer, x, y);
                if !old.tile_type.is_empty() {
                    rip_up.insert((x - old.width_offset, y - old.height_offset, old.tile_type));
                }
                self.grid.set_tile(
                    layer,
                    x,
                    y,
                    GridTile {
                        tile_type: type_id,
                        width_offset: x - x_root,
                        height_offset: y - y_root,
                    },
                );
                self.priorities[[layer, x, y]] = priority;
            }
        }

        for (root_x, root_y, old_type) in rip_up {
            let old = self.arch.tile_type(old_type);
            for x in root_x..(root_x + old.width).min(self.grid.width()) {
                for y in root_y..(root_y + old.height).min(self.grid.height()) {
                    let cell = *self.grid.tile(layer, x, y);
                    // Only leftovers of the invalidated block; fully overwritten cells stay.
                    if cell.tile_type == old_type
                        && cell.width_offset == x - root_x
                        && cell.height_offset == y - root_y
                    {
                        self.grid.set_tile(layer, x, y, GridTile::default());
                        self.priorities[[layer, x, y]] = i32::MIN;
                    }
                }
            }
        }
    }

    fn apply(&mut self, def: &GridLocDef, warn_out_of_range: bool) -> Result<TileTypeId, GridError> {
        let type_id = self
            .arch
            .tile_type_by_name(&def.block_type)
            .ok_or_else(|| GridError::UnknownBlockType(def.block_type.clone()))?;
        let tile = self.arch.tile_type(type_id);
        let (width, height) = (self.grid.width(), self.grid.height());
        let vars = FormulaVars::for_block(width, height, tile.width, tile.height);

        if def.layer >= self.grid.num_layers() {
            if warn_out_of_range {
                self.sink.emit(Diagnostic::warning(
                    LAYER_OUT_OF_RANGE,
                    format!(
                        "Block type '{}' grid location specification layer {} exceeds the device's {} layer(s)",
                        tile.name,
                        def.layer,
                        self.grid.num_layers()
                    ),
                ));
            }
            return Ok(type_id);
        }

        let xr = eval_region(&def.x, &vars)?;
        let yr = eval_region(&def.y, &vars)?;
        let name = tile.name.clone();
        let (tw, th) = (tile.width, tile.height);
        if !check_region_axis('x', &def.x, &xr, width, tw, &name, warn_out_of_range, self.sink)? {
            return Ok(type_id);
        }
        if !check_region_axis('y', &def.y, &yr, height, th, &name, warn_out_of_range, self.sink)? {
            return Ok(type_id);
        }

        let (sx, ex, ix) = (xr.start as usize, xr.end as usize, xr.incr as usize);
        let (sy, ey, iy) = (yr.start as usize, yr.end as usize, yr.incr as usize);
        let rx = xr.repeat.map(|r| r as usize);
        let ry = yr.repeat.map(|r| r as usize);

        let mut kx = 0;
        loop {
            let x_start = sx + kx * rx.unwrap_or(0);
            let x_end = ex + kx * rx.unwrap_or(0);
            let mut ky = 0;
            loop {
                let y_start = sy + ky * ry.unwrap_or(0);
                let y_end = ey + ky * ry.unwrap_or(0);
                let x_max = x_end.min(width - 1);
                let y_max = y_end.min(height - 1);

                let mut x = x_start;
                while x + (tw - 1) <= x_max {
                    let mut y = y_start;
                    while y + (th - 1) <= y_max {
                        self.set_block_type(def.priority, type_id, def.layer, x, y);
                        y += iy;
                    }
                    x += ix;
                }

                match ry {
                    Some(_) if y_end < height => ky += 1,
                    _ => break,
                }
            }
            match rx {
                Some(_) if x_end < width => kx += 1,
                _ => break,
            }
        }
        Ok(type_id)
    }
}

/// Builds `layout` at `width` x `height`.
///
/// Out-of-range starts skip the rule and out-of-range ends are clipped,
/// both with a warning when `warn_out_of_range` is set. Tile types the
/// layout never mentions are reported as unused.
pub fn build_device_grid(
    arch: &Architecture,
    layout: &GridLayout,
    width: usize,
    height: usize,
    warn_out_of_range: bool,
    sink: &DiagnosticSink,
) -> Result<DeviceGrid, GridError> {
    if let LayoutKind::Fixed {
        width: fixed_width,
        height: fixed_height,
    } = layout.kind
    {
        if fixed_width != width || fixed_height != height {
            return Err(GridError::SizeMismatch {
                width,
                height,
                fixed_width,
                fixed_height,
            });
        }
    }

    let num_layers = layout.num_layers.max(1);
    let mut builder = GridBuilder {
        arch,
        grid: DeviceGrid::new(layout.name.clone(), width, height, num_layers),
        // One above the lowest value so the first rule overrides EMPTY silently.
        priorities: NdMatrix::new([num_layers, width, height], i32::MIN + 1),
        sink,
    };

    let mut seen = BTreeSet::new();
    for def in &layout.loc_defs {
        seen.insert(builder.apply(def, warn_out_of_range)?);
    }

    for (i, tile) in arch.tile_types.iter().enumerate().skip(1) {
        if !seen.contains(&TileTypeId::from_raw(i as u32)) {
            sink.emit(Diagnostic::warning(
                UNUSED_BLOCK_TYPE,
                format!("Block type '{}' was not specified in device grid layout", tile.name),
            ));
        }
    }

    let grid = builder.grid;
    check_grid(arch, &grid)?;
    log::debug!(
        "built device grid '{}' ({}x{}, {} layer(s))",
        grid.name(),
        width,
        height,
        num_layers
    );
    Ok(grid)
}

/// Validates that every cell has a known type and that multi-cell blocks
/// are complete and consistently offset.
pub fn check_grid(arch: &Architecture, grid: &DeviceGrid) -> Result<(), GridError> {
    let invalid = |x: usize, y: usize, reason: String| GridError::InvalidGrid { x, y, reason };
    for layer in 0..grid.num_layers() {
        for x in 0..grid.width() {
            for y in 0..grid.height() {
                let cell = grid.tile(layer, x, y);
                let Some(tile) = arch.tile_types.get(cell.tile_type.index()) else {
                    return Err(invalid(x, y, "has no type".to_string()));
                };
                if cell.width_offset >= tile.width {
                    return Err(invalid(
                        x,
                        y,
                        format!("has invalid width offset ({})", cell.width_offset),
                    ));
                }
                if cell.height_offset >= tile.height {
                    return Err(invalid(
                        x,
                        y,
                        format!("has invalid height offset ({})", cell.height_offset),
                    ));
                }
                if !cell.is_root() {
                    continue;
                }
                if x + tile.width > grid.width() || y + tile.height > grid.height() {
                    return Err(invalid(
                        x,
                        y,
                        format!("block '{}' extends beyond the device", tile.name),
                    ));
                }
                for dx in 0..tile.width {
                    for dy in 0..tile.height {
                        let covered = grid.tile(layer, x + dx, y + dy);
                        if covered.tile_type != cell.tile_type {
                            return Err(invalid(
                                x,
                                y,
                                format!(
                                    "should have type '{}' (based on root location) but has type '{}'",
                                    tile.name,
                                    arch.tile_type(covered.tile_type).name
                                ),
                            ));
                        }
                        if covered.width_offset != dx || covered.height_offset != dy {
                            return Err(invalid(
                                x,
                                y,
                                format!(
                                    "of type '{}' should have offsets ({dx},{dy}) (based on root location) but has ({},{})",
                                    tile.name, covered.width_offset, covered.height_offset
                                ),
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
