//! The device grid: which tile type occupies each cell of each layer.

use crate::arch::Architecture;
use crate::ids::TileTypeId;
use serde::{Deserialize, Serialize};
use tessel_common::{GridLoc, NdMatrix};

/// One cell of the device grid.
///
/// Multi-cell blocks store their type in every covered cell, together with
/// the cell's offset from the block's origin (bottom-left) cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GridTile {
    /// Tile type occupying this cell.
    pub tile_type: TileTypeId,
    /// Column offset from the block origin.
    pub width_offset: usize,
    /// Row offset from the block origin.
    pub height_offset: usize,
}

impl GridTile {
    /// Returns `true` if this cell is the origin of its block.
    pub fn is_root(&self) -> bool {
        self.width_offset == 0 && self.height_offset == 0
    }
}

/// A finished device grid with one or more die layers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DeviceGrid {
    name: String,
    width: usize,
    height: usize,
    num_layers: usize,
    tiles: NdMatrix<GridTile, 3>,
}

impl DeviceGrid {
    /// Creates an all-empty grid.
    pub fn new(name: impl Into<String>, width: usize, height: usize, num_layers: usize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            num_layers,
            tiles: NdMatrix::new([num_layers, width, height], GridTile::default()),
        }
    }

    /// Layout name this grid was built from.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of die layers.
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// The cell at `(x, y)` on `layer`.
    pub fn tile(&self, layer: usize, x: usize, y: usize) -> &GridTile {
        &self.tiles[[layer, x, y]]
    }

    /// The cell at `loc`.
    pub fn tile_at(&self, loc: GridLoc) -> &GridTile {
        self.tile(loc.layer, loc.x, loc.y)
    }

    /// Tile type at `(x, y)` on `layer`.
    pub fn tile_type(&self, layer: usize, x: usize, y: usize) -> TileTypeId {
        self.tiles[[layer, x, y]].tile_type
    }

    /// Overwrites one cell without touching its neighbours.
    pub fn set_tile(&mut self, layer: usize, x: usize, y: usize, tile: GridTile) {
        self.tiles[[layer, x, y]] = tile;
    }

    /// Places a `width` x `height` block with its origin at `(x, y)`,
    /// filling every covered cell with the matching offsets.
    pub fn place_block(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        tile_type: TileTypeId,
        width: usize,
        height: usize,
    ) {
        for dx in 0..width {
            for dy in 0..height {
                self.tiles[[layer, x + dx, y + dy]] = GridTile {
                    tile_type,
                    width_offset: dx,
                    height_offset: dy,
                };
            }
        }
    }

    /// Origin cells of all non-empty blocks on `layer`, in row-major (y, then x) order.
    pub fn block_origins(&self, layer: usize) -> Vec<(usize, usize)> {
        let mut origins = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let tile = self.tile(layer, x, y);
                if tile.is_root() && !tile.tile_type.is_empty() {
                    origins.push((x, y));
                }
            }
        }
        origins
    }

    /// Number of placed instances of `tile_type` across all layers.
    pub fn num_instances(&self, tile_type: TileTypeId) -> usize {
        self.tiles
            .iter()
            .filter(|t| t.tile_type == tile_type && t.is_root())
            .count()
    }

    /// Bounding box `(xmin, ymin, xmax, ymax)` of all non-empty cells on `layer`,
    /// or `None` if the layer is empty.
    pub fn occupied_bbox(&self, layer: usize) -> Option<(usize, usize, usize, usize)> {
        let mut bbox: Option<(usize, usize, usize, usize)> = None;
        for x in 0..self.width {
            for y in 0..self.height {
                if self.tile_type(layer, x, y).is_empty() {
                    continue;
                }
                bbox = Some(match bbox {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        bbox
    }

    /// Human-readable map of one layer, top row first, one character per cell.
    ///
    /// Origin cells show the first letter of the type name, other cells of a
    /// multi-cell block show `+`, empty cells show `.`.
    pub fn render(&self, arch: &Architecture, layer: usize) -> String {
        let mut out = String::new();
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let tile = self.tile(layer, x, y);
                let c = if tile.tile_type.is_empty() {
                    '.'
                } else if !tile.is_root() {
                    '+'
                } else {
                    arch.tile_type(tile.tile_type)
                        .name
                        .chars()
                        .next()
                        .unwrap_or('?')
                };
                out.push(c);
            }
            out.push('\n');
        }
        out
    }
}
