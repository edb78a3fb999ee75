use hashbrown::HashSet;

use crate::{
    common::{TileIdx, TILE_COUNT},
    error::EditorError,
    events::{StoreEvent, StoreListener},
};

/// One map cell: a weak reference into the tileset by index, plus per-cell
/// flip flags. Flips are stored, not derived, because the same tile may
/// appear flipped and unflipped in the same map. The index is unchecked at
/// write time; readers degrade an invalid index to the empty tile.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct TilemapCell {
    pub tile: TileIdx,
    pub flip_h: bool,
    pub flip_v: bool,
}

/// Bounds of the map area actually in use, for export. Tile 0 counts as
/// background and is excluded from both the bounds and the used set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UsedBounds {
    pub max_x: usize,
    pub max_y: usize,
    pub used: HashSet<TileIdx>,
}

/// Fixed-size 2D grid of tilemap cells. Every cell always holds a valid value;
/// construction and every reload path fill the whole grid.
pub struct TilemapGrid {
    width: usize,
    height: usize,
    cells: Vec<TilemapCell>,
    needs_redraw: bool,
}

impl TilemapGrid {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![TilemapCell::default(); width * height],
            needs_redraw: true,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: usize, y: usize) -> Result<usize, EditorError> {
        if x >= self.width || y >= self.height {
            return Err(EditorError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        Ok(y * self.width + x)
    }

    pub fn get_cell(&self, x: usize, y: usize) -> Result<TilemapCell, EditorError> {
        Ok(self.cells[self.index(x, y)?])
    }

    pub fn set_cell(&mut self, x: usize, y: usize, cell: TilemapCell) -> Result<(), EditorError> {
        let i = self.index(x, y)?;
        self.cells[i] = cell;
        self.needs_redraw = true;
        Ok(())
    }

    pub fn toggle_flip_h_at(&mut self, x: usize, y: usize) -> Result<(), EditorError> {
        let i = self.index(x, y)?;
        self.cells[i].flip_h = !self.cells[i].flip_h;
        self.needs_redraw = true;
        Ok(())
    }

    pub fn toggle_flip_v_at(&mut self, x: usize, y: usize) -> Result<(), EditorError> {
        let i = self.index(x, y)?;
        self.cells[i].flip_v = !self.cells[i].flip_v;
        self.needs_redraw = true;
        Ok(())
    }

    /// Rewrites every cell referencing a tile outside the tileset to the
    /// default cell. Idempotent. Must run synchronously within the operation
    /// that replaced the tileset or loaded the grid, so a snapshot taken
    /// afterwards never sees a dangling index.
    pub fn sanitize(&mut self) {
        for cell in &mut self.cells {
            if cell.tile >= TILE_COUNT {
                *cell = TilemapCell::default();
            }
        }
    }

    /// Wholesale replacement from persisted rows. Short or missing rows fill
    /// with default cells, excess entries drop, and the result is sanitized.
    pub fn load(&mut self, rows: &[Vec<TilemapCell>]) {
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = rows
                    .get(y)
                    .and_then(|row| row.get(x))
                    .copied()
                    .unwrap_or_default();
                self.cells[y * self.width + x] = cell;
            }
        }
        self.sanitize();
        self.needs_redraw = true;
    }

    pub fn contains_tile(&self, tile: TileIdx) -> bool {
        self.cells.iter().any(|c| c.tile == tile)
    }

    /// Scans the grid for export: the furthest non-background cell in each
    /// axis, and the set of tile indices in use.
    pub fn find_used_bounds(&self) -> UsedBounds {
        let mut bounds = UsedBounds::default();
        for y in 0..self.height {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                if cell.tile != 0 {
                    bounds.used.insert(cell.tile);
                    bounds.max_x = bounds.max_x.max(x);
                    bounds.max_y = bounds.max_y.max(y);
                }
            }
        }
        bounds
    }

    /// Hands the pending-redraw flag to the shell, clearing it.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }
}

impl StoreListener for TilemapGrid {
    fn on_store_event(&mut self, event: &StoreEvent) {
        match event {
            StoreEvent::PaletteChanged => {
                self.needs_redraw = true;
            }
            // A redraw is only owed if some cell actually shows this tile.
            StoreEvent::TileChanged(idx) => {
                if self.contains_tile(*idx) {
                    self.needs_redraw = true;
                }
            }
            StoreEvent::TilesetReplaced => {
                self.sanitize();
                self.needs_redraw = true;
            }
        }
    }
}
