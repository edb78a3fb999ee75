use std::collections::VecDeque;

use crate::{
    common::{ColorIdx, Tile, TileIdx, PALETTE_SIZE, TILE_SIZE},
    error::EditorError,
};

pub const UNDO_LIMIT: usize = 50;

/// Edit surface for a single tile: a private working copy of the pixels plus
/// a bounded undo stack. The painter never reaches into the cache or the
/// grid; the composition root writes the buffer back through `TileStore::set`
/// and lets the `TileChanged` event do the invalidation.
pub struct PixelPainter {
    pixels: Tile,
    tile_index: TileIdx,
    active_color: ColorIdx,
    history: VecDeque<Tile>,
}

impl Default for PixelPainter {
    fn default() -> Self {
        Self {
            pixels: Tile::default(),
            tile_index: 0,
            active_color: 1,
            history: VecDeque::new(),
        }
    }
}

impl PixelPainter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the working buffer with a copy of `tile`. The undo history
    /// belongs to the previous tile and is discarded: undo never crosses
    /// tile boundaries.
    pub fn load_tile(&mut self, tile: Tile, tile_index: TileIdx) {
        self.pixels = tile;
        self.tile_index = tile_index;
        self.history.clear();
    }

    pub fn tile_index(&self) -> TileIdx {
        self.tile_index
    }

    /// A copy of the working buffer, for committing back to the store.
    pub fn working(&self) -> Tile {
        self.pixels
    }

    pub fn active_color(&self) -> ColorIdx {
        self.active_color
    }

    pub fn set_active_color(&mut self, index: ColorIdx) -> Result<(), EditorError> {
        if index as usize >= PALETTE_SIZE {
            return Err(EditorError::IndexOutOfRange {
                index: index as usize,
                limit: PALETTE_SIZE,
            });
        }
        self.active_color = index;
        Ok(())
    }

    /// Writes the active color at (x, y) and reports whether the value
    /// actually changed. Drag gestures rely on the report to skip redundant
    /// commit/notify rounds over already-painted pixels.
    pub fn paint_pixel(&mut self, x: usize, y: usize) -> Result<bool, EditorError> {
        if x >= TILE_SIZE || y >= TILE_SIZE {
            return Err(EditorError::OutOfBounds {
                x,
                y,
                width: TILE_SIZE,
                height: TILE_SIZE,
            });
        }
        if self.pixels.pixel(x, y) == self.active_color {
            return Ok(false);
        }
        self.pixels.set_pixel(x, y, self.active_color);
        Ok(true)
    }

    /// Snapshots the working buffer. Beyond the limit the oldest snapshot is
    /// dropped silently.
    pub fn push_undo(&mut self) {
        self.history.push_back(self.pixels);
        while self.history.len() > UNDO_LIMIT {
            self.history.pop_front();
        }
    }

    /// Restores the most recent snapshot. Returns false (and does nothing)
    /// when the history is empty; on true the caller re-commits through the
    /// normal store path.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(snapshot) => {
                self.pixels = snapshot;
                true
            }
            None => false,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }
}
