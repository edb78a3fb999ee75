use std::cell::RefCell;
use std::rc::Rc;

use crate::{
    common::{Tile, TileIdx, TILE_COUNT},
    error::EditorError,
    events::{NotificationBus, StoreEvent},
};

/// Source of truth for the 512-tile tileset. The capacity is fixed: slots are
/// never added or removed, and unassigned slots hold the all-zero tile. A
/// tile's identity is its index, stable only within one session (`replace_all`
/// remaps identities wholesale, which is why it broadcasts its own event
/// instead of 512 per-index ones).
pub struct TileStore {
    tiles: Vec<Tile>,
    bus: Rc<RefCell<NotificationBus>>,
}

impl TileStore {
    pub fn new(bus: Rc<RefCell<NotificationBus>>) -> Self {
        Self {
            tiles: vec![Tile::default(); TILE_COUNT],
            bus,
        }
    }

    pub fn get(&self, index: TileIdx) -> Result<Tile, EditorError> {
        self.tiles
            .get(index)
            .copied()
            .ok_or(EditorError::IndexOutOfRange {
                index,
                limit: TILE_COUNT,
            })
    }

    pub fn set(&mut self, index: TileIdx, tile: Tile) -> Result<(), EditorError> {
        if index >= TILE_COUNT {
            return Err(EditorError::IndexOutOfRange {
                index,
                limit: TILE_COUNT,
            });
        }
        self.tiles[index] = tile;
        self.bus.borrow().broadcast(&StoreEvent::TileChanged(index));
        Ok(())
    }

    pub fn replace_all(&mut self, tiles: Vec<Tile>) -> Result<(), EditorError> {
        if tiles.len() != TILE_COUNT {
            return Err(EditorError::InvalidSize {
                expected: TILE_COUNT,
                actual: tiles.len(),
            });
        }
        self.tiles = tiles;
        self.bus.borrow().broadcast(&StoreEvent::TilesetReplaced);
        Ok(())
    }

    /// All-zero test. Out-of-range indices read as empty, matching the
    /// degrade-at-read policy for stale references.
    pub fn tile_is_empty(&self, index: TileIdx) -> bool {
        self.tiles.get(index).map_or(true, |t| t.is_empty())
    }

    /// Highest index holding a non-empty tile, if any. Export truncates the
    /// tileset after this point.
    pub fn last_non_empty(&self) -> Option<TileIdx> {
        self.tiles.iter().rposition(|t| !t.is_empty())
    }
}
