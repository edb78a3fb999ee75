use std::cell::RefCell;
use std::rc::Rc;

use log::warn;

use crate::{
    cache::{TileImage, TileImageCache},
    common::{
        ColorIdx, ColorRGB, Tile, TileIdx, ZoomScale, MAP_HEIGHT, MAP_WIDTH, PALETTE_SIZE,
        TILE_COUNT,
    },
    error::EditorError,
    events::NotificationBus,
    painter::PixelPainter,
    palette::PaletteStore,
    persist::{Project, ProjectCell},
    tilemap::{TilemapCell, TilemapGrid},
    tiles::TileStore,
};

/// Composition root. Constructs the stores, cache, grid, and painter
/// independently and wires the subscriptions in one place; nothing else in
/// the crate knows about the wiring. The UI shell drives everything through
/// the methods here or through the components directly.
pub struct Editor {
    pub bus: Rc<RefCell<NotificationBus>>,
    pub palette: Rc<RefCell<PaletteStore>>,
    pub tiles: Rc<RefCell<TileStore>>,
    pub cache: Rc<RefCell<TileImageCache>>,
    pub tilemap: Rc<RefCell<TilemapGrid>>,
    pub painter: PixelPainter,
}

impl Editor {
    pub fn new() -> Self {
        Self::with_map_size(MAP_WIDTH, MAP_HEIGHT)
    }

    pub fn with_map_size(width: usize, height: usize) -> Self {
        let bus = Rc::new(RefCell::new(NotificationBus::new()));
        let palette = Rc::new(RefCell::new(PaletteStore::new(bus.clone())));
        let tiles = Rc::new(RefCell::new(TileStore::new(bus.clone())));
        let cache = Rc::new(RefCell::new(TileImageCache::new()));
        let tilemap = Rc::new(RefCell::new(TilemapGrid::new(width, height)));

        bus.borrow_mut().subscribe(cache.clone());
        bus.borrow_mut().subscribe(tilemap.clone());

        Self {
            bus,
            palette,
            tiles,
            cache,
            tilemap,
            painter: PixelPainter::new(),
        }
    }

    /// Loads the tile at `index` into the painter.
    pub fn open_tile(&mut self, index: TileIdx) -> Result<(), EditorError> {
        let tile = self.tiles.borrow().get(index)?;
        self.painter.load_tile(tile, index);
        Ok(())
    }

    /// Sets the active color on both the palette selection and the painter.
    pub fn select_color(&mut self, index: ColorIdx) -> Result<(), EditorError> {
        self.palette.borrow_mut().set_active(index)?;
        self.painter.set_active_color(index)
    }

    /// Snapshots the painter buffer for undo. Call once at the start of a
    /// drag gesture, not per pixel.
    pub fn begin_stroke(&mut self) {
        self.painter.push_undo();
    }

    /// Paints one pixel and, only if the value changed, commits the buffer
    /// to the tile store so the change event cascades into cache and grid.
    pub fn paint(&mut self, x: usize, y: usize) -> Result<bool, EditorError> {
        let changed = self.painter.paint_pixel(x, y)?;
        if changed {
            self.commit()?;
        }
        Ok(changed)
    }

    /// Writes the painter's working buffer back into the tile store.
    pub fn commit(&mut self) -> Result<(), EditorError> {
        self.tiles
            .borrow_mut()
            .set(self.painter.tile_index(), self.painter.working())
    }

    /// Undoes the latest paint stroke, re-committing through the normal
    /// store path. Returns false when there was nothing to undo.
    pub fn undo_paint(&mut self) -> Result<bool, EditorError> {
        if self.painter.undo() {
            self.commit()?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn render_tile(
        &mut self,
        tile: TileIdx,
        flip_h: bool,
        flip_v: bool,
        scale: ZoomScale,
    ) -> Rc<TileImage> {
        self.cache.borrow_mut().get(
            &self.tiles.borrow(),
            &self.palette.borrow(),
            tile,
            flip_h,
            flip_v,
            scale,
        )
    }

    /// Renders the map cell at (x, y). A stale cell index simply yields the
    /// empty tile's image.
    pub fn render_cell(
        &mut self,
        x: usize,
        y: usize,
        scale: ZoomScale,
    ) -> Result<Rc<TileImage>, EditorError> {
        let cell = self.tilemap.borrow().get_cell(x, y)?;
        Ok(self.render_tile(cell.tile, cell.flip_h, cell.flip_v, scale))
    }

    /// Full, consistent state snapshot for persistence. Because sanitize runs
    /// inside any tileset replacement, the snapshot never contains a cell
    /// referencing a just-invalidated index.
    pub fn snapshot(&self) -> Project {
        let palette = self.palette.borrow().get().to_vec();
        let tiles = (0..TILE_COUNT)
            .map(|i| {
                self.tiles
                    .borrow()
                    .get(i)
                    .unwrap_or_default()
                    .flat()
                    .collect()
            })
            .collect();
        let grid = self.tilemap.borrow();
        let tilemap = (0..grid.height())
            .map(|y| {
                (0..grid.width())
                    .map(|x| {
                        let cell = grid.get_cell(x, y).unwrap_or_default();
                        ProjectCell {
                            tile: cell.tile as i64,
                            flip_h: cell.flip_h,
                            flip_v: cell.flip_v,
                        }
                    })
                    .collect()
            })
            .collect();
        Project {
            palette,
            tiles,
            tilemap,
        }
    }

    /// Replaces all state from a loaded project. Malformed entries degrade to
    /// defaults instead of failing: project files are long-lived data and a
    /// stale or truncated one must still open.
    pub fn apply_project(&mut self, project: &Project) {
        let mut colors = [(0, 0, 0); PALETTE_SIZE];
        if project.palette.len() != PALETTE_SIZE {
            warn!(
                "Project palette has {} entries, expected {}; missing entries default to black",
                project.palette.len(),
                PALETTE_SIZE
            );
        }
        for (i, slot) in colors.iter_mut().enumerate() {
            if let Some(&c) = project.palette.get(i) {
                *slot = c;
            }
        }
        // Infallible by construction: the payloads are exactly-sized.
        let _ = self.palette.borrow_mut().set_all(&colors);

        let mut tiles = vec![Tile::default(); TILE_COUNT];
        if project.tiles.len() > TILE_COUNT {
            warn!(
                "Project has {} tiles, truncating to {}",
                project.tiles.len(),
                TILE_COUNT
            );
        }
        for (i, slot) in tiles.iter_mut().enumerate() {
            if let Some(pixels) = project.tiles.get(i) {
                match Tile::from_flat(pixels) {
                    Ok(tile) => *slot = tile,
                    Err(_) => {
                        warn!("Tile {} has {} pixels, expected 64; using empty tile", i, pixels.len());
                    }
                }
            }
        }
        let _ = self.tiles.borrow_mut().replace_all(tiles);

        let rows: Vec<Vec<TilemapCell>> = project
            .tilemap
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| {
                        if cell.tile < 0 {
                            TilemapCell::default()
                        } else {
                            TilemapCell {
                                tile: cell.tile as TileIdx,
                                flip_h: cell.flip_h,
                                flip_v: cell.flip_v,
                            }
                        }
                    })
                    .collect()
            })
            .collect();
        self.tilemap.borrow_mut().load(&rows);
    }

    /// Installs an imported palette and tileset, padding the tileset with
    /// empty tiles up to capacity. Grid sanitization runs synchronously as
    /// part of the replacement, before this returns.
    pub fn apply_import(
        &mut self,
        palette: &[ColorRGB],
        mut tiles: Vec<Tile>,
    ) -> Result<(), EditorError> {
        self.palette.borrow_mut().set_all(palette)?;
        if tiles.len() > TILE_COUNT {
            tiles.truncate(TILE_COUNT);
        }
        tiles.resize(TILE_COUNT, Tile::default());
        self.tiles.borrow_mut().replace_all(tiles)
    }
}

impl Default for Editor {
    fn default() -> Self {
        Self::new()
    }
}
