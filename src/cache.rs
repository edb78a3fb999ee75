use std::rc::Rc;

use hashbrown::HashMap;

use crate::{
    common::{ColorRGB, Tile, TileIdx, ZoomScale, FALLBACK_COLOR, PALETTE_SIZE, TILE_SIZE},
    events::{StoreEvent, StoreListener},
    palette::PaletteStore,
    tiles::TileStore,
};

/// Identity of one rendered image. The palette version makes entries rendered
/// under an older palette unreachable; the other fields are the render inputs.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub tile: TileIdx,
    pub flip_h: bool,
    pub flip_v: bool,
    pub scale: ZoomScale,
    pub palette_version: u64,
}

/// A rendered tile at some zoom scale: a square RGB buffer, row-major.
/// Immutable once produced; shared out as `Rc` so a full map redraw never
/// copies pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileImage {
    size: usize,
    pixels: Vec<ColorRGB>,
}

impl TileImage {
    /// Width and height in output pixels.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn pixel(&self, x: usize, y: usize) -> ColorRGB {
        self.pixels[y * self.size + x]
    }

    pub fn pixels(&self) -> &[ColorRGB] {
        &self.pixels
    }
}

/// Renders a tile into a scaled RGB buffer. Pure: the output depends only on
/// the arguments. Pixel values outside the palette render as the fallback
/// color rather than failing, since tile data may predate a palette import.
fn render_tile(
    tile: &Tile,
    colors: &[ColorRGB; PALETTE_SIZE],
    flip_h: bool,
    flip_v: bool,
    scale: ZoomScale,
) -> TileImage {
    let scale = scale.max(1) as usize;
    let size = TILE_SIZE * scale;
    let mut pixels = vec![(0, 0, 0); size * size];
    for y in 0..TILE_SIZE {
        for x in 0..TILE_SIZE {
            let px = if flip_h { TILE_SIZE - 1 - x } else { x };
            let py = if flip_v { TILE_SIZE - 1 - y } else { y };
            let value = tile.pixel(x, y) as usize;
            let color = colors.get(value).copied().unwrap_or(FALLBACK_COLOR);
            for dy in 0..scale {
                let row = (py * scale + dy) * size + px * scale;
                pixels[row..row + scale].fill(color);
            }
        }
    }
    TileImage { size, pixels }
}

/// Memoizes rendered tile images. A 32x32 map redraw performs up to 1024
/// lookups, so misses must be the exception once the view settles.
///
/// Only derived state lives here: on any doubt the image is recomputed from
/// the stores, never the other way around.
#[derive(Default)]
pub struct TileImageCache {
    images: HashMap<CacheKey, Rc<TileImage>>,
    last_scale: Option<ZoomScale>,
}

impl TileImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached image for the request, rendering on miss. A tile
    /// index outside the tileset renders as the all-zero tile. A request at a
    /// new zoom scale first drops the whole cache: the scale sits in the key,
    /// but retaining images across zoom history would grow without bound.
    pub fn get(
        &mut self,
        tiles: &TileStore,
        palette: &PaletteStore,
        tile: TileIdx,
        flip_h: bool,
        flip_v: bool,
        scale: ZoomScale,
    ) -> Rc<TileImage> {
        if self.last_scale != Some(scale) {
            self.images.clear();
            self.last_scale = Some(scale);
        }
        let key = CacheKey {
            tile,
            flip_h,
            flip_v,
            scale,
            palette_version: palette.version(),
        };
        if let Some(image) = self.images.get(&key) {
            return image.clone();
        }
        let pixels = tiles.get(tile).unwrap_or_default();
        let image = Rc::new(render_tile(&pixels, &palette.get(), flip_h, flip_v, scale));
        self.images.insert(key, image.clone());
        image
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    fn invalidate_tile(&mut self, tile: TileIdx) {
        self.images.retain(|key, _| key.tile != tile);
    }
}

impl StoreListener for TileImageCache {
    fn on_store_event(&mut self, event: &StoreEvent) {
        match event {
            // Conservative: a single color edit clears everything. Keys
            // holding the old palette version are unreachable anyway;
            // clearing bounds memory.
            StoreEvent::PaletteChanged => self.clear(),
            StoreEvent::TileChanged(idx) => self.invalidate_tile(*idx),
            StoreEvent::TilesetReplaced => self.clear(),
        }
    }
}
