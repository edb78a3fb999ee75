use serde::{Deserialize, Serialize};

use crate::error::EditorError;

pub type ColorValue = u8; // Color channel value (0-255)
pub type ColorIdx = u8; // Index into 4bpp palette (0-15)
pub type TileIdx = usize; // Index into the tileset
pub type ZoomScale = u8; // On-screen pixels per tile pixel

pub type ColorRGB = (ColorValue, ColorValue, ColorValue);

pub const PALETTE_SIZE: usize = 16;
pub const TILE_SIZE: usize = 8; // Tile width/height in pixels
pub const TILE_PIXELS: usize = TILE_SIZE * TILE_SIZE;
pub const TILE_COUNT: usize = 512;
pub const MAP_WIDTH: usize = 32;
pub const MAP_HEIGHT: usize = 32;

// Rendered in place of any pixel whose color index is outside the palette:
pub const FALLBACK_COLOR: ColorRGB = (255, 0, 255);

/// One 8x8 tile of 4bpp pixels, row-major: `pixels[y][x]`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub struct Tile(pub [[ColorIdx; TILE_SIZE]; TILE_SIZE]);

impl Tile {
    pub fn pixel(&self, x: usize, y: usize) -> ColorIdx {
        self.0[y][x]
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, value: ColorIdx) {
        self.0[y][x] = value;
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|row| row.iter().all(|&p| p == 0))
    }

    /// Builds a tile from a flat row-major pixel slice, which must hold
    /// exactly 64 values.
    pub fn from_flat(pixels: &[ColorIdx]) -> Result<Self, EditorError> {
        if pixels.len() != TILE_PIXELS {
            return Err(EditorError::InvalidSize {
                expected: TILE_PIXELS,
                actual: pixels.len(),
            });
        }
        let mut tile = Tile::default();
        for (i, &p) in pixels.iter().enumerate() {
            tile.0[i / TILE_SIZE][i % TILE_SIZE] = p;
        }
        Ok(tile)
    }

    /// Row-major pixel values, top-left first.
    pub fn flat(&self) -> impl Iterator<Item = ColorIdx> + '_ {
        self.0.iter().flat_map(|row| row.iter().copied())
    }
}
