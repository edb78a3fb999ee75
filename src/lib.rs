//! Core of a GBA-style tile graphics editor: a 16-color palette store, a
//! 512-tile 4bpp tileset store, a render cache keyed by tile identity, flip
//! state, zoom, and palette version, and a 32x32 tilemap grid, kept
//! consistent through synchronous change notifications. Project persistence
//! and GBA C-source import/export sit on top of the core's public hooks; the
//! windowing shell and on-screen rasterization are the caller's business.

pub mod cache;
pub mod common;
pub mod editor;
pub mod error;
pub mod events;
pub mod gba;
pub mod painter;
pub mod palette;
pub mod persist;
pub mod tilemap;
pub mod tiles;

pub use cache::{CacheKey, TileImage, TileImageCache};
pub use common::{ColorIdx, ColorRGB, Tile, TileIdx, ZoomScale};
pub use editor::Editor;
pub use error::EditorError;
pub use events::{NotificationBus, StoreEvent, StoreListener};
pub use painter::PixelPainter;
pub use palette::PaletteStore;
pub use persist::{Autosave, Project, ProjectCell};
pub use tilemap::{TilemapCell, TilemapGrid, UsedBounds};
pub use tiles::TileStore;
