//! GBA C-source import/export: a `visual_data.c`/`.h` pair holding the
//! palette and the packed 4bpp tileset, and a standalone tilemap pair. The
//! queried values come straight from the stores, so they are internally
//! consistent at the moment of the call.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{bail, ensure, Context, Result};
use itertools::Itertools;
use log::info;

use crate::{
    common::{ColorRGB, Tile, PALETTE_SIZE, TILE_COUNT, TILE_PIXELS},
    tilemap::TilemapGrid,
    tiles::TileStore,
};

pub const TILE_BYTES: usize = TILE_PIXELS / 2; // Packed size: 2 pixels per byte

/// 8-bit RGB to GBA 15-bit color (0BBBBBGG GGGRRRRR). The low 3 bits of each
/// channel are lost.
pub fn rgb_to_gba(color: ColorRGB) -> u16 {
    let r5 = (color.0 >> 3) as u16;
    let g5 = (color.1 >> 3) as u16;
    let b5 = (color.2 >> 3) as u16;
    (b5 << 10) | (g5 << 5) | r5
}

pub fn gba_to_rgb(value: u16) -> ColorRGB {
    let r = ((value & 0x1F) << 3) as u8;
    let g = (((value >> 5) & 0x1F) << 3) as u8;
    let b = (((value >> 10) & 0x1F) << 3) as u8;
    (r, g, b)
}

/// Packs a tile into 32 bytes, two pixels per byte: low nibble = left pixel.
pub fn pack_tile(tile: &Tile) -> [u8; TILE_BYTES] {
    let mut bytes = [0; TILE_BYTES];
    for (i, (left, right)) in tile.flat().tuples().enumerate() {
        bytes[i] = (right << 4) | (left & 0x0F);
    }
    bytes
}

/// Inverse of `pack_tile`. Short input leaves the remaining pixels zero.
pub fn unpack_tile(bytes: &[u8]) -> Tile {
    let mut flat = [0; TILE_PIXELS];
    for (i, &byte) in bytes.iter().take(TILE_BYTES).enumerate() {
        flat[i * 2] = byte & 0x0F;
        flat[i * 2 + 1] = (byte >> 4) & 0x0F;
    }
    Tile::from_flat(&flat).unwrap()
}

/// Writes `visual_data.c` and `visual_data.h` into `dir`: the full 16-color
/// palette and the tileset truncated after the last non-empty tile.
pub fn export_palette_tileset(
    palette: &[ColorRGB; PALETTE_SIZE],
    tiles: &TileStore,
    dir: &Path,
) -> Result<()> {
    let tile_count = tiles.last_non_empty().map_or(1, |i| i + 1);

    let mut source = String::new();
    source.push_str("#include \"visual_data.h\"\n\n");
    source.push_str("// Palette data\n");
    source.push_str("const u16 palette[16] = \n{\n");
    writeln!(source, "    0x{:04X}, // Transparent", rgb_to_gba(palette[0]))?;
    for (i, &color) in palette.iter().enumerate().skip(1) {
        writeln!(source, "    0x{:04X}, // Color {}", rgb_to_gba(color), i)?;
    }
    source.push_str("};\n\n");

    source.push_str("// Tileset data (each byte = 2 pixels, right then left)\n");
    source.push_str("const u8 tile_set[TILE_COUNT * TILE_SIZE] = \n{\n");
    for index in 0..tile_count {
        let tile = tiles.get(index).unwrap_or_default();
        let bytes = pack_tile(&tile)
            .iter()
            .map(|b| format!("0x{:02X}", b))
            .join(", ");
        writeln!(source, "    // Tile {}\n    {},", index, bytes)?;
    }
    source.push_str("};\n");

    let mut header = String::new();
    header.push_str("#ifndef VISUAL_DATA_H\n#define VISUAL_DATA_H\n\n");
    header.push_str("#include \"visual.h\"\n\n");
    header.push_str("#define PALETTE_COUNT 16\n");
    writeln!(header, "#define TILE_COUNT {}", tile_count)?;
    writeln!(header, "#define TILE_SIZE {}", TILE_BYTES)?;
    header.push_str("extern const u16 palette[16];\n");
    header.push_str("extern const u8 tile_set[TILE_COUNT * TILE_SIZE];\n");
    header.push_str("#endif\n");

    let source_path = dir.join("visual_data.c");
    let header_path = dir.join("visual_data.h");
    fs::write(&source_path, source)
        .with_context(|| format!("writing {}", source_path.display()))?;
    fs::write(&header_path, header)
        .with_context(|| format!("writing {}", header_path.display()))?;
    info!(
        "Exported palette and {} tiles to {}",
        tile_count,
        source_path.display()
    );
    Ok(())
}

/// Writes a tilemap `.c`/`.h` pair at `path` (the header lands next to it),
/// covering only the used area of the grid: rows and columns past the last
/// non-background cell are dropped, with a 1x1 minimum.
pub fn export_tilemap(grid: &TilemapGrid, path: &Path) -> Result<()> {
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .context("tilemap export path has no file name")?
        .to_owned();
    let header_path = path.with_extension("h");

    let bounds = grid.find_used_bounds();
    let map_width = (bounds.max_x + 1).max(1);
    let map_height = (bounds.max_y + 1).max(1);
    let last_used_tile = bounds.used.iter().max().copied().unwrap_or(0);

    let mut source = String::new();
    writeln!(source, "#include \"{}.h\"\n", name)?;
    source.push_str("// Tilemap data\n");
    writeln!(source, "const u16 tile_map[{} * {}] = \n{{", map_width, map_height)?;
    for y in 0..map_height {
        let row = (0..map_width)
            .map(|x| {
                // In-bounds by construction; a default cell would only appear
                // if the used area somehow exceeded the grid.
                let cell = grid.get_cell(x, y).unwrap_or_default();
                format!(
                    "TILE_ENTRY({}, 0, {}, {})",
                    cell.tile, cell.flip_h as u8, cell.flip_v as u8
                )
            })
            .join(", ");
        writeln!(source, "    {},", row)?;
    }
    source.push_str("};\n");

    let mut header = String::new();
    let guard = name.to_uppercase();
    writeln!(header, "#ifndef {}_H\n#define {}_H\n", guard, guard)?;
    header.push_str("#include \"visual.h\"\n\n");
    writeln!(header, "extern const u16 tile_map[{} * {}];\n", map_width, map_height)?;
    writeln!(header, "#define TILE_MAP_WIDTH {}", map_width)?;
    writeln!(header, "#define TILE_MAP_HEIGHT {}", map_height)?;
    writeln!(header, "#define LAST_USED_TILE {}", last_used_tile)?;
    header.push_str("#endif\n");

    fs::write(path, source).with_context(|| format!("writing {}", path.display()))?;
    fs::write(&header_path, header)
        .with_context(|| format!("writing {}", header_path.display()))?;
    info!(
        "Exported {}x{} tilemap to {}",
        map_width,
        map_height,
        path.display()
    );
    Ok(())
}

/// Collects every `0x` literal with exactly `digits` hex digits.
fn hex_literals(text: &str, digits: usize) -> Vec<u32> {
    let bytes = text.as_bytes();
    let mut out = vec![];
    let mut i = 0;
    while i + 1 < bytes.len() {
        if bytes[i] == b'0' && (bytes[i + 1] == b'x' || bytes[i + 1] == b'X') {
            let start = i + 2;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_hexdigit() {
                end += 1;
            }
            if end - start == digits {
                out.push(u32::from_str_radix(&text[start..end], 16).unwrap());
            }
            i = end;
        } else {
            i += 1;
        }
    }
    out
}

/// Parses a `visual_data.c` file: the first 16 four-digit hex literals form
/// the palette, and the byte literals inside the `tile_set` initializer form
/// the packed tiles. Returns at most `TILE_COUNT` tiles; the caller pads.
pub fn import_palette_tileset(content: &str) -> Result<([ColorRGB; PALETTE_SIZE], Vec<Tile>)> {
    let colors = hex_literals(content, 4);
    ensure!(
        colors.len() >= PALETTE_SIZE,
        "not enough palette entries found: {} of {}",
        colors.len(),
        PALETTE_SIZE
    );
    let mut palette = [(0, 0, 0); PALETTE_SIZE];
    for (slot, &value) in palette.iter_mut().zip(&colors) {
        *slot = gba_to_rgb(value as u16);
    }

    let Some(decl) = content.find("tile_set") else {
        bail!("could not find tile_set data");
    };
    let body_start = content[decl..]
        .find('{')
        .map(|i| decl + i + 1)
        .context("could not find tile_set data")?;
    let body_end = content[body_start..]
        .find('}')
        .map(|i| body_start + i)
        .context("unterminated tile_set data")?;

    let tile_bytes: Vec<u8> = hex_literals(&content[body_start..body_end], 2)
        .into_iter()
        .map(|b| b as u8)
        .collect();
    let tiles: Vec<Tile> = tile_bytes
        .chunks(TILE_BYTES)
        .take(TILE_COUNT)
        .map(unpack_tile)
        .collect();
    info!("Imported {} tiles and a palette", tiles.len());
    Ok((palette, tiles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::NotificationBus;
    use crate::tilemap::TilemapCell;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tile_store() -> TileStore {
        TileStore::new(Rc::new(RefCell::new(NotificationBus::new())))
    }

    #[test]
    fn gba_color_conversion() {
        assert_eq!(rgb_to_gba((255, 255, 255)), 0x7FFF);
        assert_eq!(rgb_to_gba((255, 0, 0)), 0x001F);
        assert_eq!(gba_to_rgb(0x001F), (248, 0, 0));
        // 5-bit-aligned colors survive the round trip exactly.
        let color = (248, 96, 8);
        assert_eq!(gba_to_rgb(rgb_to_gba(color)), color);
    }

    #[test]
    fn nibble_packing_puts_the_left_pixel_low() {
        let mut tile = Tile::default();
        tile.set_pixel(0, 0, 0x3);
        tile.set_pixel(1, 0, 0xA);
        let bytes = pack_tile(&tile);
        assert_eq!(bytes[0], 0xA3);
        assert_eq!(unpack_tile(&bytes), tile);
    }

    #[test]
    fn export_truncates_trailing_empty_tiles() {
        let dir = tempfile::tempdir().unwrap();
        let mut tiles = tile_store();
        let mut tile = Tile::default();
        tile.set_pixel(0, 0, 1);
        tiles.set(2, tile).unwrap();

        let palette = [(0, 0, 0); PALETTE_SIZE];
        export_palette_tileset(&palette, &tiles, dir.path()).unwrap();

        let header = fs::read_to_string(dir.path().join("visual_data.h")).unwrap();
        assert!(header.contains("#define TILE_COUNT 3"));
        let source = fs::read_to_string(dir.path().join("visual_data.c")).unwrap();
        assert!(source.contains("// Tile 2"));
        assert!(!source.contains("// Tile 3"));
    }

    #[test]
    fn exported_tileset_reimports_identically() {
        let dir = tempfile::tempdir().unwrap();
        let mut tiles = tile_store();
        let mut a = Tile::default();
        a.set_pixel(3, 4, 0xF);
        let mut b = Tile::default();
        b.set_pixel(0, 7, 0x2);
        tiles.set(0, a).unwrap();
        tiles.set(5, b).unwrap();

        let mut palette = [(0, 0, 0); PALETTE_SIZE];
        palette[1] = (248, 160, 16); // 5-bit aligned
        export_palette_tileset(&palette, &tiles, dir.path()).unwrap();

        let content = fs::read_to_string(dir.path().join("visual_data.c")).unwrap();
        let (imported_palette, imported_tiles) = import_palette_tileset(&content).unwrap();
        assert_eq!(imported_palette, palette);
        assert_eq!(imported_tiles.len(), 6); // trailing empties truncated
        assert_eq!(imported_tiles[0], a);
        assert_eq!(imported_tiles[5], b);
        assert!(imported_tiles[1].is_empty());
    }

    #[test]
    fn import_rejects_malformed_input() {
        assert!(import_palette_tileset("int x = 1;").is_err());

        // A palette but no tile_set declaration.
        let palette_only = (0..16).map(|i| format!("0x{:04X},", i)).join(" ");
        assert!(import_palette_tileset(&palette_only).is_err());
    }

    #[test]
    fn tilemap_export_covers_only_the_used_area() {
        let dir = tempfile::tempdir().unwrap();
        let mut grid = TilemapGrid::new(32, 32);
        grid.set_cell(
            2,
            1,
            TilemapCell {
                tile: 7,
                flip_h: true,
                flip_v: false,
            },
        )
        .unwrap();

        let path = dir.path().join("level1.c");
        export_tilemap(&grid, &path).unwrap();

        let source = fs::read_to_string(&path).unwrap();
        assert!(source.contains("#include \"level1.h\""));
        assert!(source.contains("const u16 tile_map[3 * 2]"));
        assert!(source.contains("TILE_ENTRY(7, 0, 1, 0)"));

        let header = fs::read_to_string(dir.path().join("level1.h")).unwrap();
        assert!(header.contains("#ifndef LEVEL1_H"));
        assert!(header.contains("#define TILE_MAP_WIDTH 3"));
        assert!(header.contains("#define TILE_MAP_HEIGHT 2"));
        assert!(header.contains("#define LAST_USED_TILE 7"));
    }

    #[test]
    fn empty_tilemap_exports_a_minimum_grid() {
        let dir = tempfile::tempdir().unwrap();
        let grid = TilemapGrid::new(32, 32);
        let path = dir.path().join("empty.c");
        export_tilemap(&grid, &path).unwrap();
        let header = fs::read_to_string(dir.path().join("empty.h")).unwrap();
        assert!(header.contains("#define TILE_MAP_WIDTH 1"));
        assert!(header.contains("#define TILE_MAP_HEIGHT 1"));
    }
}
