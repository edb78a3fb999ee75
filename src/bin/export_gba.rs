// Headless GBA export: reads a .gtproj project file and writes the C
// source/header pairs without opening the editor.
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use gba_tile_editor::{editor::Editor, gba, persist};

#[derive(Parser, Debug)]
struct Args {
    /// Path to the .gtproj project file
    project: PathBuf,
    /// Directory receiving visual_data.c/.h and the tilemap pair
    output_dir: PathBuf,
    /// Base name for the tilemap files
    #[arg(long, default_value = "tile_map")]
    tilemap_name: String,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let project = persist::load_project(&args.project)?;
    let mut editor = Editor::new();
    editor.apply_project(&project);

    std::fs::create_dir_all(&args.output_dir)?;
    gba::export_palette_tileset(
        &editor.palette.borrow().get(),
        &editor.tiles.borrow(),
        &args.output_dir,
    )?;
    let tilemap_path = args.output_dir.join(format!("{}.c", args.tilemap_name));
    gba::export_tilemap(&editor.tilemap.borrow(), &tilemap_path)?;
    Ok(())
}
