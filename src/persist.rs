use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use json_pretty_compact::PrettyCompactFormatter;
use log::info;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Serializer;

use crate::common::{ColorIdx, ColorRGB};

/// How often the shell should ask for an autosave pass.
pub const AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

pub const AUTOSAVE_FILENAME: &str = "autosave.gtproj";

/// On-disk project shape (`.gtproj`). Deliberately loose: lengths and index
/// ranges are validated when the project is applied to the stores, not here,
/// so an old or hand-edited file still loads with degraded entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub palette: Vec<ColorRGB>,
    pub tiles: Vec<Vec<ColorIdx>>,
    pub tilemap: Vec<Vec<ProjectCell>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCell {
    pub tile: i64,
    pub flip_h: bool,
    pub flip_v: bool,
}

fn to_json_bytes<T: Serialize>(data: &T) -> Vec<u8> {
    let formatter = PrettyCompactFormatter::new();
    let mut bytes = vec![];
    let mut ser = Serializer::with_formatter(&mut bytes, formatter);
    data.serialize(&mut ser).unwrap();
    bytes
}

fn save_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    info!("Saving {}", path.display());
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(path, to_json_bytes(data))?;
    Ok(())
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    info!("Loading {}", path.display());
    let data_bytes = fs::read(path)?;
    let data: T = serde_json::from_slice(&data_bytes)?;
    Ok(data)
}

pub fn save_project(path: &Path, project: &Project) -> Result<()> {
    save_json(path, project).with_context(|| format!("saving project to {}", path.display()))
}

pub fn load_project(path: &Path) -> Result<Project> {
    load_json(path).with_context(|| format!("loading project from {}", path.display()))
}

/// Default autosave location, in the per-user data directory.
pub fn default_autosave_path() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("", "", "GbaTileEditor")
        .context("Unable to determine data directory.")?;
    Ok(project_dirs.data_dir().join(AUTOSAVE_FILENAME))
}

/// Periodic autosave driven by the shell's timer. Writes only when the
/// serialized snapshot differs byte-for-byte from the last written one; the
/// comparison happens at the serialization layer, not as a semantic diff.
pub struct Autosave {
    path: PathBuf,
    last_written: Option<Vec<u8>>,
}

impl Autosave {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            last_written: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Runs one autosave pass; returns whether a write happened.
    pub fn run(&mut self, project: &Project) -> Result<bool> {
        let bytes = to_json_bytes(project);
        if self.last_written.as_deref() == Some(bytes.as_slice()) {
            return Ok(false);
        }
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, &bytes)
            .with_context(|| format!("autosaving to {}", self.path.display()))?;
        info!("Autosaved project to {}", self.path.display());
        self.last_written = Some(bytes);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_project() -> Project {
        Project {
            palette: vec![(0, 0, 0); 16],
            tiles: vec![vec![0; 64]; 2],
            tilemap: vec![vec![
                ProjectCell {
                    tile: 1,
                    flip_h: true,
                    flip_v: false,
                },
                ProjectCell {
                    tile: 0,
                    flip_h: false,
                    flip_v: false,
                },
            ]],
        }
    }

    #[test]
    fn project_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("demo.gtproj");
        let project = sample_project();
        save_project(&path, &project).unwrap();
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn project_json_uses_the_original_field_names() {
        let json = serde_json::to_value(sample_project()).unwrap();
        let cell = &json["tilemap"][0][0];
        assert_eq!(cell["tile"], 1);
        assert_eq!(cell["flip_h"], true);
        assert_eq!(cell["flip_v"], false);
        // Colors serialize as [r, g, b] triples.
        assert_eq!(json["palette"][0], serde_json::json!([0, 0, 0]));
    }

    #[test]
    fn autosave_skips_unchanged_snapshots() {
        let dir = tempfile::tempdir().unwrap();
        let mut autosave = Autosave::new(dir.path().join(AUTOSAVE_FILENAME));
        let mut project = sample_project();

        assert!(autosave.run(&project).unwrap());
        assert!(!autosave.run(&project).unwrap());

        project.tilemap[0][0].flip_v = true;
        assert!(autosave.run(&project).unwrap());
        assert_eq!(load_project(autosave.path()).unwrap(), project);
    }
}
