//! Output discovery. There is no manifest or index; rendered videos are
//! found by listing `content/videos/` (including `edited/`), newest first.

use crate::config::Config;
use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

fn is_mp4(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("mp4"))
        .unwrap_or(false)
}

/// Lists every rendered video under the videos directory, sorted by
/// modification time descending. An absent directory is an empty catalog,
/// not an error.
pub fn list_rendered(cfg: &Config) -> Result<Vec<PathBuf>> {
    let root = cfg.videos_dir();
    if !root.is_dir() {
        return Ok(Vec::new());
    }

    let mut entries: Vec<(SystemTime, PathBuf)> = Vec::new();
    for entry in WalkDir::new(&root) {
        let entry = entry.map_err(|e| {
            EngineError::media_with(format!("failed to list {}", root.display()), e)
        })?;
        let path = entry.path();
        if !entry.file_type().is_file() || !is_mp4(path) {
            continue;
        }
        let modified = entry
            .metadata()
            .ok()
            .and_then(|m| m.modified().ok())
            .unwrap_or(SystemTime::UNIX_EPOCH);
        entries.push((modified, path.to_path_buf()));
    }

    entries.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(entries.into_iter().map(|(_, path)| path).collect())
}
