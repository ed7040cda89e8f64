use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;
use tokio::fs;

fn required_dirs(cfg: &Config) -> Vec<PathBuf> {
    vec![
        cfg.audio_dir(),
        cfg.clips_dir(),
        cfg.videos_dir(),
        cfg.edited_dir(),
    ]
}

/// Creates the content directory tree. Idempotent; tolerant of the
/// directories already existing.
pub async fn ensure_directories(cfg: &Config) -> Result<()> {
    for dir in required_dirs(cfg) {
        if fs::metadata(&dir).await.is_err() {
            fs::create_dir_all(&dir).await?;
            tracing::info!("Created directory: {}", dir.display());
        }
    }
    Ok(())
}

pub async fn check_ffmpeg() -> bool {
    check_tool("ffmpeg").await && check_tool("ffprobe").await
}

async fn check_tool(name: &str) -> bool {
    match tokio::process::Command::new(name)
        .arg("-version")
        .output()
        .await
    {
        Ok(output) => output.status.success(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_full_tree_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            content_root: dir.path().join("content"),
            ..Config::default()
        };

        ensure_directories(&cfg).await.unwrap();
        assert!(cfg.edited_dir().is_dir());
        assert!(cfg.audio_dir().is_dir());
        assert!(cfg.clips_dir().is_dir());

        // Second run must not fail on existing directories.
        ensure_directories(&cfg).await.unwrap();
    }
}
