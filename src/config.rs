use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Fixed output frame rate. Callers must not assume any other value is honored.
pub const OUTPUT_FPS: u32 = 24;
/// Fixed video codec for every rendered output.
pub const VIDEO_CODEC: &str = "libx264";
/// Fixed audio codec for every rendered output.
pub const AUDIO_CODEC: &str = "aac";

/// Explicit per-call configuration. Every operation receives a `&Config`;
/// there is no ambient mutable state. Codec and frame rate are contract
/// constants above, so only the content root and encoder quality knobs
/// are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_content_root")]
    pub content_root: PathBuf,
    #[serde(default = "default_preset")]
    pub x264_preset: String,
    #[serde(default = "default_crf")]
    pub crf: u32,
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,
}

fn default_content_root() -> PathBuf {
    PathBuf::from("content")
}

fn default_preset() -> String {
    "veryfast".to_string()
}

fn default_crf() -> u32 {
    22
}

fn default_audio_bitrate() -> String {
    "192k".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            content_root: default_content_root(),
            x264_preset: default_preset(),
            crf: default_crf(),
            audio_bitrate: default_audio_bitrate(),
        }
    }
}

impl Config {
    /// Loads `config.json`, falling back to defaults when the file is absent.
    pub async fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if fs::metadata(path).await.is_err() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        if config.crf > 51 {
            anyhow::bail!("config: crf must be 0-51 (got {})", config.crf);
        }

        Ok(config)
    }

    pub fn audio_dir(&self) -> PathBuf {
        self.content_root.join("audio")
    }

    pub fn clips_dir(&self) -> PathBuf {
        self.content_root.join("clips")
    }

    pub fn videos_dir(&self) -> PathBuf {
        self.content_root.join("videos")
    }

    pub fn edited_dir(&self) -> PathBuf {
        self.content_root.join("videos").join("edited")
    }
}
