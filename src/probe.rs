use crate::error::{EngineError, Result};
use std::path::Path;
use tokio::process::Command;

/// Total container duration in seconds. Fails with a media error when the
/// file is unreadable or ffprobe reports no usable duration.
pub async fn duration_seconds(path: &Path) -> Result<f64> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| EngineError::media_with("ffprobe execution failed", e))?;

    if !output.status.success() {
        return Err(EngineError::media(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let duration = text.parse::<f64>().unwrap_or(-1.0);
    if duration <= 0.0 {
        return Err(EngineError::media(format!(
            "no usable duration for {}",
            path.display()
        )));
    }
    Ok(duration)
}

/// Whether the container carries at least one audio stream. Assembled
/// outputs under the no-audio policy have none, and edits must not try to
/// run an audio filter chain against them.
pub async fn has_audio_stream(path: &Path) -> Result<bool> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "a",
            "-show_entries",
            "stream=index",
            "-of",
            "csv=p=0",
        ])
        .arg(path)
        .output()
        .await
        .map_err(|e| EngineError::media_with("ffprobe execution failed", e))?;

    if !output.status.success() {
        return Err(EngineError::media(format!(
            "ffprobe failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
}
