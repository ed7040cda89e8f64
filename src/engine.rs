//! The three pipeline operations: image-sequence assembly, clip assembly,
//! and post-edit rendering. Each runs to completion or failure on its own;
//! there is no internal parallelism and no retry.

use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::ffmpeg;
use crate::filters;
use crate::probe;
use crate::request::{AudioPolicy, EditRequest};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

// Temp-audio names are fixed per operation type; the pipeline assumes at
// most one in-flight render per process.
pub const TEMP_IMAGE_AUDIO: &str = "temp-audio.m4a";
pub const TEMP_CLIP_AUDIO: &str = "temp-video-audio.m4a";
const TEMP_IMAGE_LIST: &str = "temp-image-list.txt";

fn validate_output_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::invalid("output name is empty"));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(EngineError::invalid(format!(
            "output name must be a bare file name (got {:?})",
            name
        )));
    }
    Ok(())
}

async fn ensure_output_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| EngineError::media_with(format!("failed to create {}", dir.display()), e))
}

/// Splits the track duration equally across the images. Per-image durations
/// are truncated to millisecond precision; the cumulative remainder lands on
/// the final image so the totals agree within one frame interval.
fn partition_durations(total: f64, count: usize) -> Vec<f64> {
    let per = ((total / count as f64) * 1000.0).floor() / 1000.0;
    let mut durations = vec![per; count - 1];
    durations.push(total - per * (count - 1) as f64);
    durations
}

fn escape_concat_path(path: &Path) -> String {
    path.display().to_string().replace('\'', "'\\''")
}

/// Renders a concat-demuxer list: one `file`/`duration` pair per image in
/// input order, with the final file repeated so its duration is honored.
fn render_concat_list(images: &[PathBuf], durations: &[f64]) -> String {
    let mut out = String::new();
    for (image, duration) in images.iter().zip(durations) {
        out.push_str(&format!(
            "file '{}'\nduration {:.3}\n",
            escape_concat_path(image),
            duration
        ));
    }
    if let Some(last) = images.last() {
        out.push_str(&format!("file '{}'\n", escape_concat_path(last)));
    }
    out
}

/// Builds a video from an ordered image sequence and a narration track.
/// The output duration equals the track duration; images are held static
/// for equal partitions of it, in input order, with no transitions.
pub async fn assemble_from_images(
    cfg: &Config,
    images: &[PathBuf],
    audio: &Path,
    output_name: &str,
) -> Result<PathBuf> {
    validate_output_name(output_name)?;
    if images.is_empty() {
        return Err(EngineError::invalid("image sequence is empty"));
    }

    let videos = cfg.videos_dir();
    ensure_output_dir(&videos).await?;
    let out_mp4 = videos.join(format!("{output_name}.mp4"));

    let track_duration = probe::duration_seconds(audio).await?;
    let durations = partition_durations(track_duration, images.len());
    info!(
        images = images.len(),
        track_duration,
        out = %out_mp4.display(),
        "assembling image sequence"
    );

    // Concat-demuxer entries are resolved relative to the list file, so the
    // image paths must be absolute.
    let mut absolute = Vec::with_capacity(images.len());
    for image in images {
        let path = fs::canonicalize(image)
            .await
            .map_err(|e| EngineError::unreadable(image, e))?;
        absolute.push(path);
    }

    let list_path = videos.join(TEMP_IMAGE_LIST);
    let temp_audio = videos.join(TEMP_IMAGE_AUDIO);

    let render = render_image_sequence(
        cfg,
        &absolute,
        &durations,
        audio,
        &list_path,
        &temp_audio,
        &out_mp4,
    )
    .await;

    // Transient artifacts go away on success and failure alike.
    let _ = fs::remove_file(&temp_audio).await;
    let _ = fs::remove_file(&list_path).await;

    render?;
    info!(out = %out_mp4.display(), "image sequence rendered");
    Ok(out_mp4)
}

async fn render_image_sequence(
    cfg: &Config,
    images: &[PathBuf],
    durations: &[f64],
    audio: &Path,
    list_path: &Path,
    temp_audio: &Path,
    out_mp4: &Path,
) -> Result<()> {
    let list = render_concat_list(images, durations);
    fs::write(list_path, list)
        .await
        .map_err(|e| EngineError::media_with(format!("failed to write {}", list_path.display()), e))?;

    ffmpeg::run(&ffmpeg::audio_transcode_args(cfg, audio, temp_audio)).await?;
    ffmpeg::run(&ffmpeg::image_sequence_args(cfg, list_path, temp_audio, out_mp4)).await
}

/// Builds a video from a single clip under the resolved audio policy:
/// replace the audio with a narration track (looping the visual content if
/// the clip is shorter), keep the original audio, or strip audio entirely.
pub async fn assemble_from_clip(
    cfg: &Config,
    clip: &Path,
    audio: Option<&Path>,
    keep_original_audio: bool,
    output_name: &str,
) -> Result<PathBuf> {
    validate_output_name(output_name)?;
    let policy = AudioPolicy::resolve(audio, keep_original_audio);

    let videos = cfg.videos_dir();
    ensure_output_dir(&videos).await?;
    let out_mp4 = videos.join(format!("{output_name}.mp4"));

    // Undecodable clips fail here, before any encoding starts.
    let clip_duration = probe::duration_seconds(clip).await?;
    info!(
        clip = %clip.display(),
        clip_duration,
        ?policy,
        out = %out_mp4.display(),
        "assembling clip"
    );

    if keep_original_audio {
        ffmpeg::run(&ffmpeg::clip_keep_audio_args(cfg, clip, &out_mp4)).await?;
    } else if let Some(track) = audio {
        let track_duration = probe::duration_seconds(track).await?;
        if clip_duration < track_duration {
            info!(
                clip_duration,
                track_duration, "clip shorter than track; looping visual content"
            );
        }

        let temp_audio = videos.join(TEMP_CLIP_AUDIO);
        let render = async {
            ffmpeg::run(&ffmpeg::audio_transcode_args(cfg, track, &temp_audio)).await?;
            ffmpeg::run(&ffmpeg::clip_replace_audio_args(
                cfg,
                clip,
                &temp_audio,
                track_duration,
                &out_mp4,
            ))
            .await
        }
        .await;

        let _ = fs::remove_file(&temp_audio).await;
        render?;
    } else {
        ffmpeg::run(&ffmpeg::clip_strip_audio_args(cfg, clip, &out_mp4)).await?;
    }

    info!(out = %out_mp4.display(), "clip assembled");
    Ok(out_mp4)
}

/// Applies trim, speed change, and text overlay to an existing rendered
/// video, in that fixed order, in one encoder pass. The output is always
/// re-encoded to the fixed settings, even when every edit was a no-op.
pub async fn edit(cfg: &Config, video: &Path, request: &EditRequest) -> Result<PathBuf> {
    validate_output_name(&request.output_name)?;
    if !request.speed.is_finite() || request.speed <= 0.0 {
        return Err(EngineError::invalid(format!(
            "speed must be a positive number (got {})",
            request.speed
        )));
    }

    let edited = cfg.edited_dir();
    ensure_output_dir(&edited).await?;
    let out_mp4 = edited.join(format!("{}.mp4", request.output_name));

    let source_duration = probe::duration_seconds(video).await?;
    let window = match filters::resolve_trim_window(request.start, request.end, source_duration) {
        None => {
            warn!(
                start = request.start,
                end = ?request.end,
                source_duration,
                "empty or inverted trim window; keeping the full clip"
            );
            None
        }
        // A window spanning the whole source cuts nothing.
        Some((start, end)) if start == 0.0 && end >= source_duration => None,
        window => window,
    };

    let has_audio = probe::has_audio_stream(video).await?;
    let graph =
        filters::edit_filter_complex(window, request.speed, request.overlay.as_ref(), has_audio);
    info!(
        video = %video.display(),
        %graph,
        out = %out_mp4.display(),
        "rendering edit"
    );
    ffmpeg::run(&ffmpeg::edit_args(cfg, video, &graph, has_audio, &out_mp4)).await?;

    info!(out = %out_mp4.display(), "edit rendered");
    Ok(out_mp4)
}

/// Default output name for an edited video, mirroring the `edited_<stem>`
/// convention the presentation layer suggests.
pub fn edited_output_name(video: &Path) -> String {
    let stem = video
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("video");
    format!("edited_{stem}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_must_be_bare() {
        assert!(validate_output_name("final_video").is_ok());
        assert!(validate_output_name("").unwrap_err().is_invalid_input());
        assert!(validate_output_name("  ").unwrap_err().is_invalid_input());
        assert!(validate_output_name("a/b").unwrap_err().is_invalid_input());
        assert!(validate_output_name("a\\b").unwrap_err().is_invalid_input());
    }

    #[test]
    fn partition_sums_to_track_duration() {
        let durations = partition_durations(10.0, 3);
        assert_eq!(durations.len(), 3);
        assert_eq!(durations[0], 3.333);
        assert_eq!(durations[1], 3.333);
        let total: f64 = durations.iter().sum();
        assert!((total - 10.0).abs() < 1e-9);
        // The remainder lands on the final image.
        assert!(durations[2] > durations[0]);
    }

    #[test]
    fn partition_of_single_image_is_full_track() {
        assert_eq!(partition_durations(7.25, 1), vec![7.25]);
    }

    #[test]
    fn concat_list_orders_images_and_repeats_the_last() {
        let images = vec![PathBuf::from("/a/one.png"), PathBuf::from("/a/two.png")];
        let list = render_concat_list(&images, &[2.5, 2.5]);
        assert_eq!(
            list,
            "file '/a/one.png'\nduration 2.500\nfile '/a/two.png'\nduration 2.500\nfile '/a/two.png'\n"
        );
    }

    #[test]
    fn concat_list_escapes_quotes_in_paths() {
        let images = vec![PathBuf::from("/a/it's.png")];
        let list = render_concat_list(&images, &[1.0]);
        assert!(list.contains("file '/a/it'\\''s.png'"));
    }

    #[tokio::test]
    async fn empty_image_sequence_fails_before_any_io() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            content_root: dir.path().join("content"),
            ..Config::default()
        };

        let err = assemble_from_images(&cfg, &[], Path::new("voice.mp3"), "out")
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
        // Not even the output directory was created.
        assert!(!cfg.videos_dir().exists());
    }

    #[tokio::test]
    async fn edit_rejects_tampered_speed_before_probing() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            content_root: dir.path().join("content"),
            ..Config::default()
        };
        let mut request = EditRequest::new(0.0, None, 1.0, None, "out").unwrap();
        request.speed = 0.0;

        let err = edit(&cfg, Path::new("missing.mp4"), &request)
            .await
            .unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn edited_name_follows_source_stem() {
        assert_eq!(
            edited_output_name(Path::new("content/videos/final_video.mp4")),
            "edited_final_video"
        );
    }
}
