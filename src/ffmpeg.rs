//! ffmpeg invocation: argument-vector builders plus a single process runner.
//!
//! The builders are pure so every command line the pipeline can issue is
//! unit-testable; only `run` touches the process table. A non-zero exit maps
//! to a media error carrying the captured stderr as the diagnostic trace.

use crate::config::{AUDIO_CODEC, Config, OUTPUT_FPS, VIDEO_CODEC};
use crate::error::{EngineError, Result};
use std::path::Path;
use tokio::process::Command;
use tracing::debug;

pub async fn run(args: &[String]) -> Result<()> {
    if args.is_empty() {
        return Ok(());
    }

    debug!(cmd = ?args, "running {}", args[0]);
    let output = Command::new(&args[0])
        .args(&args[1..])
        .output()
        .await
        .map_err(|e| EngineError::media_with(format!("failed to spawn {}", args[0]), e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(EngineError::media(format!(
            "{} exited with {}: {}",
            args[0],
            output.status,
            stderr.trim()
        )));
    }

    Ok(())
}

fn base_args() -> Vec<String> {
    ["ffmpeg", "-y", "-hide_banner", "-loglevel", "error"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn push_video_encode(args: &mut Vec<String>, cfg: &Config) {
    args.push("-c:v".to_string());
    args.push(VIDEO_CODEC.to_string());
    args.push("-pix_fmt".to_string());
    args.push("yuv420p".to_string());
    args.push("-preset".to_string());
    args.push(cfg.x264_preset.clone());
    args.push("-crf".to_string());
    args.push(cfg.crf.to_string());
    args.push("-r".to_string());
    args.push(OUTPUT_FPS.to_string());
}

fn push_audio_encode(args: &mut Vec<String>, cfg: &Config) {
    args.push("-c:a".to_string());
    args.push(AUDIO_CODEC.to_string());
    args.push("-b:a".to_string());
    args.push(cfg.audio_bitrate.clone());
}

/// Transcodes a narration track to the fixed audio codec ahead of muxing.
/// The destination is the operation's transient temp-audio artifact.
pub fn audio_transcode_args(cfg: &Config, audio_in: &Path, temp_out: &Path) -> Vec<String> {
    let mut args = base_args();
    args.push("-i".to_string());
    args.push(audio_in.display().to_string());
    args.push("-vn".to_string());
    push_audio_encode(&mut args, cfg);
    args.push(temp_out.display().to_string());
    args
}

/// Renders an image-sequence video from a concat-demuxer list and attaches
/// the pre-encoded temp audio. The list carries per-image durations, so the
/// video track governs the output length.
pub fn image_sequence_args(
    cfg: &Config,
    list_txt: &Path,
    temp_audio: &Path,
    out_mp4: &Path,
) -> Vec<String> {
    let mut args = base_args();
    for a in ["-f", "concat", "-safe", "0", "-i"] {
        args.push(a.to_string());
    }
    args.push(list_txt.display().to_string());
    args.push("-i".to_string());
    args.push(temp_audio.display().to_string());
    for a in ["-map", "0:v", "-map", "1:a"] {
        args.push(a.to_string());
    }
    push_video_encode(&mut args, cfg);
    for a in ["-c:a", "copy", "-shortest", "-movflags", "+faststart"] {
        args.push(a.to_string());
    }
    args.push(out_mp4.display().to_string());
    args
}

/// Replace-with-track assembly: loop the clip's visual content as often as
/// needed, trim exactly to the track duration, attach the pre-encoded temp
/// audio.
pub fn clip_replace_audio_args(
    cfg: &Config,
    clip: &Path,
    temp_audio: &Path,
    track_duration: f64,
    out_mp4: &Path,
) -> Vec<String> {
    let mut args = base_args();
    for a in ["-stream_loop", "-1", "-i"] {
        args.push(a.to_string());
    }
    args.push(clip.display().to_string());
    args.push("-i".to_string());
    args.push(temp_audio.display().to_string());
    for a in ["-map", "0:v", "-map", "1:a"] {
        args.push(a.to_string());
    }
    push_video_encode(&mut args, cfg);
    for a in ["-c:a", "copy", "-t"] {
        args.push(a.to_string());
    }
    args.push(format!("{:.3}", track_duration));
    for a in ["-movflags", "+faststart"] {
        args.push(a.to_string());
    }
    args.push(out_mp4.display().to_string());
    args
}

/// Keep-original assembly: the clip passes through, re-encoded to the
/// normalized codec and frame-rate settings.
pub fn clip_keep_audio_args(cfg: &Config, clip: &Path, out_mp4: &Path) -> Vec<String> {
    let mut args = base_args();
    args.push("-i".to_string());
    args.push(clip.display().to_string());
    for a in ["-map", "0:v", "-map", "0:a?"] {
        args.push(a.to_string());
    }
    push_video_encode(&mut args, cfg);
    push_audio_encode(&mut args, cfg);
    for a in ["-movflags", "+faststart"] {
        args.push(a.to_string());
    }
    args.push(out_mp4.display().to_string());
    args
}

/// No-audio assembly: strip the clip's audio entirely.
pub fn clip_strip_audio_args(cfg: &Config, clip: &Path, out_mp4: &Path) -> Vec<String> {
    let mut args = base_args();
    args.push("-i".to_string());
    args.push(clip.display().to_string());
    for a in ["-map", "0:v", "-an"] {
        args.push(a.to_string());
    }
    push_video_encode(&mut args, cfg);
    for a in ["-movflags", "+faststart"] {
        args.push(a.to_string());
    }
    args.push(out_mp4.display().to_string());
    args
}

/// One-pass edit render: a single `-filter_complex` graph carries trim,
/// speed, and overlay, and the output is re-encoded to the fixed settings
/// even when every stage was a no-op.
pub fn edit_args(
    cfg: &Config,
    video: &Path,
    filter_complex: &str,
    has_audio: bool,
    out_mp4: &Path,
) -> Vec<String> {
    let mut args = base_args();
    args.push("-i".to_string());
    args.push(video.display().to_string());
    args.push("-filter_complex".to_string());
    args.push(filter_complex.to_string());
    for a in ["-map", "[v]"] {
        args.push(a.to_string());
    }
    if has_audio {
        for a in ["-map", "[a]"] {
            args.push(a.to_string());
        }
    }
    push_video_encode(&mut args, cfg);
    if has_audio {
        push_audio_encode(&mut args, cfg);
    }
    for a in ["-movflags", "+faststart"] {
        args.push(a.to_string());
    }
    args.push(out_mp4.display().to_string());
    args
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn cfg() -> Config {
        Config::default()
    }

    fn pos(args: &[String], needle: &str) -> usize {
        args.iter()
            .position(|a| a == needle)
            .unwrap_or_else(|| panic!("missing {:?} in {:?}", needle, args))
    }

    #[test]
    fn every_render_overwrites_deterministically() {
        let out = PathBuf::from("content/videos/final.mp4");
        for args in [
            image_sequence_args(&cfg(), Path::new("list.txt"), Path::new("t.m4a"), &out),
            clip_keep_audio_args(&cfg(), Path::new("clip.mp4"), &out),
            clip_strip_audio_args(&cfg(), Path::new("clip.mp4"), &out),
            edit_args(&cfg(), Path::new("in.mp4"), "[0:v]null[v]", false, &out),
        ] {
            assert_eq!(args[0], "ffmpeg");
            assert_eq!(args[1], "-y");
            assert_eq!(args.last().unwrap(), "content/videos/final.mp4");
        }
    }

    #[test]
    fn fixed_encoding_settings_are_always_present() {
        let args = clip_keep_audio_args(&cfg(), Path::new("clip.mp4"), Path::new("out.mp4"));
        assert_eq!(args[pos(&args, "-c:v") + 1], "libx264");
        assert_eq!(args[pos(&args, "-r") + 1], "24");
        assert_eq!(args[pos(&args, "-c:a") + 1], "aac");
        assert_eq!(args[pos(&args, "-crf") + 1], "22");
        assert_eq!(args[pos(&args, "-preset") + 1], "veryfast");
    }

    #[test]
    fn image_sequence_uses_concat_demuxer_and_video_governs_length() {
        let args = image_sequence_args(
            &cfg(),
            Path::new("content/videos/temp-image-list.txt"),
            Path::new("content/videos/temp-audio.m4a"),
            Path::new("content/videos/out.mp4"),
        );
        assert!(pos(&args, "-f") < pos(&args, "concat"));
        // Temp audio is already AAC; it is attached, not re-encoded.
        assert_eq!(args[pos(&args, "-c:a") + 1], "copy");
        assert!(args.contains(&"-shortest".to_string()));
    }

    #[test]
    fn replace_audio_loops_then_trims_to_track_duration() {
        let args = clip_replace_audio_args(
            &cfg(),
            Path::new("clip.mp4"),
            Path::new("temp-video-audio.m4a"),
            12.3456,
            Path::new("out.mp4"),
        );
        let loop_at = pos(&args, "-stream_loop");
        assert_eq!(args[loop_at + 1], "-1");
        // The loop flag must precede its input.
        assert!(loop_at < pos(&args, "clip.mp4"));
        assert_eq!(args[pos(&args, "-t") + 1], "12.346");
    }

    #[test]
    fn strip_audio_has_no_audio_stream() {
        let args = clip_strip_audio_args(&cfg(), Path::new("clip.mp4"), Path::new("out.mp4"));
        assert!(args.contains(&"-an".to_string()));
        assert!(!args.contains(&"-c:a".to_string()));
    }

    #[test]
    fn edit_maps_filter_labels() {
        let args = edit_args(
            &cfg(),
            Path::new("in.mp4"),
            "[0:v]null[v];[0:a]anull[a]",
            true,
            Path::new("out.mp4"),
        );
        assert!(args.contains(&"[v]".to_string()));
        assert!(args.contains(&"[a]".to_string()));

        let silent = edit_args(
            &cfg(),
            Path::new("in.mp4"),
            "[0:v]null[v]",
            false,
            Path::new("out.mp4"),
        );
        assert!(!silent.contains(&"[a]".to_string()));
        assert!(!silent.contains(&"-c:a".to_string()));
    }

    #[test]
    fn narration_transcode_targets_fixed_audio_codec() {
        let args = audio_transcode_args(
            &cfg(),
            Path::new("content/audio/voice.mp3"),
            Path::new("content/videos/temp-audio.m4a"),
        );
        assert!(args.contains(&"-vn".to_string()));
        assert_eq!(args[pos(&args, "-c:a") + 1], "aac");
        assert_eq!(args[pos(&args, "-b:a") + 1], "192k");
    }
}
