use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// What happens to a source clip's own audio during assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AudioPolicy {
    /// Strip the clip's audio and attach the supplied narration track,
    /// looping the visual content if it is shorter than the track.
    ReplaceWithTrack,
    /// Keep the clip's audio; only normalize the encoding.
    KeepOriginal,
    /// No audio at all: no track supplied and the original is stripped.
    None,
}

impl AudioPolicy {
    /// Still images have no intrinsic audio, so keep-original is only
    /// reachable through the clip assembler. That keeps the §3 invariant
    /// structural instead of checked.
    pub fn resolve(audio: Option<&Path>, keep_original_audio: bool) -> Self {
        if keep_original_audio {
            AudioPolicy::KeepOriginal
        } else if audio.is_some() {
            AudioPolicy::ReplaceWithTrack
        } else {
            AudioPolicy::None
        }
    }
}

/// Anchored overlay positions. `North`/`South` are compass aliases of
/// `Top`/`Bottom` and resolve to the same drawtext expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OverlayPosition {
    Center,
    Top,
    Bottom,
    West,
    East,
    North,
    South,
}

/// Text composited over the full duration of an edited clip. Validated at
/// construction so the pipeline never sees a malformed overlay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextOverlay {
    pub text: String,
    pub font_size: u32,
    pub color: String,
    pub position: OverlayPosition,
}

impl TextOverlay {
    pub fn new(
        text: impl Into<String>,
        font_size: u32,
        color: impl Into<String>,
        position: OverlayPosition,
    ) -> Result<Self> {
        let text = text.into();
        let color = color.into();

        if text.trim().is_empty() {
            return Err(EngineError::invalid("overlay text is empty"));
        }
        if font_size == 0 || font_size > 500 {
            return Err(EngineError::invalid(format!(
                "overlay font size must be 1-500 (got {})",
                font_size
            )));
        }
        if !valid_color(&color) {
            return Err(EngineError::invalid(format!(
                "overlay color must be #RRGGBB or a color name (got {:?})",
                color
            )));
        }

        Ok(Self {
            text,
            font_size,
            color,
            position,
        })
    }
}

fn valid_color(color: &str) -> bool {
    if let Some(hex) = color.strip_prefix('#') {
        return hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit());
    }
    !color.is_empty() && color.chars().all(|c| c.is_ascii_alphabetic())
}

/// A post-edit request: trim window, speed multiplier, optional overlay.
/// Built per user action and discarded after use.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRequest {
    /// Trim window start, clamped to >= 0 at construction.
    pub start: f64,
    /// Trim window end; `None` (or a non-positive value at the call site)
    /// means the full source duration.
    pub end: Option<f64>,
    /// Playback rate multiplier for both video and paired audio.
    pub speed: f64,
    pub overlay: Option<TextOverlay>,
    pub output_name: String,
}

impl EditRequest {
    pub fn new(
        start: f64,
        end: Option<f64>,
        speed: f64,
        overlay: Option<TextOverlay>,
        output_name: impl Into<String>,
    ) -> Result<Self> {
        if !start.is_finite() {
            return Err(EngineError::invalid("trim start must be finite"));
        }
        if let Some(end) = end {
            if !end.is_finite() {
                return Err(EngineError::invalid("trim end must be finite"));
            }
        }
        if !speed.is_finite() || speed <= 0.0 {
            return Err(EngineError::invalid(format!(
                "speed must be a positive number (got {})",
                speed
            )));
        }

        Ok(Self {
            start: start.max(0.0),
            end,
            speed,
            overlay,
            output_name: output_name.into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn policy_resolution() {
        let track = PathBuf::from("content/audio/narration.mp3");
        assert_eq!(
            AudioPolicy::resolve(Some(&track), false),
            AudioPolicy::ReplaceWithTrack
        );
        assert_eq!(
            AudioPolicy::resolve(Some(&track), true),
            AudioPolicy::KeepOriginal
        );
        assert_eq!(AudioPolicy::resolve(None, false), AudioPolicy::None);
    }

    #[test]
    fn overlay_rejects_empty_text_and_bad_color() {
        assert!(TextOverlay::new("", 50, "#FFFFFF", OverlayPosition::Center).is_err());
        assert!(TextOverlay::new("   ", 50, "#FFFFFF", OverlayPosition::Center).is_err());
        assert!(TextOverlay::new("hi", 0, "#FFFFFF", OverlayPosition::Center).is_err());
        assert!(TextOverlay::new("hi", 50, "#FFF", OverlayPosition::Center).is_err());
        assert!(TextOverlay::new("hi", 50, "#GGGGGG", OverlayPosition::Center).is_err());
        assert!(TextOverlay::new("hi", 50, "not a color!", OverlayPosition::Center).is_err());
    }

    #[test]
    fn overlay_accepts_hex_and_named_colors() {
        assert!(TextOverlay::new("hi", 50, "#ffffff", OverlayPosition::South).is_ok());
        assert!(TextOverlay::new("hi", 50, "white", OverlayPosition::Top).is_ok());
    }

    #[test]
    fn edit_request_clamps_negative_start() {
        let req = EditRequest::new(-3.0, None, 1.0, None, "out").unwrap();
        assert_eq!(req.start, 0.0);
    }

    #[test]
    fn edit_request_rejects_bad_speed() {
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = EditRequest::new(0.0, None, speed, None, "out").unwrap_err();
            assert!(err.is_invalid_input());
        }
    }

    #[test]
    fn edit_request_rejects_non_finite_window() {
        assert!(EditRequest::new(f64::NAN, None, 1.0, None, "out").is_err());
        assert!(EditRequest::new(0.0, Some(f64::INFINITY), 1.0, None, "out").is_err());
    }
}
