//! Pure filter-graph string builders for the edit pipeline.
//!
//! Everything here is deterministic string construction: the edit operation
//! probes durations, resolves the trim window, then asks this module for the
//! `-filter_complex` graph. The fixed stage order is trim, then speed, then
//! overlay; none of the builders may reorder them.

use crate::request::{OverlayPosition, TextOverlay};

/// Border width for the fixed contrasting outline behind overlay text.
const OVERLAY_BORDER_WIDTH: u32 = 3;

/// Resolves the requested trim window against the probed source duration.
///
/// Start is clamped to >= 0 and end to <= the source duration; an unset or
/// non-positive end defaults to the full duration. An empty or inverted
/// window (start >= end) collapses to `None`: the trim step is skipped and
/// the full clip retained. That is a silent no-op, not an error.
pub fn resolve_trim_window(
    start: f64,
    end: Option<f64>,
    source_duration: f64,
) -> Option<(f64, f64)> {
    let start = start.max(0.0);
    let end = match end {
        Some(e) if e > 0.0 => e.min(source_duration),
        _ => source_duration,
    };

    if start >= end {
        return None;
    }
    Some((start, end))
}

/// Decomposes an arbitrary positive speed factor into valid `atempo` stages.
/// A single `atempo` instance only accepts 0.5-2.0, so factors outside that
/// range are chained: 4x becomes `atempo=2,atempo=2`.
pub fn atempo_stages(speed: f64) -> Vec<String> {
    debug_assert!(speed > 0.0);

    let mut stages = Vec::new();
    let mut rest = speed;
    while rest > 2.0 {
        stages.push("atempo=2".to_string());
        rest /= 2.0;
    }
    while rest < 0.5 {
        stages.push("atempo=0.5".to_string());
        rest /= 0.5;
    }
    stages.push(format!("atempo={}", rest));
    stages
}

/// Escapes text for use inside a quoted `drawtext` `text='...'` argument.
pub fn escape_drawtext(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            ':' => out.push_str("\\:"),
            '%' => out.push_str("\\%"),
            _ => out.push(ch),
        }
    }
    out
}

/// drawtext wants `0xRRGGBB` rather than the `#RRGGBB` the UI layer deals in.
fn drawtext_color(color: &str) -> String {
    match color.strip_prefix('#') {
        Some(hex) => format!("0x{}", hex),
        None => color.to_string(),
    }
}

/// (x, y) placement expressions for an anchored overlay position.
/// Edge anchors keep a 5% frame margin; compass names alias the edges.
pub fn position_expressions(position: OverlayPosition) -> (&'static str, &'static str) {
    match position {
        OverlayPosition::Center => ("(w-text_w)/2", "(h-text_h)/2"),
        OverlayPosition::Top | OverlayPosition::North => ("(w-text_w)/2", "h*0.05"),
        OverlayPosition::Bottom | OverlayPosition::South => ("(w-text_w)/2", "h-text_h-h*0.05"),
        OverlayPosition::West => ("w*0.05", "(h-text_h)/2"),
        OverlayPosition::East => ("w-text_w-w*0.05", "(h-text_h)/2"),
    }
}

/// Builds the `drawtext` stage for a validated overlay. The black border is
/// fixed so the text stays readable on any footage.
pub fn drawtext_filter(overlay: &TextOverlay) -> String {
    let (x, y) = position_expressions(overlay.position);
    format!(
        "drawtext=text='{}':fontsize={}:fontcolor={}:borderw={}:bordercolor=black:x={}:y={}",
        escape_drawtext(&overlay.text),
        overlay.font_size,
        drawtext_color(&overlay.color),
        OVERLAY_BORDER_WIDTH,
        x,
        y,
    )
}

/// Video chain `[0:v]...[v]` with the fixed stage order trim -> speed ->
/// overlay. When every stage is a no-op the chain degenerates to `null` so
/// the mapping label still exists and the output is re-encoded regardless.
pub fn video_chain(
    window: Option<(f64, f64)>,
    speed: f64,
    overlay: Option<&TextOverlay>,
) -> String {
    let mut stages = Vec::new();

    if let Some((start, end)) = window {
        stages.push(format!("trim=start={:.3}:end={:.3}", start, end));
        stages.push("setpts=PTS-STARTPTS".to_string());
    }
    if speed != 1.0 {
        stages.push(format!("setpts=PTS/{}", speed));
    }
    if let Some(overlay) = overlay {
        stages.push(drawtext_filter(overlay));
    }
    if stages.is_empty() {
        stages.push("null".to_string());
    }

    format!("[0:v]{}[v]", stages.join(","))
}

/// Audio chain `[0:a]...[a]` mirroring the video trim and speed stages.
pub fn audio_chain(window: Option<(f64, f64)>, speed: f64) -> String {
    let mut stages = Vec::new();

    if let Some((start, end)) = window {
        stages.push(format!("atrim=start={:.3}:end={:.3}", start, end));
        stages.push("asetpts=PTS-STARTPTS".to_string());
    }
    if speed != 1.0 {
        stages.extend(atempo_stages(speed));
    }
    if stages.is_empty() {
        stages.push("anull".to_string());
    }

    format!("[0:a]{}[a]", stages.join(","))
}

/// The complete `-filter_complex` graph for one edit invocation.
pub fn edit_filter_complex(
    window: Option<(f64, f64)>,
    speed: f64,
    overlay: Option<&TextOverlay>,
    has_audio: bool,
) -> String {
    let video = video_chain(window, speed, overlay);
    if has_audio {
        format!("{};{}", video, audio_chain(window, speed))
    } else {
        video
    }
}
