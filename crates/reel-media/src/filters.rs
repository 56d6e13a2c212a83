//! FFmpeg filter-string builders for each display mode.
//!
//! All builders are pure: given the same segment parameters they produce
//! the same filter string, which keeps rendered output reproducible.

/// Peak zoom for the Ken Burns effect.
pub const KEN_BURNS_ZOOM: f64 = 1.08;

/// Font size for word highlights.
pub const WORD_FONT_SIZE: u32 = 96;

/// Font size for placeholder captions.
pub const CAPTION_FONT_SIZE: u32 = 48;

/// Ken Burns filter for a generated still: smooth ease-in-out zoom from
/// 1.0 to 1.08 across the full segment duration.
///
/// The zoom expression is a smoothstep over the output frame number, so
/// motion accelerates in and decelerates out without a visible snap.
pub fn ken_burns_filter(duration_sec: f64, fps: u32, width: u32, height: u32) -> String {
    let frames = ((duration_sec * fps as f64).round() as u64).max(1);
    let n = frames.saturating_sub(1).max(1);
    let reach = KEN_BURNS_ZOOM - 1.0;
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,\
         zoompan=z='1+{reach}*(3*pow(on/{n},2)-2*pow(on/{n},3))':d={frames}\
         :x='iw/2-(iw/zoom/2)':y='ih/2-(ih/zoom/2)':s={width}x{height}:fps={fps},\
         format=yuv420p"
    )
}

/// Static hold for figure-sync and carry-forward visuals: scale and pad
/// only. No zoom or pan, so source figures stay legible.
pub fn static_hold_filter(width: u32, height: u32) -> String {
    format!(
        "scale={width}:{height}:force_original_aspect_ratio=decrease,\
         pad={width}:{height}:(ow-iw)/2:(oh-ih)/2,\
         format=yuv420p"
    )
}

/// Progressive word-by-word highlight for text-only segments.
///
/// Each word is drawn centered during its own time window; windows are
/// distributed evenly across the segment duration (no fine-grained word
/// timestamps are available at this layer).
pub fn word_highlight_filter(text: &str, duration_sec: f64) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return "null".to_string();
    }
    let window = duration_sec / words.len() as f64;

    let mut parts = Vec::with_capacity(words.len());
    for (i, word) in words.iter().enumerate() {
        let start = i as f64 * window;
        // The last window runs to the end of the segment so rounding
        // never leaves a blank tail frame.
        let end = if i == words.len() - 1 {
            duration_sec
        } else {
            (i + 1) as f64 * window
        };
        parts.push(format!(
            "drawtext=text='{}':fontcolor=white:fontsize={}\
             :x=(w-text_w)/2:y=(h-text_h)/2:enable='between(t,{:.3},{:.3})'",
            escape_drawtext(word),
            WORD_FONT_SIZE,
            start,
            end,
        ));
    }
    parts.join(",")
}

/// Placeholder caption over a black frame, used when a segment's render
/// failed twice.
pub fn placeholder_filter(caption: &str) -> String {
    format!(
        "drawtext=text='{}':fontcolor=gray:fontsize={}:x=(w-text_w)/2:y=(h-text_h)/2",
        escape_drawtext(caption),
        CAPTION_FONT_SIZE,
    )
}

/// Escape narration text for use inside a drawtext filter argument.
///
/// Apostrophes are swapped for their typographic form to avoid the
/// shell-style quoting maze inside filtergraphs.
pub fn escape_drawtext(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\'' => escaped.push('\u{2019}'),
            '\\' => escaped.push_str("\\\\"),
            ':' => escaped.push_str("\\:"),
            ',' => escaped.push_str("\\,"),
            ';' => escaped.push_str("\\;"),
            '%' => escaped.push_str("\\%"),
            '[' => escaped.push_str("\\["),
            ']' => escaped.push_str("\\]"),
            '\n' | '\r' => escaped.push(' '),
            _ => escaped.push(c),
        }
    }
    escaped
}
