use smallvec::SmallVec;

use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Width measurement for a single run of caption text.
///
/// Implemented by the shaping engine in production; any deterministic measure works for layout.
pub trait TextMeasure {
    /// Advance width of `text` in pixels when drawn on one line.
    fn measure(&mut self, text: &str) -> StoryreelResult<f32>;
}

/// One committed caption line.
#[derive(Clone, Debug, PartialEq)]
pub struct CaptionLine {
    /// Words of the line joined by single spaces.
    pub text: String,
    /// Measured width in pixels.
    pub width: f32,
}

/// Lines of a wrapped caption. Most captions fit in four lines or fewer.
pub type CaptionLines = SmallVec<[CaptionLine; 4]>;

/// Greedy word-wrap of `text` into lines no wider than `max_width_px`.
///
/// Words are split on Unicode whitespace and never broken; a word wider than `max_width_px`
/// occupies a line of its own. Concatenating the lines with single spaces reproduces the input's
/// word sequence. Blank text produces no lines.
pub fn layout_caption(
    text: &str,
    max_width_px: f32,
    measure: &mut impl TextMeasure,
) -> StoryreelResult<CaptionLines> {
    if !max_width_px.is_finite() || max_width_px <= 0.0 {
        return Err(StoryreelError::config(
            "caption max width must be finite and > 0",
        ));
    }

    let mut lines = CaptionLines::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
            current_width = measure.measure(&current)?;
            continue;
        }

        let candidate = format!("{current} {word}");
        let candidate_width = measure.measure(&candidate)?;
        if candidate_width <= max_width_px {
            current = candidate;
            current_width = candidate_width;
        } else {
            lines.push(CaptionLine {
                text: std::mem::take(&mut current),
                width: current_width,
            });
            current.push_str(word);
            current_width = measure.measure(&current)?;
        }
    }

    if !current.is_empty() {
        lines.push(CaptionLine {
            text: current,
            width: current_width,
        });
    }
    Ok(lines)
}

/// Vertical center of each line for a block centered on `anchor_y`.
///
/// Line `i` sits at `anchor_y - (n - 1) * line_height / 2 + i * line_height`.
pub fn line_centers(line_count: usize, anchor_y: f64, line_height: f64) -> Vec<f64> {
    if line_count == 0 {
        return Vec::new();
    }
    let start = anchor_y - ((line_count - 1) as f64 * line_height) / 2.0;
    (0..line_count)
        .map(|i| start + i as f64 * line_height)
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/layout/caption.rs"]
mod tests;
