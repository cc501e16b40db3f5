use crate::foundation::error::{StoryreelError, StoryreelResult};

/// Where a timestamp lands on the frame timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimelinePosition {
    /// Index of the frame slot covering the timestamp.
    pub frame_index: usize,
    /// Fraction of the slot elapsed, in `[0, 1)`.
    pub local_progress: f64,
}

/// Maps narration time onto an ordered list of equal-length frame slots.
///
/// Slot `i` covers `[i * slice, (i + 1) * slice)` with `slice = total / frame_count`. Timestamps past
/// the end stay on the last slot, so `frame_index` never decreases as time advances.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timeline {
    frame_count: usize,
    total_secs: f64,
    slice_secs: f64,
}

impl Timeline {
    /// Build a timeline of `frame_count` slots over `total_secs`.
    pub fn new(frame_count: usize, total_secs: f64) -> StoryreelResult<Self> {
        if frame_count == 0 {
            return Err(StoryreelError::empty_timeline(
                "at least one frame is required",
            ));
        }
        if !total_secs.is_finite() || total_secs <= 0.0 {
            return Err(StoryreelError::invalid_audio(format!(
                "narration duration must be finite and > 0, got {total_secs}"
            )));
        }
        Ok(Self {
            frame_count,
            total_secs,
            slice_secs: total_secs / frame_count as f64,
        })
    }

    /// Number of slots.
    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    /// Total narration length in seconds.
    pub fn total_secs(&self) -> f64 {
        self.total_secs
    }

    /// Length of one slot in seconds.
    pub fn slice_secs(&self) -> f64 {
        self.slice_secs
    }

    /// Slot index covering `t`. Negative or NaN times map to slot 0.
    pub fn frame_index(&self, t: f64) -> usize {
        if t.is_nan() || t <= 0.0 {
            return 0;
        }
        let raw = (t / self.slice_secs).floor();
        if raw >= self.frame_count as f64 {
            self.frame_count - 1
        } else {
            raw as usize
        }
    }

    /// Fraction of slot `frame_index(t)` that has elapsed at `t`.
    pub fn local_progress(&self, t: f64) -> f64 {
        let idx = self.frame_index(t);
        let t = if t.is_nan() { 0.0 } else { t.max(0.0) };
        let p = (t - idx as f64 * self.slice_secs) / self.slice_secs;
        p.clamp(0.0, 1.0 - f64::EPSILON)
    }

    /// Resolve `t` into a slot index and its local progress.
    pub fn locate(&self, t: f64) -> TimelinePosition {
        TimelinePosition {
            frame_index: self.frame_index(t),
            local_progress: self.local_progress(t),
        }
    }

    /// `[start, end)` of slot `i` in seconds, or `None` when out of range.
    pub fn slice_range(&self, i: usize) -> Option<(f64, f64)> {
        if i >= self.frame_count {
            return None;
        }
        let start = i as f64 * self.slice_secs;
        let end = if i + 1 == self.frame_count {
            self.total_secs
        } else {
            (i + 1) as f64 * self.slice_secs
        };
        Some((start, end))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/eval/timeline.rs"]
mod tests;
