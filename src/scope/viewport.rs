use crate::scope::sequence::MIN_TIME_SPAN_SECS;
/// Width below which zooming in stops.
pub const MIN_VIEWPORT_WIDTH_SECS: f64 = 1e-6;
/// Visible time window, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub start_secs: f64,
    pub width_secs: f64,
}
impl Default for Viewport {
    fn default() -> Self {
        Self {
            start_secs: 0.0,
            width_secs: MIN_TIME_SPAN_SECS,
        }
    }
}
impl Viewport {
    pub fn end_secs(&self) -> f64 {
        self.start_secs + self.width_secs
    }
    /// Fits the window inside `[min_time, max_time]`, shrinking it first if needed.
    pub fn clamped(start_secs: f64, width_secs: f64, min_time: f64, max_time: f64) -> Self {
        let total = (max_time - min_time).max(MIN_VIEWPORT_WIDTH_SECS);
        let width_secs = if width_secs.is_finite() {
            width_secs.clamp(MIN_VIEWPORT_WIDTH_SECS, total)
        } else {
            total
        };
        let mut start_secs = if start_secs.is_finite() {
            start_secs.max(min_time)
        } else {
            min_time
        };
        if start_secs + width_secs > max_time {
            start_secs = max_time - width_secs;
        }
        Self {
            start_secs,
            width_secs,
        }
    }
    /// Scales the width by `factor` while keeping the time under `cursor_ratio` in place.
    pub fn zoomed_around(&self, cursor_ratio: f64, factor: f64, min_time: f64, max_time: f64) -> Self {
        let cursor_time = self.start_secs + cursor_ratio * self.width_secs;
        let width = self.width_secs * factor;
        Self::clamped(cursor_time - cursor_ratio * width, width, min_time, max_time)
    }
    pub fn panned(&self, delta_secs: f64, min_time: f64, max_time: f64) -> Self {
        Self::clamped(self.start_secs + delta_secs, self.width_secs, min_time, max_time)
    }
}
/// Maps `value` to its 0..1 position within `[lo, hi]`.
pub fn project(value: f64, lo: f64, hi: f64) -> f64 {
    let span = hi - lo;
    if span == 0.0 {
        0.0
    } else {
        (value - lo) / span
    }
}
pub fn unproject(ratio: f64, lo: f64, hi: f64) -> f64 {
    lo + ratio * (hi - lo)
}
