use crate::scope::sequence::{Sequence, SequenceStore};
use crate::scope::units::{secs_to_micros, MICROS_PER_SECOND};
use crate::scope::viewport::Viewport;
/// Minimum horizontal distance between two emitted segment ends.
pub const MIN_SEGMENT_SPACING_PX: f64 = 5.0;
/// Sequences starting further right than this (or than the canvas, if wider) are skipped outright.
pub const RIGHT_EDGE_CUTOFF_PX: f64 = 1000.0;
/// Byte samples are drawn upside down so larger values sit higher on screen.
const HEIGHT_BASELINE: f64 = 256.0;
const HEIGHT_MARGIN: f64 = 10.0;
/// Total canvas height needed for the full byte range.
pub const CANVAS_HEIGHT_PX: f64 = HEIGHT_BASELINE + 2.0 * HEIGHT_MARGIN;
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LineSegment {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}
pub fn value_to_height(value: u8) -> f64 {
    HEIGHT_BASELINE - f64::from(value) + HEIGHT_MARGIN
}
/// Envelope-preserving decimation of one sequence.
///
/// Samples closer than [`MIN_SEGMENT_SPACING_PX`] are folded into a vertical
/// min/max segment so spikes stay visible; runs of one sample per step are
/// joined by slope segments. The last sample always closes a segment, so a
/// sequence yields at most `ceil(pixel_width / 5) + 1` segments.
#[derive(Clone, Debug)]
pub struct SegmentIter<'a> {
    samples: &'a [u8],
    idx: usize,
    pos: f64,
    step: f64,
    pixel_width: f64,
    prev_pos: f64,
    prev_idx: usize,
    prev_height: f64,
    min_value: u8,
    max_value: u8,
}
impl<'a> SegmentIter<'a> {
    fn empty() -> Self {
        Self {
            samples: &[],
            idx: 0,
            pos: 0.0,
            step: 0.0,
            pixel_width: 0.0,
            prev_pos: 0.0,
            prev_idx: 0,
            prev_height: 0.0,
            min_value: 0,
            max_value: 0,
        }
    }
}
impl Iterator for SegmentIter<'_> {
    type Item = LineSegment;
    fn next(&mut self) -> Option<LineSegment> {
        while self.idx < self.samples.len() {
            let idx = self.idx;
            self.idx += 1;
            let value = self.samples[idx];
            self.pos += self.step;
            self.min_value = self.min_value.min(value);
            self.max_value = self.max_value.max(value);
            let is_last = idx + 1 == self.samples.len();
            let on_screen = self.pos > 0.0 && self.pos < self.pixel_width;
            if !(on_screen && self.pos - self.prev_pos >= MIN_SEGMENT_SPACING_PX) && !is_last {
                continue;
            }
            let height = value_to_height(value);
            let (y1, y2) = if idx == self.prev_idx + 1 {
                (self.prev_height, height)
            } else if value - self.min_value > self.max_value - value {
                (value_to_height(self.min_value), value_to_height(self.max_value))
            } else {
                (value_to_height(self.max_value), value_to_height(self.min_value))
            };
            let segment = LineSegment {
                x1: self.prev_pos,
                y1,
                x2: self.pos,
                y2,
            };
            self.prev_pos = self.pos;
            self.prev_idx = idx;
            self.prev_height = height;
            self.min_value = value;
            self.max_value = value;
            return Some(segment);
        }
        None
    }
}
/// Lazily renders one sequence against `viewport` on a canvas `pixel_width` wide.
pub fn render_sequence<'a>(sequence: &'a Sequence, viewport: &Viewport, pixel_width: f64) -> SegmentIter<'a> {
    let samples = sequence.samples.as_slice();
    if samples.len() < 2 || !(pixel_width > 0.0) || !(viewport.width_secs > 0.0) {
        return SegmentIter::empty();
    }
    let scale = pixel_width / viewport.width_secs; // pixels per second
    let display_start_micros = secs_to_micros(viewport.start_secs);
    let pos = (sequence.start_time_micros as f64 - display_start_micros as f64) / MICROS_PER_SECOND * scale;
    if pos > pixel_width.max(RIGHT_EDGE_CUTOFF_PX) {
        return SegmentIter::empty();
    }
    let first = samples[0];
    SegmentIter {
        samples,
        idx: 1,
        pos,
        step: sequence.sample_delay_secs() * scale,
        pixel_width,
        prev_pos: pos,
        prev_idx: 0,
        prev_height: value_to_height(first),
        min_value: first,
        max_value: first,
    }
}
/// Segments for every stored sequence that overlaps the viewport, in start-time order.
pub fn render_visible<'a>(
    store: &'a SequenceStore,
    viewport: Viewport,
    pixel_width: f64,
) -> impl Iterator<Item = LineSegment> + 'a {
    store
        .iter()
        .filter(move |s| s.intersects(viewport.start_secs, viewport.width_secs))
        .flat_map(move |s| render_sequence(s, &viewport, pixel_width))
}
