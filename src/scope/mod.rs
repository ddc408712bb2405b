// src/scope/mod.rs
// waveform side: sequence storage, viewport, decimating renderer
pub mod render;
pub mod sequence;
pub mod units;
pub mod viewport;
pub use render::{render_visible, LineSegment, CANVAS_HEIGHT_PX};
pub use sequence::{FrequencySelector, SequenceStore};
pub use viewport::{project, unproject, Viewport};
use crate::router::WaveformSink;
/// Captured sequences plus the window they are viewed through.
///
/// Every change that invalidates previously rendered segments bumps
/// `generation`; the drawing surface re-renders when it sees a new value.
#[derive(Debug, Default)]
pub struct Oscilloscope {
    store: SequenceStore,
    viewport: Viewport,
    generation: u64,
}
impl Oscilloscope {
    pub fn new(max_retained_samples: Option<usize>) -> Self {
        Self {
            store: SequenceStore::new(max_retained_samples),
            ..Self::default()
        }
    }
    pub fn store(&self) -> &SequenceStore {
        &self.store
    }
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }
    pub fn generation(&self) -> u64 {
        self.generation
    }
    pub fn min_time(&self) -> f64 {
        self.store.min_time()
    }
    pub fn max_time(&self) -> f64 {
        self.store.max_time()
    }
    pub fn add_sequence(&mut self, start_time_micros: u64, selector: FrequencySelector, samples: Vec<u8>) {
        let start_secs = if self.store.add(start_time_micros, selector, samples) {
            // jump to the data the first time any arrives
            self.store.min_time()
        } else {
            self.viewport.start_secs
        };
        // eviction can move min_time past the current window
        self.viewport = Viewport::clamped(start_secs, self.viewport.width_secs, self.min_time(), self.max_time());
        self.generation += 1;
    }
    pub fn set_viewport(&mut self, start_secs: f64, width_secs: f64) {
        self.viewport = Viewport::clamped(start_secs, width_secs, self.min_time(), self.max_time());
        self.generation += 1;
    }
    pub fn zoom_around(&mut self, cursor_ratio: f64, factor: f64) {
        let next = self
            .viewport
            .zoomed_around(cursor_ratio, factor, self.min_time(), self.max_time());
        self.set_viewport(next.start_secs, next.width_secs);
    }
    pub fn pan_by(&mut self, delta_secs: f64) {
        let next = self.viewport.panned(delta_secs, self.min_time(), self.max_time());
        self.set_viewport(next.start_secs, next.width_secs);
    }
    /// Viewport start expressed on the full `[min_time, max_time]` scale, for a scroll bar.
    pub fn scroll_value(&self) -> f64 {
        let (min, max) = (self.min_time(), self.max_time());
        let ratio = project(self.viewport.start_secs, min, max - self.viewport.width_secs);
        unproject(ratio, min, max)
    }
    pub fn set_scroll_value(&mut self, value: f64) {
        let (min, max) = (self.min_time(), self.max_time());
        let width = self.viewport.width_secs;
        let start = unproject(project(value, min, max), min, max - width);
        self.set_viewport(start, width);
    }
    pub fn render(&self, pixel_width: f64) -> impl Iterator<Item = LineSegment> + '_ {
        render_visible(&self.store, self.viewport, pixel_width)
    }
}
impl WaveformSink for Oscilloscope {
    fn add_sequence(&mut self, start_time_micros: u64, selector: FrequencySelector, samples: Vec<u8>) {
        Oscilloscope::add_sequence(self, start_time_micros, selector, samples);
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn first_sequence_scrolls_to_start() {
        let mut scope = Oscilloscope::new(None);
        let before = scope.generation();
        scope.add_sequence(3_000_000, FrequencySelector(7), vec![1, 2, 3]);
        assert_eq!(scope.viewport().start_secs, 3.0);
        assert!(scope.generation() > before);
        scope.set_viewport(3.05, 0.01);
        scope.add_sequence(4_000_000, FrequencySelector(7), vec![1, 2, 3]);
        // only the very first batch moves the viewport
        assert_eq!(scope.viewport().start_secs, 3.05);
    }
    #[test]
    fn set_viewport_is_clamped_to_data() {
        let mut scope = Oscilloscope::new(None);
        scope.add_sequence(1_000_000, FrequencySelector(7), vec![0; 8]);
        scope.add_sequence(2_000_000, FrequencySelector(7), vec![0; 8]);
        scope.set_viewport(0.0, 50.0);
        assert_eq!(scope.viewport(), Viewport { start_secs: 1.0, width_secs: 1.0 });
        scope.set_viewport(1.9, 0.5);
        assert_eq!(scope.viewport().start_secs, 1.5);
    }
    #[test]
    fn empty_scope_uses_default_range() {
        let mut scope = Oscilloscope::new(None);
        scope.set_viewport(-4.0, 1.0);
        let vp = scope.viewport();
        assert_eq!(vp.start_secs, 0.0);
        assert!((vp.width_secs - 0.1).abs() < 1e-12);
        assert_eq!(scope.render(640.0).count(), 0);
    }
    #[test]
    fn scroll_value_round_trips() {
        let mut scope = Oscilloscope::new(None);
        scope.add_sequence(0, FrequencySelector(7), vec![0; 8]);
        scope.add_sequence(10_000_000, FrequencySelector(7), vec![0; 8]);
        scope.set_viewport(0.0, 2.0);
        scope.set_scroll_value(10.0);
        assert_eq!(scope.viewport().start_secs, 8.0);
        assert_eq!(scope.scroll_value(), 10.0);
        scope.set_scroll_value(5.0);
        assert_eq!(scope.viewport().start_secs, 4.0);
    }
    #[test]
    fn eviction_pulls_viewport_back_into_range() {
        let mut scope = Oscilloscope::new(Some(8));
        scope.add_sequence(1_000_000, FrequencySelector(7), vec![10; 8]);
        scope.set_viewport(1.0, 0.05);
        scope.add_sequence(5_000_000, FrequencySelector(7), vec![20; 8]);
        assert_eq!(scope.store().len(), 1);
        assert_eq!(scope.min_time(), 5.0);
        let vp = scope.viewport();
        assert_eq!(vp, Viewport { start_secs: 5.0, width_secs: 0.05 });
        assert!(vp.end_secs() <= scope.max_time());
        let scroll = scope.scroll_value();
        assert!(scroll >= scope.min_time() && scroll <= scope.max_time());
        assert!(scope.render(640.0).count() > 0);
    }
    #[test]
    fn zoom_and_pan_stay_in_bounds() {
        let mut scope = Oscilloscope::new(None);
        scope.add_sequence(0, FrequencySelector(7), vec![0; 8]);
        scope.add_sequence(4_000_000, FrequencySelector(7), vec![0; 8]);
        scope.set_viewport(1.0, 2.0);
        scope.zoom_around(0.5, 4.0);
        assert_eq!(scope.viewport(), Viewport { start_secs: 0.0, width_secs: 4.0 });
        scope.zoom_around(0.0, 0.25);
        assert_eq!(scope.viewport().width_secs, 1.0);
        scope.pan_by(10.0);
        assert_eq!(scope.viewport().start_secs, 3.0);
    }
}
