use log::debug;
use crate::scope::units::{micros_to_secs, ADC_CYCLES_PER_SAMPLE, CPU_CLOCK_HZ};
/// Sampling-rate bitfield sent as the first byte of every oscilloscope payload.
///
/// Bits 0-2 hold the ADC prescaler exponent (the divider is at least 2),
/// bits 3-5 the number of conversions skipped between stored samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrequencySelector(pub u8);
impl FrequencySelector {
    pub fn from_parts(prescaler_exponent: u8, skip: u8) -> Self {
        Self((prescaler_exponent & 0b111) | ((skip & 0b111) << 3))
    }
    pub fn prescaler_exponent(self) -> u32 {
        u32::from(self.0 & 0b111)
    }
    pub fn divider(self) -> u32 {
        1 << self.prescaler_exponent().max(1)
    }
    pub fn skip(self) -> u32 {
        u32::from((self.0 >> 3) & 0b111)
    }
    pub fn frequency_hz(self) -> f64 {
        CPU_CLOCK_HZ / f64::from(self.divider()) / ADC_CYCLES_PER_SAMPLE / f64::from(1 + self.skip())
    }
}
/// One batch of samples captured from a single start time at a fixed rate.
#[derive(Clone, Debug, PartialEq)]
pub struct Sequence {
    pub start_time_micros: u64,
    pub frequency_hz: f64,
    pub samples: Vec<u8>,
}
impl Sequence {
    pub fn new(start_time_micros: u64, frequency_hz: f64, samples: Vec<u8>) -> Self {
        Self {
            start_time_micros,
            frequency_hz,
            samples,
        }
    }
    pub fn start_secs(&self) -> f64 {
        micros_to_secs(self.start_time_micros)
    }
    pub fn sample_delay_secs(&self) -> f64 {
        1.0 / self.frequency_hz
    }
    pub fn duration_secs(&self) -> f64 {
        self.samples.len() as f64 * self.sample_delay_secs()
    }
    /// True when `[start, start + width]` overlaps the span covered by the samples.
    pub fn intersects(&self, start_secs: f64, width_secs: f64) -> bool {
        let seq_start = self.start_secs();
        seq_start + self.duration_secs() > start_secs && seq_start < start_secs + width_secs
    }
}
/// Sequences kept sorted by start time; equal start times keep arrival order.
#[derive(Debug, Default)]
pub struct SequenceStore {
    sequences: Vec<Sequence>,
    total_samples: usize,
    max_retained_samples: Option<usize>,
    received_any: bool,
}
impl SequenceStore {
    /// `None` keeps every sequence for the lifetime of the session.
    pub fn new(max_retained_samples: Option<usize>) -> Self {
        Self {
            max_retained_samples,
            ..Self::default()
        }
    }
    /// Decodes the selector and inserts the sequence in start-time order.
    /// Returns `true` for the first sequence this store has ever received.
    pub fn add(&mut self, start_time_micros: u64, selector: FrequencySelector, samples: Vec<u8>) -> bool {
        let sequence = Sequence::new(start_time_micros, selector.frequency_hz(), samples);
        self.insert(sequence)
    }
    pub fn insert(&mut self, sequence: Sequence) -> bool {
        let at = self
            .sequences
            .partition_point(|s| s.start_time_micros <= sequence.start_time_micros);
        self.total_samples += sequence.samples.len();
        self.sequences.insert(at, sequence);
        self.evict(at);
        let first = !self.received_any;
        self.received_any = true;
        first
    }
    /// Drops the earliest sequences (never the one at `newest`) until the cap holds.
    fn evict(&mut self, mut newest: usize) {
        let Some(cap) = self.max_retained_samples else {
            return;
        };
        while self.total_samples > cap && self.sequences.len() > 1 {
            let victim = if newest == 0 { 1 } else { 0 };
            let removed = self.sequences.remove(victim);
            self.total_samples -= removed.samples.len();
            if victim < newest {
                newest -= 1;
            }
            debug!(
                "evicted sequence at {}us ({} samples)",
                removed.start_time_micros,
                removed.samples.len()
            );
        }
    }
    pub fn iter(&self) -> impl Iterator<Item = &Sequence> {
        self.sequences.iter()
    }
    pub fn len(&self) -> usize {
        self.sequences.len()
    }
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }
    pub fn total_samples(&self) -> usize {
        self.total_samples
    }
    /// Start of the first sequence in seconds, 0 when empty.
    pub fn min_time(&self) -> f64 {
        self.sequences.first().map(Sequence::start_secs).unwrap_or(0.0)
    }
    /// Start of the last sequence in seconds, but never less than 0.1s past `min_time`.
    pub fn max_time(&self) -> f64 {
        match self.sequences.last() {
            Some(last) => last.start_secs().max(self.min_time() + MIN_TIME_SPAN_SECS),
            None => MIN_TIME_SPAN_SECS,
        }
    }
}
/// Smallest time range the store ever reports.
pub const MIN_TIME_SPAN_SECS: f64 = 0.1;
