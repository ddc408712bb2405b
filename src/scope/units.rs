//! Unit conversions shared by the store, the viewport and the renderer.
//! Device times are microseconds (u64), viewport times are seconds (f64).
pub const MICROS_PER_SECOND: f64 = 1_000_000.0;
/// Clock of the sampling microcontroller.
pub const CPU_CLOCK_HZ: f64 = 16_000_000.0;
/// ADC clock cycles spent on one conversion.
pub const ADC_CYCLES_PER_SAMPLE: f64 = 13.0;
pub fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / MICROS_PER_SECOND
}
/// Truncates; negative inputs saturate to 0.
pub fn secs_to_micros(secs: f64) -> u64 {
    (secs * MICROS_PER_SECOND) as u64
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn conversions() {
        assert_eq!(micros_to_secs(1_500_000), 1.5);
        assert_eq!(secs_to_micros(0.25), 250_000);
        assert_eq!(secs_to_micros(-3.0), 0);
    }
}
