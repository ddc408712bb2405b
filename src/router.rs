// src/router.rs
use log::{debug, warn};
use crate::logutil::escape_log;
use crate::protocol::{DecodedMessage, DEBUG_CHANNEL};
use crate::scope::FrequencySelector;
/// Channel carrying sampled waveforms.
pub const OSCILLOSCOPE_CHANNEL: &str = "oscilloscope";
/// Receives formatted debug lines. Retention is up to the implementor.
pub trait DebugSink {
    fn write_line(&mut self, line: String);
}
/// Receives decoded waveform batches.
pub trait WaveformSink {
    fn add_sequence(&mut self, start_time_micros: u64, selector: FrequencySelector, samples: Vec<u8>);
}
/// `"1.234567s text"`
pub fn format_debug_line(message: &DecodedMessage) -> String {
    format!("{:.6}s {}", message.send_time_secs(), message.text())
}
/// Dispatches one message by channel name. Unknown channels are ignored.
pub fn route<D, W>(message: &DecodedMessage, debug_sink: &mut D, waveform_sink: &mut W)
where
    D: DebugSink + ?Sized,
    W: WaveformSink + ?Sized,
{
    match message.channel_name.as_str() {
        DEBUG_CHANNEL => debug_sink.write_line(format_debug_line(message)),
        OSCILLOSCOPE_CHANNEL => {
            let send_time_micros = message.send_time_micros;
            let Some((&selector, samples)) = message.payload.split_first() else {
                warn!("oscilloscope frame at {send_time_micros}us has no selector byte");
                return;
            };
            if samples.is_empty() {
                debug!("oscilloscope frame at {send_time_micros}us carries no samples");
                return;
            }
            waveform_sink.add_sequence(send_time_micros, FrequencySelector(selector), samples.to_vec());
        }
        other => debug!("ignoring message on channel '{}'", escape_log(other)),
    }
}
