use std::borrow::Cow;
use crate::scope::units::micros_to_secs;
/// One typed message pulled off the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DecodedMessage {
    pub channel_name: String,
    /// Device clock in microseconds; 0 for notices synthesized from registrations.
    pub send_time_micros: u64,
    pub payload: Vec<u8>,
}
impl DecodedMessage {
    pub fn new(channel_name: impl Into<String>, send_time_micros: u64, payload: Vec<u8>) -> Self {
        Self {
            channel_name: channel_name.into(),
            send_time_micros,
            payload,
        }
    }
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
    pub fn send_time_secs(&self) -> f64 {
        micros_to_secs(self.send_time_micros)
    }
}
