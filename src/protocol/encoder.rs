//! Writer side of the wire format; the exact inverse of [`super::decoder`].
use crate::protocol::decoder::{FRAME_MARKER, REGISTRATION_MAGIC};
use crate::protocol::error::{ProtocolError, Violation};
/// Reply the device sends once it receives the connect request.
pub const CONNECTION_REPLY: &[u8] = b"CONNECTION";
fn length_field(len: usize) -> Result<[u8; 2], ProtocolError> {
    u16::try_from(len)
        .map(u16::to_le_bytes)
        .map_err(|_| Violation::PayloadTooLarge(len).into())
}
/// `START 0x00 "ChannelInit" <id> <u16 len> <name>`
pub fn encode_registration(channel_id: u8, name: &str) -> Result<Vec<u8>, ProtocolError> {
    let name = name.as_bytes();
    let mut frame =
        Vec::with_capacity(FRAME_MARKER.len() + 1 + REGISTRATION_MAGIC.len() + 3 + name.len());
    frame.extend_from_slice(FRAME_MARKER);
    frame.push(0);
    frame.extend_from_slice(REGISTRATION_MAGIC);
    frame.push(channel_id);
    frame.extend_from_slice(&length_field(name.len())?);
    frame.extend_from_slice(name);
    Ok(frame)
}
/// `START <id> <u32 time> <u16 len> <payload>`
pub fn encode_data_frame(
    channel_id: u8,
    send_time_micros: u32,
    payload: &[u8],
) -> Result<Vec<u8>, ProtocolError> {
    let mut frame = Vec::with_capacity(FRAME_MARKER.len() + 7 + payload.len());
    frame.extend_from_slice(FRAME_MARKER);
    frame.push(channel_id);
    frame.extend_from_slice(&send_time_micros.to_le_bytes());
    frame.extend_from_slice(&length_field(payload.len())?);
    frame.extend_from_slice(payload);
    Ok(frame)
}
/// Oscilloscope payload: selector byte followed by the raw samples.
pub fn encode_waveform_payload(selector: u8, samples: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(samples.len() + 1);
    payload.push(selector);
    payload.extend_from_slice(samples);
    payload
}
#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn registration_layout_matches_wire_format() {
        let frame = encode_registration(1, "hello").unwrap();
        let mut expected = b"START\x00ChannelInit\x01\x05\x00".to_vec();
        expected.extend_from_slice(b"hello");
        assert_eq!(frame, expected);
    }
    #[test]
    fn data_frame_is_little_endian() {
        let frame = encode_data_frame(2, 1_000_000, &[0x2A, 0x10, 0x20]).unwrap();
        assert_eq!(
            frame,
            b"START\x02\x40\x42\x0F\x00\x03\x00\x2A\x10\x20".to_vec()
        );
    }
    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![0u8; u16::MAX as usize + 1];
        let err = encode_data_frame(1, 0, &payload).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ProtocolViolation(Violation::PayloadTooLarge(65536))
        ));
    }
}
