use std::collections::BTreeMap;
use log::{info, warn};
use crate::logutil::escape_log;
use crate::protocol::error::{ProtocolError, Violation};
use crate::protocol::message::DecodedMessage;
use crate::protocol::source::ByteSource;
/// Marker preceding every frame.
pub const FRAME_MARKER: &[u8] = b"START";
/// Literal the device answers the connect request with.
pub const CONNECTION_MARKER: &[u8] = b"CONNECTION";
/// Magic following channel id 0 in a registration frame.
pub const REGISTRATION_MAGIC: &[u8] = b"ChannelInit";
/// Byte written once to ask the device for a connection.
pub const CONNECT_REQUEST: u8 = b'C';
/// Channel id reserved for registration frames.
pub const REGISTRATION_CHANNEL_ID: u8 = 0;
/// Channel name used for debug text, including the notices synthesized here.
pub const DEBUG_CHANNEL: &str = "debug";
/// Maps channel ids announced by the device to their names.
///
/// Owned by the decode loop; other threads only ever see names already
/// resolved into [`DecodedMessage`]s, or a [`ChannelRegistry::snapshot`]
/// handed over by [`FrameDecoder::take_registry_update`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelRegistry {
    channels: BTreeMap<u8, String>,
}
impl ChannelRegistry {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn get(&self, id: u8) -> Option<&str> {
        self.channels.get(&id).map(String::as_str)
    }
    pub fn len(&self) -> usize {
        self.channels.len()
    }
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
    pub fn iter(&self) -> impl Iterator<Item = (u8, &str)> {
        self.channels.iter().map(|(id, name)| (*id, name.as_str()))
    }
    pub fn snapshot(&self) -> ChannelRegistry {
        self.clone()
    }
    fn register(&mut self, id: u8, name: String) {
        // The firmware re-announces every channel on each connect request.
        if let Some(previous) = self.channels.insert(id, name.clone()) {
            if previous != name {
                warn!(
                    "channel {id} renamed from '{}' to '{}'",
                    escape_log(&previous),
                    escape_log(&name)
                );
            }
        }
    }
}
/// Pull decoder turning a raw byte stream into [`DecodedMessage`]s.
pub struct FrameDecoder<S: ByteSource> {
    source: S,
    registry: ChannelRegistry,
    registry_changed: bool,
}
impl<S: ByteSource> FrameDecoder<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            registry: ChannelRegistry::new(),
            registry_changed: false,
        }
    }
    /// Sends the connect request and skips everything up to the device's reply.
    /// Must run exactly once, before the first [`FrameDecoder::decode_next`].
    pub fn handshake(&mut self) -> Result<(), ProtocolError> {
        self.source.write_byte(CONNECT_REQUEST)?;
        self.source.read_until(CONNECTION_MARKER)?;
        info!("device acknowledged connection");
        Ok(())
    }
    pub fn registry(&self) -> &ChannelRegistry {
        &self.registry
    }
    /// Snapshot of the registry if a registration frame arrived since the last call.
    pub fn take_registry_update(&mut self) -> Option<ChannelRegistry> {
        if !self.registry_changed {
            return None;
        }
        self.registry_changed = false;
        Some(self.registry.snapshot())
    }
    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }
    /// Blocks until one complete frame has been read.
    pub fn decode_next(&mut self) -> Result<DecodedMessage, ProtocolError> {
        self.source.read_until(FRAME_MARKER)?;
        let id = self.source.read_byte()?;
        if id == REGISTRATION_CHANNEL_ID {
            self.decode_registration()
        } else {
            self.decode_data(id)
        }
    }
    fn decode_registration(&mut self) -> Result<DecodedMessage, ProtocolError> {
        let magic = self.source.read_bytes(REGISTRATION_MAGIC.len())?;
        if magic != REGISTRATION_MAGIC {
            return Err(Violation::BadRegistrationMagic { found: magic }.into());
        }
        let id = self.source.read_byte()?;
        let len = self.source.read_u16_le()?;
        let name_bytes = self.source.read_bytes(usize::from(len))?;
        if id == REGISTRATION_CHANNEL_ID {
            return Err(Violation::ReservedChannelId.into());
        }
        let name = String::from_utf8_lossy(&name_bytes).into_owned();
        info!("channel {id} registered as '{}'", escape_log(&name));
        let notice = format!("Channel {name} opened");
        self.registry.register(id, name);
        self.registry_changed = true;
        Ok(DecodedMessage::new(DEBUG_CHANNEL, 0, notice.into_bytes()))
    }
    fn decode_data(&mut self, id: u8) -> Result<DecodedMessage, ProtocolError> {
        let send_time_micros = u64::from(self.source.read_u32_le()?);
        let len = self.source.read_u16_le()?;
        let payload = self.source.read_bytes(usize::from(len))?;
        let name = self
            .registry
            .get(id)
            .ok_or(Violation::UnknownChannel(id))?;
        Ok(DecodedMessage::new(name, send_time_micros, payload))
    }
}
