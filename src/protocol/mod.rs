// src/protocol/mod.rs
// wire format: marker-delimited frames, dynamic channel registration
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod message;
pub mod source;
pub use decoder::{ChannelRegistry, FrameDecoder, DEBUG_CHANNEL};
pub use error::ProtocolError;
pub use message::DecodedMessage;
pub use source::{ByteSource, StreamSource};
