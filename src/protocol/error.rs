use thiserror::Error;
/// The precise reason a byte stream was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("registration frame magic mismatch: got {found:?}")]
    BadRegistrationMagic { found: Vec<u8> },
    #[error("data frame references unregistered channel {0}")]
    UnknownChannel(u8),
    #[error("registration frame assigns reserved channel id 0")]
    ReservedChannelId,
    #[error("{0} bytes do not fit a 16-bit length field")]
    PayloadTooLarge(usize),
}
/// Both classes are fatal: byte alignment is lost and the session has to be reopened.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,
    #[error("protocol violation: {0}")]
    ProtocolViolation(#[from] Violation),
}
