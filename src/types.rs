// src/types.rs
use serde::{Deserialize, Serialize};
use crate::protocol::{ChannelRegistry, DecodedMessage};
// where the byte stream comes from
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum ConnectionMode {
    Simulation,
    #[default]
    Hardware,
}
// reader thread -> GUI, strictly in arrival order
#[derive(Clone, Debug)]
pub enum MonitorEvent {
    Log(String),
    Status(bool), // connection state
    Message(DecodedMessage),
    Channels(ChannelRegistry), // registry after a registration frame
    SessionEnded(String),
}
