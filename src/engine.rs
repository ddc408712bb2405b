// src/engine.rs
// Background reader: owns the byte source and the frame decoder, posts every
// decoded message to the GUI thread in order.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use anyhow::{Context, Result};
use log::{error, info};
use crate::config::MonitorConfig;
use crate::protocol::{ByteSource, FrameDecoder, ProtocolError, StreamSource};
use crate::simulator::SimulatedDevice;
use crate::types::*;
/// Poll period while waiting for a stopped reader to let go of its port.
const STOP_POLL: Duration = Duration::from_millis(5);
/// Handle to a running reader thread.
pub struct ReaderHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<()>,
}
impl ReaderHandle {
    /// Asks the reader to end the session at the next frame boundary or idle poll.
    /// Never joins: the thread may be parked in a blocking read.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Relaxed);
    }
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }
    /// Stops the reader and waits up to `grace` for its thread to exit.
    /// Returns `false` if it is still running, e.g. parked in a read.
    pub fn wait_stopped(&self, grace: Duration) -> bool {
        self.stop();
        let deadline = Instant::now() + grace;
        while !self.is_finished() {
            if Instant::now() >= deadline {
                return false;
            }
            thread::sleep(STOP_POLL);
        }
        true
    }
}
impl Drop for ReaderHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
pub fn spawn_reader(
    config: &MonitorConfig,
    mode: ConnectionMode,
    tx: Sender<MonitorEvent>,
) -> Result<ReaderHandle> {
    let stop = Arc::new(AtomicBool::new(false));
    let thread_stop = stop.clone();
    let config = config.clone();
    let thread = thread::Builder::new()
        .name("serial-reader".to_owned())
        .spawn(move || {
            info!("reader started ({mode:?})");
            match run_session(&config, mode, thread_stop, &tx) {
                Ok(()) => info!("reader stopped: receiver gone"),
                Err(e) => {
                    match e.downcast_ref::<ProtocolError>() {
                        Some(ProtocolError::ConnectionClosed) => info!("session ended: {e:#}"),
                        _ => error!("session failed: {e:#}"),
                    }
                    tx.send(MonitorEvent::Status(false)).ok();
                    tx.send(MonitorEvent::SessionEnded(format!("{e:#}"))).ok();
                }
            }
        })
        .context("failed to spawn reader thread")?;
    Ok(ReaderHandle { stop, thread })
}
fn run_session(
    config: &MonitorConfig,
    mode: ConnectionMode,
    stop: Arc<AtomicBool>,
    tx: &Sender<MonitorEvent>,
) -> Result<()> {
    match mode {
        ConnectionMode::Hardware => {
            let port = serialport::new(&config.port_name, config.baud_rate)
                .timeout(Duration::from_millis(config.poll_interval_ms.max(1)))
                .open()
                .with_context(|| {
                    format!("failed to open {} at {} baud", config.port_name, config.baud_rate)
                })?;
            info!("opened {} at {} baud", config.port_name, config.baud_rate);
            drive(StreamSource::new(port, stop), tx)?;
        }
        ConnectionMode::Simulation => {
            let device = SimulatedDevice::new(Duration::from_millis(config.simulation_frame_ms));
            drive(StreamSource::new(device, stop), tx)?;
        }
    }
    Ok(())
}
/// Handshake, then decode until the session dies.
fn drive<S: ByteSource>(source: S, tx: &Sender<MonitorEvent>) -> Result<(), ProtocolError> {
    let mut decoder = FrameDecoder::new(source);
    tx.send(MonitorEvent::Log("Connecting...".to_owned())).ok();
    decoder.handshake()?;
    if tx.send(MonitorEvent::Status(true)).is_err() {
        return Ok(());
    }
    tx.send(MonitorEvent::Log("Connected".to_owned())).ok();
    pump(&mut decoder, tx)
}
/// Posts decoded messages until a fatal error. `Ok` means the receiver hung up.
pub fn pump<S: ByteSource>(
    decoder: &mut FrameDecoder<S>,
    tx: &Sender<MonitorEvent>,
) -> Result<(), ProtocolError> {
    loop {
        let message = decoder.decode_next()?;
        if tx.send(MonitorEvent::Message(message)).is_err() {
            return Ok(());
        }
        if let Some(channels) = decoder.take_registry_update() {
            if tx.send(MonitorEvent::Channels(channels)).is_err() {
                return Ok(());
            }
        }
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::{channel, Receiver};
    use crate::console::ConsoleLog;
    use crate::protocol::encoder::{encode_data_frame, encode_registration};
    use crate::protocol::source::MemorySource;
    use crate::protocol::error::Violation;
    use crate::router::route;
    use crate::scope::Oscilloscope;
    fn messages(rx: &Receiver<MonitorEvent>) -> Vec<crate::protocol::DecodedMessage> {
        rx.try_iter()
            .filter_map(|event| match event {
                MonitorEvent::Message(m) => Some(m),
                _ => None,
            })
            .collect()
    }
    #[test]
    fn end_to_end_registration_and_waveform() {
        let mut bytes = b"START\x00ChannelInit\x01\x05\x00hello".to_vec();
        bytes.extend(encode_registration(2, "oscilloscope").unwrap());
        bytes.extend_from_slice(b"START\x02\x40\x42\x0F\x00\x03\x00\x2A\x10\x20");
        let mut decoder = FrameDecoder::new(MemorySource::new(bytes));
        let (tx, rx) = channel();
        let result = pump(&mut decoder, &tx);
        assert!(matches!(result, Err(ProtocolError::ConnectionClosed)));
        assert_eq!(decoder.registry().get(1), Some("hello"));
        let mut console = ConsoleLog::default();
        let mut scope = Oscilloscope::new(None);
        for message in messages(&rx) {
            route(&message, &mut console, &mut scope);
        }
        assert_eq!(
            console.text(),
            "0.000000s Channel hello opened\n0.000000s Channel oscilloscope opened"
        );
        let sequences: Vec<_> = scope.store().iter().collect();
        assert_eq!(sequences.len(), 1);
        assert_eq!(sequences[0].start_time_micros, 1_000_000);
        assert_eq!(sequences[0].samples, vec![0x10, 0x20]);
        assert_eq!(
            sequences[0].frequency_hz,
            crate::scope::FrequencySelector(0x2A).frequency_hz()
        );
        assert_eq!(scope.viewport().start_secs, 1.0);
    }
    #[test]
    fn messages_arrive_in_wire_order() {
        let mut bytes = encode_registration(1, "debug").unwrap();
        for i in 0..20u32 {
            bytes.extend(encode_data_frame(1, i, format!("msg {i}").as_bytes()).unwrap());
        }
        let mut decoder = FrameDecoder::new(MemorySource::new(bytes));
        let (tx, rx) = channel();
        pump(&mut decoder, &tx).unwrap_err();
        let times: Vec<u64> = messages(&rx).iter().skip(1).map(|m| m.send_time_micros).collect();
        assert_eq!(times, (0..20).collect::<Vec<u64>>());
    }
    #[test]
    fn registrations_publish_channel_snapshots() {
        let mut bytes = encode_registration(1, "debug").unwrap();
        bytes.extend(encode_data_frame(1, 5, b"x").unwrap());
        bytes.extend(encode_registration(2, "oscilloscope").unwrap());
        let mut decoder = FrameDecoder::new(MemorySource::new(bytes));
        let (tx, rx) = channel();
        pump(&mut decoder, &tx).unwrap_err();
        let snapshots: Vec<Vec<u8>> = rx
            .try_iter()
            .filter_map(|event| match event {
                MonitorEvent::Channels(registry) => Some(registry.iter().map(|(id, _)| id).collect()),
                _ => None,
            })
            .collect();
        assert_eq!(snapshots, vec![vec![1], vec![1, 2]]);
    }
    #[test]
    fn unknown_channel_stops_without_message() {
        let bytes = encode_data_frame(4, 0, b"x").unwrap();
        let mut decoder = FrameDecoder::new(MemorySource::new(bytes));
        let (tx, rx) = channel();
        let err = pump(&mut decoder, &tx).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::ProtocolViolation(Violation::UnknownChannel(4))
        ));
        assert!(messages(&rx).is_empty());
    }
    #[test]
    fn pump_returns_quietly_when_receiver_is_gone() {
        let bytes = encode_registration(1, "debug").unwrap();
        let mut decoder = FrameDecoder::new(MemorySource::new(bytes));
        let (tx, rx) = channel();
        drop(rx);
        assert!(pump(&mut decoder, &tx).is_ok());
    }
    #[test]
    fn simulated_session_streams_until_stopped() {
        let config = MonitorConfig {
            simulation_frame_ms: 1,
            ..MonitorConfig::default()
        };
        let (tx, rx) = channel();
        let handle = spawn_reader(&config, ConnectionMode::Simulation, tx).unwrap();
        let timeout = Duration::from_secs(5);
        let mut connected = false;
        loop {
            match rx.recv_timeout(timeout).unwrap() {
                MonitorEvent::Status(true) => connected = true,
                MonitorEvent::Message(m) if m.channel_name == "oscilloscope" => break,
                _ => {}
            }
        }
        assert!(connected);
        assert!(!handle.is_finished());
        assert!(handle.wait_stopped(timeout));
        assert!(handle.is_finished());
        let ended = loop {
            if let MonitorEvent::SessionEnded(reason) = rx.recv_timeout(timeout).unwrap() {
                break reason;
            }
        };
        assert_eq!(ended, "connection closed");
    }
}
