// src/simulator.rs
// Firmware stand-in for running without hardware. Speaks the same wire format:
// silent until it sees 'C', then "CONNECTION", channel registrations, and a
// steady stream of oscilloscope frames with the odd debug line in between.
use std::collections::VecDeque;
use std::f64::consts::TAU;
use std::io::{self, ErrorKind, Read, Write};
use std::thread;
use std::time::{Duration, Instant};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use crate::protocol::decoder::CONNECT_REQUEST;
use crate::protocol::encoder::{
    encode_data_frame, encode_registration, encode_waveform_payload, CONNECTION_REPLY,
};
use crate::protocol::{ProtocolError, DEBUG_CHANNEL};
use crate::router::OSCILLOSCOPE_CHANNEL;
use crate::scope::FrequencySelector;
pub const SIM_DEBUG_CHANNEL_ID: u8 = 1;
pub const SIM_SCOPE_CHANNEL_ID: u8 = 2;
const SAMPLES_PER_FRAME: usize = 128;
const PRESCALER_EXPONENT: u8 = 7;
const SIGNAL_HZ: f64 = 20.0;
const AMPLITUDE: f64 = 100.0;
const NOISE: f64 = 8.0;
const DEBUG_EVERY_FRAMES: u64 = 25;
pub struct SimulatedDevice {
    pending: VecDeque<u8>,
    connected: bool,
    frame_interval: Duration,
    started: Instant,
    frames_sent: u64,
    rng: StdRng,
}
impl SimulatedDevice {
    pub fn new(frame_interval: Duration) -> Self {
        Self::with_rng(frame_interval, StdRng::from_entropy())
    }
    #[cfg(test)]
    pub fn with_seed(frame_interval: Duration, seed: u64) -> Self {
        Self::with_rng(frame_interval, StdRng::seed_from_u64(seed))
    }
    fn with_rng(frame_interval: Duration, rng: StdRng) -> Self {
        Self {
            pending: VecDeque::new(),
            connected: false,
            frame_interval,
            started: Instant::now(),
            frames_sent: 0,
            rng,
        }
    }
    // the firmware answers every connect request, re-announcing all channels
    fn on_connect(&mut self) -> Result<(), ProtocolError> {
        if !self.connected {
            self.started = Instant::now();
        }
        self.connected = true;
        self.pending.extend(CONNECTION_REPLY);
        self.pending
            .extend(encode_registration(SIM_DEBUG_CHANNEL_ID, DEBUG_CHANNEL)?);
        self.pending
            .extend(encode_registration(SIM_SCOPE_CHANNEL_ID, OSCILLOSCOPE_CHANNEL)?);
        Ok(())
    }
    /// Device clock: microseconds since connection, wrapping at 32 bits.
    fn now_micros(&self) -> u32 {
        self.started.elapsed().as_micros() as u32
    }
    fn produce_frame(&mut self) -> Result<(), ProtocolError> {
        let send_time = self.now_micros();
        let selector = FrequencySelector::from_parts(PRESCALER_EXPONENT, (self.frames_sent % 4) as u8);
        let rate = selector.frequency_hz();
        let start_secs = f64::from(send_time) / 1e6;
        let samples: Vec<u8> = (0..SAMPLES_PER_FRAME)
            .map(|i| {
                let t = start_secs + i as f64 / rate;
                let noise = self.rng.gen_range(-NOISE..NOISE);
                (128.0 + AMPLITUDE * (TAU * SIGNAL_HZ * t).sin() + noise).clamp(0.0, 255.0) as u8
            })
            .collect();
        let payload = encode_waveform_payload(selector.0, &samples);
        self.pending
            .extend(encode_data_frame(SIM_SCOPE_CHANNEL_ID, send_time, &payload)?);
        self.frames_sent += 1;
        if self.frames_sent % DEBUG_EVERY_FRAMES == 0 {
            let text = format!("sent {} frames, last at {:.1} Hz", self.frames_sent, rate);
            self.pending.extend(encode_data_frame(
                SIM_DEBUG_CHANNEL_ID,
                self.now_micros(),
                text.as_bytes(),
            )?);
        }
        Ok(())
    }
}
fn to_io(err: ProtocolError) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, err)
}
impl Read for SimulatedDevice {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.pending.is_empty() {
            thread::sleep(self.frame_interval);
            if !self.connected {
                return Err(io::Error::new(ErrorKind::TimedOut, "waiting for connect request"));
            }
            self.produce_frame().map_err(to_io)?;
        }
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}
impl Write for SimulatedDevice {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if byte == CONNECT_REQUEST {
                self.on_connect().map_err(to_io)?;
            }
        }
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
