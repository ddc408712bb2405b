use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use log::warn;
use crate::protocol::error::ProtocolError;
/// Ordered, blocking byte stream the frame decoder pulls from.
pub trait ByteSource {
    /// Blocks until `buf` is completely filled.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError>;
    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError>;
    /// Checked before every marker scan, i.e. between frames.
    fn check_open(&self) -> Result<(), ProtocolError> {
        Ok(())
    }
    fn read_byte(&mut self) -> Result<u8, ProtocolError> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
    fn read_bytes(&mut self, count: usize) -> Result<Vec<u8>, ProtocolError> {
        let mut buf = vec![0u8; count];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }
    fn read_u16_le(&mut self) -> Result<u16, ProtocolError> {
        let mut buf = [0u8; 2];
        self.read_exact(&mut buf)?;
        Ok(u16::from_le_bytes(buf))
    }
    fn read_u32_le(&mut self) -> Result<u32, ProtocolError> {
        let mut buf = [0u8; 4];
        self.read_exact(&mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }
    /// Consumes and discards everything up to and including the first occurrence of `marker`.
    fn read_until(&mut self, marker: &[u8]) -> Result<(), ProtocolError> {
        self.check_open()?;
        if marker.is_empty() {
            return Ok(());
        }
        let mut window: VecDeque<u8> = VecDeque::with_capacity(marker.len());
        loop {
            let byte = self.read_byte()?;
            if window.len() == marker.len() {
                window.pop_front();
            }
            window.push_back(byte);
            if window.len() == marker.len() && window.iter().eq(marker.iter()) {
                return Ok(());
            }
        }
    }
}
/// Adapts any blocking `Read + Write` stream (serial port, simulated device).
///
/// Read timeouts are never surfaced: they only give the reader a chance to
/// notice that `stop` was raised.
pub struct StreamSource<T> {
    inner: T,
    stop: Arc<AtomicBool>,
}
impl<T: Read + Write> StreamSource<T> {
    pub fn new(inner: T, stop: Arc<AtomicBool>) -> Self {
        Self { inner, stop }
    }
    fn stopped(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}
impl<T: Read + Write> ByteSource for StreamSource<T> {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => return Err(ProtocolError::ConnectionClosed),
                Ok(n) => filled += n,
                Err(e) if is_idle(&e) => {
                    if self.stopped() {
                        return Err(ProtocolError::ConnectionClosed);
                    }
                }
                Err(e) => {
                    warn!("read failed: {e}");
                    return Err(ProtocolError::ConnectionClosed);
                }
            }
        }
        Ok(())
    }
    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.inner
            .write_all(&[byte])
            .and_then(|_| self.inner.flush())
            .map_err(|e| {
                warn!("write failed: {e}");
                ProtocolError::ConnectionClosed
            })
    }
    fn check_open(&self) -> Result<(), ProtocolError> {
        if self.stopped() {
            Err(ProtocolError::ConnectionClosed)
        } else {
            Ok(())
        }
    }
}
fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
    )
}
/// Scripted source for tests; running out of input is end-of-stream.
#[cfg(test)]
pub struct MemorySource {
    input: VecDeque<u8>,
    pub written: Vec<u8>,
}
#[cfg(test)]
impl MemorySource {
    pub fn new(bytes: impl IntoIterator<Item = u8>) -> Self {
        Self {
            input: bytes.into_iter().collect(),
            written: Vec::new(),
        }
    }
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}
#[cfg(test)]
impl ByteSource for MemorySource {
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        if self.input.len() < buf.len() {
            self.input.clear();
            return Err(ProtocolError::ConnectionClosed);
        }
        for slot in buf.iter_mut() {
            if let Some(byte) = self.input.pop_front() {
                *slot = byte;
            }
        }
        Ok(())
    }
    fn write_byte(&mut self, byte: u8) -> Result<(), ProtocolError> {
        self.written.push(byte);
        Ok(())
    }
}
#[cfg(test)]
mod tests {
    use super::*;
    /// Replays a fixed list of read results, then reports end-of-stream.
    struct ScriptedStream {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }
    impl ScriptedStream {
        fn new(reads: Vec<io::Result<Vec<u8>>>) -> Self {
            Self {
                reads: reads.into(),
                written: Vec::new(),
            }
        }
    }
    impl Read for ScriptedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e),
                Some(Ok(mut chunk)) => {
                    let n = chunk.len().min(buf.len());
                    buf[..n].copy_from_slice(&chunk[..n]);
                    if n < chunk.len() {
                        self.reads.push_front(Ok(chunk.split_off(n)));
                    }
                    Ok(n)
                }
            }
        }
    }
    impl Write for ScriptedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
    fn timeout() -> io::Result<Vec<u8>> {
        Err(io::Error::new(ErrorKind::TimedOut, "poll"))
    }
    #[test]
    fn read_until_discards_through_marker() {
        let mut source = MemorySource::new(b"noiseSTARTx".iter().copied());
        source.read_until(b"START").unwrap();
        assert_eq!(source.read_byte().unwrap(), b'x');
    }
    #[test]
    fn read_until_handles_overlapping_prefix() {
        let mut source = MemorySource::new(b"STSTSTART!".iter().copied());
        source.read_until(b"START").unwrap();
        assert_eq!(source.read_byte().unwrap(), b'!');
    }
    #[test]
    fn read_until_without_marker_is_connection_closed() {
        let mut source = MemorySource::new(b"STAR".iter().copied());
        assert!(matches!(
            source.read_until(b"START"),
            Err(ProtocolError::ConnectionClosed)
        ));
    }
    #[test]
    fn little_endian_helpers() {
        let mut source = MemorySource::new([0x34, 0x12, 0x40, 0x42, 0x0F, 0x00]);
        assert_eq!(source.read_u16_le().unwrap(), 0x1234);
        assert_eq!(source.read_u32_le().unwrap(), 1_000_000);
    }
    #[test]
    fn stream_source_retries_timeouts_and_joins_partial_reads() {
        let stream = ScriptedStream::new(vec![Ok(vec![1, 2]), timeout(), Ok(vec![3, 4, 5])]);
        let mut source = StreamSource::new(stream, Arc::new(AtomicBool::new(false)));
        assert_eq!(source.read_bytes(4).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(source.read_byte().unwrap(), 5);
        assert!(matches!(
            source.read_byte(),
            Err(ProtocolError::ConnectionClosed)
        ));
    }
    #[test]
    fn stream_source_stop_flag_ends_session() {
        let stop = Arc::new(AtomicBool::new(false));
        let stream = ScriptedStream::new(vec![timeout(), Ok(vec![9])]);
        let mut source = StreamSource::new(stream, stop.clone());
        stop.store(true, Ordering::Relaxed);
        assert!(matches!(
            source.read_until(b"START"),
            Err(ProtocolError::ConnectionClosed)
        ));
        assert!(matches!(
            source.read_byte(),
            Err(ProtocolError::ConnectionClosed)
        ));
    }
    #[test]
    fn stream_source_io_error_is_connection_closed() {
        let stream = ScriptedStream::new(vec![Err(io::Error::new(
            ErrorKind::BrokenPipe,
            "unplugged",
        ))]);
        let mut source = StreamSource::new(stream, Arc::new(AtomicBool::new(false)));
        assert!(matches!(
            source.read_byte(),
            Err(ProtocolError::ConnectionClosed)
        ));
    }
    #[test]
    fn stream_source_writes_connect_byte() {
        let mut source = StreamSource::new(ScriptedStream::new(vec![]), Arc::new(AtomicBool::new(false)));
        source.write_byte(b'C').unwrap();
        assert_eq!(source.inner.written, b"C");
    }
}
