//! Frame writer for the `u32 length (little-endian) || payload` format.

use std::io::{self, ErrorKind, Write};

use crate::byte_view::set_u32_le;

use super::tcp_error::TcpError;

pub const LENGTH_PREFIX_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    SendingLength,
    SendingContent,
}

/// Sends one frame at a time, resuming after partial writes.
///
/// The cursor counts bytes of the current part (prefix or payload) already on
/// the wire. Only one of the two states is active at a time.
#[derive(Debug)]
pub struct FrameWriter {
    state: WriteState,
    length: [u8; LENGTH_PREFIX_SIZE],
    cursor: usize,
}

impl Default for FrameWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameWriter {
    pub fn new() -> Self {
        Self {
            state: WriteState::SendingLength,
            length: [0; LENGTH_PREFIX_SIZE],
            cursor: 0,
        }
    }

    pub fn state(&self) -> WriteState {
        self.state
    }

    /// Prepares the length prefix for a payload of `size` bytes and rewinds
    /// to `SendingLength`.
    pub fn start(&mut self, size: usize) -> Result<(), TcpError> {
        let len = u32::try_from(size).map_err(|_| TcpError::PacketTooLarge(size))?;
        set_u32_le(&mut self.length, 0, len);
        self.state = WriteState::SendingLength;
        self.cursor = 0;
        Ok(())
    }

    /// Issues one `write` call. Returns `true` once the whole frame is out.
    pub fn write_some<W: Write>(&mut self, out: &mut W, payload: &[u8]) -> io::Result<bool> {
        let pending = match self.state {
            WriteState::SendingLength => &self.length[self.cursor..],
            WriteState::SendingContent => &payload[self.cursor..],
        };
        let n = if pending.is_empty() { 0 } else { out.write(pending)? };
        if n == 0 && !pending.is_empty() {
            return Err(io::Error::new(ErrorKind::WriteZero, "connection closed"));
        }
        self.cursor += n;

        match self.state {
            WriteState::SendingLength if self.cursor == LENGTH_PREFIX_SIZE => {
                self.state = WriteState::SendingContent;
                self.cursor = 0;
                // empty payloads finish right after the prefix
                Ok(payload.is_empty() && self.finish())
            }
            WriteState::SendingContent if self.cursor == payload.len() => Ok(self.finish()),
            _ => Ok(false),
        }
    }

    /// Writes a complete frame, retrying on `Interrupted`.
    pub fn write_frame<W: Write>(&mut self, out: &mut W, payload: &[u8]) -> Result<(), TcpError> {
        self.start(payload.len())?;
        loop {
            match self.write_some(out, payload) {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    self.reset();
                    return Err(e.into());
                }
            }
        }
    }

    /// Forgets any partially written frame.
    pub fn reset(&mut self) {
        self.state = WriteState::SendingLength;
        self.cursor = 0;
    }

    fn finish(&mut self) -> bool {
        self.reset();
        true
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    /// Accepts at most `chunk` bytes per call.
    struct Trickle {
        out: Vec<u8>,
        chunk: usize,
        calls: usize,
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.calls += 1;
            let n = buf.len().min(self.chunk);
            self.out.extend_from_slice(&buf[..n]);
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct Closed;

    impl Write for Closed {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Ok(0)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frame_layout() {
        let mut out = Vec::new();
        FrameWriter::new().write_frame(&mut out, b"hello").unwrap();
        assert_eq!(out, [5, 0, 0, 0, b'h', b'e', b'l', b'l', b'o']);
    }

    #[test]
    fn test_partial_writes_resume() {
        let payload: Vec<u8> = (0..=255).collect();
        let mut sink = Trickle { out: Vec::new(), chunk: 3, calls: 0 };
        let mut writer = FrameWriter::new();
        writer.start(payload.len()).unwrap();

        assert!(!writer.write_some(&mut sink, &payload).unwrap());
        assert_eq!(writer.state(), WriteState::SendingLength);
        assert!(!writer.write_some(&mut sink, &payload).unwrap());
        assert_eq!(writer.state(), WriteState::SendingContent);

        while !writer.write_some(&mut sink, &payload).unwrap() {}
        assert_eq!(writer.state(), WriteState::SendingLength);
        assert_eq!(&sink.out[..4], &[0, 1, 0, 0]);
        assert_eq!(&sink.out[4..], &payload[..]);
        assert_eq!(sink.calls, 2 + 256usize.div_ceil(3));
    }

    #[test]
    fn test_empty_payload() {
        let mut out = Vec::new();
        FrameWriter::new().write_frame(&mut out, b"").unwrap();
        assert_eq!(out, [0, 0, 0, 0]);
    }

    #[test]
    fn test_closed_peer_is_an_error() {
        let mut writer = FrameWriter::new();
        let err = writer.write_frame(&mut Closed, b"abc").unwrap_err();
        assert!(matches!(err, TcpError::Io(e) if e.kind() == ErrorKind::WriteZero));
        assert_eq!(writer.state(), WriteState::SendingLength);
    }
}
