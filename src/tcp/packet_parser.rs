use bytes::BytesMut;

use crate::byte_view::u32_le;
use crate::unit::Unit;

use super::framing::LENGTH_PREFIX_SIZE;
use super::tcp_error::TcpError;

/// Largest frame accepted from the wire.
pub const MAX_PACKET_SIZE: usize = 8 * 1024 * 1024;

const INITIAL_CAPACITY: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ReadingLength,
    ReadingContent,
}

/// Incremental parser for `[length: u32 le][content]` frames.
///
/// Input can be split at any byte; state carries over between calls. The
/// content buffer grows to fit the largest frame seen.
#[derive(Debug)]
pub struct PacketParser {
    state: State,
    length: [u8; LENGTH_PREFIX_SIZE],
    filled: usize,
    remaining: usize,
    buffer: BytesMut,
}

impl Default for PacketParser {
    fn default() -> Self {
        Self::new()
    }
}

impl PacketParser {
    pub fn new() -> Self {
        Self {
            state: State::ReadingLength,
            length: [0; LENGTH_PREFIX_SIZE],
            filled: 0,
            remaining: 0,
            buffer: BytesMut::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// Feeds received bytes and returns every frame they completed.
    ///
    /// A length above [`MAX_PACKET_SIZE`] fails the stream; the parser is
    /// reset and the connection should be dropped.
    pub fn update(&mut self, mut data: &[u8]) -> Result<Vec<Unit>, TcpError> {
        let mut units = Vec::new();

        while !data.is_empty() {
            match self.state {
                State::ReadingLength => {
                    let n = (LENGTH_PREFIX_SIZE - self.filled).min(data.len());
                    self.length[self.filled..self.filled + n].copy_from_slice(&data[..n]);
                    self.filled += n;
                    data = &data[n..];

                    if self.filled == LENGTH_PREFIX_SIZE {
                        let size = u32_le(&self.length, 0) as usize;
                        if size > MAX_PACKET_SIZE {
                            self.reset();
                            return Err(TcpError::PacketTooLarge(size));
                        }
                        self.filled = 0;
                        self.remaining = size;
                        self.buffer.reserve(size);
                        self.state = State::ReadingContent;
                    }
                }
                State::ReadingContent => {
                    let n = self.remaining.min(data.len());
                    self.buffer.extend_from_slice(&data[..n]);
                    self.remaining -= n;
                    data = &data[n..];
                }
            }

            if self.state == State::ReadingContent && self.remaining == 0 {
                units.push(Unit::from_annexb(self.buffer.split().freeze(), 0));
                self.state = State::ReadingLength;
            }
        }

        Ok(units)
    }

    pub fn reset(&mut self) {
        self.state = State::ReadingLength;
        self.filled = 0;
        self.remaining = 0;
        self.buffer.clear();
    }
}
