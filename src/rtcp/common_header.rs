//! RTCP common header (RFC 3550 §6.4).
//!
//! ```text
//!  0               1               2               3
//!  7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | V |P|    RC   |      PT       |             length            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! `length` is the packet size in 32-bit words minus one, so a compound
//! packet is walked with [`Header::next`].

use crate::byte_view::{set_bits, set_u16_be, u16_be};

use super::packet_type::PacketType;

const VERSION_MASK: u8 = 0b1100_0000;
const PADDING_MASK: u8 = 0b0010_0000;
const COUNT_MASK: u8 = 0b0001_1111;

#[derive(Debug, Clone, Copy)]
pub struct Header<B> {
    buf: B,
}

impl<B> Header<B> {
    pub const MIN_SIZE: usize = 4;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> Header<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    /// Buffer size. Not the same as [`packet_size`](Self::packet_size).
    pub fn size(&self) -> usize {
        self.bytes().len()
    }

    pub fn valid(&self) -> bool {
        self.size() >= Self::MIN_SIZE
    }

    pub fn version(&self) -> u8 {
        (self.bytes()[0] & VERSION_MASK) >> 6
    }

    pub fn has_padding(&self) -> bool {
        self.bytes()[0] & PADDING_MASK != 0
    }

    /// RC: report blocks (SR/RR), chunks (SDES), sources (BYE) or subtype (APP).
    pub fn count(&self) -> u8 {
        self.bytes()[0] & COUNT_MASK
    }

    pub fn packet_type(&self) -> u8 {
        self.bytes()[1]
    }

    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_u8(self.packet_type())
    }

    pub fn length(&self) -> u16 {
        u16_be(self.bytes(), 2)
    }

    /// `(length + 1) * 4`
    pub fn packet_size(&self) -> usize {
        (usize::from(self.length()) + 1) * 4
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Header<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_version(&mut self, version: u8) {
        set_bits(&mut self.bytes_mut()[0], VERSION_MASK, version << 6);
    }

    pub fn set_has_padding(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[0], PADDING_MASK, if flag { PADDING_MASK } else { 0 });
    }

    pub fn set_count(&mut self, count: u8) {
        set_bits(&mut self.bytes_mut()[0], COUNT_MASK, count);
    }

    pub fn set_packet_type(&mut self, pt: u8) {
        self.bytes_mut()[1] = pt;
    }

    pub fn set_length(&mut self, length: u16) {
        set_u16_be(self.bytes_mut(), 2, length);
    }

    /// Sets `length` from a size in bytes. Returns `false` and leaves the
    /// header untouched unless `size` is a multiple of 4 the field can hold.
    pub fn set_packet_size(&mut self, size: usize) -> bool {
        if size < Self::MIN_SIZE || size % 4 != 0 {
            return false;
        }
        match u16::try_from(size / 4 - 1) {
            Ok(length) => {
                self.set_length(length);
                true
            }
            Err(_) => false,
        }
    }
}

impl<'a> Header<&'a [u8]> {
    /// This packet's bytes, `packet_size` long (clamped to the buffer).
    pub fn packet(&self) -> &'a [u8] {
        let n = self.packet_size().min(self.buf.len());
        &self.buf[..n]
    }

    /// Header of the next packet in a compound buffer. Invalid past the end.
    pub fn next(&self) -> Header<&'a [u8]> {
        let len = self.packet_size();
        if len + Self::MIN_SIZE > self.buf.len() {
            return Header::new(&[]);
        }
        Header::new(&self.buf[len..])
    }
}

impl<'a> Header<&'a mut [u8]> {
    pub fn next(self) -> Header<&'a mut [u8]> {
        let len = self.packet_size();
        let buf = self.buf;
        if len + Self::MIN_SIZE > buf.len() {
            return Header::new(&mut []);
        }
        Header::new(&mut buf[len..])
    }
}

/// Walks every packet of a compound RTCP buffer.
pub fn packets(buf: &[u8]) -> impl Iterator<Item = Header<&[u8]>> {
    std::iter::successors(Some(Header::new(buf)), |h| h.valid().then(|| h.next()))
        .take_while(|h| h.valid())
}
