//! RTP fixed header view (RFC 3550 §5.1).
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|X|  CC   |M|     PT      |       sequence number         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           timestamp                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           synchronization source (SSRC) identifier            |
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |            contributing source (CSRC) identifiers             |
//! |                             ....                              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use crate::byte_view::{set_bits, set_u16_be, set_u32_be, u16_be, u32_be};

const VERSION_MASK: u8 = 0b1100_0000;
const PADDING_MASK: u8 = 0b0010_0000;
const EXTENSION_MASK: u8 = 0b0001_0000;
const CC_MASK: u8 = 0b0000_1111;
const MARKER_MASK: u8 = 0b1000_0000;
const PT_MASK: u8 = 0b0111_1111;

/// Borrowed view over one RTP packet. The buffer is never copied.
///
/// Use `Packet<&[u8]>` to read and `Packet<&mut [u8]>` to write in place.
#[derive(Debug, Clone, Copy)]
pub struct Packet<B> {
    buf: B,
}

impl<B> Packet<B> {
    pub const MIN_SIZE: usize = 12;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }

    pub fn into_inner(self) -> B {
        self.buf
    }
}

impl<B: AsRef<[u8]>> Packet<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn size(&self) -> usize {
        self.bytes().len()
    }

    /// Fixed header plus the advertised CSRC list fit in the buffer.
    pub fn valid(&self) -> bool {
        self.size() >= Self::MIN_SIZE && self.size() >= self.header_size()
    }

    pub fn version(&self) -> u8 {
        (self.bytes()[0] & VERSION_MASK) >> 6
    }

    pub fn has_padding(&self) -> bool {
        self.bytes()[0] & PADDING_MASK != 0
    }

    pub fn has_extensions(&self) -> bool {
        self.bytes()[0] & EXTENSION_MASK != 0
    }

    pub fn contributors_count(&self) -> u8 {
        self.bytes()[0] & CC_MASK
    }

    pub fn marked(&self) -> bool {
        self.bytes()[1] & MARKER_MASK != 0
    }

    pub fn payload_type(&self) -> u8 {
        self.bytes()[1] & PT_MASK
    }

    pub fn sequence(&self) -> u16 {
        u16_be(self.bytes(), 2)
    }

    pub fn timestamp(&self) -> u32 {
        u32_be(self.bytes(), 4)
    }

    /// SSRC
    pub fn stream_id(&self) -> u32 {
        u32_be(self.bytes(), 8)
    }

    /// CSRC number `i`, `i < contributors_count()`.
    pub fn contributor(&self, i: usize) -> u32 {
        u32_be(self.bytes(), Self::MIN_SIZE + i * 4)
    }

    pub fn header_size(&self) -> usize {
        Self::MIN_SIZE + usize::from(self.contributors_count()) * 4
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes()[self.header_size()..]
    }

    pub fn payload_size(&self) -> usize {
        self.size() - self.header_size()
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Packet<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_version(&mut self, version: u8) {
        set_bits(&mut self.bytes_mut()[0], VERSION_MASK, version << 6);
    }

    pub fn set_has_padding(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[0], PADDING_MASK, if flag { PADDING_MASK } else { 0 });
    }

    pub fn set_has_extensions(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[0], EXTENSION_MASK, if flag { EXTENSION_MASK } else { 0 });
    }

    pub fn set_contributors_count(&mut self, cc: u8) {
        set_bits(&mut self.bytes_mut()[0], CC_MASK, cc);
    }

    pub fn set_marked(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[1], MARKER_MASK, if flag { MARKER_MASK } else { 0 });
    }

    pub fn set_payload_type(&mut self, pt: u8) {
        set_bits(&mut self.bytes_mut()[1], PT_MASK, pt);
    }

    pub fn set_sequence(&mut self, seq: u16) {
        set_u16_be(self.bytes_mut(), 2, seq);
    }

    pub fn set_timestamp(&mut self, ts: u32) {
        set_u32_be(self.bytes_mut(), 4, ts);
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.bytes_mut(), 8, ssrc);
    }

    pub fn set_contributor(&mut self, i: usize, csrc: u32) {
        set_u32_be(self.bytes_mut(), Self::MIN_SIZE + i * 4, csrc);
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let at = self.header_size();
        &mut self.bytes_mut()[at..]
    }
}
