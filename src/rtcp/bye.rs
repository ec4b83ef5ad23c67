//! Goodbye packet (RFC 3550 §6.6).
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P|    SC   |   PT=BYE=203  |             length            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           SSRC/CSRC                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! :                              ...                              :
//! +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! |     length    |               reason for leaving            ... (opt)
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use crate::byte_view::{set_u32_be, u32_be};

use super::{common_header::Header, packet_type::PT_BYE};

#[derive(Debug, Clone, Copy)]
pub struct Bye<B> {
    buf: B,
}

impl<B> Bye<B> {
    pub const MIN_SIZE: usize = 4;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> Bye<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn header(&self) -> Header<&[u8]> {
        Header::new(self.bytes())
    }

    fn reason_offset(&self) -> usize {
        Self::MIN_SIZE + usize::from(self.header().count()) * 4
    }

    pub fn valid(&self) -> bool {
        let header = self.header();
        header.valid()
            && header.packet_type() == PT_BYE
            && self.bytes().len() >= header.packet_size()
            && header.packet_size() >= self.reason_offset()
    }

    /// Source `i`, `i < header().count()`.
    pub fn stream_id(&self, i: usize) -> u32 {
        u32_be(self.bytes(), Self::MIN_SIZE + i * 4)
    }

    pub fn stream_ids(&self) -> impl Iterator<Item = u32> + '_ {
        (0..usize::from(self.header().count())).map(move |i| self.stream_id(i))
    }

    pub fn has_reason(&self) -> bool {
        self.header().packet_size() > self.reason_offset()
    }

    /// The reason text, clamped to the packet.
    pub fn reason(&self) -> &[u8] {
        if !self.has_reason() {
            return &[];
        }
        let at = self.reason_offset();
        let end = self.header().packet_size();
        let len = usize::from(self.bytes()[at]).min(end - at - 1);
        &self.bytes()[at + 1..at + 1 + len]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Bye<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn header_mut(&mut self) -> Header<&mut [u8]> {
        Header::new(self.bytes_mut())
    }

    pub fn set_stream_id(&mut self, i: usize, ssrc: u32) {
        set_u32_be(self.bytes_mut(), Self::MIN_SIZE + i * 4, ssrc);
    }

    /// Writes the length-prefixed reason after the sources. The caller sizes
    /// the packet (`length`) to cover it.
    pub fn set_reason(&mut self, reason: &[u8]) {
        let at = self.reason_offset();
        let len = reason.len().min(usize::from(u8::MAX));
        let bytes = self.bytes_mut();
        bytes[at] = len as u8;
        bytes[at + 1..at + 1 + len].copy_from_slice(&reason[..len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty() {
        let mut buf = [0u8; 4];
        let mut bye = Bye::new(&mut buf[..]);
        bye.header_mut().set_packet_type(PT_BYE);
        assert!(bye.header_mut().set_packet_size(4));

        assert!(bye.valid());
        assert!(!bye.has_reason());
        assert_eq!(bye.reason(), b"");
    }

    #[test]
    fn test_set_fields() {
        let mut buf = [0u8; 12];
        let mut bye = Bye::new(&mut buf[..]);
        bye.header_mut().set_version(2);
        bye.header_mut().set_count(1);
        bye.header_mut().set_packet_type(PT_BYE);
        assert!(bye.header_mut().set_packet_size(12));
        bye.set_stream_id(0, 0xd34d_10cc);
        bye.set_reason(b"bye");

        assert!(bye.valid());
        assert_eq!(bye.stream_id(0), 0xd34d_10cc);
        assert!(bye.has_reason());
        assert_eq!(bye.reason(), b"bye");
    }

    #[test]
    fn test_deserialize() {
        let buf = [
            0x82, 0xcb, 0x00, 0x03, // header
            0x00, 0x00, 0x00, 0x42, // ssrc #0
            0xd3, 0x4d, 0x10, 0xcc, // ssrc #1
            0x03, 0x61, 0x62, 0x63, // reason
        ];
        let bye = Bye::new(&buf[..]);
        assert!(bye.valid());
        assert_eq!(bye.header().count(), 2);
        assert_eq!(bye.header().packet_size(), 16);
        assert_eq!(bye.stream_ids().collect::<Vec<_>>(), vec![0x42, 0xd34d_10cc]);
        assert!(bye.has_reason());
        assert_eq!(bye.reason(), b"abc");
    }

    #[test]
    fn test_sources_past_length_are_invalid() {
        let buf = [0x83, 0xcb, 0x00, 0x01, 0, 0, 0, 1];
        assert!(!Bye::new(&buf[..]).valid());
    }

    #[test]
    fn test_oversized_reason_length_is_clamped() {
        let buf = [0x80, 0xcb, 0x00, 0x01, 0xff, b'a', b'b', b'c'];
        assert_eq!(Bye::new(&buf[..]).reason(), b"abc");
    }
}
