//! Sender report (RFC 3550 §6.4.1).
//!
//! ```text
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! header |V=2|P|    RC   |   PT=SR=200   |             length            |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                         SSRC of sender                        |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! sender |              NTP timestamp, most significant word             |
//! info   +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |             NTP timestamp, least significant word             |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                         RTP timestamp                         |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                     sender's packet count                     |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                      sender's octet count                     |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//!        |                   report blocks (24 bytes each)               |
//! ```

use crate::byte_view::{set_u32_be, set_u64_be, u32_be, u64_be};

use super::{
    common_header::Header,
    packet_type::PT_SR,
    report_block::{Block, block_at, block_at_mut},
};

/// View over exactly one SR; the buffer must be `packet_size` long.
#[derive(Debug, Clone, Copy)]
pub struct SenderReport<B> {
    buf: B,
}

impl<B> SenderReport<B> {
    pub const MIN_SIZE: usize = 28;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> SenderReport<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn header(&self) -> Header<&[u8]> {
        Header::new(self.bytes())
    }

    pub fn valid(&self) -> bool {
        let header = self.header();
        header.valid()
            && self.bytes().len() >= Self::MIN_SIZE
            && self.bytes().len() == header.packet_size()
            && header.packet_type() == PT_SR
    }

    pub fn stream_id(&self) -> u32 {
        u32_be(self.bytes(), 4)
    }

    pub fn ntp_timestamp(&self) -> u64 {
        u64_be(self.bytes(), 8)
    }

    pub fn rtp_timestamp(&self) -> u32 {
        u32_be(self.bytes(), 16)
    }

    pub fn packet_count(&self) -> u32 {
        u32_be(self.bytes(), 20)
    }

    pub fn octet_count(&self) -> u32 {
        u32_be(self.bytes(), 24)
    }

    pub fn block(&self, index: usize) -> Block<&[u8]> {
        block_at(self.bytes(), Self::MIN_SIZE, index)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SenderReport<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn header_mut(&mut self) -> Header<&mut [u8]> {
        Header::new(self.bytes_mut())
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.bytes_mut(), 4, ssrc);
    }

    pub fn set_ntp_timestamp(&mut self, ts: u64) {
        set_u64_be(self.bytes_mut(), 8, ts);
    }

    pub fn set_rtp_timestamp(&mut self, ts: u32) {
        set_u32_be(self.bytes_mut(), 16, ts);
    }

    pub fn set_packet_count(&mut self, n: u32) {
        set_u32_be(self.bytes_mut(), 20, n);
    }

    pub fn set_octet_count(&mut self, n: u32) {
        set_u32_be(self.bytes_mut(), 24, n);
    }

    pub fn block_mut(&mut self, index: usize) -> Block<&mut [u8]> {
        block_at_mut(self.bytes_mut(), Self::MIN_SIZE, index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtcp::packet_type::PT_RR;

    fn empty_report(buf: &mut [u8]) -> SenderReport<&mut [u8]> {
        let size = buf.len();
        let mut sr = SenderReport::new(buf);
        let mut h = sr.header_mut();
        h.set_version(2);
        h.set_packet_type(PT_SR);
        assert!(h.set_packet_size(size));
        sr
    }

    #[test]
    fn test_empty_report_is_valid() {
        let mut buf = [0u8; 28];
        let sr = empty_report(&mut buf);
        assert!(sr.valid());
        assert_eq!(sr.header().count(), 0);
        assert!(!sr.block(0).valid());
    }

    #[test]
    fn test_set_fields() {
        let mut buf = [0u8; 28 + 24];
        let mut sr = empty_report(&mut buf);
        sr.header_mut().set_count(1);
        sr.set_stream_id(0xd34d_10cc);
        sr.set_ntp_timestamp(0x0102_0304_0506_0708);
        sr.set_rtp_timestamp(90_000);
        sr.set_packet_count(1234);
        sr.set_octet_count(987_654);
        sr.block_mut(0).set_stream_id(42);
        sr.block_mut(0).set_jitter(3);

        assert!(sr.valid());
        assert_eq!(sr.stream_id(), 0xd34d_10cc);
        assert_eq!(sr.ntp_timestamp(), 0x0102_0304_0506_0708);
        assert_eq!(sr.rtp_timestamp(), 90_000);
        assert_eq!(sr.packet_count(), 1234);
        assert_eq!(sr.octet_count(), 987_654);
        assert_eq!(sr.block(0).stream_id(), 42);
        assert_eq!(sr.block(0).jitter(), 3);
        assert!(!sr.block(1).valid());
    }

    #[test]
    fn test_size_must_match_length() {
        let mut buf = [0u8; 32];
        let mut sr = empty_report(&mut buf);
        assert!(sr.header_mut().set_packet_size(28));
        assert!(!sr.valid());
    }

    #[test]
    fn test_wrong_packet_type_is_invalid() {
        let mut buf = [0u8; 28];
        let mut sr = empty_report(&mut buf);
        sr.header_mut().set_packet_type(PT_RR);
        assert!(!sr.valid());
    }
}
