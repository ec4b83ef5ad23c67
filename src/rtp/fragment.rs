//! FU-A fragment view (RFC 6184 §5.8).
//!
//! ```text
//!  0               1               2               3
//!  7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! | FU indicator  |   FU header   |                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               |
//! |                         FU payload                            |
//! |                               +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                               :...OPTIONAL RTP padding        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! indicator: |F|NRI|  Type  |     header: |S|E|R|  Type  |
//! ```

use crate::byte_view::set_bits;

pub const PACKET_TYPE_FU_A: u8 = 28;

// indicator fields
pub const NRI_MASK: u8 = 0b0110_0000;
pub const PACKET_TYPE_MASK: u8 = 0b0001_1111;

// header fields
pub const START_FLAG_MASK: u8 = 0b1000_0000;
pub const END_FLAG_MASK: u8 = 0b0100_0000;
pub const NAL_TYPE_MASK: u8 = 0b0001_1111;

#[derive(Debug, Clone, Copy)]
pub struct Fragment<B> {
    buf: B,
}

impl<B> Fragment<B> {
    pub const MIN_SIZE: usize = 2;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> Fragment<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn size(&self) -> usize {
        self.bytes().len()
    }

    pub fn valid(&self) -> bool {
        self.size() >= Self::MIN_SIZE
    }

    pub fn indicator(&self) -> u8 {
        self.bytes()[0]
    }

    /// nal_ref_idc, 0..=3
    pub fn nri(&self) -> u8 {
        (self.indicator() & NRI_MASK) >> 5
    }

    pub fn packet_type(&self) -> u8 {
        self.indicator() & PACKET_TYPE_MASK
    }

    pub fn header(&self) -> u8 {
        self.bytes()[1]
    }

    pub fn is_first(&self) -> bool {
        self.header() & START_FLAG_MASK != 0
    }

    pub fn is_last(&self) -> bool {
        self.header() & END_FLAG_MASK != 0
    }

    pub fn nal_type(&self) -> u8 {
        self.header() & NAL_TYPE_MASK
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes()[Self::MIN_SIZE..]
    }

    pub fn payload_size(&self) -> usize {
        self.size() - Self::MIN_SIZE
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Fragment<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_nri(&mut self, nri: u8) {
        set_bits(&mut self.bytes_mut()[0], NRI_MASK, nri << 5);
    }

    pub fn set_packet_type(&mut self, t: u8) {
        set_bits(&mut self.bytes_mut()[0], PACKET_TYPE_MASK, t);
    }

    pub fn set_first(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[1], START_FLAG_MASK, if flag { START_FLAG_MASK } else { 0 });
    }

    pub fn set_last(&mut self, flag: bool) {
        set_bits(&mut self.bytes_mut()[1], END_FLAG_MASK, if flag { END_FLAG_MASK } else { 0 });
    }

    pub fn set_nal_type(&mut self, t: u8) {
        set_bits(&mut self.bytes_mut()[1], NAL_TYPE_MASK, t);
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes_mut()[Self::MIN_SIZE..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_from_wire_ok() {
        // NRI=3, FU-A, Start, IDR
        let bytes = [0x7c, 0x85, 0xb8, 0x00];
        let f = Fragment::new(&bytes[..]);
        assert!(f.valid());
        assert_eq!(f.nri(), 3);
        assert_eq!(f.packet_type(), PACKET_TYPE_FU_A);
        assert!(f.is_first());
        assert!(!f.is_last());
        assert_eq!(f.nal_type(), 5);
        assert_eq!(f.payload(), &[0xb8, 0x00]);
    }

    #[test]
    fn test_setters_round_trip() {
        let mut buf = [0u8; 5];
        let mut f = Fragment::new(&mut buf[..]);
        f.set_nri(2);
        f.set_packet_type(PACKET_TYPE_FU_A);
        f.set_first(false);
        f.set_last(true);
        f.set_nal_type(1);
        f.payload_mut().copy_from_slice(&[9, 8, 7]);

        assert_eq!(f.nri(), 2);
        assert_eq!(f.packet_type(), PACKET_TYPE_FU_A);
        assert!(!f.is_first());
        assert!(f.is_last());
        assert_eq!(f.nal_type(), 1);
        assert_eq!(f.payload_size(), 3);
        assert_eq!(buf, [0x5c, 0x41, 9, 8, 7]);
    }

    #[test]
    fn test_single_byte_is_invalid() {
        assert!(!Fragment::new(&[0x7c][..]).valid());
    }
}
