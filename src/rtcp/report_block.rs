use crate::byte_view::{set_u24_be, set_u32_be, u24_be, u32_be};

/// Reception report block, RFC 3550 §6.4.1 (24 bytes).
///
/// ```text
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 SSRC_n (SSRC of source n)                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// | fraction lost |       cumulative number of packets lost       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           extended highest sequence number received           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      interarrival jitter                      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                         last SR (LSR)                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                   delay since last SR (DLSR)                  |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Debug, Clone, Copy)]
pub struct Block<B> {
    buf: B,
}

impl<B> Block<B> {
    pub const MIN_SIZE: usize = 24;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> Block<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn valid(&self) -> bool {
        self.bytes().len() >= Self::MIN_SIZE
    }

    pub fn stream_id(&self) -> u32 {
        u32_be(self.bytes(), 0)
    }

    pub fn fraction_lost(&self) -> u8 {
        self.bytes()[4]
    }

    /// Raw 24-bit cumulative loss, as on the wire.
    pub fn packets_lost(&self) -> u32 {
        u24_be(self.bytes(), 5)
    }

    pub fn last_sequence(&self) -> u32 {
        u32_be(self.bytes(), 8)
    }

    pub fn jitter(&self) -> u32 {
        u32_be(self.bytes(), 12)
    }

    pub fn last_sender_report(&self) -> u32 {
        u32_be(self.bytes(), 16)
    }

    pub fn delay_since_last_sender_report(&self) -> u32 {
        u32_be(self.bytes(), 20)
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Block<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.bytes_mut(), 0, ssrc);
    }

    pub fn set_fraction_lost(&mut self, lost: u8) {
        self.bytes_mut()[4] = lost;
    }

    /// Only the low 24 bits are kept.
    pub fn set_packets_lost(&mut self, lost: u32) {
        set_u24_be(self.bytes_mut(), 5, lost);
    }

    pub fn set_last_sequence(&mut self, seq: u32) {
        set_u32_be(self.bytes_mut(), 8, seq);
    }

    pub fn set_jitter(&mut self, jitter: u32) {
        set_u32_be(self.bytes_mut(), 12, jitter);
    }

    pub fn set_last_sender_report(&mut self, lsr: u32) {
        set_u32_be(self.bytes_mut(), 16, lsr);
    }

    pub fn set_delay_since_last_sender_report(&mut self, dlsr: u32) {
        set_u32_be(self.bytes_mut(), 20, dlsr);
    }
}

/// Block `index` of a report whose blocks start at `offset`; invalid if it
/// does not fit.
pub(super) fn block_at(buf: &[u8], offset: usize, index: usize) -> Block<&[u8]> {
    let at = offset + index * Block::<&[u8]>::MIN_SIZE;
    match buf.get(at..at + Block::<&[u8]>::MIN_SIZE) {
        Some(b) => Block::new(b),
        None => Block::new(&[]),
    }
}

pub(super) fn block_at_mut(buf: &mut [u8], offset: usize, index: usize) -> Block<&mut [u8]> {
    let at = offset + index * Block::<&[u8]>::MIN_SIZE;
    match buf.get_mut(at..at + Block::<&[u8]>::MIN_SIZE) {
        Some(b) => Block::new(b),
        None => Block::new(&mut []),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_fields() {
        let mut buf = [0u8; 24];
        let mut block = Block::new(&mut buf[..]);
        block.set_stream_id(0xd34d_10cc);
        block.set_fraction_lost(7);
        block.set_packets_lost(0x0012_3456);
        block.set_last_sequence(70_000);
        block.set_jitter(11);
        block.set_last_sender_report(0xabcd_0000);
        block.set_delay_since_last_sender_report(65_536);

        assert!(block.valid());
        assert_eq!(block.stream_id(), 0xd34d_10cc);
        assert_eq!(block.fraction_lost(), 7);
        assert_eq!(block.packets_lost(), 0x0012_3456);
        assert_eq!(block.last_sequence(), 70_000);
        assert_eq!(block.jitter(), 11);
        assert_eq!(block.last_sender_report(), 0xabcd_0000);
        assert_eq!(block.delay_since_last_sender_report(), 65_536);
    }

    #[test]
    fn test_packets_lost_keeps_neighbours() {
        let mut buf = [0u8; 24];
        let mut block = Block::new(&mut buf[..]);
        block.set_fraction_lost(0xff);
        block.set_last_sequence(0xffff_ffff);
        block.set_packets_lost(0xffff_ffff);
        assert_eq!(block.fraction_lost(), 0xff);
        assert_eq!(block.packets_lost(), 0x00ff_ffff);
        assert_eq!(block.last_sequence(), 0xffff_ffff);
    }

    #[test]
    fn test_block_at_out_of_range_is_invalid() {
        let buf = [0u8; 40];
        assert!(block_at(&buf, 8, 0).valid());
        assert!(!block_at(&buf, 8, 1).valid());
    }
}
