//! Receiver report (RFC 3550 §6.4.2).
//!
//! ```text
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! header |V=2|P|    RC   |   PT=RR=201   |             length            |
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                     SSRC of packet sender                     |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//!        |                   report blocks (24 bytes each)               |
//! ```

use crate::byte_view::{set_u32_be, u32_be};

use super::{
    common_header::Header,
    packet_type::PT_RR,
    report_block::{Block, block_at, block_at_mut},
};

#[derive(Debug, Clone, Copy)]
pub struct ReceiverReport<B> {
    buf: B,
}

impl<B> ReceiverReport<B> {
    pub const MIN_SIZE: usize = 8;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> ReceiverReport<B> {
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
            && header.packet_type() == PT_RR
    }

    pub fn stream_id(&self) -> u32 {
        u32_be(self.bytes(), 4)
    }

    pub fn block(&self, index: usize) -> Block<&[u8]> {
        block_at(self.bytes(), Self::MIN_SIZE, index)
    }

    /// The `count()` blocks announced in the header that fit in the buffer.
    pub fn blocks(&self) -> impl Iterator<Item = Block<&[u8]>> {
        (0..usize::from(self.header().count()))
            .map(move |i| self.block(i))
            .take_while(|b| b.valid())
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> ReceiverReport<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn header_mut(&mut self) -> Header<&mut [u8]> {
        Header::new(self.bytes_mut())
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.bytes_mut(), 4, ssrc);
    }

    pub fn block_mut(&mut self, index: usize) -> Block<&mut [u8]> {
        block_at_mut(self.bytes_mut(), Self::MIN_SIZE, index)
    }
}
