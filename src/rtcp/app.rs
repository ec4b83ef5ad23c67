//! Application-defined packet (RFC 3550 §6.7).
//!
//! ```text
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |V=2|P| subtype |   PT=APP=204  |             length            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           SSRC/CSRC                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          name (ASCII)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                   application-dependent data                ...
//! ```

use crate::byte_view::{set_u32_be, u32_be};

use super::{common_header::Header, packet_type::PT_APP};

#[derive(Debug, Clone, Copy)]
pub struct App<B> {
    buf: B,
}

impl<B> App<B> {
    pub const MIN_SIZE: usize = 12;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> App<B> {
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
            && header.packet_size() >= Self::MIN_SIZE
            && self.bytes().len() >= header.packet_size()
            && header.packet_type() == PT_APP
    }

    pub fn subtype(&self) -> u8 {
        self.header().count()
    }

    pub fn stream_id(&self) -> u32 {
        u32_be(self.bytes(), 4)
    }

    pub fn name(&self) -> [u8; 4] {
        let mut name = [0u8; 4];
        name.copy_from_slice(&self.bytes()[8..12]);
        name
    }

    pub fn payload(&self) -> &[u8] {
        &self.bytes()[Self::MIN_SIZE..self.header().packet_size()]
    }

    pub fn payload_size(&self) -> usize {
        self.header().packet_size() - Self::MIN_SIZE
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> App<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn header_mut(&mut self) -> Header<&mut [u8]> {
        Header::new(self.bytes_mut())
    }

    pub fn set_subtype(&mut self, subtype: u8) {
        self.header_mut().set_count(subtype);
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.bytes_mut(), 4, ssrc);
    }

    pub fn set_name(&mut self, name: [u8; 4]) {
        self.bytes_mut()[8..12].copy_from_slice(&name);
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        let end = Header::new(self.bytes()).packet_size();
        &mut self.bytes_mut()[Self::MIN_SIZE..end]
    }
}
