//! STUN message header (RFC 5389 §6).
//!
//! ```text
//!  0               1               2               3
//!  7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0 7 6 5 4 3 2 1 0
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |0 0|     STUN Message Type     |         Message Length        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                         Magic Cookie                          |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                Transaction ID (96 bits, 12 bytes)             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!
//! message type: M11 M10 M9 M8 M7 C1 M6 M5 M4 C0 M3 M2 M1 M0
//! ```

use crate::byte_view::{set_u16_be, set_u32_be, u16_be, u32_be};

pub const MAGIC_COOKIE: u32 = 0x2112_A442;

pub const CLASS_REQUEST: u8 = 0b00;
pub const CLASS_INDICATION: u8 = 0b01;
pub const CLASS_SUCCESS: u8 = 0b10;
pub const CLASS_ERROR: u8 = 0b11;

pub const METHOD_BINDING: u16 = 0x001;

pub type Transaction = [u8; 12];

/// Cheap check that `bytes` looks like a STUN message (RFC 5389 §7.3).
pub fn is_message(bytes: &[u8]) -> bool {
    let message = Message::new(bytes);
    message.valid()
        && message.message_type() >> 14 == 0
        && message.length() % 4 == 0
        && message.cookie() == MAGIC_COOKIE
}

#[derive(Debug, Clone, Copy)]
pub struct Message<B> {
    buf: B,
}

impl<B> Message<B> {
    pub const MIN_SIZE: usize = 20;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> Message<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn size(&self) -> usize {
        self.bytes().len()
    }

    pub fn valid(&self) -> bool {
        self.size() >= Self::MIN_SIZE
    }

    pub fn message_type(&self) -> u16 {
        u16_be(self.bytes(), 0)
    }

    /// C1 C0
    pub fn class(&self) -> u8 {
        let (msb, lsb) = (self.bytes()[0], self.bytes()[1]);
        ((msb & 0b0000_0001) << 1) | ((lsb & 0b0001_0000) >> 4)
    }

    /// M11..M0
    pub fn method(&self) -> u16 {
        let msb = u16::from(self.bytes()[0]);
        let lsb = u16::from(self.bytes()[1]);
        ((msb & 0b0011_1110) << 6) | ((lsb & 0b1110_0000) >> 1) | (lsb & 0b0000_1111)
    }

    /// Payload length in bytes, header excluded.
    pub fn length(&self) -> u16 {
        u16_be(self.bytes(), 2)
    }

    pub fn cookie(&self) -> u32 {
        u32_be(self.bytes(), 4)
    }

    pub fn transaction(&self) -> Transaction {
        let mut id = [0u8; 12];
        id.copy_from_slice(&self.bytes()[8..20]);
        id
    }

    /// Attribute area, `length()` bytes clamped to the buffer.
    pub fn payload(&self) -> &[u8] {
        let end = (Self::MIN_SIZE + usize::from(self.length())).min(self.size());
        &self.bytes()[Self::MIN_SIZE..end]
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> Message<B> {
    fn bytes_mut(&mut self) -> &mut [u8] {
        self.buf.as_mut()
    }

    pub fn set_message_type(&mut self, t: u16) {
        set_u16_be(self.bytes_mut(), 0, t);
    }

    pub fn set_class(&mut self, class: u8) {
        let b = self.bytes_mut();
        b[0] = (b[0] & 0b1111_1110) | ((class & 0b10) >> 1);
        b[1] = (b[1] & 0b1110_1111) | ((class & 0b01) << 4);
    }

    pub fn set_method(&mut self, method: u16) {
        let b = self.bytes_mut();
        let msb = ((method & 0b1111_1000_0000) >> 6) as u8;
        let lsb = ((method & 0b0000_0111_0000) << 1) as u8 | (method & 0b1111) as u8;
        b[0] = (b[0] & 0b0000_0001) | msb;
        b[1] = (b[1] & 0b0001_0000) | lsb;
    }

    pub fn set_length(&mut self, len: u16) {
        set_u16_be(self.bytes_mut(), 2, len);
    }

    pub fn set_cookie(&mut self, cookie: u32) {
        set_u32_be(self.bytes_mut(), 4, cookie);
    }

    pub fn set_transaction(&mut self, id: &Transaction) {
        self.bytes_mut()[8..20].copy_from_slice(id);
    }

    /// Everything after the header, for writing attributes.
    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.bytes_mut()[Self::MIN_SIZE..]
    }
}
