//! STUN attributes (RFC 5389 §15): `type(16) length(16) value[length]`,
//! each padded to a 32-bit boundary.

use crate::byte_view::{pad4, set_u16_be, u16_be};

pub const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
pub const ATTR_XOR_MAPPED_ADDRESS: u16 = 0x0020;
pub const ATTR_SOFTWARE: u16 = 0x8022;

pub const FAMILY_IPV4: u8 = 0x01;
pub const FAMILY_IPV6: u8 = 0x02;

const ATTR_HEADER_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub kind: u16,
    pub data: &'a [u8],
}

/// Walks the attribute area of a message. Stops at the first attribute that
/// does not fit.
#[derive(Debug, Clone, Copy)]
pub struct Attributes<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> Attributes<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, position: 0 }
    }

    pub fn position(&self) -> usize {
        self.position
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Attribute<'a>;

    fn next(&mut self) -> Option<Attribute<'a>> {
        let at = self.position;
        if at + ATTR_HEADER_SIZE > self.buf.len() {
            return None;
        }
        let kind = u16_be(self.buf, at);
        let len = usize::from(u16_be(self.buf, at + 2));
        let start = at + ATTR_HEADER_SIZE;
        let data = self.buf.get(start..start + len)?;
        self.position = pad4(start + len).min(self.buf.len());
        Some(Attribute { kind, data })
    }
}

/// Appends attributes into a payload buffer.
pub struct AttributesMut<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> AttributesMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, position: 0 }
    }

    /// Bytes written so far, padding included.
    pub fn len(&self) -> usize {
        self.position
    }

    pub fn is_empty(&self) -> bool {
        self.position == 0
    }

    /// `false` when the attribute does not fit.
    pub fn append(&mut self, kind: u16, data: &[u8]) -> bool {
        let Ok(len) = u16::try_from(data.len()) else {
            return false;
        };
        let start = self.position + ATTR_HEADER_SIZE;
        let end = pad4(start + data.len());
        if end > self.buf.len() {
            return false;
        }
        set_u16_be(self.buf, self.position, kind);
        set_u16_be(self.buf, self.position + 2, len);
        self.buf[start..start + data.len()].copy_from_slice(data);
        self.buf[start + data.len()..end].fill(0);
        self.position = end;
        true
    }
}
