//! Source description (RFC 3550 §6.5).
//!
//! ```text
//!        +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! header |V=2|P|    SC   |  PT=SDES=202  |             length            |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! chunk  |                          SSRC/CSRC_1                          |
//!   1    +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//!        |                           SDES items                          |
//!        |                              ...                              |
//!        +=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+=+
//! ```
//!
//! Items are `type(8) length(8) data[length]`; a chunk's item list ends with a
//! zero type byte and is padded to the next 32-bit boundary.

use crate::byte_view::{pad4, set_u32_be, u32_be};

use super::{common_header::Header, packet_type::PT_SDES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ItemType {
    End = 0,
    Cname = 1,
    Name = 2,
    Email = 3,
    Phone = 4,
    Location = 5,
    Tool = 6,
    Note = 7,
    Private = 8,
}

impl ItemType {
    pub fn from_u8(t: u8) -> Option<Self> {
        Some(match t {
            0 => Self::End,
            1 => Self::Cname,
            2 => Self::Name,
            3 => Self::Email,
            4 => Self::Phone,
            5 => Self::Location,
            6 => Self::Tool,
            7 => Self::Note,
            8 => Self::Private,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SourceDescription<B> {
    buf: B,
}

impl<B> SourceDescription<B> {
    pub const MIN_SIZE: usize = 4;

    pub fn new(buf: B) -> Self {
        Self { buf }
    }
}

impl<B: AsRef<[u8]>> SourceDescription<B> {
    fn bytes(&self) -> &[u8] {
        self.buf.as_ref()
    }

    pub fn header(&self) -> Header<&[u8]> {
        Header::new(self.bytes())
    }

    pub fn valid(&self) -> bool {
        let header = self.header();
        header.valid()
            && header.packet_type() == PT_SDES
            && self.bytes().len() >= header.packet_size()
    }

    /// Chunks announced by the source count, stopping at the first one that
    /// does not fit.
    pub fn chunks(&self) -> Chunks<'_> {
        let end = self.header().packet_size();
        Chunks {
            buf: &self.bytes()[Self::MIN_SIZE..end],
            remaining: self.header().count(),
        }
    }
}

impl<B: AsRef<[u8]> + AsMut<[u8]>> SourceDescription<B> {
    pub fn header_mut(&mut self) -> Header<&mut [u8]> {
        Header::new(self.buf.as_mut())
    }

    /// Writer for the chunk area, starting right after the header.
    pub fn items_mut(&mut self) -> SourceItemsMut<'_> {
        SourceItemsMut::new(&mut self.buf.as_mut()[Self::MIN_SIZE..])
    }
}

pub struct Chunks<'a> {
    buf: &'a [u8],
    remaining: u8,
}

impl<'a> Iterator for Chunks<'a> {
    type Item = SourceItems<'a>;

    fn next(&mut self) -> Option<SourceItems<'a>> {
        if self.remaining == 0 {
            return None;
        }
        let items = SourceItems::new(self.buf);
        if !items.valid() {
            self.remaining = 0;
            return None;
        }
        self.remaining -= 1;
        let len = items.chunk_size().min(self.buf.len());
        self.buf = &self.buf[len..];
        Some(items)
    }
}

/// One SDES item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item<'a> {
    pub kind: u8,
    pub data: &'a [u8],
}

impl Item<'_> {
    pub fn item_type(&self) -> Option<ItemType> {
        ItemType::from_u8(self.kind)
    }
}

/// Reader over one chunk: SSRC followed by items.
#[derive(Debug, Clone, Copy)]
pub struct SourceItems<'a> {
    buf: &'a [u8],
    position: usize,
}

impl<'a> SourceItems<'a> {
    pub const MIN_SIZE: usize = 4;

    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            position: Self::MIN_SIZE,
        }
    }

    pub fn valid(&self) -> bool {
        self.buf.len() >= Self::MIN_SIZE
    }

    pub fn stream_id(&self) -> u32 {
        u32_be(self.buf, 0)
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn reset(&mut self) {
        self.position = Self::MIN_SIZE;
    }

    /// Bytes this chunk occupies including END and padding.
    pub fn chunk_size(&self) -> usize {
        let mut p = Self::MIN_SIZE;
        while p < self.buf.len() {
            if self.buf[p] == ItemType::End as u8 {
                p += 1;
                break;
            }
            match self.buf.get(p + 1) {
                Some(&len) => p += 2 + usize::from(len),
                None => {
                    p = self.buf.len();
                    break;
                }
            }
        }
        pad4(p)
    }
}

impl<'a> Iterator for SourceItems<'a> {
    type Item = Item<'a>;

    fn next(&mut self) -> Option<Item<'a>> {
        let kind = *self.buf.get(self.position)?;
        if kind == ItemType::End as u8 {
            return None;
        }
        let len = usize::from(*self.buf.get(self.position + 1)?);
        let start = self.position + 2;
        let data = self.buf.get(start..start + len)?;
        self.position = start + len;
        Some(Item { kind, data })
    }
}

/// Writes one chunk: [`set_stream_id`](Self::set_stream_id), any number of
/// [`push`](Self::push), then [`finish`](Self::finish).
pub struct SourceItemsMut<'a> {
    buf: &'a mut [u8],
    position: usize,
}

impl<'a> SourceItemsMut<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self {
            buf,
            position: SourceItems::MIN_SIZE,
        }
    }

    pub fn set_stream_id(&mut self, ssrc: u32) {
        set_u32_be(self.buf, 0, ssrc);
    }

    /// `false` when the item does not fit (END and padding included).
    pub fn push(&mut self, kind: ItemType, data: &[u8]) -> bool {
        let Ok(len) = u8::try_from(data.len()) else {
            return false;
        };
        let end = self.position + 2 + data.len();
        if pad4(end + 1) > self.buf.len() {
            return false;
        }
        self.buf[self.position] = kind as u8;
        self.buf[self.position + 1] = len;
        self.buf[self.position + 2..end].copy_from_slice(data);
        self.position = end;
        true
    }

    /// Terminates the item list; returns the padded chunk size.
    pub fn finish(self) -> usize {
        let end = pad4(self.position + 1).min(self.buf.len());
        self.buf[self.position..end].fill(0);
        end
    }
}
