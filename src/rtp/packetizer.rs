//! RFC 6184 H.264 -> FU-A packetizer.
//!
//! Input  : one Annex-B access unit (may contain several NAL units, with 3- or
//!          4-byte start codes).
//! Output : an iterator of [`FuChunk`]s, each one the payload of one RTP packet.
//!
//! Every NAL is sent as FU-A, even small ones. RFC 6184 forbids setting Start
//! and End in the same FU header, so a NAL whose body fits in one fragment is
//! followed by an extra, empty fragment carrying only End.
//!
//! Typical use:
//!   let mut p = Packetizer::new(1400, unit.data());
//!   while let Some(chunk) = p.next() {
//!       let n = chunk.write_into(packet.payload_mut());
//!   }

use super::fragment::{Fragment, NAL_TYPE_MASK, NRI_MASK, PACKET_TYPE_FU_A};

/// One FU-A fragment borrowing its payload from the access unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuChunk<'a> {
    pub indicator: u8,
    pub header: u8,
    pub payload: &'a [u8],
}

impl FuChunk<'_> {
    /// Bytes needed on the wire (indicator + header + payload).
    pub fn len(&self) -> usize {
        Fragment::<&[u8]>::MIN_SIZE + self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Writes the fragment at the start of `out`, returns bytes written.
    /// `out` must hold at least [`len`](Self::len) bytes.
    pub fn write_into(&self, out: &mut [u8]) -> usize {
        let n = self.len();
        let out = &mut out[..n];
        out[0] = self.indicator;
        out[1] = self.header;
        Fragment::new(out).payload_mut().copy_from_slice(self.payload);
        n
    }

    pub fn is_first(&self) -> bool {
        Fragment::new([self.indicator, self.header]).is_first()
    }

    pub fn is_last(&self) -> bool {
        Fragment::new([self.indicator, self.header]).is_last()
    }
}

pub struct Packetizer<'a> {
    data: &'a [u8],
    /// largest FU payload per fragment
    mtu: usize,

    nri: u8,
    nal_type: u8,

    /// bytes of the current NAL body not yet emitted
    remaining: usize,
    pending_end: bool,
}

impl<'a> Packetizer<'a> {
    /// `mtu` is clamped to at least 1 byte of payload.
    pub fn new(mtu: usize, data: &'a [u8]) -> Self {
        Self {
            data,
            mtu: mtu.max(1),
            nri: 0,
            nal_type: 0,
            remaining: 0,
            pending_end: false,
        }
    }

    /// Moves to the next NAL unit. `false` when there is none left.
    fn next_unit(&mut self) -> bool {
        let Some(start) = find_start_code(self.data) else {
            self.data = &[];
            return false;
        };
        let (at, code_len) = start;
        let header_index = at + code_len;
        let Some(&nal_header) = self.data.get(header_index) else {
            self.data = &[];
            return false;
        };

        self.nri = nal_header & NRI_MASK;
        self.nal_type = nal_header & NAL_TYPE_MASK;
        self.data = &self.data[header_index + 1..];

        self.remaining = match find_start_code(self.data) {
            Some((pos, _)) => pos,
            None => self.data.len(),
        };
        true
    }

    fn chunk(&self, first: bool, last: bool, payload: &'a [u8]) -> FuChunk<'a> {
        let mut header = self.nal_type;
        if first {
            header |= 1 << 7;
        }
        if last {
            header |= 1 << 6;
        }
        FuChunk {
            indicator: self.nri | PACKET_TYPE_FU_A,
            header,
            payload,
        }
    }
}

impl<'a> Iterator for Packetizer<'a> {
    type Item = FuChunk<'a>;

    fn next(&mut self) -> Option<FuChunk<'a>> {
        if self.pending_end {
            self.pending_end = false;
            return Some(self.chunk(false, true, &[]));
        }

        let mut first = false;
        if self.remaining == 0 {
            if self.data.is_empty() || !self.next_unit() {
                return None;
            }
            first = true;
        }

        let size = self.remaining.min(self.mtu);
        self.remaining -= size;

        let mut last = false;
        if self.remaining == 0 {
            if first {
                self.pending_end = true;
            } else {
                last = true;
            }
        }

        let (payload, rest) = self.data.split_at(size);
        self.data = rest;
        Some(self.chunk(first, last, payload))
    }
}

/// Position and length of the first `00 00 01` / `00 00 00 01` in `data`.
fn find_start_code(data: &[u8]) -> Option<(usize, usize)> {
    let pos = data.windows(3).position(|w| w == [0x00, 0x00, 0x01])?;
    if pos > 0 && data[pos - 1] == 0x00 {
        Some((pos - 1, 4))
    } else {
        Some((pos, 3))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]
    use super::*;

    const FIRST: u8 = 1 << 7;
    const LAST: u8 = 1 << 6;

    #[test]
    fn empty_data_yields_nothing() {
        assert_eq!(Packetizer::new(20, b"").next(), None);
        assert_eq!(Packetizer::new(20, &[0x00, 0x00, 0x01]).next(), None);
        assert_eq!(Packetizer::new(20, &[0xAB, 0xCD, 0xEF]).next(), None);
    }

    #[test]
    fn small_units_get_separate_end_fragment() {
        // AUD, SPS, PPS
        let data = [
            0x00, 0x00, 0x01, 0x09, 0x10, 0x00, 0x00, 0x01, 0x67, 0x42, 0x00, 0x20, 0xe9, 0x00,
            0x80, 0x0c, 0x32, 0x00, 0x00, 0x00, 0x01, 0x68, 0xce, 0x3c, 0x80,
        ];
        let chunks: Vec<_> = Packetizer::new(20, &data).collect();

        let expected = [
            FuChunk { indicator: PACKET_TYPE_FU_A, header: FIRST | 9, payload: &[0x10] },
            FuChunk { indicator: PACKET_TYPE_FU_A, header: LAST | 9, payload: &[] },
            FuChunk {
                indicator: PACKET_TYPE_FU_A | (3 << 5),
                header: FIRST | 7,
                payload: &[0x42, 0x00, 0x20, 0xe9, 0x00, 0x80, 0x0c, 0x32],
            },
            FuChunk { indicator: PACKET_TYPE_FU_A | (3 << 5), header: LAST | 7, payload: &[] },
            FuChunk {
                indicator: PACKET_TYPE_FU_A | (3 << 5),
                header: FIRST | 8,
                payload: &[0xce, 0x3c, 0x80],
            },
            FuChunk { indicator: PACKET_TYPE_FU_A | (3 << 5), header: LAST | 8, payload: &[] },
        ];
        assert_eq!(chunks, expected);
    }

    #[test]
    fn big_unit_splits_by_mtu() {
        let mut data = vec![0x00, 0x00, 0x00, 0x01, 0x65];
        data.extend((1..=10u8).collect::<Vec<_>>());
        let chunks: Vec<_> = Packetizer::new(4, &data).collect();

        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].header, FIRST | 5);
        assert_eq!(chunks[0].payload, &[1, 2, 3, 4]);
        assert_eq!(chunks[1].header, 5);
        assert_eq!(chunks[1].payload, &[5, 6, 7, 8]);
        assert_eq!(chunks[2].header, LAST | 5);
        assert_eq!(chunks[2].payload, &[9, 10]);
        assert!(chunks.iter().all(|c| c.indicator == (3 << 5) | PACKET_TYPE_FU_A));
    }

    #[test]
    fn exact_multiple_of_mtu_has_no_trailing_empty_chunk() {
        let data = [0x00, 0x00, 0x01, 0x41, 1, 2, 3, 4];
        let chunks: Vec<_> = Packetizer::new(2, &data).collect();
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].is_first());
        assert!(chunks[1].is_last());
        assert_eq!(chunks[1].payload, &[3, 4]);
    }

    #[test]
    fn leading_garbage_before_first_start_code_is_skipped() {
        let data = [0xFF, 0xEE, 0x00, 0x00, 0x01, 0x41, 7];
        let chunks: Vec<_> = Packetizer::new(10, &data).collect();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].payload, &[7]);
    }

    #[test]
    fn write_into_lays_out_fragment() {
        let chunk = FuChunk { indicator: 0x7c, header: FIRST | 5, payload: &[1, 2, 3] };
        let mut out = [0u8; 8];
        assert_eq!(chunk.write_into(&mut out), 5);
        assert_eq!(&out[..5], &[0x7c, 0x85, 1, 2, 3]);
    }
}
