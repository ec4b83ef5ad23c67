use bytes::Bytes;

const NAL_TYPE_MASK: u8 = 0b0001_1111;
const NAL_TYPE_SLICE: u8 = 1;
const NAL_TYPE_IDR: u8 = 5;
const NAL_TYPE_SEI: u8 = 6;
const NAL_TYPE_SPS: u8 = 7;
const NAL_TYPE_PPS: u8 = 8;
const NAL_TYPE_AUD: u8 = 9;

/// RTP video clock.
pub const CLOCK_RATE: u64 = 90_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitType {
    Idr,
    Unknown,
}

/// One encoded access unit travelling through the pipeline.
///
/// The payload is a [`Bytes`] so fanning a unit out to many P2P clients only
/// bumps a reference count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    data: Bytes,
    timestamp: u64,
    kind: UnitType,
}

impl Unit {
    pub fn new(data: impl Into<Bytes>, timestamp: u64, kind: UnitType) -> Self {
        Self {
            data: data.into(),
            timestamp,
            kind,
        }
    }

    /// Builds a unit from Annex-B bytes, flagging it `Idr` when any NAL in it
    /// is an IDR slice.
    pub fn from_annexb(data: impl Into<Bytes>, timestamp: u64) -> Self {
        let data = data.into();
        let kind = if contains_idr(&data) {
            UnitType::Idr
        } else {
            UnitType::Unknown
        };
        Self {
            data,
            timestamp,
            kind,
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn kind(&self) -> UnitType {
        self.kind
    }

    pub fn is_idr(&self) -> bool {
        self.kind == UnitType::Idr
    }
}

/// Iterates NAL header bytes following each `00 00 01` start code.
pub fn nal_types(data: &[u8]) -> impl Iterator<Item = u8> + '_ {
    data.windows(4)
        .filter(|w| w[0] == 0 && w[1] == 0 && w[2] == 1)
        .map(|w| w[3] & NAL_TYPE_MASK)
}

fn contains_idr(data: &[u8]) -> bool {
    nal_types(data).any(|t| t == NAL_TYPE_IDR)
}

/// Start offsets of every NAL (its start code included) in an Annex-B stream.
fn nal_starts(data: &[u8]) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0 && data[i + 1] == 0 && data[i + 2] == 1 {
            // fold a leading zero of a 4-byte start code into this NAL
            let at = if i > 0 && data[i - 1] == 0 { i - 1 } else { i };
            starts.push(at);
            i += 3;
        } else {
            i += 1;
        }
    }
    starts
}

/// Splits an Annex-B elementary stream into access units, stamping them on
/// a 90 kHz clock at `fps`.
///
/// A unit ends before an AUD, SPS, PPS or SEI, or before a slice whose
/// `first_mb_in_slice` is zero, once it already holds a slice.
pub fn split_access_units(data: &[u8], fps: u32) -> Vec<Unit> {
    let step = CLOCK_RATE / u64::from(fps.max(1));
    let starts = nal_starts(data);
    let mut units = Vec::new();
    let mut begin = match starts.first() {
        Some(&b) => b,
        None => return units,
    };
    let mut has_slice = false;

    for (n, &start) in starts.iter().enumerate() {
        let end = starts.get(n + 1).copied().unwrap_or(data.len());
        let nal = &data[start..end];
        let header_at = nal.iter().position(|&b| b == 1).map_or(nal.len(), |p| p + 1);
        let Some(&header) = nal.get(header_at) else {
            continue;
        };
        let kind = header & NAL_TYPE_MASK;
        let is_slice = kind == NAL_TYPE_SLICE || kind == NAL_TYPE_IDR;
        let first_mb_zero = nal.get(header_at + 1).is_some_and(|b| b & 0x80 != 0);

        let opens_unit = matches!(kind, NAL_TYPE_AUD | NAL_TYPE_SPS | NAL_TYPE_PPS | NAL_TYPE_SEI)
            || (is_slice && first_mb_zero);
        if has_slice && opens_unit {
            let ts = units.len() as u64 * step;
            units.push(Unit::from_annexb(data[begin..start].to_vec(), ts));
            begin = start;
            has_slice = false;
        }
        has_slice |= is_slice;
    }

    if begin < data.len() {
        let ts = units.len() as u64 * step;
        units.push(Unit::from_annexb(data[begin..].to_vec(), ts));
    }
    units
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_annexb_detects_idr_after_parameter_sets() {
        // SPS, PPS, IDR slice
        let au = [
            0, 0, 0, 1, 0x67, 0x42, 0, 0, 0, 1, 0x68, 0xce, 0, 0, 1, 0x65, 0x88, 0x80,
        ];
        let unit = Unit::from_annexb(au.to_vec(), 3000);
        assert!(unit.is_idr());
        assert_eq!(unit.timestamp(), 3000);
        assert_eq!(unit.size(), au.len());
    }

    #[test]
    fn from_annexb_non_idr_slice_is_unknown() {
        let unit = Unit::from_annexb(vec![0, 0, 1, 0x41, 0x9a, 0x02], 0);
        assert_eq!(unit.kind(), UnitType::Unknown);
    }

    #[test]
    fn clones_share_payload() {
        let unit = Unit::new(vec![1u8; 64], 1, UnitType::Idr);
        let copy = unit.clone();
        assert_eq!(unit.data().as_ptr(), copy.data().as_ptr());
    }

    #[test]
    fn split_groups_parameter_sets_with_the_next_slice() {
        let stream = [
            0, 0, 0, 1, 0x67, 0x42, // SPS
            0, 0, 0, 1, 0x68, 0xce, // PPS
            0, 0, 1, 0x65, 0x88, 0x01, // IDR, first slice
            0, 0, 1, 0x65, 0x08, 0x02, // IDR, second slice of the same picture
            0, 0, 1, 0x41, 0x9a, 0x03, // P slice, new picture
            0, 0, 1, 0x41, 0x9a, 0x04, // P slice, new picture
        ];
        let units = split_access_units(&stream, 30);
        assert_eq!(units.len(), 3);
        assert_eq!(units[0].size(), 24);
        assert!(units[0].is_idr());
        assert_eq!(units[1].data(), &[0, 0, 1, 0x41, 0x9a, 0x03]);
        assert!(!units[2].is_idr());
        assert_eq!(units[2].timestamp(), 6_000);

        let total: usize = units.iter().map(Unit::size).sum();
        assert_eq!(total, stream.len());
    }

    #[test]
    fn split_without_start_codes_is_empty() {
        assert!(split_access_units(&[1, 2, 3, 4], 30).is_empty());
    }
}
