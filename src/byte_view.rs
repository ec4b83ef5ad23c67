//! Bounds-checked integer access over borrowed byte slices.
//!
//! Wire views (`rtp::Packet`, `rtcp::Header`, `stun::Message`, ...) keep a
//! borrowed buffer and read fields through these helpers. Every access goes
//! through slice indexing, so reading past the end panics instead of touching
//! memory outside the buffer. Callers check `valid()` first.

use byteorder::{BigEndian, ByteOrder, LittleEndian};

#[inline]
pub fn u16_be(buf: &[u8], at: usize) -> u16 {
    BigEndian::read_u16(&buf[at..at + 2])
}

#[inline]
pub fn u24_be(buf: &[u8], at: usize) -> u32 {
    BigEndian::read_u24(&buf[at..at + 3])
}

#[inline]
pub fn u32_be(buf: &[u8], at: usize) -> u32 {
    BigEndian::read_u32(&buf[at..at + 4])
}

#[inline]
pub fn u64_be(buf: &[u8], at: usize) -> u64 {
    BigEndian::read_u64(&buf[at..at + 8])
}

#[inline]
pub fn set_u16_be(buf: &mut [u8], at: usize, v: u16) {
    BigEndian::write_u16(&mut buf[at..at + 2], v);
}

/// Writes the low 24 bits of `v`.
#[inline]
pub fn set_u24_be(buf: &mut [u8], at: usize, v: u32) {
    BigEndian::write_u24(&mut buf[at..at + 3], v & 0x00FF_FFFF);
}

#[inline]
pub fn set_u32_be(buf: &mut [u8], at: usize, v: u32) {
    BigEndian::write_u32(&mut buf[at..at + 4], v);
}

#[inline]
pub fn set_u64_be(buf: &mut [u8], at: usize, v: u64) {
    BigEndian::write_u64(&mut buf[at..at + 8], v);
}

// The TCP/P2P length prefix is the one little-endian field on the wire.

#[inline]
pub fn u32_le(buf: &[u8], at: usize) -> u32 {
    LittleEndian::read_u32(&buf[at..at + 4])
}

#[inline]
pub fn set_u32_le(buf: &mut [u8], at: usize, v: u32) {
    LittleEndian::write_u32(&mut buf[at..at + 4], v);
}

/// Replaces the bits selected by `mask` in `byte` with `value` (already shifted).
#[inline]
pub fn set_bits(byte: &mut u8, mask: u8, value: u8) {
    *byte = (*byte & !mask) | (value & mask);
}

/// Rounds `n` up to the next multiple of 4 (RTCP words, STUN attribute padding).
#[inline]
pub const fn pad4(n: usize) -> usize {
    (n + 3) & !3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_fields_land_in_network_order() {
        let mut buf = [0u8; 16];
        set_u16_be(&mut buf, 0, 0x1234);
        set_u24_be(&mut buf, 2, 0xAB_CDEF);
        set_u32_be(&mut buf, 5, 0x2112_A442);
        set_u64_be(&mut buf, 8, 0x0102_0304_0506_0708);

        assert_eq!(&buf[..9], &[0x12, 0x34, 0xAB, 0xCD, 0xEF, 0x21, 0x12, 0xA4, 0x42]);
        assert_eq!(u16_be(&buf, 0), 0x1234);
        assert_eq!(u24_be(&buf, 2), 0xAB_CDEF);
        assert_eq!(u32_be(&buf, 5), 0x2112_A442);
        assert_eq!(u64_be(&buf, 8), 0x0102_0304_0506_0708);
    }

    #[test]
    fn u24_setter_ignores_high_byte() {
        let mut buf = [0xFFu8; 4];
        set_u24_be(&mut buf, 1, 0xFF00_0001);
        assert_eq!(buf, [0xFF, 0x00, 0x00, 0x01]);
    }

    #[test]
    fn length_prefix_is_little_endian() {
        let mut buf = [0u8; 4];
        set_u32_le(&mut buf, 0, 5000);
        assert_eq!(buf, [0x88, 0x13, 0x00, 0x00]);
        assert_eq!(u32_le(&buf, 0), 5000);
    }

    #[test]
    fn set_bits_only_touches_mask() {
        let mut b = 0b1010_1010;
        set_bits(&mut b, 0b0110_0000, 0b0100_0000);
        assert_eq!(b, 0b1100_1010);
    }

    #[test]
    fn pad4_rounds_up() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 4);
        assert_eq!(pad4(4), 4);
        assert_eq!(pad4(21), 24);
    }

    #[test]
    #[should_panic]
    fn out_of_range_read_panics() {
        let buf = [0u8; 3];
        let _ = u32_be(&buf, 0);
    }
}
