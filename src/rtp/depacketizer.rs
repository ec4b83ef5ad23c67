//! RFC 6184 H.264 <- FU-A depacketizer.
//!
//! Fragments between a Start and an End fragment are accumulated into one
//! Annex-B NAL: `00 00 01`, the recovered NAL header (`NRI << 5 | type`),
//! then the fragment payloads. Several NALs of one access unit are appended
//! back to back. Out-of-order Start/End flags drop only the NAL that was
//! open; NALs already closed stay in the buffer.

use super::fragment::Fragment;

const START_CODE: [u8; 3] = [0x00, 0x00, 0x01];

#[derive(Debug, Default)]
pub struct Depacketizer {
    buffer: Vec<u8>,
    /// buffer length before the open NAL, the last NAL boundary
    nal_start: usize,
    /// a Start was seen and its End was not
    in_nal: bool,
    complete: bool,
}

impl Depacketizer {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(4096),
            nal_start: 0,
            in_nal: false,
            complete: false,
        }
    }

    /// Returns `true` when the last pushed fragment closed a NAL unit.
    pub fn push<B: AsRef<[u8]>>(&mut self, fragment: &Fragment<B>) -> bool {
        if !fragment.valid() {
            self.drop_open_nal();
            return false;
        }

        if fragment.is_first() {
            // previous NAL never ended
            self.drop_open_nal();
            if fragment.is_last() {
                // Start and End in one header
                return false;
            }
            self.nal_start = self.buffer.len();
            self.buffer.extend_from_slice(&START_CODE);
            self.buffer.push((fragment.nri() << 5) | fragment.nal_type());
            self.in_nal = true;
            self.complete = false;
        } else if !self.in_nal {
            // continuation without a Start
            return false;
        }

        self.buffer.extend_from_slice(fragment.payload());
        if fragment.is_last() {
            self.in_nal = false;
            self.complete = true;
            return true;
        }
        false
    }

    /// The buffer ends on a closed NAL.
    pub fn complete(&self) -> bool {
        self.complete
    }

    pub fn bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Hands out the accumulated bytes and resets.
    pub fn take(&mut self) -> Vec<u8> {
        self.nal_start = 0;
        self.in_nal = false;
        self.complete = false;
        std::mem::take(&mut self.buffer)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.nal_start = 0;
        self.in_nal = false;
        self.complete = false;
    }

    fn drop_open_nal(&mut self) {
        if self.in_nal {
            self.buffer.truncate(self.nal_start);
            self.in_nal = false;
            self.complete = !self.buffer.is_empty();
        }
    }
}
